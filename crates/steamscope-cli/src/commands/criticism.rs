use super::load_catalog;
use crate::output::{new_table, Output};
use color_eyre::Result;
use comfy_table::Cell;
use std::path::PathBuf;
use steamscope_config::Config;
use steamscope_core::catalog::genres_by_appid;
use steamscope_core::{analyze_reviews, load_reviews_csv, CatalogCleaner, CriticismReport};

/// Tag scraped reviews, joining genres when a catalog is given.
pub fn build_report(reviews: Option<PathBuf>, catalog: Option<PathBuf>, config: &Config) -> Result<CriticismReport> {
    let reviews_path = reviews.unwrap_or_else(|| config.scrape.output.clone());
    let records = load_reviews_csv(&reviews_path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read reviews from {}: {}", reviews_path.display(), e))?;

    let genres = match catalog {
        Some(path) => {
            let entries = CatalogCleaner::new(config.catalog.clone())
                .clean(&load_catalog(&path)?)
                .map_err(|e| color_eyre::eyre::eyre!("Failed to clean catalog: {}", e))?;
            Some(genres_by_appid(&entries))
        }
        None => None,
    };

    Ok(analyze_reviews(&records, &config.criticism, genres.as_ref()))
}

pub fn run_criticism(
    reviews: Option<PathBuf>,
    catalog: Option<PathBuf>,
    limit: usize,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let report = build_report(reviews, catalog, config)?;

    let mut view = new_table(&["Game", "Reviews", "Stability", "Ratio", "Buggy"]);
    for ratio in report.stability.iter().take(limit) {
        let features = report.games.iter().find(|g| g.game_title == ratio.game_title);
        view.add_row(vec![
            Cell::new(&ratio.game_title),
            Cell::new(ratio.stability_reviews + ratio.other_reviews),
            Cell::new(ratio.stability_reviews),
            Cell::new(format!("{:.3}", ratio.stability_ratio)),
            Cell::new(if features.map_or(false, |f| f.buggy) { "yes" } else { "no" }),
        ]);
    }
    output.report(view, &report);

    if output.is_human() {
        let mut categories = new_table(&["Criticism", "Reviews"]);
        let mut totals: Vec<_> = report.category_totals.iter().collect();
        totals.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (category, count) in totals {
            categories.add_row(vec![Cell::new(category), Cell::new(count)]);
        }
        output.report(categories, &report.category_totals);

        let terms: Vec<String> = report.top_terms.iter().map(|t| format!("{} ({})", t.term, t.count)).collect();
        output.info(format!("Frequent terms: {}", terms.join(", ")));
        for genre in &report.genres {
            if let Some(dominant) = &genre.dominant {
                output.info(format!("{}: mostly {}", genre.genre, dominant));
            }
        }
    }

    output.success(format!(
        "Analyzed {} reviews across {} games; {} labelled buggy (stability ratio >= {})",
        report.reviews,
        report.games.len(),
        report.buggy_games().count(),
        config.criticism.buggy_threshold
    ));
    Ok(())
}
