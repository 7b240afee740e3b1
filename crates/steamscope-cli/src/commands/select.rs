use super::{catalog_path, load_catalog};
use crate::output::{new_table, Output};
use color_eyre::Result;
use comfy_table::Cell;
use std::path::PathBuf;
use steamscope_config::Config;
use steamscope_core::catalog::select_targets;
use steamscope_core::CatalogCleaner;

pub fn run_select(catalog: Option<PathBuf>, seed: Option<u64>, config: &Config, output: &Output) -> Result<()> {
    let path = catalog_path(catalog, config)?;
    let table = load_catalog(&path)?;
    let games = CatalogCleaner::new(config.catalog.clone())
        .games(&table)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to clean catalog: {}", e))?;

    let mut selection = config.selection.clone();
    if seed.is_some() {
        selection.seed = seed;
    }
    let targets = select_targets(&games, &selection);

    let mut view = new_table(&["AppID", "Title"]);
    for target in &targets {
        view.add_row(vec![Cell::new(target.appid), Cell::new(&target.title)]);
    }
    output.report(view, &targets);
    output.success(format!(
        "{} games selected (score < {}, at least {} reviews, {:.0}% sample)",
        targets.len(),
        selection.max_review_score,
        selection.min_review_count,
        selection.sample_fraction * 100.0
    ));
    Ok(())
}
