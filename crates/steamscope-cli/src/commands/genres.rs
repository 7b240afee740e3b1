use super::{catalog_path, load_catalog};
use crate::output::{format_dollars, new_table, Output};
use color_eyre::Result;
use comfy_table::Cell;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use steamscope_config::Config;
use steamscope_core::catalog::{GenreRevenue, GenreSuccess};
use steamscope_core::CatalogCleaner;

#[derive(Debug, Serialize)]
struct GenreRow {
    genre: String,
    games: usize,
    q1_revenue: f64,
    median_revenue: f64,
    q3_revenue: f64,
    success_rate: Option<f64>,
}

fn join_rows(revenue: Vec<GenreRevenue>, success: Vec<GenreSuccess>, limit: usize) -> Vec<GenreRow> {
    let rates: HashMap<String, f64> = success.into_iter().map(|s| (s.genre, s.success_rate)).collect();
    revenue
        .into_iter()
        .take(limit)
        .map(|r| GenreRow {
            success_rate: rates.get(&r.genre).copied(),
            genre: r.genre,
            games: r.games,
            q1_revenue: r.q1,
            median_revenue: r.median,
            q3_revenue: r.q3,
        })
        .collect()
}

pub fn run_genres(catalog: Option<PathBuf>, limit: usize, config: &Config, output: &Output) -> Result<()> {
    let path = catalog_path(catalog, config)?;
    let table = load_catalog(&path)?;
    let cleaner = CatalogCleaner::new(config.catalog.clone());
    let entries = cleaner
        .clean(&table)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to clean catalog: {}", e))?;

    if entries.is_empty() {
        output.warn("No catalog rows survived cleaning");
        return Ok(());
    }

    let rows = join_rows(
        cleaner.revenue_by_genre(&entries),
        cleaner.success_rate_by_genre(&entries),
        limit,
    );

    let threshold = format_dollars(config.catalog.revenue_threshold);
    let success_header = format!("≥ {}", threshold);
    let mut view = new_table(&["Genre", "Games", "Q1", "Median revenue", "Q3", success_header.as_str()]);
    for row in &rows {
        view.add_row(vec![
            Cell::new(&row.genre),
            Cell::new(row.games),
            Cell::new(format_dollars(row.q1_revenue)),
            Cell::new(format_dollars(row.median_revenue)),
            Cell::new(format_dollars(row.q3_revenue)),
            Cell::new(row.success_rate.map(|r| format!("{:.1}%", r)).unwrap_or_else(|| "-".to_string())),
        ]);
    }
    output.report(view, &rows);
    Ok(())
}
