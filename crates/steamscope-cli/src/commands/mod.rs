pub mod config;
pub mod criticism;
pub mod genres;
pub mod preprocess;
pub mod scrape;
pub mod select;
pub mod serve;
pub mod stability;
mod ui;

use color_eyre::Result;
use std::path::{Path, PathBuf};
use steamscope_core::CatalogTable;

/// The `--catalog` argument, or `[catalog].path` from the config.
pub(crate) fn catalog_path(arg: Option<PathBuf>, config: &steamscope_config::Config) -> Result<PathBuf> {
    arg.or_else(|| config.catalog.path.clone()).ok_or_else(|| {
        color_eyre::eyre::eyre!("No catalog given: pass --catalog or set [catalog].path in the config file")
    })
}

pub(crate) fn load_catalog(path: &Path) -> Result<CatalogTable> {
    CatalogTable::from_path(path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read catalog {}: {}", path.display(), e))
}
