use super::load_catalog;
use crate::output::Output;
use color_eyre::Result;
use std::path::PathBuf;
use steamscope_config::Config;
use steamscope_core::catalog::{preprocess_games, write_games_data};

pub fn run_preprocess(input: PathBuf, out: Option<PathBuf>, config: &Config, output: &Output) -> Result<()> {
    let destination = match out {
        Some(path) => path,
        None if config.server.games_data.starts_with("http://") || config.server.games_data.starts_with("https://") => {
            return Err(color_eyre::eyre::eyre!(
                "[server].games_data is a URL; pass --out to choose where to write the games data"
            ));
        }
        None => PathBuf::from(&config.server.games_data),
    };

    let table = load_catalog(&input)?;
    let games = preprocess_games(&table, &config.preprocess)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to preprocess {}: {}", input.display(), e))?;

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&destination)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create {}: {}", destination.display(), e))?;
    write_games_data(file, &games).map_err(|e| color_eyre::eyre::eyre!("Failed to write games data: {}", e))?;

    output.success(format!(
        "Kept {} of {} games; games data written to {}",
        games.len(),
        table.len(),
        destination.display()
    ));
    Ok(())
}
