use crate::output::{new_table, Output};
use color_eyre::Result;
use comfy_table::Cell;
use std::path::{Path, PathBuf};
use steamscope_config::{Config, PathManager};

pub fn resolve_config_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| PathManager::default().config_file())
}

pub fn load_config(path: &Path) -> Result<Config> {
    tracing::debug!("Loading config from {}", path.display());
    Config::load(path).map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", path.display(), e))
}

pub fn run_config(cmd: crate::ConfigCommands, path: &Path, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show => show_config(path, output),
        crate::ConfigCommands::Init { force } => init_config(path, force, output),
        crate::ConfigCommands::Path => {
            output.info(path.display().to_string());
            Ok(())
        }
    }
}

fn show_config(path: &Path, output: &Output) -> Result<()> {
    let mut config = load_config(path)?;
    if !path.exists() {
        output.warn(format!("No configuration file at {}; showing defaults", path.display()));
    }
    config.summarizer.api_key = config.summarizer.api_key.as_deref().map(mask_secret);

    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to render configuration: {}", e))?;
    let mut table = new_table(&["Config File", "Google API Key"]);
    let key_state = if config.summarizer.resolve_api_key().is_some() { "configured" } else { "not configured" };
    table.add_row(vec![Cell::new(path.display().to_string()), Cell::new(key_state)]);

    output.report(table, &config);
    if output.is_human() {
        output.info(rendered);
    }
    Ok(())
}

fn init_config(path: &Path, force: bool, output: &Output) -> Result<()> {
    if path.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        ));
        return Ok(());
    }
    Config::default()
        .save(path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write config to {}: {}", path.display(), e))?;
    output.success(format!("Wrote default configuration to {}", path.display()));
    Ok(())
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("{}********", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "********");
        assert_eq!(mask_secret("AIzaSyExampleKey"), "AIza********");
    }

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let output = Output::new(crate::output::OutputFormat::Json, true);

        init_config(&path, false, &output).unwrap();
        assert_eq!(load_config(&path).unwrap(), Config::default());

        std::fs::write(&path, "[scrape]\nmax_pages = 7\n").unwrap();
        init_config(&path, false, &output).unwrap();
        assert_eq!(load_config(&path).unwrap().scrape.max_pages, 7);

        init_config(&path, true, &output).unwrap();
        assert_eq!(load_config(&path).unwrap().scrape.max_pages, Config::default().scrape.max_pages);
    }
}
