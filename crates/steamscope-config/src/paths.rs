use anyhow::Result;
use std::path::PathBuf;

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("STEAMSCOPE_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    config_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("steamscope");
        Ok(Self::rooted_at(base_dir))
    }

    pub fn from_docker_env() -> Self {
        Self::rooted_at(container_base_path())
    }

    fn rooted_at(base: PathBuf) -> Self {
        Self {
            log_dir: base.join("logs"),
            config_dir: base,
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Target of a bare `--log-file`.
    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir.join("steamscope.log")
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base directory, so its presence means Docker
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }

        // Otherwise ~/.config/steamscope on Linux
        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_share_one_base() {
        let paths = PathManager::rooted_at(PathBuf::from("/srv/steamscope"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/steamscope/config.toml"));
        assert_eq!(paths.default_log_file(), PathBuf::from("/srv/steamscope/logs/steamscope.log"));
    }
}
