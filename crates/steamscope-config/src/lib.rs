pub mod config;
pub mod paths;

pub use config::{
    CatalogConfig, Config, ConfigError, CriticismConfig, HttpConfig, PreprocessConfig,
    QualityFilterConfig, ReviewOrder, ScrapeConfig, SelectionConfig, ServerConfig,
    StabilityConfig, SummarizerConfig, default_criticism_categories,
};
pub use paths::{PathManager, container_base_path};
