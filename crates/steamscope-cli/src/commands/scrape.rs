use super::ui::scrape_bar;
use super::{catalog_path, load_catalog};
use crate::output::{new_table, Output};
use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use color_eyre::Result;
use comfy_table::Cell;
use std::path::PathBuf;
use steamscope_config::{Config, ScrapeConfig};
use steamscope_core::catalog::select_targets;
use steamscope_core::filter::AcceptAll;
use steamscope_core::{
    export_reviews, quality_predicate, scrape_batch, CatalogCleaner, ExportFormat, ReviewPredicate, ScrapeTarget,
    SessionOptions,
};
use steamscope_models::TimeWindow;
use steamscope_sources::SteamReviewsClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    Csv,
    Json,
}

impl From<FileFormat> for ExportFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Csv => ExportFormat::Csv,
            FileFormat::Json => ExportFormat::Json,
        }
    }
}

pub struct ScrapeArgs {
    pub app_ids: Vec<String>,
    pub catalog: Option<PathBuf>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub max_pages: Option<u32>,
    pub out: Option<PathBuf>,
    pub format: Option<FileFormat>,
    pub no_filter: bool,
}

pub async fn run_scrape(args: ScrapeArgs, config: Config, output: &Output) -> Result<()> {
    tracing::debug!("Scrape command started");

    let window = resolve_window(args.start.as_deref(), args.end.as_deref(), &config.scrape, Utc::now())?;
    let targets = resolve_targets(&args, &config)?;
    if targets.is_empty() {
        output.warn("No games to scrape");
        return Ok(());
    }

    let mut scrape_config = config.scrape.clone();
    if let Some(max_pages) = args.max_pages {
        scrape_config.max_pages = max_pages;
    }
    let options = SessionOptions::batch(&scrape_config, window);

    let source = SteamReviewsClient::new(&config.http)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create HTTP client: {}", e))?;
    let predicate: Box<dyn ReviewPredicate> = if args.no_filter {
        Box::new(AcceptAll)
    } else {
        Box::new(
            quality_predicate(&config.quality_filter)
                .map_err(|e| color_eyre::eyre::eyre!("Invalid quality filter settings: {}", e))?,
        )
    };

    output.info(format!(
        "Scraping {} games, window [{}, {})",
        targets.len(),
        format_timestamp(window.start),
        format_timestamp(window.end)
    ));

    let pb = scrape_bar(targets.len() as u64, output.is_human());
    let result = scrape_batch(&source, predicate.as_ref(), &targets, &options, |_, report| {
        pb.set_message(format!("{} ({} reviews)", report.title, report.reviews));
        pb.inc(1);
    })
    .await;
    pb.finish_and_clear();

    let path = args.out.unwrap_or_else(|| config.scrape.output.clone());
    let format = args.format.map(ExportFormat::from).unwrap_or_else(|| ExportFormat::from_path(&path));
    export_reviews(&path, &result.reviews, format)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to export reviews: {}", e))?;

    let mut table = new_table(&["AppID", "Game", "Reviews", "Pages", "Stopped"]);
    for app in &result.apps {
        let stopped = match &app.error {
            Some(e) => format!("{}: {}", app.termination, e),
            None => app.termination.to_string(),
        };
        table.add_row(vec![
            Cell::new(app.appid),
            Cell::new(&app.title),
            Cell::new(app.reviews),
            Cell::new(app.pages),
            Cell::new(stopped),
        ]);
    }
    output.report(table, &result.apps);

    if result.failed_apps() > 0 {
        output.warn(format!("{} of {} games ended with an error", result.failed_apps(), result.apps.len()));
    }
    output.success(format!("Exported {} reviews to {}", result.reviews.len(), path.display()));
    Ok(())
}

fn resolve_targets(args: &ScrapeArgs, config: &Config) -> Result<Vec<ScrapeTarget>> {
    if !args.app_ids.is_empty() {
        return args
            .app_ids
            .iter()
            .map(|spec| ScrapeTarget::parse(spec).map_err(color_eyre::eyre::Report::from))
            .collect();
    }

    let path = catalog_path(args.catalog.clone(), config)?;
    let table = load_catalog(&path)?;
    let games = CatalogCleaner::new(config.catalog.clone())
        .games(&table)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to clean catalog: {}", e))?;
    Ok(select_targets(&games, &config.selection))
}

/// RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| color_eyre::eyre::eyre!("Invalid time '{}': expected RFC 3339 or YYYY-MM-DD", value))
}

/// Arguments override the config; a missing start is unbounded and a
/// missing end is `now`.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    config: &ScrapeConfig,
    now: DateTime<Utc>,
) -> Result<TimeWindow> {
    let start = match start {
        Some(s) => Some(parse_time(s)?),
        None => config.start,
    };
    let end = match end {
        Some(s) => parse_time(s)?,
        None => config.end.unwrap_or(now),
    };

    let start_ts = start.map(|s| s.timestamp()).unwrap_or(i64::MIN);
    let end_ts = end.timestamp();
    if start_ts >= end_ts {
        return Err(color_eyre::eyre::eyre!(
            "Window start must be before its end ({} >= {})",
            format_timestamp(start_ts),
            end
        ));
    }
    Ok(TimeWindow::new(start_ts, end_ts))
}

fn format_timestamp(ts: i64) -> String {
    match ts {
        i64::MIN => "-inf".to_string(),
        i64::MAX => "+inf".to_string(),
        _ => DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| ts.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_time_formats() {
        let date = parse_time("2024-01-01").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let rfc = parse_time("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(rfc, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn test_window_defaults_to_config_start_and_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let window = resolve_window(None, None, &ScrapeConfig::default(), now).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp());
        assert_eq!(window.end, now.timestamp());
    }

    #[test]
    fn test_window_arguments_override_config() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let config = ScrapeConfig {
            start: None,
            ..Default::default()
        };
        let open = resolve_window(None, Some("2025-01-01"), &config, now).unwrap();
        assert_eq!(open.start, i64::MIN);

        let err = resolve_window(Some("2025-02-01"), Some("2025-01-01"), &config, now);
        assert!(err.is_err());
    }

    #[test]
    fn test_explicit_app_ids_skip_catalog() {
        let args = ScrapeArgs {
            app_ids: vec!["1245620:ELDEN RING".to_string(), "413150".to_string()],
            catalog: None,
            start: None,
            end: None,
            max_pages: None,
            out: None,
            format: None,
            no_filter: false,
        };
        let targets = resolve_targets(&args, &Config::default()).unwrap();
        assert_eq!(targets, vec![ScrapeTarget::new(1245620, "ELDEN RING"), ScrapeTarget::new(413150, "413150")]);
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        let args = ScrapeArgs {
            app_ids: vec![],
            catalog: None,
            start: None,
            end: None,
            max_pages: None,
            out: None,
            format: None,
            no_filter: false,
        };
        assert!(resolve_targets(&args, &Config::default()).is_err());
    }
}
