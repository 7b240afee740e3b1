use clap::{ArgAction, Parser, Subcommand};
use commands::{config, criticism, genres, preprocess, scrape, select, serve, stability};
use std::path::PathBuf;
use steamscope_config::PathManager;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "steamscope")]
#[command(about = "Steamscope - Steam review scraping and indie market analysis")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to a daily-rotated file instead of stderr; without a
    /// value, to the default log directory
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1, require_equals = true)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape reviews for a set of games into a CSV or JSON file
    #[command(long_about = "Walk the paginated review feed of each game and keep reviews created inside the time window. Games come from --app-id (repeatable, APPID or APPID:Title) or are sampled from the catalog with the [selection] settings.")]
    Scrape {
        /// Game to scrape, as APPID or APPID:Title
        #[arg(long = "app-id", value_name = "APPID[:TITLE]")]
        app_ids: Vec<String>,

        /// Sample targets from this catalog CSV (defaults to [catalog].path)
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,

        /// Window start (RFC 3339 or YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: Option<String>,

        /// Window end (RFC 3339 or YYYY-MM-DD, exclusive; defaults to now)
        #[arg(long)]
        end: Option<String>,

        /// Maximum pages per game
        #[arg(long)]
        max_pages: Option<u32>,

        /// Output file (defaults to [scrape].output)
        #[arg(long = "out", short = 'o', value_name = "PATH")]
        out: Option<PathBuf>,

        /// Export format (defaults to the output file extension)
        #[arg(long, value_enum)]
        format: Option<scrape::FileFormat>,

        /// Keep every review, skipping the spam heuristic
        #[arg(long, action = ArgAction::SetTrue)]
        no_filter: bool,
    },
    /// Build the games data used by the analysis API from a store export
    Preprocess {
        /// Raw store export CSV
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Destination CSV (defaults to [server].games_data)
        #[arg(long = "out", short = 'o', value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Genre revenue and success-rate statistics from the catalog
    Genres {
        /// Catalog CSV (defaults to [catalog].path)
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,

        /// Number of genres to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the games the batch scraper would target
    Select {
        /// Catalog CSV (defaults to [catalog].path)
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,

        /// Random seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Criticism categories, stability ratios and frequent terms of scraped reviews
    Criticism {
        /// Scraped reviews CSV (defaults to [scrape].output)
        #[arg(long, value_name = "PATH")]
        reviews: Option<PathBuf>,

        /// Join genres from this catalog CSV
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,

        /// Number of games to list
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Train and evaluate the buggy-game classifier on criticism features
    Stability {
        /// Scraped reviews CSV (defaults to [scrape].output)
        #[arg(long, value_name = "PATH")]
        reviews: Option<PathBuf>,

        /// Catalog CSV for genre features (defaults to [catalog].path)
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,

        /// Seed for the split, oversampling and forest (overrides [stability].seed)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Serve the description analysis HTTP API
    #[command(long_about = "Start the analysis API. POST /analyze returns similar games, predicted tags, their recent reviews and a summary; GET /health reports readiness. The games data is loaded in the background and /analyze answers 503 until it is ready.")]
    Serve {
        /// Address to bind (defaults to [server].bind)
        #[arg(long)]
        bind: Option<String>,

        /// Games data path or URL (defaults to [server].games_data)
        #[arg(long, value_name = "PATH_OR_URL")]
        games_data: Option<String>,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a configuration file with every default filled in
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .map(|path| path.unwrap_or_else(|| PathManager::default().default_log_file()));
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let config_path = config::resolve_config_path(cli.config.clone());

    match cli.command {
        Commands::Scrape {
            app_ids,
            catalog,
            start,
            end,
            max_pages,
            out,
            format,
            no_filter,
        } => {
            let args = scrape::ScrapeArgs {
                app_ids,
                catalog,
                start,
                end,
                max_pages,
                out,
                format,
                no_filter,
            };
            scrape::run_scrape(args, config::load_config(&config_path)?, &output).await
        }
        Commands::Preprocess { input, out } => {
            preprocess::run_preprocess(input, out, &config::load_config(&config_path)?, &output)
        }
        Commands::Genres { catalog, limit } => {
            genres::run_genres(catalog, limit, &config::load_config(&config_path)?, &output)
        }
        Commands::Select { catalog, seed } => {
            select::run_select(catalog, seed, &config::load_config(&config_path)?, &output)
        }
        Commands::Criticism { reviews, catalog, limit } => {
            criticism::run_criticism(reviews, catalog, limit, &config::load_config(&config_path)?, &output)
        }
        Commands::Stability { reviews, catalog, seed } => {
            stability::run_stability(reviews, catalog, seed, &config::load_config(&config_path)?, &output)
        }
        Commands::Serve { bind, games_data } => {
            serve::run_serve(bind, games_data, config::load_config(&config_path)?, &output).await
        }
        Commands::Config { cmd } => config::run_config(cmd, &config_path, &output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_value_is_optional() {
        let cli = Cli::try_parse_from(["steamscope", "--log-file", "config", "path"]).unwrap();
        assert_eq!(cli.log_file, Some(None));
        assert!(matches!(cli.command, Commands::Config { cmd: ConfigCommands::Path }));

        let cli = Cli::try_parse_from(["steamscope", "--log-file=/tmp/scrape.log", "config", "path"]).unwrap();
        assert_eq!(cli.log_file, Some(Some(PathBuf::from("/tmp/scrape.log"))));

        let cli = Cli::try_parse_from(["steamscope", "config", "path"]).unwrap();
        assert_eq!(cli.log_file, None);
    }
}
