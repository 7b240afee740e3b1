use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

/// Bar over `total` games; hidden when not interactive, where the batch
/// progress is logged instead.
pub fn scrape_bar(total: u64, show: bool) -> ProgressBar {
    if !show || !is_interactive() {
        tracing::info!(
            operation = "ui_init",
            mode = "non_interactive",
            "Progress bars disabled, using structured logging"
        );
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
    pb.set_style(style);
    pb.set_message("Starting scrape...");
    pb
}
