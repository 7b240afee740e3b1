use super::criticism::build_report;
use crate::output::{new_table, Output};
use color_eyre::Result;
use comfy_table::Cell;
use std::path::PathBuf;
use steamscope_config::Config;
use steamscope_core::evaluate_stability;

pub fn run_stability(
    reviews: Option<PathBuf>,
    catalog: Option<PathBuf>,
    seed: Option<u64>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let catalog = catalog.or_else(|| config.catalog.path.clone());
    if catalog.is_none() {
        output.warn("No catalog given; training without genre features");
    }
    let criticism = build_report(reviews, catalog, config)?;

    let mut settings = config.stability.clone();
    if let Some(seed) = seed {
        settings.seed = seed;
    }
    let report = evaluate_stability(&criticism.games, &settings)
        .map_err(|e| color_eyre::eyre::eyre!("Could not train the stability classifier: {}", e))?;

    let mut view = new_table(&["Class", "Precision", "Recall", "F1", "Support"]);
    for class in &report.classes {
        view.add_row(vec![
            Cell::new(class.class),
            Cell::new(format!("{:.2}", class.precision)),
            Cell::new(format!("{:.2}", class.recall)),
            Cell::new(format!("{:.2}", class.f1)),
            Cell::new(class.support),
        ]);
    }
    output.report(view, &report);

    output.info(format!(
        "{} games ({} buggy), {} features; trained on {} (+{} synthetic), tested on {}",
        report.games,
        report.buggy_games,
        report.features.len(),
        report.train_size,
        report.synthetic_samples,
        report.test_size
    ));
    match report.auc {
        Some(auc) => output.success(format!("Accuracy {:.3}, AUC {:.3}", report.accuracy, auc)),
        None => output.success(format!(
            "Accuracy {:.3}; AUC undefined (test split has one class)",
            report.accuracy
        )),
    }
    Ok(())
}
