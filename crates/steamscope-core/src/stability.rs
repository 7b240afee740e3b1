//! Buggy-game classifier trained on per-game criticism features.
//!
//! Games are split into train and test sets with a seeded shuffle, the
//! training minority class is oversampled with SMOTE, and a random forest is
//! scored on the held-out games.

use crate::criticism::GameFeatures;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use smartcore::ensemble::random_forest_classifier::{RandomForestClassifier, RandomForestClassifierParameters};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::BTreeSet;
use steamscope_config::StabilityConfig;
use thiserror::Error;
use tracing::{debug, info};

pub const STABLE: i32 = 0;
pub const BUGGY: i32 = 1;

const BASE_FEATURES: [&str; 5] = [
    "review_count",
    "performance_ratio",
    "design_ratio",
    "content_ratio",
    "monetization_ratio",
];

type Tree = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

#[derive(Debug, Error)]
pub enum StabilityError {
    #[error("need at least {needed} games to train and evaluate, got {got}")]
    TooFewGames { needed: usize, got: usize },
    #[error("training split has only {0} games")]
    SingleClass(&'static str),
    #[error("model error: {0}")]
    Model(String),
}

/// Feature matrix with one row per game.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityDataset {
    pub feature_names: Vec<String>,
    pub games: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<i32>,
}

impl StabilityDataset {
    /// Genre is one-hot encoded with the first genre (sorted) dropped; a
    /// game without a genre gets all zeros.
    pub fn from_features(features: &[GameFeatures]) -> Self {
        let genres: Vec<&str> = features
            .iter()
            .filter_map(|f| f.genre.as_deref())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .skip(1)
            .collect();

        let mut feature_names: Vec<String> = BASE_FEATURES.iter().map(|s| s.to_string()).collect();
        feature_names.extend(genres.iter().map(|g| format!("genre_{}", g)));

        let rows = features
            .iter()
            .map(|f| {
                let mut row = vec![
                    f.review_count as f64,
                    f.performance_ratio,
                    f.design_ratio,
                    f.content_ratio,
                    f.monetization_ratio,
                ];
                row.extend(
                    genres
                        .iter()
                        .map(|g| if f.genre.as_deref() == Some(*g) { 1.0 } else { 0.0 }),
                );
                row
            })
            .collect();

        Self {
            feature_names,
            games: features.iter().map(|f| f.game_title.clone()).collect(),
            rows,
            labels: features.iter().map(|f| if f.buggy { BUGGY } else { STABLE }).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Shuffled `(train, test)` indices; the test side gets `ceil(n * test_fraction)`.
pub fn train_test_split(n: usize, test_fraction: f64, rng: &mut StdRng) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let train = indices.split_off(n_test.min(n));
    (train, indices)
}

/// Oversample the minority class until both classes are the same size.
///
/// Each synthetic row lies on the segment between a minority row and one of
/// its `k` nearest minority neighbours. Originals come first in the output.
pub fn smote(rows: &[Vec<f64>], labels: &[i32], k: usize, rng: &mut StdRng) -> (Vec<Vec<f64>>, Vec<i32>) {
    let mut out_rows = rows.to_vec();
    let mut out_labels = labels.to_vec();

    let buggy = labels.iter().filter(|&&l| l == BUGGY).count();
    let stable = labels.len() - buggy;
    let (minority_label, missing) = if buggy < stable {
        (BUGGY, stable - buggy)
    } else {
        (STABLE, buggy - stable)
    };
    let minority: Vec<&Vec<f64>> = rows
        .iter()
        .zip(labels)
        .filter(|(_, l)| **l == minority_label)
        .map(|(r, _)| r)
        .collect();
    if minority.is_empty() || missing == 0 {
        return (out_rows, out_labels);
    }

    let neighbours: Vec<Vec<usize>> = (0..minority.len())
        .map(|i| {
            let mut others: Vec<(usize, f64)> = (0..minority.len())
                .filter(|&j| j != i)
                .map(|j| (j, squared_distance(minority[i], minority[j])))
                .collect();
            others.sort_by(|a, b| a.1.total_cmp(&b.1));
            others.into_iter().take(k).map(|(j, _)| j).collect()
        })
        .collect();

    for _ in 0..missing {
        let i = rng.gen_range(0..minority.len());
        let base = minority[i];
        let synthetic = match neighbours[i].choose(rng) {
            Some(&j) => {
                let gap: f64 = rng.gen();
                base.iter()
                    .zip(minority[j])
                    .map(|(a, b)| a + gap * (b - a))
                    .collect()
            }
            None => base.clone(),
        };
        out_rows.push(synthetic);
        out_labels.push(minority_label);
    }
    debug!("SMOTE added {} synthetic rows of class {}", missing, minority_label);
    (out_rows, out_labels)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Random forest whose members are trained separately so that the share of
/// trees voting buggy serves as a probability.
pub struct StabilityForest {
    trees: Vec<Tree>,
}

impl StabilityForest {
    pub fn fit(rows: &[Vec<f64>], labels: &[i32], n_trees: usize, seed: u64) -> Result<Self, StabilityError> {
        let x = DenseMatrix::from_2d_vec(&rows.to_vec());
        let y = labels.to_vec();
        let trees = (0..n_trees.max(1))
            .map(|i| {
                let params = RandomForestClassifierParameters::default()
                    .with_n_trees(1)
                    .with_seed(seed.wrapping_add(i as u64));
                Tree::fit(&x, &y, params).map_err(|e| StabilityError::Model(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { trees })
    }

    /// Share of trees predicting buggy, per row.
    pub fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, StabilityError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = DenseMatrix::from_2d_vec(&rows.to_vec());
        let mut votes = vec![0usize; rows.len()];
        for tree in &self.trees {
            let predicted = tree.predict(&x).map_err(|e| StabilityError::Model(e.to_string()))?;
            for (vote, label) in votes.iter_mut().zip(predicted) {
                if label == BUGGY {
                    *vote += 1;
                }
            }
        }
        let n = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / n).collect())
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<i32>, StabilityError> {
        Ok(self
            .predict_proba(rows)?
            .into_iter()
            .map(|p| if p >= 0.5 { BUGGY } else { STABLE })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class: &'static str,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Precision, recall and F1 for one class; 0 where undefined.
pub fn class_metrics(class: &'static str, label: i32, truth: &[i32], predicted: &[i32]) -> ClassMetrics {
    let pairs = || truth.iter().zip(predicted);
    let tp = pairs().filter(|(t, p)| **t == label && **p == label).count() as f64;
    let predicted_pos = predicted.iter().filter(|&&p| p == label).count() as f64;
    let support = truth.iter().filter(|&&t| t == label).count();

    let precision = if predicted_pos > 0.0 { tp / predicted_pos } else { 0.0 };
    let recall = if support > 0 { tp / support as f64 } else { 0.0 };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        class,
        precision,
        recall,
        f1,
        support,
    }
}

/// Area under the ROC curve as the probability that a random buggy game
/// outscores a random stable one, ties counting half. `None` when either
/// class is absent.
pub fn roc_auc(truth: &[i32], scores: &[f64]) -> Option<f64> {
    let positives: Vec<f64> = truth.iter().zip(scores).filter(|(t, _)| **t == BUGGY).map(|(_, s)| *s).collect();
    let negatives: Vec<f64> = truth.iter().zip(scores).filter(|(t, _)| **t != BUGGY).map(|(_, s)| *s).collect();
    if positives.is_empty() || negatives.is_empty() {
        return None;
    }

    let mut wins = 0.0;
    for p in &positives {
        for n in &negatives {
            if p > n {
                wins += 1.0;
            } else if p == n {
                wins += 0.5;
            }
        }
    }
    Some(wins / (positives.len() * negatives.len()) as f64)
}

#[derive(Debug, Clone, Serialize)]
pub struct StabilityReport {
    pub games: usize,
    pub buggy_games: usize,
    pub features: Vec<String>,
    pub train_size: usize,
    pub test_size: usize,
    pub synthetic_samples: usize,
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub auc: Option<f64>,
}

/// Train on a seeded split and score the held-out games.
pub fn evaluate_stability(
    features: &[GameFeatures],
    config: &StabilityConfig,
) -> Result<StabilityReport, StabilityError> {
    let dataset = StabilityDataset::from_features(features);
    if dataset.len() < 3 {
        return Err(StabilityError::TooFewGames {
            needed: 3,
            got: dataset.len(),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (train, test) = train_test_split(dataset.len(), config.test_fraction, &mut rng);
    if train.len() < 2 || test.is_empty() {
        return Err(StabilityError::TooFewGames {
            needed: 3,
            got: dataset.len(),
        });
    }

    let pick_rows = |idx: &[usize]| idx.iter().map(|&i| dataset.rows[i].clone()).collect::<Vec<_>>();
    let pick_labels = |idx: &[usize]| idx.iter().map(|&i| dataset.labels[i]).collect::<Vec<_>>();
    let (train_rows, train_labels) = (pick_rows(&train), pick_labels(&train));
    let (test_rows, test_labels) = (pick_rows(&test), pick_labels(&test));

    if !train_labels.contains(&BUGGY) {
        return Err(StabilityError::SingleClass("stable"));
    }
    if !train_labels.contains(&STABLE) {
        return Err(StabilityError::SingleClass("buggy"));
    }

    let (resampled_rows, resampled_labels) = smote(&train_rows, &train_labels, config.smote_neighbors, &mut rng);
    let synthetic_samples = resampled_rows.len() - train_rows.len();

    let forest = StabilityForest::fit(&resampled_rows, &resampled_labels, config.n_trees, config.seed)?;
    let scores = forest.predict_proba(&test_rows)?;
    let predicted: Vec<i32> = scores.iter().map(|&p| if p >= 0.5 { BUGGY } else { STABLE }).collect();

    let correct = test_labels.iter().zip(&predicted).filter(|(t, p)| t == p).count();
    let report = StabilityReport {
        games: dataset.len(),
        buggy_games: dataset.labels.iter().filter(|&&l| l == BUGGY).count(),
        features: dataset.feature_names.clone(),
        train_size: train.len(),
        test_size: test.len(),
        synthetic_samples,
        classes: vec![
            class_metrics("stable", STABLE, &test_labels, &predicted),
            class_metrics("buggy", BUGGY, &test_labels, &predicted),
        ],
        accuracy: correct as f64 / test_labels.len() as f64,
        auc: roc_auc(&test_labels, &scores),
    };
    info!(
        "Stability classifier: {} train ({} synthetic), {} test, accuracy {:.3}",
        report.train_size, report.synthetic_samples, report.test_size, report.accuracy
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(title: &str, buggy: bool, genre: Option<&str>, jitter: f64) -> GameFeatures {
        let level = if buggy { 0.6 } else { 0.02 };
        GameFeatures {
            game_title: title.to_string(),
            review_count: if buggy { 80 } else { 10 },
            stability_sum: 0,
            performance_ratio: level + jitter,
            design_ratio: level,
            content_ratio: level - jitter,
            monetization_ratio: level / 2.0,
            stability_ratio: if buggy { 0.5 } else { 0.0 },
            buggy,
            genre: genre.map(str::to_string),
        }
    }

    fn separable(n_per_class: usize) -> Vec<GameFeatures> {
        (0..n_per_class)
            .flat_map(|i| {
                let jitter = i as f64 * 0.001;
                [
                    game(&format!("broken {}", i), true, None, jitter),
                    game(&format!("solid {}", i), false, None, jitter),
                ]
            })
            .collect()
    }

    #[test]
    fn test_dataset_one_hot_drops_first_genre() {
        let features = vec![
            game("a", true, Some("RPG"), 0.0),
            game("b", false, Some("Action"), 0.0),
            game("c", false, None, 0.0),
        ];
        let dataset = StabilityDataset::from_features(&features);

        assert_eq!(dataset.feature_names.len(), 6);
        assert_eq!(dataset.feature_names[5], "genre_RPG");
        assert_eq!(dataset.rows[0][5], 1.0);
        assert_eq!(dataset.rows[1][5], 0.0);
        assert_eq!(dataset.rows[2][5], 0.0);
        assert_eq!(dataset.labels, vec![BUGGY, STABLE, STABLE]);
        assert_eq!(dataset.rows[0][0], 80.0);
    }

    #[test]
    fn test_split_is_seeded_and_disjoint() {
        let (train, test) = train_test_split(10, 0.2, &mut StdRng::seed_from_u64(42));
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert!(test.iter().all(|i| !train.contains(i)));

        let again = train_test_split(10, 0.2, &mut StdRng::seed_from_u64(42));
        assert_eq!(again, (train, test));
    }

    #[test]
    fn test_smote_balances_between_minority_rows() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.2, 0.1],
            vec![0.0, 0.2],
            vec![0.1, 0.1],
            vec![1.0, 2.0],
            vec![3.0, 4.0],
        ];
        let labels = vec![STABLE, STABLE, STABLE, STABLE, STABLE, BUGGY, BUGGY];
        let (out_rows, out_labels) = smote(&rows, &labels, 5, &mut StdRng::seed_from_u64(7));

        assert_eq!(out_rows.len(), 10);
        assert_eq!(out_labels.iter().filter(|&&l| l == BUGGY).count(), 5);
        for synthetic in &out_rows[7..] {
            assert!((1.0..=3.0).contains(&synthetic[0]));
            assert!((2.0..=4.0).contains(&synthetic[1]));
            // On the segment between the two buggy rows
            assert!(((synthetic[1] - 2.0) - (synthetic[0] - 1.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_smote_single_minority_row_is_copied() {
        let rows = vec![vec![0.0], vec![0.1], vec![5.0]];
        let labels = vec![STABLE, STABLE, BUGGY];
        let (out_rows, _) = smote(&rows, &labels, 5, &mut StdRng::seed_from_u64(1));
        assert_eq!(out_rows[3], vec![5.0]);
    }

    #[test]
    fn test_roc_auc() {
        assert_eq!(roc_auc(&[BUGGY, STABLE, BUGGY, STABLE], &[0.9, 0.1, 0.8, 0.3]), Some(1.0));
        assert_eq!(roc_auc(&[BUGGY, STABLE], &[0.1, 0.9]), Some(0.0));
        assert_eq!(roc_auc(&[BUGGY, STABLE], &[0.5, 0.5]), Some(0.5));
        assert_eq!(roc_auc(&[STABLE, STABLE], &[0.5, 0.7]), None);
    }

    #[test]
    fn test_class_metrics() {
        let truth = [BUGGY, BUGGY, STABLE, STABLE];
        let predicted = [BUGGY, STABLE, BUGGY, STABLE];
        let buggy = class_metrics("buggy", BUGGY, &truth, &predicted);
        assert_eq!(buggy.precision, 0.5);
        assert_eq!(buggy.recall, 0.5);
        assert_eq!(buggy.f1, 0.5);
        assert_eq!(buggy.support, 2);
    }

    #[test]
    fn test_forest_separates_clear_classes() {
        let dataset = StabilityDataset::from_features(&separable(10));
        let forest = StabilityForest::fit(&dataset.rows, &dataset.labels, 15, 42).unwrap();

        let query_rows = vec![
            vec![80.0, 0.6, 0.6, 0.6, 0.3],
            vec![10.0, 0.02, 0.02, 0.02, 0.01],
        ];
        let scores = forest.predict_proba(&query_rows).unwrap();
        assert!(scores[0] > 0.5);
        assert!(scores[1] < 0.5);
        assert_eq!(forest.predict(&query_rows).unwrap(), vec![BUGGY, STABLE]);
    }

    #[test]
    fn test_evaluate_on_separable_games() {
        let config = StabilityConfig {
            n_trees: 15,
            ..Default::default()
        };
        let report = evaluate_stability(&separable(10), &config).unwrap();

        assert_eq!(report.games, 20);
        assert_eq!(report.buggy_games, 10);
        assert_eq!(report.test_size, 4);
        assert_eq!(report.train_size, 16);
        assert_eq!(report.accuracy, 1.0);
        assert!(report.auc.map_or(true, |auc| auc == 1.0));
        let support: usize = report.classes.iter().map(|c| c.support).sum();
        assert_eq!(support, 4);
    }

    #[test]
    fn test_too_few_games() {
        let err = evaluate_stability(&separable(1), &StabilityConfig::default()).unwrap_err();
        assert!(matches!(err, StabilityError::TooFewGames { got: 2, .. }));
    }

    #[test]
    fn test_single_class_training_split() {
        let features: Vec<GameFeatures> = (0..6).map(|i| game(&i.to_string(), false, None, 0.0)).collect();
        let err = evaluate_stability(&features, &StabilityConfig::default()).unwrap_err();
        assert!(matches!(err, StabilityError::SingleClass("stable")));
    }
}
