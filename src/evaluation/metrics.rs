//! Binary classification metrics

use serde::{Deserialize, Serialize};

use crate::error::{FraudError, Result};
use crate::training::Prediction;

const PROB_EPSILON: f64 = 1e-15;

/// Metrics over a scored test set. Log-based values are in bits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    /// Area under the ROC curve; `None` when only one class is present
    pub auc: Option<f64>,
    pub f1_score: f64,
    pub positive_precision: f64,
    pub positive_recall: f64,
    pub negative_precision: f64,
    pub negative_recall: f64,
    pub log_loss: f64,
    /// Relative improvement of log-loss over the prior entropy
    pub log_loss_reduction: f64,
    /// Entropy of the test-set label distribution
    pub entropy: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub n_samples: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl BinaryMetrics {
    pub fn compute(predictions: &[Prediction]) -> Result<Self> {
        if predictions.is_empty() {
            return Err(FraudError::ValidationError(
                "cannot compute metrics without predictions".to_string(),
            ));
        }

        let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
        for p in predictions {
            match (p.label, p.predicted_label) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fn_ += 1,
            }
        }
        let n = predictions.len();

        let positive_precision = ratio(tp, tp + fp);
        let positive_recall = ratio(tp, tp + fn_);
        let f1_score = if positive_precision + positive_recall > 0.0 {
            2.0 * positive_precision * positive_recall / (positive_precision + positive_recall)
        } else {
            0.0
        };

        let log_loss = predictions
            .iter()
            .map(|p| {
                let prob = p.probability.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
                if p.label {
                    -prob.log2()
                } else {
                    -(1.0 - prob).log2()
                }
            })
            .sum::<f64>()
            / n as f64;

        let entropy = binary_entropy(ratio(tp + fn_, n));
        let log_loss_reduction = if entropy > 0.0 { (entropy - log_loss) / entropy } else { 0.0 };

        Ok(Self {
            accuracy: ratio(tp + tn, n),
            auc: auc(predictions),
            f1_score,
            positive_precision,
            positive_recall,
            negative_precision: ratio(tn, tn + fn_),
            negative_recall: ratio(tn, tn + fp),
            log_loss,
            log_loss_reduction,
            entropy,
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
            n_samples: n,
        })
    }
}

fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
}

/// Rank-based AUC (Mann-Whitney U); tied scores share their average rank
pub fn auc(predictions: &[Prediction]) -> Option<f64> {
    let n_pos = predictions.iter().filter(|p| p.label).count();
    let n_neg = predictions.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..predictions.len()).collect();
    order.sort_by(|&a, &b| predictions[a].score.total_cmp(&predictions[b].score));

    let mut pos_rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && predictions[order[j + 1]].score == predictions[order[i]].score {
            j += 1;
        }
        // 1-based ranks i+1..=j+1
        let avg_rank = (i + j + 2) as f64 / 2.0;
        for &idx in &order[i..=j] {
            if predictions[idx].label {
                pos_rank_sum += avg_rank;
            }
        }
        i = j + 1;
    }

    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos * n_neg) as f64)
}
