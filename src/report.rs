//! Console report formatting
//!
//! `format_*` functions are pure and return plain text. [`ConsoleReporter`]
//! writes them to a sink, adding colour only when its flag is set.

use colored::{Color, Colorize};
use std::io::{self, IsTerminal, Stdout, Write};

use crate::data::{Dataset, Row};
use crate::error::{FraudError, Result};
use crate::evaluation::BinaryMetrics;
use crate::training::{CVResults, FraudModel, Prediction};

pub fn format_header(lines: &[&str]) -> String {
    underline(lines, '#')
}

pub fn format_section(lines: &[&str]) -> String {
    underline(lines, '-')
}

fn underline(lines: &[&str], mark: char) -> String {
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut out = String::from(" \n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.extend(std::iter::repeat(mark).take(width));
    out.push('\n');
    out
}

/// `Label: ..` and `Features: [0] .. [1] .. ... [28] ..`
pub fn format_row(row: &Row) -> String {
    let features = row
        .features()
        .iter()
        .enumerate()
        .map(|(i, v)| format!("[{}] {}", i, v))
        .collect::<Vec<_>>()
        .join(" ");
    format!("Label: {}\nFeatures: {}\n", row.label, features)
}

pub fn format_prediction(p: &Prediction) -> String {
    format!(
        "Predicted Label: {} [{}]\nProbability: {}  ({})\n",
        p.predicted_label, p.label, p.probability, p.score
    )
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "n/a".to_string())
}

pub fn format_metrics(m: &BinaryMetrics) -> String {
    let rows: [(&str, String); 12] = [
        ("Accuracy", format!("{:.4}", m.accuracy)),
        ("AUC", fmt_opt(m.auc)),
        ("F1 Score", format!("{:.4}", m.f1_score)),
        ("Positive Precision", format!("{:.4}", m.positive_precision)),
        ("Positive Recall", format!("{:.4}", m.positive_recall)),
        ("Negative Precision", format!("{:.4}", m.negative_precision)),
        ("Negative Recall", format!("{:.4}", m.negative_recall)),
        ("Log Loss", format!("{:.4}", m.log_loss)),
        ("Log Loss Reduction", format!("{:.4}", m.log_loss_reduction)),
        ("Entropy", format!("{:.4}", m.entropy)),
        (
            "Confusion",
            format!(
                "TP {} | FP {} | TN {} | FN {}",
                m.true_positives, m.false_positives, m.true_negatives, m.false_negatives
            ),
        ),
        ("Samples", m.n_samples.to_string()),
    ];
    rows.iter()
        .map(|(k, v)| format!("{:<20} {}\n", format!("{}:", k), v))
        .collect()
}

pub fn format_cv_summary(results: &CVResults, best: Option<usize>) -> String {
    let mut out = String::new();
    for (i, s) in results.scores.iter().enumerate() {
        let marker = if Some(i) == best { "  <- best" } else { "" };
        out.push_str(&format!("Fold {}/{}: accuracy {:.4}{}\n", i + 1, results.n_folds, s, marker));
    }
    out.push_str(&format!(
        "Mean accuracy: {:.4} (+/- {:.4})\n",
        results.mean_score, results.std_score
    ));
    out
}

/// Writes report blocks to a sink
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
}

impl ConsoleReporter<Stdout> {
    /// Stdout, coloured when it is a terminal
    pub fn stdout() -> Self {
        let out = io::stdout();
        let color = out.is_terminal();
        Self { out, color }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str, color: Option<Color>) -> Result<()> {
        match color {
            Some(c) if self.color => write!(self.out, "{}", text.color(c))?,
            _ => self.out.write_all(text.as_bytes())?,
        }
        Ok(())
    }

    pub fn header(&mut self, title: &str) -> Result<()> {
        self.emit(&format_header(&[title]), Some(Color::Yellow))
    }

    pub fn section(&mut self, title: &str) -> Result<()> {
        self.emit(&format_section(&[title]), Some(Color::Blue))
    }

    pub fn line(&mut self, text: &str) -> Result<()> {
        self.emit(text, None)?;
        self.emit("\n", None)
    }

    pub fn warning(&mut self, message: &str) -> Result<()> {
        self.emit(&format!("WARNING: {}\n", message), Some(Color::Yellow))
    }

    pub fn exception(&mut self, message: &str) -> Result<()> {
        self.emit(&format_header(&["EXCEPTION"]), Some(Color::Red))?;
        self.line(message)
    }

    /// First `count` rows carrying `label`
    pub fn rows(&mut self, dataset: &Dataset, label: bool, count: usize) -> Result<()> {
        for row in dataset.take_with_label(label, count) {
            self.emit(&format_row(row), None)?;
        }
        Ok(())
    }

    /// `count` fraud rows then `count` non-fraud rows
    pub fn inspect_data(&mut self, title: &str, dataset: &Dataset, count: usize) -> Result<()> {
        self.header(title)?;
        self.header(&format!("Show {}", count * 2))?;
        self.rows(dataset, true, count)?;
        self.rows(dataset, false, count)
    }

    /// Print each row with its prediction and return the predictions
    pub fn scored_rows(&mut self, model: &FraudModel, rows: &[&Row]) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::with_capacity(rows.len());
        for row in rows {
            let prediction = model.predict(row)?;
            self.emit(&format_row(row), None)?;
            self.emit(&format_prediction(&prediction), Some(prediction_color(&prediction)))?;
            predictions.push(prediction);
        }
        Ok(predictions)
    }

    /// `count` already-scored rows of each label. `predictions` must be
    /// aligned with the rows of `dataset`.
    pub fn inspect_scored(&mut self, dataset: &Dataset, predictions: &[Prediction], count: usize) -> Result<()> {
        if dataset.len() != predictions.len() {
            return Err(FraudError::ValidationError(format!(
                "{} predictions for {} rows",
                predictions.len(),
                dataset.len()
            )));
        }
        self.header(&format!("Show {}", count * 2))?;
        for label in [true, false] {
            let scored = dataset
                .iter()
                .zip(predictions)
                .filter(|(row, _)| row.label == label)
                .take(count);
            for (row, prediction) in scored {
                self.emit(&format_row(row), None)?;
                self.emit(&format_prediction(prediction), Some(prediction_color(prediction)))?;
            }
        }
        Ok(())
    }

    pub fn metrics(&mut self, title: &str, metrics: &BinaryMetrics) -> Result<()> {
        self.section(title)?;
        self.emit(&format_metrics(metrics), None)
    }

    pub fn cv_summary(&mut self, results: &CVResults, best: Option<usize>) -> Result<()> {
        self.header("Cross-validation summary")?;
        self.emit(&format_cv_summary(results, best), None)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

fn prediction_color(p: &Prediction) -> Color {
    if p.is_correct() {
        Color::Green
    } else {
        Color::Red
    }
}
