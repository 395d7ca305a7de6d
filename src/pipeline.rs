//! Train, predict and inspect workflows

use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::data::{ensure_source, Dataset, SplitCache};
use crate::error::{FraudError, Result};
use crate::evaluation::{cross_validate, evaluate, BinaryMetrics};
use crate::export;
use crate::preprocessing::FeatureAssembler;
use crate::report::ConsoleReporter;
use crate::training::{CVResults, Prediction, Splitter, TrainEngine};

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Split files were reloaded rather than produced
    pub split_reused: bool,
    pub holdout: BinaryMetrics,
    pub cross_validation: CVResults,
    /// 0-based index of the persisted fold model
    pub best_fold: usize,
    pub model_path: PathBuf,
}

/// Predictions printed by [`run_prediction`]
#[derive(Debug, Clone)]
pub struct PredictionSummary {
    pub fraud: Vec<Prediction>,
    pub legit: Vec<Prediction>,
}

fn holdout_title(test_fraction: f64) -> String {
    let test = (test_fraction * 100.0).round() as u32;
    format!("Train Metrics ({}/{}) :", 100 - test.min(100), test)
}

fn load_source(config: &PipelineConfig) -> Result<Dataset> {
    let archive = config.archive_path();
    let path = ensure_source(&config.source_path(), archive.as_deref())?;
    config.loader().load_csv(path)
}

/// Load or split the data, fit and evaluate on the holdout split,
/// cross-validate, and persist the best fold model.
pub fn run_training<W: Write>(config: &PipelineConfig, reporter: &mut ConsoleReporter<W>) -> Result<TrainingSummary> {
    config.validate()?;
    let count = config.sample_count;
    let splitter = Splitter::new(config.seed);
    let cache = SplitCache::new(config.split_path(), config.loader());

    let split = cache.load_or_split(|| load_source(config), &splitter, config.test_fraction)?;
    if let Some(source) = &split.source {
        reporter.inspect_data("Source data", source, count)?;
    }
    reporter.inspect_data("Train data", &split.train, count)?;
    reporter.inspect_data("Test data", &split.test, count)?;

    let assembler = FeatureAssembler::new(&config.features)?;
    let engine = TrainEngine::from_config(assembler, config.normalization, &config.trainer)?;
    info!(trainer = engine.trainer_name(), folds = config.folds, "Training");

    let model = engine.fit(&split.train)?;
    let holdout = evaluate(&model, &split.test)?;
    reporter.metrics(&holdout_title(config.test_fraction), &holdout.metrics)?;

    let cv = cross_validate(&engine, &split.train, &splitter, config.folds)?;
    for fold in &cv.folds {
        reporter.metrics(
            &format!("Train Metrics Cross Validate [{}/{}]:", fold.index + 1, config.folds),
            &fold.evaluation.metrics,
        )?;
        reporter.inspect_scored(&fold.test, &fold.evaluation.predictions, count)?;
    }

    let summary = cv.summary();
    let best = cv
        .into_best()
        .ok_or_else(|| FraudError::TrainingError("cross-validation produced no usable fold".to_string()))?;

    let model_path = config.model_path();
    export::save(&best.model, &model_path)?;
    reporter.cv_summary(&summary, Some(best.index))?;
    reporter.line(&format!("Saved fold {} model to {}", best.index + 1, model_path.display()))?;
    reporter.flush()?;

    Ok(TrainingSummary {
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        split_reused: split.reused(),
        holdout: holdout.metrics,
        cross_validation: summary,
        best_fold: best.index,
        model_path,
    })
}

/// Score `count` fraud and `count` non-fraud rows of the train split with
/// the saved model. Returns `None` after a warning when an artifact is
/// missing.
pub fn run_prediction<W: Write>(
    config: &PipelineConfig,
    count: usize,
    reporter: &mut ConsoleReporter<W>,
) -> Result<Option<PredictionSummary>> {
    let model_path = config.model_path();
    let cache = SplitCache::new(config.split_path(), config.loader());

    if !model_path.is_file() || !cache.train_path().is_file() {
        warn!(model = %model_path.display(), split = %cache.dir().display(), "Missing training artifacts");
        reporter.warning(&format!(
            "{} or {} not found, run training first",
            model_path.display(),
            cache.train_path().display()
        ))?;
        reporter.flush()?;
        return Ok(None);
    }

    let model = export::load_for_features(&model_path, &config.features)?;
    let train = cache.load_train()?;
    info!(model = %model_path.display(), trainer = model.trainer(), rows = train.len(), "Scoring samples");

    reporter.inspect_data("Train data", &train, config.sample_count)?;
    reporter.header("Predictions for saved model:")?;
    reporter.section("Evaluate Data (should be predicted true):")?;
    let fraud = reporter.scored_rows(&model, &train.take_with_label(true, count))?;
    reporter.section("Evaluate Data (should be predicted false):")?;
    let legit = reporter.scored_rows(&model, &train.take_with_label(false, count))?;
    reporter.flush()?;

    Ok(Some(PredictionSummary { fraud, legit }))
}

/// Print `count` sample rows of each label from the source file
pub fn run_inspection<W: Write>(config: &PipelineConfig, count: usize, reporter: &mut ConsoleReporter<W>) -> Result<Dataset> {
    let source = load_source(config)?;
    info!(rows = source.len(), fraud = source.count_label(true), "Loaded source");
    reporter.inspect_data("Source data", &source, count)?;
    reporter.line(&format!(
        "{} rows, {} fraud, {} not fraud",
        source.len(),
        source.count_label(true),
        source.count_label(false)
    ))?;
    reporter.flush()?;
    Ok(source)
}
