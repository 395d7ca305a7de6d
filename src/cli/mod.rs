//! Command-line interface for training, prediction and data inspection.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::pipeline::{run_inspection, run_prediction, run_training};
use crate::report::ConsoleReporter;
use crate::training::{BoostedTreesConfig, LinearConfig, TrainerConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    println!("  {} {}...", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("  {} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<22} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "card-fraud")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Credit-card fraud detection: train, cross-validate and score a binary classifier")]
#[command(long_about = None)]
pub struct Cli {
    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TrainerKind {
    /// Gradient-boosted trees
    FastTree,
    /// Linear logistic classifier (alias: sdca)
    #[value(alias = "sdca")]
    Logistic,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split, train, cross-validate and save the best fold model
    Train {
        /// Working directory with Data/, SplitData/ and Models/
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// JSON pipeline configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Trainer to use (overrides the config file)
        #[arg(short, long, value_enum)]
        trainer: Option<TrainerKind>,

        /// Number of cross-validation folds
        #[arg(long)]
        folds: Option<usize>,

        /// Seed for splitting and fold assignment
        #[arg(long)]
        seed: Option<u64>,

        /// Share of rows held out for evaluation
        #[arg(long)]
        test_fraction: Option<f64>,
    },

    /// Score sample rows with the saved model
    Predict {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rows of each label to score
        #[arg(short = 'n', long, default_value = "4")]
        count: usize,
    },

    /// Show sample rows of the source data
    Inspect {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rows of each label to show
        #[arg(short = 'n', long, default_value = "2")]
        count: usize,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Defaults, then the config file, then explicit flags
pub fn load_config(config: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = data_dir {
        cfg.data_dir = dir.to_path_buf();
    }
    Ok(cfg)
}

fn trainer_for(kind: TrainerKind, current: &TrainerConfig) -> TrainerConfig {
    match (kind, current) {
        (TrainerKind::FastTree, TrainerConfig::FastTree(_)) | (TrainerKind::Logistic, TrainerConfig::Logistic(_)) => {
            current.clone()
        }
        (TrainerKind::FastTree, _) => TrainerConfig::FastTree(BoostedTreesConfig::default()),
        (TrainerKind::Logistic, _) => TrainerConfig::Logistic(LinearConfig::default()),
    }
}

/// Stdout reporter, colour off when `no_color` is set or stdout is not a terminal
pub fn reporter(no_color: bool) -> ConsoleReporter<std::io::Stdout> {
    let r = ConsoleReporter::stdout();
    if no_color {
        r.with_color(false)
    } else {
        r
    }
}

pub struct TrainArgs {
    pub trainer: Option<TrainerKind>,
    pub folds: Option<usize>,
    pub seed: Option<u64>,
    pub test_fraction: Option<f64>,
}

pub fn cmd_train(mut config: PipelineConfig, args: TrainArgs, no_color: bool) -> anyhow::Result<()> {
    if let Some(kind) = args.trainer {
        config.trainer = trainer_for(kind, &config.trainer);
    }
    if let Some(folds) = args.folds {
        config.folds = folds;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(fraction) = args.test_fraction {
        config.test_fraction = fraction;
    }
    config.validate()?;

    section("Train");
    step_run(&format!("Training {} with {}-fold cross-validation", config.trainer.name().cyan(), config.folds));
    let start = Instant::now();
    let mut out = reporter(no_color);
    let summary = run_training(&config, &mut out)?;
    step_done(&format!("{:?}", start.elapsed()));

    section("Summary");
    kv("Train / test rows", &format!("{} / {}", summary.train_rows, summary.test_rows));
    kv("Split", if summary.split_reused { "reused" } else { "new" });
    kv("Holdout accuracy", &format!("{:.4}", summary.holdout.accuracy));
    kv(
        "CV accuracy",
        &format!(
            "{:.4} ± {:.4}",
            summary.cross_validation.mean_score, summary.cross_validation.std_score
        ),
    );
    kv("Best fold", &(summary.best_fold + 1).to_string());
    kv("Model", &summary.model_path.display().to_string());
    println!();

    Ok(())
}

pub fn cmd_predict(config: PipelineConfig, count: usize, no_color: bool) -> anyhow::Result<()> {
    section("Predict");
    let mut out = reporter(no_color);
    if let Some(summary) = run_prediction(&config, count, &mut out)? {
        let correct = summary
            .fraud
            .iter()
            .chain(&summary.legit)
            .filter(|p| p.is_correct())
            .count();
        let total = summary.fraud.len() + summary.legit.len();
        println!();
        kv("Correct", &format!("{}/{}", correct, total));
    }
    Ok(())
}

pub fn cmd_inspect(config: PipelineConfig, count: usize, no_color: bool) -> anyhow::Result<()> {
    section("Inspect");
    step_run(&format!("Loading {}", config.source_path().display()));
    let start = Instant::now();
    let mut out = reporter(no_color);
    let data = run_inspection(&config, count, &mut out)?;
    step_done(&format!("{} rows in {:?}", data.len(), start.elapsed()));
    Ok(())
}
