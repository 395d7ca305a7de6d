//! card-fraud - entry point

use clap::Parser;
use card_fraud::cli::{cmd_inspect, cmd_predict, cmd_train, load_config, reporter, Cli, Commands, TrainArgs};

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Train { data_dir, config, trainer, folds, seed, test_fraction } => {
            let cfg = load_config(config.as_deref(), data_dir.as_deref())?;
            cmd_train(cfg, TrainArgs { trainer, folds, seed, test_fraction }, cli.no_color)
        }
        Commands::Predict { data_dir, config, count } => {
            let cfg = load_config(config.as_deref(), data_dir.as_deref())?;
            cmd_predict(cfg, count, cli.no_color)
        }
        Commands::Inspect { data_dir, config, count } => {
            let cfg = load_config(config.as_deref(), data_dir.as_deref())?;
            cmd_inspect(cfg, count, cli.no_color)
        }
    }
}

/// EXCEPTION block on stdout, or stderr when stdout itself is broken
fn report_failure(err: &anyhow::Error, no_color: bool) {
    let mut out = reporter(no_color);
    let written = out.exception(&format!("{:#}", err)).and_then(|_| out.flush());
    if let Err(write_err) = written {
        eprintln!("Error: {:#} (report output failed: {})", err, write_err);
    }
}

fn main() {
    // Logs go to stderr, reports to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "card_fraud=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let no_color = cli.no_color;
    if no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = run(cli) {
        report_failure(&err, no_color);
        std::process::exit(1);
    }
}
