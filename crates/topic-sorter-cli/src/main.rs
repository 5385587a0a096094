mod commands;
mod logging;
mod progress;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use topic_sorter_core::associations::{FolderNameTerms, NoSynonyms, SynonymSource};
use topic_sorter_core::config::load_configuration_from;
use topic_sorter_core::{AppConfig, CancelToken, Outcome, SortEngine, SortReport};
use tracing::{info, warn};

fn main() -> Result<()> {
    dotenv().ok();

    let args = Cli::parse();
    let config = load_configuration_from(args.config.as_deref())
        .context("Error loading configuration")?;

    let _guard = logging::init_logger(&config);

    match args.command {
        Some(Commands::Sort { train }) => run_sort(config, train)?,
        Some(Commands::Associate { name_terms }) => run_associate(config, name_terms)?,
        Some(Commands::Train) => run_train(config)?,
        Some(Commands::Explain { filenames }) => run_explain(config, &filenames),
        Some(Commands::PrintConfig) => {
            let rendered = toml::to_string_pretty(&config).context("Error rendering configuration")?;
            println!("{}", rendered);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_sort(config: AppConfig, train: bool) -> Result<()> {
    let reporter = CliReporter::new();
    let cancel = CancelToken::new();
    let mut engine = SortEngine::new(config);
    engine.load_associations();

    if train {
        if let Outcome::Completed(examples) = engine.train_classifier(&reporter, &cancel)? {
            info!("Classifier trained on {} examples", examples);
        }
    } else {
        info!("Classifier not trained; model-based votes will fall back to General");
    }

    match engine.sort(&reporter, &cancel)? {
        Outcome::Completed(report) => print_sort_summary(&report),
        Outcome::Cancelled => warn!("Sort cancelled"),
    }
    Ok(())
}

fn print_sort_summary(report: &SortReport) {
    let log = &report.log;
    println!();
    info!(
        "{} files found, {} clusters scored in {}",
        report.files_found,
        report.clusters,
        format!("{:.2}s", report.duration.as_secs_f64()).green(),
    );
    info!(
        "{} sorted, {} unsorted, {} duplicates, {} errors",
        format!("{}", log.sorted.len()).green(),
        format!("{}", log.unsorted.len()).yellow(),
        format!("{}", log.duplicates.len()).cyan(),
        format!("{}", log.errors.len()).red(),
    );
    for entry in &log.errors {
        warn!("{}", entry.message());
    }
    info!("Run log written to {}", report.log_path.display());
}

fn run_associate(config: AppConfig, name_terms: bool) -> Result<()> {
    let reporter = CliReporter::new();
    let synonyms: &dyn SynonymSource = if name_terms {
        &FolderNameTerms
    } else {
        &NoSynonyms
    };
    let mut engine = SortEngine::new(config);
    match engine.refresh_associations(synonyms, &reporter, &CancelToken::new())? {
        Outcome::Completed(folders) => info!(
            "{} folders written to {}",
            format!("{}", folders).green(),
            engine.config().associations_file
        ),
        Outcome::Cancelled => warn!("Association update cancelled; file left untouched"),
    }
    Ok(())
}

fn run_train(config: AppConfig) -> Result<()> {
    let reporter = CliReporter::new();
    let mut engine = SortEngine::new(config);
    engine.load_associations();
    match engine.train_classifier(&reporter, &CancelToken::new())? {
        Outcome::Completed(examples) => info!(
            "Training set OK: classifier trained on {} examples (model not kept; use `sort --train` to sort with it)",
            format!("{}", examples).green()
        ),
        Outcome::Cancelled => warn!("Training cancelled"),
    }
    Ok(())
}

fn run_explain(config: AppConfig, filenames: &[String]) {
    let threshold = config.score_threshold;
    let mut engine = SortEngine::new(config);
    engine.load_associations();

    for filename in filenames {
        let explanation = engine.explain(filename);
        let votes = &explanation.votes;
        println!("{}", filename.bold());
        println!("  terms: {}", explanation.terms.join(" "));
        for (name, vote) in [
            ("rule", &votes.rule),
            ("hybrid", &votes.hybrid),
            ("model", &votes.model),
        ] {
            println!("  {:<7} {:>7.2}  {}", name, vote.raw_score, vote.destination);
        }
        let verdict = if explanation.would_sort {
            "would sort".green()
        } else {
            "would stay".yellow()
        };
        println!(
            "  -> {} via {} ({:.2} vs threshold {:.2}): {}",
            votes.outcome.destination.cyan(),
            votes.outcome.winning_strategy,
            votes.outcome.score,
            threshold,
            verdict
        );
        for step in &votes.outcome.rationale {
            println!("     {}", step.dimmed());
        }
    }
}
