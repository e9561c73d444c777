use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use marguerite_core::{ModelStore, Orchestrator, PredictionOutcome, SampleTable};
use marguerite_io::{to_delimited, GraphReader, RecordReader, ResultAssembler, TranslatorClient};

use crate::config::FileConfig;
use crate::domain::{parse_domain, Domain};

mod config;
mod domain;

#[derive(Parser)]
#[command(name = "marguerite")]
#[command(about = "Condition estimation from tabular sensor and lab measurements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML config file supplying defaults for unset flags
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Train one classifier per target and emit test predictions with metrics
    Train {
        /// Path to the input JSON document
        #[arg(long)]
        input: PathBuf,

        /// Estimation domain: "herd-health" or "milk-quality"
        #[arg(long)]
        domain: String,

        /// Parse the input as a nested graph document instead of flat records
        #[arg(long, default_value_t = false)]
        graph: bool,

        /// Model artifact directory (default "models")
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Model artifact prefix (defaults to the domain's prefix)
        #[arg(long)]
        prefix: Option<String>,

        /// RNG seed for split and ensemble determinism (default 42)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of trees per target ensemble (default 100)
        #[arg(long)]
        n_trees: Option<usize>,

        /// Translation service URL; exchanges a delimited payload when set
        #[arg(long)]
        translator_url: Option<String>,

        /// Also write the exchange document to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Predict every target over all input rows using persisted models
    Predict {
        /// Path to the input JSON document
        #[arg(long)]
        input: PathBuf,

        /// Estimation domain: "herd-health" or "milk-quality"
        #[arg(long)]
        domain: String,

        /// Parse the input as a nested graph document instead of flat records
        #[arg(long, default_value_t = false)]
        graph: bool,

        /// Model artifact directory (default "models")
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Model artifact prefix (defaults to the domain's prefix)
        #[arg(long)]
        prefix: Option<String>,

        /// Translation service URL; exchanges a delimited payload when set
        #[arg(long)]
        translator_url: Option<String>,

        /// Also write the exchange document to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Read the input document into a table, choosing the adapter.
fn read_table(input: &Path, graph: bool, domain: Domain) -> Result<SampleTable> {
    if graph {
        if domain != Domain::HerdHealth {
            anyhow::bail!("graph-document input is only defined for the herd-health domain");
        }
        let text = std::fs::read_to_string(input)
            .with_context(|| format!("cannot read input file {}", input.display()))?;
        let table = GraphReader::herd_health()
            .read_str(&text)
            .context("failed to parse graph document")?;
        Ok(table)
    } else {
        let table = RecordReader::new()
            .read_path(input)
            .context("failed to parse input records")?;
        Ok(table)
    }
}

/// Print the exchange document and optionally persist it.
fn emit(document: &serde_json::Value, output: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(document)?;
    if let Some(path) = output {
        std::fs::write(path, &rendered)
            .with_context(|| format!("cannot write output file {}", path.display()))?;
        info!(path = %path.display(), "exchange document written");
    }
    println!("{rendered}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    match cli.command {
        Command::Train {
            input,
            domain,
            graph,
            model_dir,
            prefix,
            seed,
            n_trees,
            translator_url,
            output,
        } => {
            let domain = parse_domain(&domain)?;
            let seed = seed.or(file_config.training.seed).unwrap_or(42);
            let n_trees = n_trees.or(file_config.training.estimators).unwrap_or(100);
            let model_dir = model_dir
                .or(file_config.models.directory)
                .unwrap_or_else(|| PathBuf::from("models"));
            let prefix = prefix
                .or(file_config.models.prefix)
                .unwrap_or_else(|| domain.model_prefix().to_string());
            let translator_url = translator_url.or(file_config.exchange.translator_url);

            let table = read_table(&input, graph, domain)?;
            info!(n_rows = table.n_rows(), seed, n_trees, "input loaded");

            let store = ModelStore::new(&model_dir, prefix);
            let specs = domain.targets();
            let run = Orchestrator::new(seed, n_trees)
                .train(&table, &specs, &store)
                .context("training failed")?;

            let assembler = domain.assembler();
            let document = match translator_url {
                Some(url) => {
                    let rows = assembler.training_rows(&table, &run)?;
                    let payload = to_delimited(&rows)?;
                    TranslatorClient::new(url)
                        .translate(&payload)
                        .context("translation exchange failed")?
                }
                None => assembler.training_document(&table, &run)?,
            };
            emit(&document, output.as_deref())?;
        }

        Command::Predict {
            input,
            domain,
            graph,
            model_dir,
            prefix,
            translator_url,
            output,
        } => {
            let domain = parse_domain(&domain)?;
            let model_dir = model_dir
                .or(file_config.models.directory)
                .unwrap_or_else(|| PathBuf::from("models"));
            let prefix = prefix
                .or(file_config.models.prefix)
                .unwrap_or_else(|| domain.model_prefix().to_string());
            let translator_url = translator_url.or(file_config.exchange.translator_url);

            let table = read_table(&input, graph, domain)?;
            info!(n_rows = table.n_rows(), "input loaded");

            let store = ModelStore::new(&model_dir, prefix);
            let specs = domain.targets();
            // Seed and ensemble size are training-time knobs; prediction
            // only loads persisted models.
            let outcome = Orchestrator::new(0, 1)
                .predict(&table, &specs, &store)
                .context("prediction failed")?;

            let document = match outcome {
                PredictionOutcome::Unavailable(failure) => {
                    ResultAssembler::failure_document(&failure)
                }
                PredictionOutcome::Completed(run) => {
                    let assembler = domain.assembler();
                    match translator_url {
                        Some(url) => {
                            let rows = assembler.prediction_rows(&table, &run)?;
                            let payload = to_delimited(&rows)?;
                            TranslatorClient::new(url)
                                .translate(&payload)
                                .context("translation exchange failed")?
                        }
                        None => assembler.prediction_document(&table, &run)?,
                    }
                }
            };
            emit(&document, output.as_deref())?;
        }
    }

    Ok(())
}
