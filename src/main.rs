use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use tracing::info;

use sylva_forest::{
    ForestConfig, HoldoutSplit, MaxFeatures, OobMode, RandomForest, Votes, evaluate,
};
use sylva_io::{DatasetReader, ExperimentName, PredictedRecord, ResultWriter};

#[derive(Parser)]
#[command(name = "sylva")]
#[command(about = "ID3 decision trees and random forests over categorical CSV data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Split a labelled CSV into train/test, train a forest, and report holdout accuracy
    Evaluate {
        /// Path to the input CSV file (last column is the class label)
        #[arg(long)]
        data: PathBuf,

        /// Fraction of records used for training
        #[arg(long, default_value_t = 0.7)]
        train_fraction: f64,

        /// Shuffle records (seeded) before splitting instead of keeping file order
        #[arg(long, default_value_t = false)]
        shuffle: bool,

        /// Number of trees in the forest
        #[arg(long, default_value_t = 3)]
        n_trees: usize,

        /// Attributes sampled per tree: "sqrt", "log2", "all", a count, or a fraction in (0, 1)
        #[arg(long, default_value = "sqrt")]
        max_features: String,

        /// Bootstrap sample size relative to the training set
        #[arg(long, default_value_t = 1.0)]
        bootstrap_fraction: f64,

        /// Compute out-of-bag accuracy on the training set
        #[arg(long, default_value_t = false)]
        oob: bool,

        /// The input file has no header row
        #[arg(long, default_value_t = false)]
        no_headers: bool,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Classify the rows of a CSV with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the CSV file (attribute columns, optionally followed by a label)
        #[arg(long)]
        data: PathBuf,

        /// Number of top-voted labels to output per row
        #[arg(long, default_value_t = 3)]
        top_k: usize,

        /// The input file has no header row
        #[arg(long, default_value_t = false)]
        no_headers: bool,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    n_train: usize,
    n_test: usize,
    n_trees: usize,
    max_features: usize,
    accuracy: f64,
    n_correct: usize,
    oob_accuracy: Option<f64>,
    model_path: PathBuf,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_records: usize,
    n_labelled: usize,
    model_n_trees: usize,
    model_n_attributes: usize,
}

fn parse_max_features(s: &str) -> Result<MaxFeatures> {
    match s {
        "sqrt" => Ok(MaxFeatures::Sqrt),
        "log2" => Ok(MaxFeatures::Log2),
        "all" => Ok(MaxFeatures::All),
        other if other.contains('.') => {
            let fraction: f64 = other
                .parse()
                .with_context(|| format!("invalid max-features fraction: {other}"))?;
            Ok(MaxFeatures::Fraction(fraction))
        }
        other => match other.parse::<usize>() {
            Ok(n) => Ok(MaxFeatures::Fixed(n)),
            Err(_) => anyhow::bail!(
                "unknown max-features: {other} (expected sqrt, log2, all, a count, or a fraction)"
            ),
        },
    }
}

fn predicted_record(
    record_index: usize,
    votes: &Votes,
    actual: Option<&str>,
    top_k: usize,
) -> PredictedRecord {
    let predicted = votes.winner().to_string();
    PredictedRecord {
        record_index,
        confidence: Some(votes.fraction(&predicted)),
        predicted,
        actual: actual.map(str::to_string),
        top_votes: votes
            .top_k(top_k)
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect(),
    }
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

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Evaluate {
            data,
            train_fraction,
            shuffle,
            n_trees,
            max_features,
            bootstrap_fraction,
            oob,
            no_headers,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Read CSV
            let table = DatasetReader::new(&data)
                .with_headers(!no_headers)
                .read()
                .context("failed to read input CSV")?;

            // 2. Split
            let mut holdout = HoldoutSplit::new(train_fraction)?;
            if shuffle {
                holdout = holdout.with_shuffle(cli.seed);
            }
            let (train, test) = holdout
                .split(table.dataset())
                .context("failed to split dataset")?;
            info!(n_train = train.len(), n_test = test.len(), "dataset split");

            // 3. Train
            let oob_mode = if oob { OobMode::Enabled } else { OobMode::Disabled };
            let config = ForestConfig::new(n_trees)?
                .with_max_features(parse_max_features(&max_features)?)
                .with_bootstrap_fraction(bootstrap_fraction)
                .with_seed(cli.seed)
                .with_oob_mode(oob_mode);
            let result = config
                .fit(&train, table.attribute_names())
                .context("forest training failed")?;

            // 4. Evaluate on the held-out partition
            let evaluation = evaluate(result.forest(), &test)
                .context("holdout evaluation failed (is the test partition empty?)")?;

            // 5. Save model and write JSON artifacts
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let model_path = writer.model_path();
            result
                .forest()
                .save(&model_path)
                .context("failed to save model")?;
            writer.write_evaluation(&result, &evaluation)?;
            let records: Vec<PredictedRecord> = evaluation
                .predictions
                .iter()
                .map(PredictedRecord::from)
                .collect();
            writer.write_predictions(&records)?;

            // 6. Print summary
            let output = EvaluateOutput {
                experiment,
                n_train: train.len(),
                n_test: test.len(),
                n_trees,
                max_features: result.metadata().max_features_resolved,
                accuracy: evaluation.accuracy,
                n_correct: evaluation.n_correct,
                oob_accuracy: result.oob_score().map(|s| s.accuracy),
                model_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            top_k,
            no_headers,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model
            let forest = RandomForest::load(&model).context("failed to load model")?;
            let n_attributes = forest.n_attributes();
            info!(n_trees = forest.n_trees(), n_attributes, "model loaded");

            // 2. Read rows
            let table = DatasetReader::new(&data)
                .with_headers(!no_headers)
                .read()
                .context("failed to read input CSV")?;
            let records = table.dataset().records();

            // Rows carry either the attributes alone or the attributes plus a label.
            let width = table.column_names().len();
            let labelled = if width == n_attributes {
                false
            } else if width == n_attributes + 1 {
                true
            } else {
                anyhow::bail!(
                    "input has {width} columns, model expects {n_attributes} attributes (optionally plus a label)"
                );
            };

            // 3. Classify
            let votes: Result<Vec<Votes>, _> = if labelled {
                forest.votes_batch(records)
            } else {
                records
                    .par_iter()
                    .map(|record| forest.votes(record.fields()))
                    .collect()
            };
            let votes = votes.context("prediction failed")?;

            let predictions: Vec<PredictedRecord> = votes
                .iter()
                .zip(records)
                .enumerate()
                .map(|(i, (v, record))| {
                    predicted_record(i, v, labelled.then(|| record.label()), top_k)
                })
                .collect();

            // 4. Write predictions JSON
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions(&predictions)?;

            // 5. Print summary
            let output = PredictOutput {
                experiment,
                n_records: predictions.len(),
                n_labelled: if labelled { predictions.len() } else { 0 },
                model_n_trees: forest.n_trees(),
                model_n_attributes: n_attributes,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
