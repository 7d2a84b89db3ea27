use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use depthforest_image::ImagePool;
use depthforest_rf::{NumRange, RandomForest, TrainingParams};

/// File holding the effective training parameters next to the tree files.
const PARAMS_FILE: &str = "params.json";

#[derive(Parser)]
#[command(name = "depthforest")]
#[command(about = "Randomized decision forests for depth-image pixel labeling")]
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

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Training parameters given on the command line.
#[derive(Args, Debug, Clone)]
struct TrainArgs {
    /// Number of trees
    #[arg(long, default_value_t = 3)]
    trees: usize,

    /// Number of labels
    #[arg(long, default_value_t = 2)]
    labels: usize,

    /// Number of images in the image directory
    #[arg(long, default_value_t = 1)]
    images: usize,

    /// Directory holding {i}-depth.csv and {i}-labels.csv
    #[arg(long)]
    img_dir: Option<PathBuf>,

    /// Maximum tree depth (0 = single leaf)
    #[arg(long, default_value_t = 20)]
    max_depth: usize,

    /// Nodes with this many samples or fewer become leaves
    #[arg(long, default_value_t = 1)]
    min_samples: usize,

    /// Labeled pixels sampled per training image
    #[arg(long, default_value_t = 2000)]
    sample_pixels: usize,

    /// Images sampled per tree
    #[arg(long, default_value_t = 1)]
    train_images: usize,

    /// Offset pairs generated per node
    #[arg(long, default_value_t = 50)]
    offsets: usize,

    /// Thresholds generated per offset pair
    #[arg(long, default_value_t = 50)]
    thresholds: usize,

    /// Offset range, as "start,end"
    #[arg(long, default_value = "-150,150", value_parser = parse_range)]
    offset_range: NumRange,

    /// Threshold range, as "start,end"
    #[arg(long, default_value = "-1,1", value_parser = parse_range)]
    threshold_range: NumRange,

    /// Parallel batches per split search
    #[arg(long, default_value_t = 4)]
    search_workers: usize,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Train a forest and write one tree file per tree
    Train {
        /// JSON training parameters; replaces the parameter flags
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory receiving {i}-Tree.txt and params.json
        #[arg(long)]
        output_dir: PathBuf,

        #[command(flatten)]
        params: TrainArgs,
    },

    /// Load a forest and score it on labeled images
    Test {
        /// Directory holding the tree files
        #[arg(long)]
        forest_dir: PathBuf,

        /// Number of trees (defaults to the forest's params.json)
        #[arg(long)]
        trees: Option<usize>,

        /// Number of labels (defaults to the forest's params.json)
        #[arg(long)]
        labels: Option<usize>,

        /// Directory holding the test images
        #[arg(long)]
        img_dir: PathBuf,

        /// Number of test images, read as ids 0..images
        #[arg(long, default_value_t = 1)]
        images: usize,

        /// Print the confusion matrix of every image to stderr
        #[arg(long, default_value_t = false)]
        confusion: bool,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    output_dir: PathBuf,
    n_trees: usize,
    label_num: usize,
    trees: Vec<TreeOutput>,
}

#[derive(Serialize)]
struct TreeOutput {
    n_nodes: usize,
    n_leaves: usize,
    max_depth: usize,
}

#[derive(Serialize)]
struct TestOutput {
    n_trees: usize,
    n_images: usize,
    mean_accuracy: f64,
    images: Vec<ImageScore>,
}

#[derive(Serialize)]
struct ImageScore {
    image_id: usize,
    accuracy: f64,
    n_pixels: usize,
    labels: Vec<LabelScore>,
}

#[derive(Serialize)]
struct LabelScore {
    label: usize,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

fn parse_range(s: &str) -> Result<NumRange, String> {
    let (start, end) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"start,end\", got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid range bound {v:?}: {e}"))
    };
    Ok(NumRange::new(parse(start)?, parse(end)?))
}

fn build_params(args: &TrainArgs) -> Result<TrainingParams> {
    let mut params = TrainingParams::new(args.trees)?
        .with_label_num(args.labels)
        .with_img_num(args.images)
        .with_max_depth(args.max_depth)
        .with_min_sample_count(args.min_samples)
        .with_sample_pixel_num(args.sample_pixels)
        .with_train_img_num(args.train_images)
        .with_offset_num(args.offsets)
        .with_threshold_num(args.thresholds)
        .with_offset_range(args.offset_range)
        .with_threshold_range(args.threshold_range)
        .with_search_workers(args.search_workers)
        .with_seed(args.seed);
    if let Some(dir) = &args.img_dir {
        params = params.with_img_dir(dir);
    }
    Ok(params)
}

/// Tree and label counts from the flags, falling back to `params.json`.
fn forest_shape(
    forest_dir: &Path,
    trees: Option<usize>,
    labels: Option<usize>,
) -> Result<(usize, usize)> {
    if let (Some(trees), Some(labels)) = (trees, labels) {
        return Ok((trees, labels));
    }
    let params_path = forest_dir.join(PARAMS_FILE);
    if !params_path.exists() {
        bail!(
            "--trees and --labels are required when {} is missing",
            params_path.display()
        );
    }
    let params = TrainingParams::load_json(&params_path)
        .with_context(|| format!("failed to read {}", params_path.display()))?;
    Ok((
        trees.unwrap_or(params.tree_num()),
        labels.unwrap_or(params.label_num()),
    ))
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
        Command::Train {
            config,
            output_dir,
            params,
        } => {
            let params = match config {
                Some(path) => TrainingParams::load_json(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => build_params(&params)?,
            };

            let forest = RandomForest::train(&params).context("training failed")?;
            forest
                .write_forest(&output_dir)
                .context("failed to write forest")?;
            params
                .save_json(output_dir.join(PARAMS_FILE))
                .context("failed to write training parameters")?;

            let output = TrainOutput {
                output_dir,
                n_trees: forest.n_trees(),
                label_num: forest.label_num(),
                trees: forest
                    .tree_summaries()
                    .into_iter()
                    .map(|s| TreeOutput {
                        n_nodes: s.n_nodes,
                        n_leaves: s.n_leaves,
                        max_depth: s.max_depth,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Test {
            forest_dir,
            trees,
            labels,
            img_dir,
            images,
            confusion,
        } => {
            let (tree_num, label_num) = forest_shape(&forest_dir, trees, labels)?;
            let forest = RandomForest::load_forest(tree_num, label_num, &forest_dir)
                .context("failed to load forest")?;
            let pool = ImagePool::load(&img_dir, images).context("failed to load test images")?;

            let mut scores = Vec::with_capacity(pool.len());
            for (image_id, image) in pool.iter().enumerate() {
                let cm = forest
                    .evaluate_image(image)
                    .with_context(|| format!("failed to evaluate image {image_id}"))?;
                if confusion {
                    eprintln!("image {image_id}\n{cm}");
                }
                info!(image_id, accuracy = cm.accuracy(), "image scored");
                scores.push(ImageScore {
                    image_id,
                    accuracy: cm.accuracy(),
                    n_pixels: cm.total(),
                    labels: cm
                        .label_metrics()
                        .into_iter()
                        .map(|m| LabelScore {
                            label: m.label,
                            precision: m.precision,
                            recall: m.recall,
                            f1: m.f1,
                            support: m.support,
                        })
                        .collect(),
                });
            }

            let mean_accuracy =
                scores.iter().map(|s| s.accuracy).sum::<f64>() / scores.len() as f64;
            let output = TestOutput {
                n_trees: forest.n_trees(),
                n_images: scores.len(),
                mean_accuracy,
                images: scores,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
