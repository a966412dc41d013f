#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::doc_markdown,
    clippy::uninlined_format_args,
    clippy::match_same_arms,
    clippy::needless_pass_by_value
)]

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::Serialize;

use slic::{Session, SlicError, SlicParams, SlicResult};

/// SLIC superpixel tools
#[derive(Parser)]
#[command(name = "slic")]
#[command(about = "SLIC CLI tools - segment images into superpixels and inspect the result")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment an image and write the oversegmented and edges images
    Segment {
        /// Input image file
        input: PathBuf,
        /// Output path for the mean-color image
        #[arg(long)]
        oversegmented: Option<PathBuf>,
        /// Output path for the boundary overlay
        #[arg(long)]
        edges: Option<PathBuf>,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Segment an image and print statistics about the partition
    Info {
        /// Input image file
        input: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
        /// Output format (json, yaml, toml)
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
        /// Pretty print output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Print the effective segmentation parameters
    Params {
        #[command(flatten)]
        params: ParamArgs,
        /// Output format (json, yaml, toml)
        #[arg(short, long, default_value = "toml")]
        format: OutputFormat,
    },
}

/// Segmentation parameters; flags override values from `--config`
#[derive(ClapArgs)]
struct ParamArgs {
    /// Parameter file (.toml, .yaml, .json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Grid spacing in pixels
    #[arg(short, long)]
    spacing: Option<f32>,
    /// Spatial weight (m)
    #[arg(short = 'm', long)]
    spatial_weight: Option<f32>,
    /// Color weight (c)
    #[arg(short = 'c', long)]
    color_weight: Option<f32>,
    /// Maximum refinement iterations
    #[arg(short = 'n', long)]
    iterations: Option<u32>,
    /// Seed for boundary colors
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(ValueEnum, Clone)]
enum OutputFormat {
    Json,
    Yaml,
    Toml,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.quiet {
        log::LevelFilter::Error
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.quiet && args.verbose {
        warn!("Both --quiet and --verbose specified, using --quiet");
    }

    // Run command
    if let Err(e) = run(args) {
        error!("Command failed: {:#}", e);

        // Map to appropriate exit codes
        let exit_code = match e.downcast_ref::<SlicError>() {
            Some(err) if err.is_input_error() => 1,
            Some(SlicError::Image(_)) => 1,
            Some(SlicError::Io(_)) => 1,
            Some(SlicError::Config(_)) => 1,
            _ => 2,
        };

        process::exit(exit_code);
    }
}

fn run(args: Args) -> Result<()> {
    let quiet = args.quiet;
    match args.command {
        Commands::Segment {
            input,
            oversegmented,
            edges,
            params,
        } => cmd_segment(input, oversegmented, edges, params, quiet),
        Commands::Info {
            input,
            params,
            format,
            pretty,
        } => cmd_info(input, params, format, pretty, quiet),
        Commands::Params { params, format } => cmd_params(params, format),
    }
}

fn cmd_segment(
    input: PathBuf,
    oversegmented: Option<PathBuf>,
    edges: Option<PathBuf>,
    params: ParamArgs,
    quiet: bool,
) -> Result<()> {
    let params = resolve_params(&params)?;
    let oversegmented = oversegmented.unwrap_or_else(|| sibling_path(&input, "oversegmented"));
    let edges = edges.unwrap_or_else(|| sibling_path(&input, "edges"));

    let result = segment_file(&input, params, quiet)?;

    result.save(&oversegmented, &edges)?;
    info!("Oversegmented image: {}", oversegmented.display());
    info!("Edges image: {}", edges.display());
    info!(
        "{} clusters after {} iterations (converged: {})",
        result.stats.cluster_count, result.stats.iterations_run, result.stats.converged
    );

    Ok(())
}

fn cmd_info(
    input: PathBuf,
    params: ParamArgs,
    format: OutputFormat,
    pretty: bool,
    quiet: bool,
) -> Result<()> {
    let params = resolve_params(&params)?;
    let result = segment_file(&input, params, quiet)?;

    println!("{}", render(&result.stats, &format, pretty)?);
    Ok(())
}

fn cmd_params(params: ParamArgs, format: OutputFormat) -> Result<()> {
    let params = resolve_params(&params)?;
    params.validate()?;

    println!("{}", render(&params, &format, true)?);
    Ok(())
}

/// Load an image and segment it on a background task behind a spinner
fn segment_file(input: &Path, params: SlicParams, quiet: bool) -> Result<SlicResult> {
    info!("Loading {}", input.display());
    let image = image::open(input)
        .map_err(SlicError::from)
        .with_context(|| format!("Failed to open {}", input.display()))?
        .to_rgb8();
    info!("Loaded image: {}x{} pixels", image.width(), image.height());

    let runtime = tokio::runtime::Runtime::new()?;
    let session = Session::new();

    let spinner = if quiet { None } else { Some(create_spinner()) };

    let pending = {
        let _enter = runtime.enter();
        session.submit(image, params)?
    };
    let outcome = runtime.block_on(pending.wait());

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    Ok(outcome?)
}

fn resolve_params(args: &ParamArgs) -> Result<SlicParams> {
    let mut params = match &args.config {
        Some(path) => SlicParams::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SlicParams::default(),
    };

    if let Some(spacing) = args.spacing {
        params = params.with_spacing(spacing);
    }
    if let Some(weight) = args.spatial_weight {
        params = params.with_spatial_weight(weight);
    }
    if let Some(weight) = args.color_weight {
        params = params.with_color_weight(weight);
    }
    if let Some(iterations) = args.iterations {
        params = params.with_iterations(iterations);
    }
    if let Some(seed) = args.seed {
        params = params.with_seed(seed);
    }

    Ok(params)
}

fn render<T: Serialize>(value: &T, format: &OutputFormat, pretty: bool) -> Result<String> {
    let output = match format {
        OutputFormat::Json => {
            if pretty {
                serde_json::to_string_pretty(value)?
            } else {
                serde_json::to_string(value)?
            }
        }
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Toml => {
            if pretty {
                toml::to_string_pretty(value)?
            } else {
                toml::to_string(value)?
            }
        }
    };
    Ok(output)
}

/// `dir/photo.jpg` -> `dir/photo_<suffix>.png`
fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}_{suffix}.png"))
}

fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Processing, please wait");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
