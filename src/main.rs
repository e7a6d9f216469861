//! `nafdeblur` CLI - Deblur a folder of images and save side-by-side comparisons.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nafdeblur::model::{OnnxDeblur, ValueRange};
use nafdeblur::{BatchProcessor, BatchReport, Config, Deblur, ErrorPolicy, NoPreview};

/// Deblur images with a NAFNet model.
#[derive(Parser, Debug)]
#[command(name = "nafdeblur")]
#[command(version, about, long_about = None)]
struct Args {
    /// Folder searched recursively for *.jpg and *.png images.
    #[arg(long, value_name = "DIR")]
    data_root: PathBuf,

    /// Path to the deblurring model.
    #[arg(long, default_value = "weights/nafnet_reds_64_fp8.mlmodel", value_name = "FILE")]
    model_path: PathBuf,

    /// Folder for the comparison images. Created if missing.
    #[arg(long, default_value = "results", value_name = "DIR")]
    save_root: PathBuf,

    /// Show each comparison in a window and wait for a key press.
    #[arg(long)]
    show_results: bool,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Pixel value range the model was exported with.
    #[arg(long, value_enum, default_value_t = ValueRangeArg::Unit)]
    value_range: ValueRangeArg,

    /// Keep going after an image fails instead of stopping the run.
    #[arg(long)]
    keep_going: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ValueRangeArg {
    /// Model works in 0..1.
    Unit,
    /// Model works in 0..255.
    Byte,
}

impl From<ValueRangeArg> for ValueRange {
    fn from(arg: ValueRangeArg) -> Self {
        match arg {
            ValueRangeArg::Unit => Self::Unit,
            ValueRangeArg::Byte => Self::Byte,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("nafdeblur={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&args) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            for (path, err) in &report.failed {
                tracing::error!("{}: {err}", path.display());
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<BatchReport> {
    if !args.data_root.is_dir() {
        anyhow::bail!("Input folder does not exist: {}", args.data_root.display());
    }

    let config = Config {
        save_root: args.save_root.clone(),
        output_quality: args.quality,
        on_error: if args.keep_going {
            ErrorPolicy::Skip
        } else {
            ErrorPolicy::Abort
        },
    };

    let model = OnnxDeblur::load(&args.model_path, args.value_range.into())
        .context("Failed to load model")?;

    if args.show_results {
        run_with_preview(config, model, &args.data_root)
    } else {
        run_batch(BatchProcessor::new(config, model, NoPreview)?, &args.data_root)
    }
}

#[cfg(feature = "preview")]
fn run_with_preview(config: Config, model: OnnxDeblur, data_root: &Path) -> Result<BatchReport> {
    let preview = nafdeblur::preview::WindowPreview;
    run_batch(BatchProcessor::new(config, model, preview)?, data_root)
}

#[cfg(not(feature = "preview"))]
fn run_with_preview(config: Config, model: OnnxDeblur, data_root: &Path) -> Result<BatchReport> {
    tracing::warn!("Built without the `preview` feature; --show-results is ignored");
    run_batch(BatchProcessor::new(config, model, NoPreview)?, data_root)
}

fn run_batch<D, V>(mut processor: BatchProcessor<D, V>, data_root: &Path) -> Result<BatchReport>
where
    D: Deblur,
    V: nafdeblur::Preview,
{
    let report = processor
        .run(data_root)
        .context("Failed to process images")?;

    println!(
        "Saved {} comparison(s) to {}",
        report.processed.len(),
        processor.config().save_root.display()
    );

    Ok(report)
}
