//! Detect command - stamp and signature presence on a page image.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde_json::json;
use tracing::info;

use dealerscan_core::{ArtifactInspector, GroundTruth};

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Page image
    #[arg(required = true)]
    image: PathBuf,

    /// Detector model (ONNX), overrides the configured path
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Ground-truth boxes (JSON) to match detections against
    #[arg(short, long)]
    ground_truth: Option<PathBuf>,
}

pub async fn run(args: DetectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = super::config::load(config_path)?;
    if let Some(model) = args.model {
        config.detection.model_path = model;
    }

    if !args.image.exists() {
        anyhow::bail!("Image not found: {}", args.image.display());
    }

    let ground_truth = args
        .ground_truth
        .as_deref()
        .map(GroundTruth::from_file)
        .transpose()?;

    let image = image::open(&args.image)?;
    info!(
        "Loaded {} ({}x{})",
        args.image.display(),
        image.width(),
        image.height()
    );

    let inspector = ArtifactInspector::from_config(&config.detection);
    if !inspector.has_detector() {
        eprintln!(
            "{} No detector available at {}; reporting all artifacts absent",
            style("!").yellow(),
            config.detection.model_path.display()
        );
    }

    let detections = inspector.detections(&image);
    let report = inspector.report(&detections, ground_truth.as_ref());

    let output = json!({
        "detections": detections,
        "signature": report.signature,
        "stamp": report.stamp,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
