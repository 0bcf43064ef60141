//! Vlm command - recover structured fields from a raw VLM response.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use dealerscan_core::{extract_json_text, parse_vlm_fields};

/// Arguments for the vlm command.
#[derive(Args)]
pub struct VlmArgs {
    /// Raw response text file
    #[arg(required = true)]
    input: PathBuf,
}

pub async fn run(args: VlmArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let raw = fs::read_to_string(&args.input)?;
    debug!("Extracted JSON: {:?}", extract_json_text(&raw));

    let Some(fields) = parse_vlm_fields(&raw) else {
        anyhow::bail!("No JSON object found in {}", args.input.display());
    };

    println!("{}", serde_json::to_string_pretty(&fields)?);

    Ok(())
}
