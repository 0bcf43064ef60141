//! Extract command - resolve fields from a single OCR token file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use dealerscan_core::models::config::ScanConfig;
use dealerscan_core::{
    ArtifactInspector, DealerRegistry, DealerStrategy, ExtractionReport, OcrPage,
    QuotationExtractor, Resolution,
};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// OCR token file (JSON page)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Dealer registry (JSON array of names)
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Dealer name strategy
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Page image, to also check for stamps and signatures
    #[arg(short, long)]
    image: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    /// Position, keyword, case and confidence heuristics
    Heuristic,
    /// Fuzzy match against the dealer registry
    Registry,
    /// Registry first, heuristics when it finds nothing
    RegistryWithFallback,
}

impl From<StrategyArg> for DealerStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Heuristic => DealerStrategy::Heuristic,
            StrategyArg::Registry => DealerStrategy::Registry,
            StrategyArg::RegistryWithFallback => DealerStrategy::RegistryWithFallback,
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::config::load(config_path)?;
    if let Some(strategy) = args.strategy {
        config.dealer.strategy = strategy.into();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let extractor = build_extractor(config, args.registry.as_ref())?;
    let page = OcrPage::from_file(&args.input)?;

    let report = match &args.image {
        Some(image_path) => {
            let image = image::open(image_path)?;
            let inspector = ArtifactInspector::from_config(&extractor.config().detection);
            extractor
                .with_inspector(inspector)
                .extract_with_image(&page, &image)?
        }
        None => extractor.extract(&page)?,
    };

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Build an extractor, with an explicit registry file taking precedence
/// over the configured one.
pub fn build_extractor(
    mut config: ScanConfig,
    registry: Option<&PathBuf>,
) -> anyhow::Result<QuotationExtractor> {
    if let Some(path) = registry {
        config.dealer.registry_path = None;
        let registry = DealerRegistry::from_file(path)?;
        return Ok(QuotationExtractor::new(config).with_registry(registry));
    }

    Ok(QuotationExtractor::from_config(config)?)
}

pub fn format_report(report: &ExtractionReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_csv(report: &ExtractionReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "dealer_name",
        "dealer_confidence",
        "dealer_reason",
        "model_name",
        "model_confidence",
        "model_reason",
        "horse_power",
        "horse_power_confidence",
        "horse_power_reason",
    ])?;

    wtr.write_record([
        report.dealer_name.value.clone().unwrap_or_default(),
        format!("{:.2}", report.dealer_name.confidence),
        report.dealer_name.reason.to_string(),
        report.model_name.value.clone().unwrap_or_default(),
        format!("{:.2}", report.model_name.confidence),
        report.model_name.reason.to_string(),
        report.horse_power.value.map(|hp| hp.to_string()).unwrap_or_default(),
        format!("{:.2}", report.horse_power.confidence),
        report.horse_power.reason.to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ExtractionReport) -> String {
    let mut output = String::new();

    output.push_str(&text_line("Dealer", &report.dealer_name));
    output.push_str(&text_line("Model", &report.model_name));
    output.push_str(&text_line("Horsepower", &report.horse_power));

    if let Some(artifacts) = &report.artifacts {
        output.push('\n');
        output.push_str(&format!(
            "Signature: {}\n",
            if artifacts.signature.present { "present" } else { "absent" }
        ));
        output.push_str(&format!(
            "Stamp:     {}\n",
            if artifacts.stamp.present { "present" } else { "absent" }
        ));
    }

    output.push('\n');
    output.push_str(&format!(
        "Layout: {} tokens, {} lines, {} blocks ({} table-like)\n",
        report.layout.tokens, report.layout.lines, report.layout.blocks, report.layout.table_blocks
    ));

    output
}

fn text_line<T: ToString>(label: &str, resolution: &Resolution<T>) -> String {
    let value = resolution
        .value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<11} {} ({:.2}, {})\n",
        format!("{}:", label),
        value,
        resolution.confidence,
        resolution.reason
    )
}
