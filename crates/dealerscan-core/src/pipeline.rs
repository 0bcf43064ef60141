//! Document-level entry point: OCR page in, resolved fields out.

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::detection::{ArtifactInspector, ArtifactReport};
use crate::layout::PageLayout;
use crate::models::config::ScanConfig;
use crate::models::document::OcrPage;
use crate::models::result::Resolution;
use crate::resolvers::{
    DealerRegistry, DealerResolver, FieldResolver, HorsepowerResolver, ModelNameResolver,
};
use crate::Result;

/// Size of the analyzed layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutSummary {
    pub tokens: usize,
    pub lines: usize,
    pub blocks: usize,
    pub table_blocks: usize,
}

impl LayoutSummary {
    fn of(layout: &PageLayout) -> Self {
        Self {
            tokens: layout.token_count(),
            lines: layout.line_count(),
            blocks: layout.blocks.len(),
            table_blocks: layout.blocks.iter().filter(|b| b.is_table_like()).count(),
        }
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub dealer_name: Resolution<String>,
    pub model_name: Resolution<String>,
    pub horse_power: Resolution<u32>,
    /// Stamp/signature presence, when an image was inspected.
    pub artifacts: Option<ArtifactReport>,
    pub layout: LayoutSummary,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionReport {
    /// JSON rendering with each field in `{field: value, confidence, reason}` form.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (field, keyed) in [
            (DealerResolver::FIELD, self.dealer_name.keyed(DealerResolver::FIELD)),
            (ModelNameResolver::FIELD, self.model_name.keyed(ModelNameResolver::FIELD)),
            (HorsepowerResolver::FIELD, self.horse_power.keyed(HorsepowerResolver::FIELD)),
        ] {
            map.insert(field.to_string(), keyed);
        }
        map.insert("layout".to_string(), json!(self.layout));
        map.insert("processing_time_ms".to_string(), json!(self.processing_time_ms));

        if let Some(artifacts) = &self.artifacts {
            map.insert("artifacts".to_string(), json!(artifacts));
        }

        Value::Object(map)
    }

    /// Number of resolved text fields.
    pub fn resolved_fields(&self) -> usize {
        [
            self.dealer_name.is_resolved(),
            self.model_name.is_resolved(),
            self.horse_power.is_resolved(),
        ]
        .iter()
        .filter(|r| **r)
        .count()
    }
}

impl Serialize for ExtractionReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Quotation field extractor.
///
/// Immutable once built, so one instance can serve many documents
/// concurrently.
pub struct QuotationExtractor {
    config: ScanConfig,
    dealer: DealerResolver,
    model: ModelNameResolver,
    horsepower: HorsepowerResolver,
    inspector: Option<ArtifactInspector>,
}

impl QuotationExtractor {
    /// Create an extractor. No registry is loaded; see [`Self::from_config`].
    pub fn new(config: ScanConfig) -> Self {
        Self {
            dealer: DealerResolver::new(config.dealer.clone()),
            model: ModelNameResolver::new(config.model.clone()),
            horsepower: HorsepowerResolver::new(config.horsepower.clone()),
            inspector: None,
            config,
        }
    }

    /// Create an extractor, loading the dealer registry when the
    /// configuration names one.
    pub fn from_config(config: ScanConfig) -> Result<Self> {
        let registry = match &config.dealer.registry_path {
            Some(path) => Some(DealerRegistry::from_file(path)?),
            None => None,
        };

        let extractor = Self::new(config);
        Ok(match registry {
            Some(registry) => extractor.with_registry(registry),
            None => extractor,
        })
    }

    /// Attach a dealer registry.
    pub fn with_registry(mut self, registry: DealerRegistry) -> Self {
        info!("Using dealer registry with {} entries", registry.len());
        self.dealer = self.dealer.with_registry(registry);
        self
    }

    /// Attach a stamp/signature inspector used by [`Self::extract_with_image`].
    pub fn with_inspector(mut self, inspector: ArtifactInspector) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Segment the page without resolving fields.
    pub fn analyze(&self, page: &OcrPage) -> Result<PageLayout> {
        page.validate()?;
        Ok(PageLayout::analyze(page, &self.config.layout))
    }

    /// Resolve every field of one page.
    pub fn extract(&self, page: &OcrPage) -> Result<ExtractionReport> {
        let start = Instant::now();
        let layout = self.analyze(page)?;

        let dealer_name = self.dealer.resolve(&layout);
        let model_name = self.model.resolve(&layout);
        let horse_power = self.horsepower.resolve(&layout);

        debug!(
            "dealer={} model={} hp={}",
            dealer_name.reason, model_name.reason, horse_power.reason
        );

        Ok(ExtractionReport {
            dealer_name,
            model_name,
            horse_power,
            artifacts: None,
            layout: LayoutSummary::of(&layout),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Resolve fields and inspect the page image for stamps and signatures.
    /// Without an inspector both artifacts are reported absent.
    pub fn extract_with_image(&self, page: &OcrPage, image: &DynamicImage) -> Result<ExtractionReport> {
        let start = Instant::now();
        let mut report = self.extract(page)?;

        report.artifacts = Some(match &self.inspector {
            Some(inspector) => inspector.inspect(image, None),
            None => ArtifactReport::absent(),
        });
        report.processing_time_ms = start.elapsed().as_millis() as u64;

        Ok(report)
    }

    /// Load a page from a JSON file and extract it.
    pub fn extract_file(&self, path: &Path) -> Result<ExtractionReport> {
        let page = OcrPage::from_file(path)?;
        self.extract(&page)
    }
}

impl Default for QuotationExtractor {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
