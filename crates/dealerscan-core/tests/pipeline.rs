//! End-to-end extraction over realistic OCR pages.

use std::path::PathBuf;

use dealerscan_core::models::config::{DealerConfig, LayoutConfig};
use dealerscan_core::resolvers::horsepower::HpColumns;
use dealerscan_core::{
    BBox, DealerRegistry, DealerResolver, DealerStrategy, FieldResolver, HorsepowerResolver,
    LayoutError, ModelNameResolver, OcrPage, PageLayout, QuotationExtractor, Reason, ScanConfig,
    ScanError, Token,
};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn quotation() -> OcrPage {
    OcrPage::from_file(&fixture("quotation.json")).unwrap()
}

fn page(width: f32, height: f32, tokens: Vec<Token>) -> OcrPage {
    OcrPage::new(width, height, tokens).unwrap()
}

#[test]
fn test_full_quotation_page() {
    let report = QuotationExtractor::default().extract(&quotation()).unwrap();

    assert_eq!(report.dealer_name.value.as_deref(), Some("SHREE RAM TRACTORS"));
    assert_eq!(report.dealer_name.reason, Reason::HeuristicMatch);
    assert_eq!(report.dealer_name.confidence, 0.83);

    assert_eq!(report.model_name.value.as_deref(), Some("575 DI"));
    assert_eq!(
        report.model_name.original_text.as_deref(),
        Some("Mahindra 575 DI XP Plus 47 750000")
    );

    assert_eq!(report.horse_power.value, Some(47));
    assert_eq!(report.horse_power.reason, Reason::ColumnAlignedMatch);
    assert_eq!(report.horse_power.confidence, 0.7);

    assert_eq!(report.layout.tokens, 13);
    assert_eq!(report.layout.lines, 8);
    assert_eq!(report.layout.blocks, 5);
    assert_eq!(report.layout.table_blocks, 1);
}

#[test]
fn test_coverage_no_token_or_line_lost() {
    let page = quotation();
    let layout = PageLayout::analyze(&page, &LayoutConfig::default());

    let tokens_in_lines: usize = layout
        .blocks
        .iter()
        .flat_map(|b| b.lines())
        .map(|l| l.len())
        .sum();
    assert_eq!(tokens_in_lines, page.tokens.len());

    let lines_in_blocks: usize = layout.blocks.iter().map(|b| b.len()).sum();
    assert_eq!(lines_in_blocks, layout.line_count());

    let mut seen: Vec<&str> = layout.tokens().map(|t| t.text.as_str()).collect();
    let mut expected: Vec<&str> = page.tokens.iter().map(|t| t.text.as_str()).collect();
    seen.sort_unstable();
    expected.sort_unstable();
    assert_eq!(seen, expected);
}

#[test]
fn test_grouping_is_idempotent() {
    let config = LayoutConfig::default();
    let first = PageLayout::analyze(&quotation(), &config);

    let flattened = page(first.width, first.height, first.tokens().cloned().collect());
    let second = PageLayout::analyze(&flattened, &config);

    assert_eq!(first.blocks, second.blocks);
}

#[test]
fn test_lines_within_block_are_top_to_bottom() {
    let layout = PageLayout::analyze(&quotation(), &LayoutConfig::default());

    for block in &layout.blocks {
        let centers: Vec<f32> = block.lines().iter().map(|l| l.y_center()).collect();
        assert!(centers.windows(2).all(|w| w[0] <= w[1]), "{centers:?}");
    }
}

#[test]
fn test_scores_bounded() {
    let layout = PageLayout::analyze(&quotation(), &LayoutConfig::default());
    let registry = DealerRegistry::new(["Shree Ram Tractors", "Kisan Agro Agency"]);

    let dealer = DealerResolver::new(DealerConfig {
        strategy: DealerStrategy::RegistryWithFallback,
        ..DealerConfig::default()
    })
    .with_registry(registry);

    let scores: Vec<f32> = dealer
        .candidates(&layout)
        .iter()
        .map(|c| c.score)
        .chain(ModelNameResolver::default().candidates(&layout).iter().map(|c| c.score))
        .chain(HorsepowerResolver::default().candidates(&layout).iter().map(|c| c.score))
        .collect();

    assert!(!scores.is_empty());
    assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)), "{scores:?}");
}

#[test]
fn test_dealer_heuristic_scenario() {
    let page = page(
        1000.0,
        1400.0,
        vec![
            Token::axis_aligned(
                "SHREE RAM TRACTORS AND IMPLEMENTS",
                [200.0, 60.0, 800.0, 80.0],
                0.95,
            ),
            Token::axis_aligned("Station Road, Alwar", [300.0, 85.0, 700.0, 105.0], 0.9),
        ],
    );
    let report = QuotationExtractor::default().extract(&page).unwrap();

    assert_eq!(
        report.dealer_name.value.as_deref(),
        Some("SHREE RAM TRACTORS AND IMPLEMENTS")
    );
    assert_eq!(report.dealer_name.reason, Reason::HeuristicMatch);
    assert!(report.dealer_name.confidence >= 0.6);
}

#[test]
fn test_dealer_registry_strategy_end_to_end() {
    let mut config = ScanConfig::default();
    config.dealer.strategy = DealerStrategy::Registry;

    let dir = tempfile::tempdir().unwrap();
    let registry_path = dir.path().join("dealers.json");
    std::fs::write(&registry_path, r#"["Shree Ram Tractors", "Kisan Agro Agency"]"#).unwrap();
    config.dealer.registry_path = Some(registry_path);

    let report = QuotationExtractor::from_config(config)
        .unwrap()
        .extract(&quotation())
        .unwrap();

    assert_eq!(report.dealer_name.value.as_deref(), Some("Shree Ram Tractors"));
    assert_eq!(report.dealer_name.reason, Reason::HeuristicMatch);
    assert_eq!(report.dealer_name.confidence, 1.0);
    assert_eq!(
        report.dealer_name.original_text.as_deref(),
        Some("SHREE RAM TRACTORS")
    );
}

#[test]
fn test_horsepower_slash_rule_keeps_engine_value() {
    // Row "45 HP / 40 PTO" spans the HP and PTO columns of a table.
    let page = page(
        1000.0,
        1000.0,
        vec![
            Token::axis_aligned("Item", [100.0, 480.0, 200.0, 500.0], 0.9),
            Token::axis_aligned("HP", [400.0, 480.0, 440.0, 500.0], 0.9),
            Token::axis_aligned("PTO HP", [700.0, 480.0, 780.0, 500.0], 0.9),
            Token::axis_aligned("45 HP /", [380.0, 505.0, 460.0, 525.0], 0.9),
            Token::axis_aligned("40 PTO", [700.0, 505.0, 780.0, 525.0], 0.9),
        ],
    );
    let layout = PageLayout::analyze(&page, &LayoutConfig::default());
    let columns = HpColumns::detect(&layout);
    assert_eq!(columns.hp_x, Some(420.0));
    assert_eq!(columns.pto_x, Some(740.0));

    let candidates = HorsepowerResolver::default().candidates(&layout);
    let values: Vec<u32> = candidates.iter().map(|c| c.value).collect();
    assert_eq!(values, vec![45]);
    assert_eq!(candidates[0].source_text, "45 hp / 40 pto");
}

#[test]
fn test_horsepower_engine_column_beats_pto_column() {
    let page = page(
        1000.0,
        1000.0,
        vec![
            Token::axis_aligned("Description", [100.0, 300.0, 250.0, 320.0], 0.9),
            Token::axis_aligned("HP", [500.0, 300.0, 540.0, 320.0], 0.9),
            Token::axis_aligned("PTO HP", [750.0, 300.0, 830.0, 320.0], 0.9),
            Token::axis_aligned("Engine 45 HP", [460.0, 325.0, 580.0, 345.0], 0.9),
            Token::axis_aligned("PTO HP 40", [750.0, 350.0, 830.0, 370.0], 0.9),
        ],
    );
    let layout = PageLayout::analyze(&page, &LayoutConfig::default());
    let resolver = HorsepowerResolver::default();

    let candidates = resolver.candidates(&layout);
    let engine = candidates.iter().find(|c| c.value == 45).unwrap();
    let pto = candidates.iter().find(|c| c.value == 40).unwrap();
    assert!(engine.score > pto.score);
    assert_eq!(pto.score, 0.0);

    let res = resolver.resolve(&layout);
    assert_eq!(res.value, Some(45));
    assert_eq!(res.confidence, 1.0);
    assert_eq!(res.reason, Reason::ColumnAlignedMatch);
}

#[test]
fn test_block_split_by_gap_and_keyword() {
    let config = LayoutConfig::default();

    let gap = PageLayout::analyze(
        &page(
            1000.0,
            1000.0,
            vec![
                Token::axis_aligned("Delivery at", [100.0, 100.0, 300.0, 120.0], 0.9),
                Token::axis_aligned("Kota depot", [100.0, 160.0, 300.0, 180.0], 0.9),
            ],
        ),
        &config,
    );
    assert_eq!(gap.blocks.len(), 2);

    let keyword = PageLayout::analyze(
        &page(
            1000.0,
            1000.0,
            vec![
                Token::axis_aligned("Delivery at", [100.0, 100.0, 300.0, 120.0], 0.9),
                Token::axis_aligned("Total", [100.0, 125.0, 200.0, 145.0], 0.9),
            ],
        ),
        &config,
    );
    assert_eq!(keyword.blocks.len(), 2);

    let together = PageLayout::analyze(
        &page(
            1000.0,
            1000.0,
            vec![
                Token::axis_aligned("Delivery at", [100.0, 100.0, 300.0, 120.0], 0.9),
                Token::axis_aligned("Kota depot", [100.0, 125.0, 300.0, 145.0], 0.9),
            ],
        ),
        &config,
    );
    assert_eq!(together.blocks.len(), 1);
}

#[test]
fn test_abstention_on_excluded_content() {
    let page = page(
        1000.0,
        1400.0,
        vec![
            Token::axis_aligned("GSTIN 08ABCDE", [100.0, 100.0, 400.0, 120.0], 0.9),
            Token::axis_aligned("Bank details IFSC", [100.0, 300.0, 400.0, 320.0], 0.9),
            Token::axis_aligned("Phone 98765", [100.0, 500.0, 400.0, 520.0], 0.9),
        ],
    );
    let report = QuotationExtractor::default().extract(&page).unwrap();

    for (value_missing, reason) in [
        (report.dealer_name.value.is_none(), report.dealer_name.reason),
        (report.model_name.value.is_none(), report.model_name.reason),
        (report.horse_power.value.is_none(), report.horse_power.reason),
    ] {
        assert!(value_missing);
        assert_eq!(reason, Reason::NoCandidates);
    }
}

#[test]
fn test_malformed_box_fails_document() {
    let json = r#"{"width": 100, "height": 100, "tokens": [
        {"text": "ok", "bbox": [[0,0],[1,0],[1,1],[0,1]]},
        {"text": "bad", "bbox": [[0,0],[1,0]]}
    ]}"#;
    let err = serde_json::from_str::<OcrPage>(json).unwrap_err();
    assert!(err.to_string().contains("token 1"));
}

#[test]
fn test_non_finite_corner_fails_document() {
    let mut page = quotation();
    page.tokens.push(Token::new(
        "SHREE RAM TRACTORS",
        [[f32::NAN, 10.0], [90.0, 10.0], [90.0, f32::INFINITY], [10.0, 30.0]],
        0.9,
    ));
    let index = page.tokens.len() - 1;

    let err = QuotationExtractor::default().extract(&page).unwrap_err();
    assert!(
        matches!(
            err,
            ScanError::Layout(LayoutError::NonFiniteCoordinate { index: i }) if i == index
        ),
        "{err}"
    );
}

#[test]
fn test_iou_laws() {
    let boxes = [
        BBox::new(0.0, 0.0, 100.0, 50.0),
        BBox::from_center(60.0, 30.0, 80.0, 40.0),
        BBox::new(500.0, 500.0, 520.0, 530.0),
    ];

    for a in &boxes {
        assert_eq!(a.iou(a), 1.0);
        for b in &boxes {
            assert_eq!(a.iou(b), b.iou(a));
            assert!((0.0..=1.0).contains(&a.iou(b)));
        }
    }
    assert_eq!(boxes[0].iou(&boxes[2]), 0.0);
}
