//! Line -> block clustering.

use tracing::trace;

use super::{Block, Line};
use crate::models::config::LayoutConfig;

/// Cluster consecutive lines into blocks.
///
/// A new block opens when the vertical gap to the previous line exceeds
/// `block_gap_factor` times the previous line's average height, or when the
/// line contains one of the structural keywords (case-insensitive).
pub fn group_lines_into_blocks(lines: Vec<Line>, config: &LayoutConfig) -> Vec<Block> {
    let keywords: Vec<String> = config
        .block_break_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();

    let mut blocks: Vec<Block> = Vec::new();
    let mut prev: Option<(f32, f32)> = None;

    for line in lines {
        let (bottom, avg_height) = (line.bottom(), line.avg_height());

        let split = match prev {
            None => true,
            Some((prev_bottom, prev_height)) => {
                let gap = line.top() - prev_bottom;
                let text = line.text().to_lowercase();
                gap > prev_height * config.block_gap_factor
                    || keywords.iter().any(|k| text.contains(k.as_str()))
            }
        };

        match blocks.last_mut() {
            Some(block) if !split => block.push(line),
            _ => blocks.push(Block::new(blocks.len(), line)),
        }

        prev = Some((bottom, avg_height));
    }

    trace!("Grouped lines into {} blocks", blocks.len());
    blocks
}
