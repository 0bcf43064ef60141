//! Layout segmentation: tokens -> lines -> blocks.
//!
//! Purely geometric and deterministic. No learned model is involved; every
//! threshold comes from [`LayoutConfig`].

mod blocks;
pub mod geometry;
mod lines;

pub use blocks::group_lines_into_blocks;
pub use geometry::{Point, Quad, Rect};
pub use lines::group_tokens_into_lines;

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::models::config::LayoutConfig;
use crate::models::document::{OcrPage, Token};

/// Tokens sharing a horizontal band, ordered left to right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    tokens: Vec<Token>,
}

impl Line {
    /// Start a line with its reference token.
    pub(crate) fn new(first: Token) -> Self {
        Self {
            tokens: vec![first],
        }
    }

    /// The token that opened the line. Before x-ordering this is the
    /// grouping reference.
    pub(crate) fn first(&self) -> &Token {
        &self.tokens[0]
    }

    pub(crate) fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub(crate) fn sort_left_to_right(&mut self) {
        self.tokens.sort_by(|a, b| a.rect.x_min.total_cmp(&b.rect.x_min));
    }

    /// Tokens in reading order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Lines are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token texts joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Smallest `y_min` over the tokens.
    pub fn top(&self) -> f32 {
        self.tokens
            .iter()
            .map(|t| t.rect.y_min)
            .fold(f32::INFINITY, f32::min)
    }

    /// Largest `y_max` over the tokens.
    pub fn bottom(&self) -> f32 {
        self.tokens
            .iter()
            .map(|t| t.rect.y_max)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Mean token height.
    pub fn avg_height(&self) -> f32 {
        self.mean(|t| t.rect.height)
    }

    /// Mean of the token x centers.
    pub fn x_center(&self) -> f32 {
        self.mean(|t| t.rect.x_center)
    }

    /// Mean of the token y centers.
    pub fn y_center(&self) -> f32 {
        self.mean(|t| t.rect.y_center)
    }

    /// Highest recognition confidence among the tokens.
    pub fn max_confidence(&self) -> f32 {
        self.tokens
            .iter()
            .map(|t| t.confidence)
            .fold(0.0, f32::max)
    }

    /// Rectangle covering every token.
    pub fn bbox(&self) -> Rect {
        self.tokens[1..]
            .iter()
            .fold(self.tokens[0].rect, |acc, t| acc.union(&t.rect))
    }

    fn mean(&self, f: impl Fn(&Token) -> f32) -> f32 {
        self.tokens.iter().map(f).sum::<f32>() / self.tokens.len() as f32
    }
}

/// Consecutive lines forming one visual section (header, table, footer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Position of the block on the page, top to bottom.
    pub id: usize,
    lines: Vec<Line>,
    table_like: bool,
}

impl Block {
    pub(crate) fn new(id: usize, first: Line) -> Self {
        Self {
            id,
            lines: vec![first],
            table_like: false,
        }
    }

    pub(crate) fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// Lines, top to bottom.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Blocks are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the block looked tabular when the layout was analyzed.
    pub fn is_table_like(&self) -> bool {
        self.table_like
    }

    /// A block is table-like when it has at least two lines and its token
    /// centers fall into at least two distinct column buckets.
    pub fn detect_table(&mut self, column_width: f32) {
        self.table_like = self.lines.len() >= 2 && {
            let buckets: HashSet<i64> = self
                .lines
                .iter()
                .flat_map(|l| l.tokens())
                .map(|t| (t.rect.x_center / column_width).floor() as i64)
                .collect();
            buckets.len() >= 2
        };
    }
}

/// Block hierarchy of one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageLayout {
    /// Page width in pixels.
    pub width: f32,
    /// Page height in pixels.
    pub height: f32,
    /// Blocks, top to bottom.
    pub blocks: Vec<Block>,
}

impl PageLayout {
    /// Normalize, group into lines, then into blocks.
    pub fn analyze(page: &OcrPage, config: &LayoutConfig) -> Self {
        let lines = group_tokens_into_lines(page.tokens.clone(), config);
        let mut blocks = group_lines_into_blocks(lines, config);

        for block in &mut blocks {
            block.detect_table(config.table_column_width);
        }

        debug!(
            "Layout: {} tokens, {} blocks ({} table-like)",
            page.tokens.len(),
            blocks.len(),
            blocks.iter().filter(|b| b.is_table_like()).count()
        );

        Self {
            width: page.width,
            height: page.height,
            blocks,
        }
    }

    /// Every line with its block.
    pub fn lines(&self) -> impl Iterator<Item = (&Block, usize, &Line)> {
        self.blocks.iter().flat_map(|block| {
            block
                .lines()
                .iter()
                .enumerate()
                .map(move |(line_id, line)| (block, line_id, line))
        })
    }

    /// Every token in block/line/reading order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines().flat_map(|(_, _, line)| line.tokens())
    }

    /// Total number of lines.
    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// Total number of tokens.
    pub fn token_count(&self) -> usize {
        self.lines().map(|(_, _, line)| line.len()).sum()
    }
}
