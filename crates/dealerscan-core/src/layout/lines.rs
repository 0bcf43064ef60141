//! Token -> line clustering.

use tracing::trace;

use super::Line;
use crate::models::config::LayoutConfig;
use crate::models::document::Token;

/// Cluster tokens sharing a horizontal band into lines.
///
/// Tokens are visited top to bottom by `y_center`. Each one joins the first
/// line, in creation order, whose reference token it is vertically
/// compatible with; otherwise it opens a new line. First match wins, not
/// best match. Tokens within a line end up ordered by `x_min`.
pub fn group_tokens_into_lines(mut tokens: Vec<Token>, config: &LayoutConfig) -> Vec<Line> {
    tokens.sort_by(|a, b| a.rect.y_center.total_cmp(&b.rect.y_center));

    let mut lines: Vec<Line> = Vec::new();

    for token in tokens {
        let slot = lines
            .iter()
            .position(|line| same_band(line.first(), &token, config));

        match slot {
            Some(i) => lines[i].push(token),
            None => lines.push(Line::new(token)),
        }
    }

    for line in &mut lines {
        line.sort_left_to_right();
    }

    trace!("Grouped tokens into {} lines", lines.len());
    lines
}

fn same_band(reference: &Token, token: &Token, config: &LayoutConfig) -> bool {
    let r = &reference.rect;
    let t = &token.rect;

    r.vertical_overlap_ratio(t) > config.line_overlap_ratio
        || (t.y_center - r.y_center).abs() < r.height * config.line_center_tolerance
}
