//! Quadrilateral to axis-aligned rectangle normalization.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// A single (x, y) corner.
pub type Point = [f32; 2];

/// Four corners of an OCR text box, in detector order.
pub type Quad = [Point; 4];

/// Axis-aligned rectangle derived from a [`Quad`].
///
/// `x_center`/`y_center` are the mean of the four corners, not the midpoint
/// of the extrema. For skewed quads the two differ slightly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
    pub x_center: f32,
    pub y_center: f32,
    pub height: f32,
}

impl Rect {
    /// Normalize a quadrilateral.
    pub fn from_quad(quad: &Quad) -> Self {
        let xs = quad.map(|p| p[0]);
        let ys = quad.map(|p| p[1]);

        let x_min = xs.iter().copied().fold(f32::INFINITY, f32::min);
        let x_max = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let y_min = ys.iter().copied().fold(f32::INFINITY, f32::min);
        let y_max = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            x_center: xs.iter().sum::<f32>() / 4.0,
            y_center: ys.iter().sum::<f32>() / 4.0,
            height: y_max - y_min,
        }
    }

    /// Vertical overlap divided by the smaller of the two heights.
    ///
    /// Returns 0 when either rectangle is flat.
    pub fn vertical_overlap_ratio(&self, other: &Rect) -> f32 {
        let top = self.y_min.max(other.y_min);
        let bottom = self.y_max.min(other.y_max);
        let overlap = (bottom - top).max(0.0);
        let min_height = self.height.min(other.height);

        if min_height > 0.0 {
            overlap / min_height
        } else {
            0.0
        }
    }

    /// Smallest rectangle covering both. Centers become the box midpoint.
    pub fn union(&self, other: &Rect) -> Rect {
        let x_min = self.x_min.min(other.x_min);
        let y_min = self.y_min.min(other.y_min);
        let x_max = self.x_max.max(other.x_max);
        let y_max = self.y_max.max(other.y_max);

        Rect {
            x_min,
            y_min,
            x_max,
            y_max,
            x_center: (x_min + x_max) / 2.0,
            y_center: (y_min + y_max) / 2.0,
            height: y_max - y_min,
        }
    }
}

/// Validate raw corner points coming from OCR and build a [`Quad`].
///
/// `index` is the token position, used only for the error message.
pub fn quad_from_points(points: &[Point], index: usize) -> Result<Quad, LayoutError> {
    let quad: Quad = points.try_into().map_err(|_| LayoutError::MalformedQuad {
        index,
        points: points.len(),
    })?;

    if quad.iter().flatten().any(|c| !c.is_finite()) {
        return Err(LayoutError::NonFiniteCoordinate { index });
    }

    Ok(quad)
}
