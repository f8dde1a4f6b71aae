#![forbid(unsafe_code)]

//! Pixel ↔ cell conversions.
//!
//! Everything here is pure. Cell dimensions come from [`CellMetrics`], which
//! the grid recomputes on every container refresh.
//!
//! Without outer margins the first row/column has no leading gap, so a pixel
//! offset is biased by (half) a margin before dividing by the cell size.

use serde::{Deserialize, Serialize};

use crate::config::{Margins, RowHeight};

/// Rounding applied when converting pixels to cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round half up.
    #[default]
    Nearest,
    /// Ceiling.
    Up,
    /// Floor.
    Down,
}

impl Rounding {
    #[inline]
    fn apply(self, value: f64) -> f64 {
        match self {
            Self::Nearest => (value + 0.5).floor(),
            Self::Up => value.ceil(),
            Self::Down => value.floor(),
        }
    }
}

/// Resolved cell dimensions for one container width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellMetrics {
    /// Column pitch in pixels (cell plus one margin).
    pub col_width: f64,
    /// Row pitch in pixels.
    pub row_height: f64,
    /// Gaps between cells.
    pub margins: Margins,
    /// Whether margins also surround the outer edge.
    pub outer_margin: bool,
}

impl CellMetrics {
    /// Number of rows covered by `pixels`.
    ///
    /// `for_drag` halves the margin bias, matching how a dragged item's top
    /// edge is measured.
    #[must_use]
    pub fn pixels_to_rows(&self, pixels: f64, rounding: Rounding, for_drag: bool) -> i64 {
        let mut pixels = pixels;
        if !self.outer_margin {
            let bias = f64::from(self.margins.row);
            pixels += if for_drag { bias / 2.0 } else { bias };
        }
        cells(pixels, self.row_height, rounding)
    }

    /// Number of columns covered by `pixels`.
    #[must_use]
    pub fn pixels_to_columns(&self, pixels: f64, rounding: Rounding) -> i64 {
        let mut pixels = pixels;
        if !self.outer_margin {
            pixels += f64::from(self.margins.col) / 2.0;
        }
        cells(pixels, self.col_width, rounding)
    }

    /// Pixel height of a grid that is `rows` tall.
    #[must_use]
    pub fn grid_pixel_height(&self, rows: usize) -> f64 {
        let margin = f64::from(self.margins.row);
        rows as f64 * self.row_height + if self.outer_margin { margin } else { -margin }
    }
}

fn cells(pixels: f64, pitch: f64, rounding: Rounding) -> i64 {
    if !(pitch > 0.0) || !pixels.is_finite() {
        return 0;
    }
    rounding.apply(pixels / pitch) as i64
}

/// Column width for an automatically sized grid.
#[must_use]
pub fn auto_column_width(width: f64, columns: usize, margins: Margins, outer_margin: bool) -> f64 {
    let margin = f64::from(margins.col);
    let adjusted = width + if outer_margin { -margin } else { margin };
    adjusted / columns.max(1) as f64
}

/// Resolve the configured row height against the current column width.
#[must_use]
pub fn resolve_row_height(row_height: RowHeight, col_width: f64) -> f64 {
    match row_height {
        RowHeight::Px(px) => px,
        RowHeight::Match => col_width.round(),
        RowHeight::Times(factor) => (col_width * factor).round(),
        RowHeight::Divide(divisor) => (col_width / divisor).round(),
    }
}
