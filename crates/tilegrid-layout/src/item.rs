#![forbid(unsafe_code)]

//! Grid items: the unit of placement.
//!
//! An item knows its top-left cell, its configured size per axis and the size
//! constraints that apply to it. Sizes are either a fixed cell count or
//! [`Size::Auto`], in which case the measured content decides.
//!
//! The *effective* size is what placement works with:
//!
//! ```text
//! configured   content    effective
//! Fixed(2)     none       2
//! Fixed(2)     3 cols     3          (content wins when larger)
//! Auto         3 cols     3
//! Auto         none       1
//! ```
//!
//! Horizontally the effective size is additionally clipped so the item never
//! extends past the last column.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::{CellMetrics, Rounding};

/// Handle to an item registered with a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub(crate) u32);

impl ItemId {
    /// Raw numeric id, stable for the lifetime of the grid.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// A grid cell address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Cell {
    /// Row index (0 is the top row).
    pub row: usize,
    /// Column index (0 is the leftmost column).
    pub col: usize,
}

impl Cell {
    /// Create a cell address.
    #[inline]
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Size axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Width, in columns.
    X,
    /// Height, in rows.
    Y,
}

/// Configured size along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SizeRepr", into = "SizeRepr")]
pub enum Size {
    /// A fixed number of cells.
    Fixed(usize),
    /// Track the measured content size.
    Auto,
}

impl Size {
    /// Parse user input.
    ///
    /// Returns `None` for empty input (treated as "no change"). Integers parse
    /// from their leading digits; anything unparsable yields `Fixed(0)`, which
    /// the grid replaces with its default size.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.eq_ignore_ascii_case("auto") {
            return Some(Self::Auto);
        }
        let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
        Some(Self::Fixed(digits.parse().unwrap_or(0)))
    }

    /// The fixed cell count, if any.
    #[inline]
    #[must_use]
    pub const fn fixed(self) -> Option<usize> {
        match self {
            Self::Fixed(n) => Some(n),
            Self::Auto => None,
        }
    }

    /// True for [`Size::Auto`].
    #[inline]
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Resolve against an optional content size (in cells).
    fn resolve(self, content: Option<usize>) -> usize {
        match (self, content) {
            (Self::Auto, content) => content.unwrap_or(0),
            (Self::Fixed(n), Some(c)) if c > n => c,
            (Self::Fixed(n), _) => n,
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Cells(usize),
    Text(String),
}

impl TryFrom<SizeRepr> for Size {
    type Error = String;

    fn try_from(repr: SizeRepr) -> Result<Self, Self::Error> {
        match repr {
            SizeRepr::Cells(n) => Ok(Self::Fixed(n)),
            SizeRepr::Text(text) => {
                Self::parse(&text).ok_or_else(|| "empty size".to_string())
            }
        }
    }
}

impl From<Size> for SizeRepr {
    fn from(size: Size) -> Self {
        match size {
            Size::Fixed(n) => Self::Cells(n),
            Size::Auto => Self::Text("auto".to_string()),
        }
    }
}

/// Rendered content extent, in pixels (scroll width/height).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelExtent {
    /// Scroll width in pixels.
    pub width: f64,
    /// Scroll height in pixels.
    pub height: f64,
}

impl PixelExtent {
    /// Create an extent.
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Minimal persisted form of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Top row.
    pub row: usize,
    /// Left column.
    pub col: usize,
    /// Configured width.
    pub size_x: Size,
    /// Configured height.
    pub size_y: Size,
}

/// Per-item placement state.
#[derive(Debug, Clone, PartialEq)]
pub struct GridItem {
    pub(crate) origin: Option<Cell>,
    /// Last committed position; locates the occupancy cell for removal.
    pub(crate) committed: Option<Cell>,
    pub(crate) size_x: Size,
    pub(crate) size_y: Size,
    pub(crate) min_size_x: Option<usize>,
    pub(crate) max_size_x: Option<usize>,
    pub(crate) min_size_y: Option<usize>,
    pub(crate) max_size_y: Option<usize>,
    /// Last value produced by a size update, per axis.
    pub(crate) last_size_x: Option<usize>,
    pub(crate) last_size_y: Option<usize>,
    pub(crate) content: Option<PixelExtent>,
    pub(crate) pinned: bool,
    pub(crate) rendered: bool,
}

impl Default for GridItem {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl GridItem {
    /// Create an unplaced item with fixed dimensions.
    #[must_use]
    pub fn new(size_x: usize, size_y: usize) -> Self {
        Self {
            origin: None,
            committed: None,
            size_x: Size::Fixed(size_x),
            size_y: Size::Fixed(size_y),
            min_size_x: None,
            max_size_x: None,
            min_size_y: None,
            max_size_y: None,
            last_size_x: None,
            last_size_y: None,
            content: None,
            pinned: false,
            rendered: false,
        }
    }

    /// Rebuild an item from its persisted summary.
    #[must_use]
    pub fn from_summary(summary: ItemSummary) -> Self {
        Self::new(1, 1)
            .with_size(summary.size_x, summary.size_y)
            .at(summary.row, summary.col)
    }

    /// Request an initial position.
    #[must_use]
    pub fn at(mut self, row: usize, col: usize) -> Self {
        self.origin = Some(Cell::new(row, col));
        self
    }

    /// Set both configured sizes.
    #[must_use]
    pub fn with_size(mut self, size_x: Size, size_y: Size) -> Self {
        self.size_x = size_x;
        self.size_y = size_y;
        self
    }

    /// Set per-item minimum sizes.
    #[must_use]
    pub fn with_min_size(mut self, min_x: Option<usize>, min_y: Option<usize>) -> Self {
        self.min_size_x = min_x;
        self.min_size_y = min_y;
        self
    }

    /// Set per-item maximum sizes.
    #[must_use]
    pub fn with_max_size(mut self, max_x: Option<usize>, max_y: Option<usize>) -> Self {
        self.max_size_x = max_x;
        self.max_size_y = max_y;
        self
    }

    /// Pinned items cannot be pushed out of the way by a drag.
    #[must_use]
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Current top-left cell, if the item has a position.
    #[inline]
    pub fn origin(&self) -> Option<Cell> {
        self.origin
    }

    /// Current row.
    #[inline]
    pub fn row(&self) -> Option<usize> {
        self.origin.map(|c| c.row)
    }

    /// Current column.
    #[inline]
    pub fn col(&self) -> Option<usize> {
        self.origin.map(|c| c.col)
    }

    /// Last committed position.
    #[inline]
    pub fn committed(&self) -> Option<Cell> {
        self.committed
    }

    /// Configured size for an axis.
    #[inline]
    pub fn size(&self, axis: Axis) -> Size {
        match axis {
            Axis::X => self.size_x,
            Axis::Y => self.size_y,
        }
    }

    /// Per-item minimum for an axis.
    #[inline]
    pub fn min_size(&self, axis: Axis) -> Option<usize> {
        match axis {
            Axis::X => self.min_size_x,
            Axis::Y => self.min_size_y,
        }
    }

    /// Per-item maximum for an axis.
    #[inline]
    pub fn max_size(&self, axis: Axis) -> Option<usize> {
        match axis {
            Axis::X => self.max_size_x,
            Axis::Y => self.max_size_y,
        }
    }

    /// Whether the item resists being pushed by a drag.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Set when the item was settled by resolving the overlaps above it.
    #[inline]
    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Last measured content extent.
    #[inline]
    pub fn content_extent(&self) -> Option<PixelExtent> {
        self.content
    }

    /// Persisted form; `None` while unplaced.
    pub fn summary(&self) -> Option<ItemSummary> {
        self.origin.map(|cell| ItemSummary {
            row: cell.row,
            col: cell.col,
            size_x: self.size_x,
            size_y: self.size_y,
        })
    }

    pub(crate) fn set_size(&mut self, axis: Axis, size: Size) {
        match axis {
            Axis::X => self.size_x = size,
            Axis::Y => self.size_y = size,
        }
    }

    pub(crate) fn last_size_mut(&mut self, axis: Axis) -> &mut Option<usize> {
        match axis {
            Axis::X => &mut self.last_size_x,
            Axis::Y => &mut self.last_size_y,
        }
    }

    /// Content size in cells along an axis, if measured.
    pub(crate) fn content_cells(&self, axis: Axis, metrics: Option<&CellMetrics>) -> Option<usize> {
        let metrics = metrics?;
        let extent = self.content?;
        let cells = match axis {
            Axis::X => metrics.pixels_to_columns(extent.width, Rounding::Up),
            Axis::Y => metrics.pixels_to_rows(extent.height, Rounding::Up, false),
        };
        Some(usize::try_from(cells).unwrap_or(0))
    }

    /// Width used for placement.
    pub(crate) fn effective_size_x(&self, columns: usize, metrics: Option<&CellMetrics>) -> usize {
        let mut size = self.size_x.resolve(self.content_cells(Axis::X, metrics));
        let col = self.col().unwrap_or(0);
        if col + size > columns {
            size = columns.saturating_sub(col);
        }
        size.max(1)
    }

    /// Height used for placement.
    pub(crate) fn effective_size_y(&self, metrics: Option<&CellMetrics>) -> usize {
        self.size_y
            .resolve(self.content_cells(Axis::Y, metrics))
            .max(1)
    }
}
