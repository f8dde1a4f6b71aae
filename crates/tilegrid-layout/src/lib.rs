#![forbid(unsafe_code)]

//! Grid packing for dashboard tiles.
//!
//! # Role
//! `tilegrid-layout` places rectangular items on a fixed-column grid that
//! grows downward. Items never overlap: when one lands on others they are
//! pushed down (cascading), same-size neighbours can swap, and once the grid
//! has loaded everything floats up into free space.
//!
//! # Layers
//! - **[`GridModel`]**: item arena plus sparse row → column occupancy.
//! - **[`PlacementEngine`]**: placement, push-down, swap, float-up and the
//!   height recompute, driven by an explicit worklist.
//! - **[`CellMetrics`]**: pixel ↔ cell conversion for a resolved column width.
//! - **[`Grid`]**: the session. Configuration, lifecycle, content sizing,
//!   coalesced layout passes, drag/resize gestures and [`GridEvent`]s.
//!
//! # Example
//! ```
//! use tilegrid_layout::{Cell, Grid, GridConfig, GridItem};
//!
//! let mut grid = Grid::new(GridConfig::default());
//! let a = grid.add_item(GridItem::new(2, 1)).unwrap();
//! let b = grid.add_item(GridItem::new(2, 2).at(0, 0)).unwrap();
//! grid.flush().unwrap();
//!
//! assert_eq!(grid.item(b).unwrap().origin(), Some(Cell::new(0, 0)));
//! assert_eq!(grid.item(a).unwrap().origin(), Some(Cell::new(2, 0)));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod gesture;
pub mod grid;
pub mod item;
pub mod metrics;
pub mod model;
pub mod probe;
pub mod schedule;

pub use config::{
    Dimension, DragConfig, DragOptions, GridConfig, GridOptions, MarginValue, Margins,
    ResizeConfig, ResizeHandle, ResizeOptions, RowHeight,
};
pub use engine::{IgnoreSet, PlacementEngine};
pub use error::{GridError, MAX_FIT_ATTEMPTS, Result};
pub use events::GridEvent;
pub use grid::{Grid, GridState};
pub use item::{Axis, Cell, GridItem, ItemId, ItemSummary, PixelExtent, Size};
pub use metrics::{CellMetrics, Rounding, auto_column_width, resolve_row_height};
pub use model::{GridModel, Region};
pub use probe::{ContentProbe, NoContent};
pub use schedule::{Debounce, FollowUp, LayoutRequest, LayoutScheduler, RESIZE_DEBOUNCE};
