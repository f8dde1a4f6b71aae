#![forbid(unsafe_code)]

//! Errors raised by the grid.
//!
//! Ordinary overlap is never an error: pushing, swapping and floating exist to
//! resolve it. The variants here signal misconfiguration (a grid too small for
//! its items), misbehaving content, or misuse of a handle.

use std::fmt;

use crate::item::ItemId;

/// Number of content-fit attempts before growth is treated as runaway.
pub const MAX_FIT_ATTEMPTS: usize = 50;

/// Errors from grid operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Auto-placement scanned every cell and found none that fits.
    NoFreeCell {
        /// Width of the item that could not be placed.
        size_x: usize,
        /// Height of the item that could not be placed.
        size_y: usize,
    },
    /// Content kept overflowing horizontally while the item grew in height.
    RunawayGrowth {
        /// The offending item.
        item: ItemId,
        /// Attempts made before giving up.
        attempts: usize,
    },
    /// Overlap resolution did not settle within its work budget.
    CascadeLimit {
        /// Jobs processed before the engine gave up.
        budget: usize,
    },
    /// The id is not registered with this grid.
    UnknownItem(ItemId),
    /// The grid was destroyed; no further operations are valid.
    Destroyed,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFreeCell { size_x, size_y } => {
                write!(f, "unable to place item: no free {size_x}x{size_y} area in the grid")
            }
            Self::RunawayGrowth { item, attempts } => write!(
                f,
                "{item} keeps outgrowing its columns after {attempts} fit attempts; \
                 give it an initial size that matches its content, or cap the content \
                 height (e.g. max-height instead of height: 100%) so it can wrap horizontally"
            ),
            Self::CascadeLimit { budget } => write!(
                f,
                "overlap resolution exceeded {budget} steps; the grid is too small for its items"
            ),
            Self::UnknownItem(id) => write!(f, "{id} is not part of this grid"),
            Self::Destroyed => write!(f, "grid has been destroyed"),
        }
    }
}

impl std::error::Error for GridError {}

/// Result alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
