#![forbid(unsafe_code)]

//! Drag and resize gestures in grid units.
//!
//! Pointer tracking stays with the caller, which converts pointer offsets to
//! cells (see [`Grid::pixels_to_rows`]) and drives a gesture through
//! `begin_*`, any number of `*_to` updates and `end_*`. Only one item can be
//! moving at a time; starting a gesture replaces the previous one.

use crate::error::Result;
use crate::grid::Grid;
use crate::item::{Axis, Cell, GridItem, ItemId, Size};
use crate::schedule::LayoutRequest;

impl Grid {
    /// The item currently dragged or resized.
    #[inline]
    pub fn moving_item(&self) -> Option<ItemId> {
        self.engine.moving_item()
    }

    #[inline]
    pub fn is_moving(&self, id: ItemId) -> bool {
        self.engine.is_moving(id)
    }

    /// Start dragging `id`. Refused (`Ok(false)`) in mobile mode or when
    /// dragging is disabled.
    pub fn begin_drag(&mut self, id: ItemId) -> Result<bool> {
        self.live()?;
        self.item_ref(id)?;
        if !self.can_drag() {
            return Ok(false);
        }
        self.engine.set_moving(Some(id));
        // Reserve the item's height below the grid so it can be dropped there.
        let (_, size_y) = self.engine.model().size_of(id).unwrap_or((1, 1));
        self.engine.update_height(size_y as isize, None);
        Ok(true)
    }

    /// Drag `id` over `(row, col)`. Returns whether the item was moved.
    ///
    /// With swapping enabled, a single same-size item exactly under the
    /// target trades places, and smaller groups in line with the item shift
    /// into the space it vacates. Otherwise the item moves when pushing is
    /// enabled or nothing is in the way, unless something in the way is
    /// pinned.
    pub fn drag_to(&mut self, id: ItemId, row: usize, col: usize) -> Result<bool> {
        self.live()?;
        let target = self.clamp_to_grid(row, col);
        let origin = self.item_ref(id)?.origin().unwrap_or(target);
        let (size_x, size_y) = self.engine.model().size_of(id).unwrap_or((1, 1));
        let in_way = self
            .engine
            .model()
            .items_in(target.row, target.col, size_x, size_y, &[id]);

        if self.config.swapping
            && let Some(bbox) = self.engine.model().bounding_box(&in_way)
        {
            let same_size = bbox.size_x == size_x && bbox.size_y == size_y;
            let same_position = bbox.row == target.row && bbox.col == target.col;
            let in_line = bbox.row == origin.row || bbox.col == origin.col;

            if same_size && in_way.len() == 1 {
                if same_position {
                    self.engine.swap(id, in_way[0])?;
                } else if in_line {
                    return Ok(false);
                }
            } else if bbox.size_x <= size_x && bbox.size_y <= size_y && in_line {
                let empty_row = if origin.row <= target.row {
                    origin.row
                } else {
                    target.row + size_y
                };
                let empty_col = if origin.col <= target.col {
                    origin.col
                } else {
                    target.col + size_x
                };
                let row_offset = empty_row as isize - bbox.row as isize;
                let col_offset = empty_col as isize - bbox.col as isize;
                for &other in &in_way {
                    let Some(region) = self.engine.model().region_of(other) else {
                        continue;
                    };
                    let (Some(dest_row), Some(dest_col)) = (
                        region.row.checked_add_signed(row_offset),
                        region.col.checked_add_signed(col_offset),
                    ) else {
                        continue;
                    };
                    if self
                        .engine
                        .model()
                        .items_in(dest_row, dest_col, region.size_x, region.size_y, &[id])
                        .is_empty()
                    {
                        self.engine.place(other, Some(Cell::new(dest_row, dest_col)))?;
                    }
                }
            }
        }

        if !self.may_take(&in_way) {
            return Ok(false);
        }
        self.engine.place(id, Some(target))?;
        Ok(self.item_ref(id)?.origin() != Some(origin))
    }

    /// Drop `id` at `(row, col)` and end the drag.
    pub fn end_drag(&mut self, id: ItemId, row: usize, col: usize) -> Result<()> {
        self.live()?;
        let target = self.clamp_to_grid(row, col);
        let current = self.item_ref(id)?.origin();
        let (size_x, size_y) = self.engine.model().size_of(id).unwrap_or((1, 1));
        let in_way = self
            .engine
            .model()
            .items_in(target.row, target.col, size_x, size_y, &[id]);
        let destination = if self.may_take(&in_way) {
            Some(target)
        } else {
            current
        };

        self.engine.set_moving(None);
        self.engine.update_height(0, None);
        self.engine.place_with(id, destination, &[], true)
    }

    /// Start resizing `id`. Refused (`Ok(false)`) in mobile mode or when
    /// resizing is disabled.
    pub fn begin_resize(&mut self, id: ItemId) -> Result<bool> {
        self.live()?;
        self.item_ref(id)?;
        if !self.can_resize() {
            return Ok(false);
        }
        self.engine.set_moving(Some(id));
        // Placeholder row so the pointer can move below the item.
        self.engine.update_height(1, None);
        Ok(true)
    }

    /// Resize `id` to `size_x` × `size_y` with its top-left at `(row, col)`.
    ///
    /// Accepted only when the new footprint fits the grid and pushing is
    /// enabled or the footprint is free. `Auto` axes keep tracking content.
    /// Returns whether anything changed.
    pub fn resize_to(&mut self, id: ItemId, row: usize, col: usize, size_x: usize, size_y: usize) -> Result<bool> {
        self.live()?;
        let item = self.item_ref(id)?;
        let model = self.engine.model();
        let fits = model.can_occupy(size_x, size_y, row, col)
            && (self.config.pushing || model.items_in(row, col, size_x, size_y, &[id]).is_empty());
        if !fits {
            return Ok(false);
        }

        let next_x = if item.size_x.is_auto() {
            Size::Auto
        } else {
            Size::Fixed(size_x)
        };
        let next_y = if item.size_y.is_auto() {
            Size::Auto
        } else {
            Size::Fixed(size_y)
        };
        let cell = Cell::new(row, col);
        let moved = item.origin() != Some(cell);
        if let Some(entry) = self.engine.model_mut().get_mut(id) {
            entry.set_size(Axis::X, next_x);
            entry.set_size(Axis::Y, next_y);
        }
        if moved {
            self.engine.place(id, Some(cell))?;
        }
        let resized = self.resize_item(id, next_x, next_y)?;
        Ok(moved || resized)
    }

    /// End the resize gesture, re-applying the final size.
    pub fn end_resize(&mut self, id: ItemId) -> Result<()> {
        self.live()?;
        let item = self.item_ref(id)?;
        let (origin, size_x, size_y) = (item.origin(), item.size_x, item.size_y);

        self.engine.set_moving(None);
        self.engine.place(id, origin)?;
        let changed_y = self.set_size(id, Axis::Y, size_y)?;
        let changed_x = self.set_size(id, Axis::X, size_x)?;
        if changed_x != 0 || changed_y != 0 {
            self.engine.resolve_overlaps(id, &[], false)?;
            self.engine.request_layout(LayoutRequest::new(0));
        } else {
            // Release the placeholder row.
            self.engine.update_height(0, None);
        }
        Ok(())
    }

    fn clamp_to_grid(&self, row: usize, col: usize) -> Cell {
        let model = self.engine.model();
        Cell::new(
            row.min(model.max_rows().saturating_sub(1)),
            col.min(model.columns().saturating_sub(1)),
        )
    }

    /// Whether a dragged item may take a spot with `in_way` under it.
    fn may_take(&self, in_way: &[ItemId]) -> bool {
        (self.config.pushing || in_way.is_empty())
            && !in_way.iter().any(|&other| {
                self.engine
                    .model()
                    .get(other)
                    .is_some_and(GridItem::is_pinned)
            })
    }
}
