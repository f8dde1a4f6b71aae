#![forbid(unsafe_code)]

//! Occupancy model.
//!
//! [`GridModel`] owns every item and the occupancy map. Only an item's origin
//! cell stores its id; the rest of its footprint is implied by its size, so a
//! point query has to look up and to the left for an origin whose extent
//! reaches the probed cell.
//!
//! # Invariants
//!
//! 1. Each id appears in at most one occupancy cell, the item's committed cell.
//! 2. The registry lists every item that has ever been assigned a cell and not
//!    been removed, in first-placement order, without duplicates.
//! 3. Unoccupied rows and cells are absent keys, never placeholders.
//!
//! Overlap between items is allowed here; resolving it is the engine's job.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::item::{Cell, GridItem, ItemId};
use crate::metrics::CellMetrics;

/// A rectangle in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub row: usize,
    pub col: usize,
    pub size_x: usize,
    pub size_y: usize,
}

impl Region {
    /// Create a region.
    #[inline]
    #[must_use]
    pub const fn new(row: usize, col: usize, size_x: usize, size_y: usize) -> Self {
        Self {
            row,
            col,
            size_x,
            size_y,
        }
    }

    /// One past the last row.
    #[inline]
    pub const fn bottom(&self) -> usize {
        self.row + self.size_y
    }

    /// One past the last column.
    #[inline]
    pub const fn right(&self) -> usize {
        self.col + self.size_x
    }

    /// Whether two regions share at least one cell.
    #[inline]
    pub const fn intersects(&self, other: &Region) -> bool {
        self.col < other.right()
            && other.col < self.right()
            && self.row < other.bottom()
            && other.row < self.bottom()
    }
}

/// Item store, occupancy map and registry for one grid.
#[derive(Debug, Clone)]
pub struct GridModel {
    items: FxHashMap<ItemId, GridItem>,
    /// row -> col -> item whose origin is that cell.
    occupancy: BTreeMap<usize, BTreeMap<usize, ItemId>>,
    registry: Vec<ItemId>,
    next_id: u32,
    columns: usize,
    max_rows: usize,
    sparse: bool,
    metrics: Option<CellMetrics>,
}

impl Default for GridModel {
    fn default() -> Self {
        Self::new(6, 100)
    }
}

impl GridModel {
    /// Create an empty model.
    #[must_use]
    pub fn new(columns: usize, max_rows: usize) -> Self {
        Self {
            items: FxHashMap::default(),
            occupancy: BTreeMap::new(),
            registry: Vec::new(),
            next_id: 0,
            columns: columns.max(1),
            max_rows: max_rows.max(1),
            sparse: false,
            metrics: None,
        }
    }

    /// Select the sparse query strategy.
    #[must_use]
    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    #[inline]
    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    /// Replace the bounds and query strategy.
    pub fn set_bounds(&mut self, columns: usize, max_rows: usize, sparse: bool) {
        self.columns = columns.max(1);
        self.max_rows = max_rows.max(1);
        self.sparse = sparse;
    }

    /// Cell dimensions used to convert measured content into cells.
    #[inline]
    pub fn metrics(&self) -> Option<&CellMetrics> {
        self.metrics.as_ref()
    }

    pub fn set_metrics(&mut self, metrics: Option<CellMetrics>) {
        self.metrics = metrics;
    }

    // ── Item store ──────────────────────────────────────────────────────

    /// Take ownership of an item without placing it.
    pub fn insert(&mut self, item: GridItem) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        // Committed cells belong to this model only.
        let mut item = item;
        item.committed = None;
        self.items.insert(id, item);
        id
    }

    #[inline]
    pub fn get(&self, id: ItemId) -> Option<&GridItem> {
        self.items.get(&id)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: ItemId) -> Option<&mut GridItem> {
        self.items.get_mut(&id)
    }

    #[inline]
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of stored items, placed or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Registered ids in first-placement order.
    #[inline]
    pub fn registry(&self) -> &[ItemId] {
        &self.registry
    }

    /// Effective `(size_x, size_y)` of an item.
    pub fn size_of(&self, id: ItemId) -> Option<(usize, usize)> {
        self.items.get(&id).map(|item| self.sizes(item))
    }

    fn sizes(&self, item: &GridItem) -> (usize, usize) {
        let metrics = self.metrics.as_ref();
        (
            item.effective_size_x(self.columns, metrics),
            item.effective_size_y(metrics),
        )
    }

    /// Footprint of a positioned item.
    pub fn region_of(&self, id: ItemId) -> Option<Region> {
        let item = self.items.get(&id)?;
        let origin = item.origin?;
        let (size_x, size_y) = self.sizes(item);
        Some(Region::new(origin.row, origin.col, size_x, size_y))
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// The item covering `(row, col)`, skipping `excluding`.
    ///
    /// Scans origins upward and leftward, accepting the first whose extent
    /// reaches the probed cell.
    pub fn occupant_at(&self, row: usize, col: usize, excluding: &[ItemId]) -> Option<ItemId> {
        for (&r, cols) in self.occupancy.range(..=row).rev() {
            let span_y = row - r + 1;
            for (&c, &id) in cols.range(..=col).rev() {
                if excluding.contains(&id) {
                    continue;
                }
                let Some((size_x, size_y)) = self.size_of(id) else {
                    continue;
                };
                if size_x > col - c && size_y >= span_y {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Distinct items overlapping the rectangle, skipping `excluding`.
    ///
    /// A zero extent on either axis queries a single cell.
    pub fn items_in(
        &self,
        row: usize,
        col: usize,
        size_x: usize,
        size_y: usize,
        excluding: &[ItemId],
    ) -> Vec<ItemId> {
        let (size_x, size_y) = if size_x == 0 || size_y == 0 {
            (1, 1)
        } else {
            (size_x, size_y)
        };
        let mut found = Vec::new();
        if self.sparse {
            let probe = Region::new(row, col, size_x, size_y);
            for &id in &self.registry {
                if excluding.contains(&id) || found.contains(&id) {
                    continue;
                }
                if self.region_of(id).is_some_and(|r| r.intersects(&probe)) {
                    found.push(id);
                }
            }
        } else {
            for r in row..row + size_y {
                for c in col..col + size_x {
                    if let Some(id) = self.occupant_at(r, c, excluding)
                        && !found.contains(&id)
                    {
                        found.push(id);
                    }
                }
            }
        }
        found
    }

    /// Smallest rectangle covering all given items; `None` when empty.
    pub fn bounding_box(&self, ids: &[ItemId]) -> Option<Region> {
        let mut regions = ids.iter().filter_map(|&id| self.region_of(id));
        let first = regions.next()?;
        let (mut top, mut left, mut bottom, mut right) =
            (first.row, first.col, first.bottom(), first.right());
        for r in regions {
            top = top.min(r.row);
            left = left.min(r.col);
            bottom = bottom.max(r.bottom());
            right = right.max(r.right());
        }
        Some(Region::new(top, left, right - left, bottom - top))
    }

    /// Whether a `size_x` × `size_y` item fits inside the grid at `(row, col)`.
    #[inline]
    pub fn can_occupy(&self, size_x: usize, size_y: usize, row: usize, col: usize) -> bool {
        col + size_x <= self.columns && row + size_y <= self.max_rows
    }

    /// Whether the occupancy cell holds `id`.
    pub fn cell_holds(&self, cell: Cell, id: ItemId) -> bool {
        self.occupancy
            .get(&cell.row)
            .and_then(|cols| cols.get(&cell.col))
            .is_some_and(|&held| held == id)
    }

    /// Occupied origin cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Cell, ItemId)> + '_ {
        self.occupancy.iter().flat_map(|(&row, cols)| {
            cols.iter().map(move |(&col, &id)| (Cell::new(row, col), id))
        })
    }

    /// Positioned items ordered by origin, row-major.
    pub fn placed_row_major(&self) -> Vec<ItemId> {
        let mut placed: Vec<(Cell, ItemId)> = self
            .registry
            .iter()
            .filter_map(|&id| self.items.get(&id)?.origin.map(|cell| (cell, id)))
            .collect();
        placed.sort_unstable();
        placed.into_iter().map(|(_, id)| id).collect()
    }

    /// First pair of overlapping positioned items, row-major.
    ///
    /// The first element of the pair precedes the second in row-major order.
    pub fn first_overlap(&self) -> Option<(ItemId, ItemId)> {
        let ordered: Vec<(ItemId, Region)> = self
            .placed_row_major()
            .into_iter()
            .filter_map(|id| self.region_of(id).map(|r| (id, r)))
            .collect();
        for (i, (a, ra)) in ordered.iter().enumerate() {
            for (b, rb) in &ordered[i + 1..] {
                if ra.intersects(rb) {
                    return Some((*a, *b));
                }
            }
        }
        None
    }

    /// [`first_overlap`](Self::first_overlap) restricted to pairs where at
    /// least one item is in `ids`.
    pub fn first_overlap_among(&self, ids: &[ItemId]) -> Option<(ItemId, ItemId)> {
        let placed: Vec<((Cell, ItemId), Region)> = self
            .registry
            .iter()
            .filter_map(|&id| {
                let cell = self.items.get(&id)?.origin?;
                Some(((cell, id), self.region_of(id)?))
            })
            .collect();
        let mut best: Option<((Cell, ItemId), (Cell, ItemId))> = None;
        for (ka, ra) in placed.iter().filter(|((_, id), _)| ids.contains(id)) {
            for (kb, rb) in &placed {
                if ka.1 == kb.1 || !ra.intersects(rb) {
                    continue;
                }
                let pair = if ka < kb { (*ka, *kb) } else { (*kb, *ka) };
                if best.is_none_or(|b| pair < b) {
                    best = Some(pair);
                }
            }
        }
        best.map(|((_, a), (_, b))| (a, b))
    }

    /// Highest row extent over occupied cells, with the item's effective
    /// height adjusted by `adjust`.
    pub(crate) fn occupied_extent(&self, mut adjust: impl FnMut(ItemId, usize) -> isize) -> isize {
        let mut extent = 0isize;
        for (cell, id) in self.occupied() {
            let Some((_, size_y)) = self.size_of(id) else {
                continue;
            };
            let row = isize::try_from(cell.row).unwrap_or(isize::MAX);
            extent = extent.max(row.saturating_add(adjust(id, size_y)));
        }
        extent
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Clear the item's committed occupancy cell, if it still holds the item.
    pub fn detach(&mut self, id: ItemId) {
        let Some(cell) = self.items.get(&id).and_then(|item| item.committed) else {
            return;
        };
        self.clear_cell(cell, id);
    }

    fn clear_cell(&mut self, cell: Cell, id: ItemId) {
        if let Some(cols) = self.occupancy.get_mut(&cell.row) {
            if cols.get(&cell.col) == Some(&id) {
                cols.remove(&cell.col);
            }
            if cols.is_empty() {
                self.occupancy.remove(&cell.row);
            }
        }
    }

    /// Write the item at `cell` without resolving overlaps.
    ///
    /// Clears its previous cell, records `cell` as both position and
    /// committed position, and registers the item.
    pub fn assign(&mut self, id: ItemId, cell: Cell) {
        if !self.items.contains_key(&id) {
            return;
        }
        self.detach(id);
        self.occupancy
            .entry(cell.row)
            .or_default()
            .insert(cell.col, id);
        if let Some(item) = self.items.get_mut(&id) {
            item.origin = Some(cell);
            item.committed = Some(cell);
        }
        if !self.registry.contains(&id) {
            self.registry.push(id);
        }
    }

    /// Exchange the cells and positions of two placed items.
    pub fn swap(&mut self, a: ItemId, b: ItemId) {
        let (Some(ca), Some(cb)) = (
            self.items.get(&a).and_then(|i| i.origin),
            self.items.get(&b).and_then(|i| i.origin),
        ) else {
            return;
        };
        self.detach(a);
        self.detach(b);
        self.occupancy.entry(cb.row).or_default().insert(cb.col, a);
        self.occupancy.entry(ca.row).or_default().insert(ca.col, b);
        if let Some(item) = self.items.get_mut(&a) {
            item.origin = Some(cb);
            item.committed = Some(cb);
        }
        if let Some(item) = self.items.get_mut(&b) {
            item.origin = Some(ca);
            item.committed = Some(ca);
        }
    }

    /// Remove an item: clear its occupancy cell, deregister it and return it.
    pub fn remove(&mut self, id: ItemId) -> Option<GridItem> {
        let row_hit = self
            .occupancy
            .iter()
            .find_map(|(&row, cols)| {
                cols.iter()
                    .find(|&(_, &held)| held == id)
                    .map(|(&col, _)| Cell::new(row, col))
            });
        if let Some(cell) = row_hit {
            self.clear_cell(cell, id);
        }
        self.registry.retain(|&held| held != id);
        self.items.remove(&id)
    }

    /// Drop every item and cell.
    pub fn clear(&mut self) {
        self.items.clear();
        self.occupancy.clear();
        self.registry.clear();
    }
}
