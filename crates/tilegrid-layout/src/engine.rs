#![forbid(unsafe_code)]

//! Placement engine.
//!
//! [`PlacementEngine`] owns the [`GridModel`] and implements every mutation
//! that moves items: auto-placement, placement with overlap resolution,
//! cascading push-down, swapping and float-up compaction.
//!
//! # Execution model
//!
//! Overlap resolution is naturally recursive: placing an item pushes the
//! items under it down one row at a time, each of which may push further
//! items. Here that recursion is an explicit LIFO worklist of [`Job`]s, so
//! the depth of a cascade never touches the call stack and its total work is
//! bounded by a budget. Jobs are pushed in reverse so they pop in the order a
//! recursive walk would visit them.
//!
//! # Invariants
//!
//! After every public mutation returns `Ok`, positioned items do not overlap
//! and each lies within `[0, max_rows) × [0, columns)`. Column-grouped pushes
//! can occasionally leave two pushed items overlapping, so every mutation ends
//! with a settle sweep that pushes the later of any overlapping pair below
//! the earlier one. The sweep only looks at items the mutation moved, unless
//! the model was edited directly since the last sweep.
//!
//! A mutation that fails leaves the model and the pending layout request as
//! they were before the call.
//!
//! # Failure Modes
//!
//! | Condition | Result |
//! |-----------|--------|
//! | No cell fits an auto-placed item | [`GridError::NoFreeCell`] |
//! | Cascade exceeds its budget (grid too small) | [`GridError::CascadeLimit`] |
//! | Unknown id | [`GridError::UnknownItem`] |

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::item::{Cell, GridItem, ItemId};
use crate::model::GridModel;
use crate::schedule::{LayoutRequest, LayoutScheduler};

/// Items excluded from overlap queries while a cascade is in flight.
pub type IgnoreSet = SmallVec<[ItemId; 8]>;

/// Floor for the per-mutation work budget.
const MIN_CASCADE_BUDGET: usize = 10_000;

#[derive(Debug, Clone)]
enum Job {
    /// Move an item to `target` (its own position, or auto-placement, when
    /// `None`), resolving overlaps at the new position.
    Place {
        item: ItemId,
        target: Option<Cell>,
        ignore: IgnoreSet,
        is_drop: bool,
    },
    /// Write the item's occupancy cell once its overlaps are resolved.
    Commit { item: ItemId },
    /// Push away everything overlapping the item.
    Resolve {
        item: ItemId,
        ignore: IgnoreSet,
        is_drop: bool,
    },
    /// Move an item down to `target_row`; no-op if it is already there or
    /// below.
    MoveDown {
        item: ItemId,
        target_row: usize,
        ignore: IgnoreSet,
    },
    /// One row of a downward move toward `target_row`.
    Step {
        item: ItemId,
        target_row: usize,
        ignore: IgnoreSet,
    },
}

impl Job {
    fn item(&self) -> ItemId {
        match self {
            Self::Place { item, .. }
            | Self::Commit { item }
            | Self::Resolve { item, .. }
            | Self::MoveDown { item, .. }
            | Self::Step { item, .. } => *item,
        }
    }
}

/// Placement, collision resolution and compaction over a [`GridModel`].
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    model: GridModel,
    pushing: bool,
    floating: bool,
    swapping: bool,
    min_rows: usize,
    /// The item currently dragged or resized, if any.
    moving: Option<ItemId>,
    loaded: bool,
    scheduler: LayoutScheduler,
    height: usize,
    /// Set when the model changed outside a cascade; the next sweep checks
    /// every pair.
    unsettled: bool,
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::from_config(&GridConfig::default())
    }
}

impl PlacementEngine {
    /// Wrap an existing model, using default mode flags.
    #[must_use]
    pub fn new(model: GridModel) -> Self {
        let defaults = GridConfig::default();
        Self {
            model,
            pushing: defaults.pushing,
            floating: defaults.floating,
            swapping: defaults.swapping,
            min_rows: defaults.min_rows,
            moving: None,
            loaded: false,
            scheduler: LayoutScheduler::new(),
            height: defaults.min_rows,
            unsettled: false,
        }
    }

    /// Empty engine configured from `config`.
    #[must_use]
    pub fn from_config(config: &GridConfig) -> Self {
        let mut engine = Self::new(GridModel::new(config.columns, config.max_rows));
        engine.configure(config);
        engine
    }

    /// Apply bounds and mode flags from `config`.
    pub fn configure(&mut self, config: &GridConfig) {
        self.model
            .set_bounds(config.columns, config.max_rows, config.sparse);
        self.pushing = config.pushing;
        self.floating = config.floating;
        self.swapping = config.swapping;
        self.min_rows = config.min_rows.min(self.model.max_rows());
        self.height = self.height.clamp(self.min_rows, self.model.max_rows());
        self.unsettled = true;
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[inline]
    pub fn model(&self) -> &GridModel {
        &self.model
    }

    #[inline]
    pub(crate) fn model_mut(&mut self) -> &mut GridModel {
        self.unsettled = true;
        &mut self.model
    }

    /// Current grid height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn min_rows(&self) -> usize {
        self.min_rows
    }

    #[inline]
    pub fn is_pushing(&self) -> bool {
        self.pushing
    }

    #[inline]
    pub fn is_floating(&self) -> bool {
        self.floating
    }

    #[inline]
    pub fn is_swapping(&self) -> bool {
        self.swapping
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Once loaded, programmatic placements make room above instead of
    /// pushing down.
    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    /// The item currently dragged or resized.
    #[inline]
    pub fn moving_item(&self) -> Option<ItemId> {
        self.moving
    }

    #[inline]
    pub fn is_moving(&self, id: ItemId) -> bool {
        self.moving == Some(id)
    }

    /// Start or end an interactive gesture.
    pub fn set_moving(&mut self, id: Option<ItemId>) {
        self.moving = id;
    }

    #[inline]
    pub fn scheduler(&self) -> &LayoutScheduler {
        &self.scheduler
    }

    #[inline]
    pub(crate) fn scheduler_mut(&mut self) -> &mut LayoutScheduler {
        &mut self.scheduler
    }

    /// Ask for a coalesced layout pass.
    pub fn request_layout(&mut self, request: LayoutRequest) -> bool {
        self.scheduler.request(request)
    }

    fn ensure(&self, id: ItemId) -> Result<()> {
        if self.model.contains(id) {
            Ok(())
        } else {
            Err(GridError::UnknownItem(id))
        }
    }

    // ── Store ───────────────────────────────────────────────────────────

    /// Store an item without placing it.
    pub fn insert(&mut self, item: GridItem) -> ItemId {
        self.model.insert(item)
    }

    /// Remove an item and schedule a layout pass.
    pub fn remove(&mut self, id: ItemId) -> Result<GridItem> {
        let item = self.model.remove(id).ok_or(GridError::UnknownItem(id))?;
        if self.moving == Some(id) {
            self.moving = None;
        }
        self.scheduler.request(LayoutRequest::new(0));
        Ok(item)
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.model.clear();
        self.moving = None;
        self.scheduler.cancel();
        self.height = self.min_rows;
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// First free cell for `id`, scanning row-major from the top-left.
    pub fn find_free_cell(&self, id: ItemId) -> Result<Cell> {
        let (size_x, size_y) = self.model.size_of(id).ok_or(GridError::UnknownItem(id))?;
        for row in 0..self.model.max_rows() {
            for col in 0..self.model.columns() {
                if self.model.can_occupy(size_x, size_y, row, col)
                    && self.model.items_in(row, col, size_x, size_y, &[id]).is_empty()
                {
                    return Ok(Cell::new(row, col));
                }
            }
        }
        Err(GridError::NoFreeCell { size_x, size_y })
    }

    /// Place `id` in the first free cell.
    pub fn auto_place(&mut self, id: ItemId) -> Result<Cell> {
        let cell = self.find_free_cell(id)?;
        #[cfg(feature = "tracing")]
        debug!(item = %id, row = cell.row, col = cell.col, "auto placed");
        self.run(vec![Job::Place {
            item: id,
            target: Some(cell),
            ignore: IgnoreSet::new(),
            is_drop: false,
        }])?;
        self.model
            .get(id)
            .and_then(GridItem::origin)
            .ok_or(GridError::UnknownItem(id))
    }

    /// Place `id` at `target`, or at its current position, or auto-placed
    /// when it has none.
    pub fn place(&mut self, id: ItemId, target: Option<Cell>) -> Result<()> {
        self.place_with(id, target, &[], false)
    }

    /// [`place`](Self::place) with an ignore set and drop flag.
    ///
    /// A drop always pushes overlapping items down, even after loading.
    pub fn place_with(
        &mut self,
        id: ItemId,
        target: Option<Cell>,
        ignore: &[ItemId],
        is_drop: bool,
    ) -> Result<()> {
        self.ensure(id)?;
        self.run(vec![Job::Place {
            item: id,
            target,
            ignore: ignore.iter().copied().collect(),
            is_drop,
        }])
    }

    /// Push everything overlapping `id` out of its way.
    pub fn resolve_overlaps(&mut self, id: ItemId, ignore: &[ItemId], is_drop: bool) -> Result<()> {
        self.ensure(id)?;
        self.run(vec![Job::Resolve {
            item: id,
            ignore: ignore.iter().copied().collect(),
            is_drop,
        }])
    }

    /// Move `ids` down so the top of each column group lands on `target_row`.
    pub fn move_items_down(&mut self, ids: &[ItemId], target_row: usize, ignore: &[ItemId]) -> Result<()> {
        for &id in ids {
            self.ensure(id)?;
        }
        let mut jobs = Vec::new();
        let ignore: IgnoreSet = ignore.iter().copied().collect();
        self.push_move_down(&mut jobs, ids, target_row, &ignore);
        self.run(jobs)
    }

    /// Move `id` down to `target_row`, one row at a time.
    pub fn move_item_down(&mut self, id: ItemId, target_row: usize, ignore: &[ItemId]) -> Result<()> {
        self.ensure(id)?;
        if self.model.get(id).and_then(GridItem::row).is_none_or(|row| row >= target_row) {
            return Ok(());
        }
        self.run(vec![Job::Step {
            item: id,
            target_row,
            ignore: ignore.iter().copied().collect(),
        }])
    }

    /// Exchange the positions of two placed items.
    pub fn swap(&mut self, a: ItemId, b: ItemId) -> Result<()> {
        self.ensure(a)?;
        self.ensure(b)?;
        self.model.swap(a, b);
        self.unsettled = true;
        Ok(())
    }

    /// Move `id` up as far as its column span stays clear.
    pub fn float_up(&mut self, id: ItemId) -> Result<()> {
        self.ensure(id)?;
        let Some(cell) = self.float_target(id) else {
            return Ok(());
        };
        self.run(vec![Job::Place {
            item: id,
            target: Some(cell),
            ignore: IgnoreSet::new(),
            is_drop: false,
        }])
    }

    /// Float every placed item, row-major.
    pub fn float_all_up(&mut self) -> Result<()> {
        if !self.floating {
            return Ok(());
        }
        let ids: Vec<ItemId> = self.model.occupied().map(|(_, id)| id).collect();
        for id in ids {
            if self.model.contains(id) {
                self.float_up(id)?;
            }
        }
        Ok(())
    }

    fn float_target(&self, id: ItemId) -> Option<Cell> {
        if !self.floating {
            return None;
        }
        let region = self.model.region_of(id)?;
        let mut best = None;
        let mut row = region.row;
        while row > 0 {
            row -= 1;
            if !self
                .model
                .items_in(row, region.col, region.size_x, region.size_y, &[id])
                .is_empty()
            {
                break;
            }
            best = Some(Cell::new(row, region.col));
        }
        best
    }

    /// Recompute the grid height from occupied cells.
    ///
    /// A positive `delta` reserves extra rows below every item. A negative
    /// `delta` shrinks only `item`; without an item its magnitude is added
    /// instead. The result is clamped to `[min_rows, max_rows]`.
    pub fn update_height(&mut self, delta: isize, item: Option<ItemId>) -> usize {
        let extent = match (delta < 0, item) {
            (false, _) => self.model.occupied_extent(|_, size_y| delta + size_y as isize),
            (true, Some(target)) => self.model.occupied_extent(|id, size_y| {
                if id == target {
                    delta + size_y as isize
                } else {
                    size_y as isize
                }
            }),
            (true, None) => {
                #[cfg(feature = "tracing")]
                warn!(delta, "negative height delta without an item");
                self.model
                    .occupied_extent(|_, size_y| delta.saturating_neg() + size_y as isize)
            }
        };
        let raw = usize::try_from(extent).unwrap_or(0);
        self.height = raw.min(self.model.max_rows()).max(self.min_rows);
        self.height
    }

    // ── Worklist ────────────────────────────────────────────────────────

    fn budget(&self) -> usize {
        let n = self.model.len().saturating_add(1);
        n.saturating_mul(n)
            .saturating_mul(self.model.max_rows().saturating_add(1))
            .saturating_mul(4)
            .max(MIN_CASCADE_BUDGET)
    }

    fn run(&mut self, seed: Vec<Job>) -> Result<()> {
        let before = self.model.clone();
        let scheduler = self.scheduler.clone();
        match self.cascade(seed, &before) {
            Ok(()) => {
                self.unsettled = false;
                Ok(())
            }
            Err(err) => {
                self.model = before;
                self.scheduler = scheduler;
                Err(err)
            }
        }
    }

    fn cascade(&mut self, seed: Vec<Job>, before: &GridModel) -> Result<()> {
        let budget = self.budget();
        let mut spent = 0;
        let seeds: IgnoreSet = seed.iter().map(Job::item).collect();
        let mut stack = seed;
        self.drain(&mut stack, &mut spent, budget)?;
        self.settle(&mut stack, &mut spent, budget, &seeds, before)
    }

    fn drain(&mut self, stack: &mut Vec<Job>, spent: &mut usize, budget: usize) -> Result<()> {
        while let Some(job) = stack.pop() {
            *spent += 1;
            if *spent > budget {
                #[cfg(feature = "tracing")]
                warn!(budget, pending = stack.len(), "overlap cascade exceeded budget");
                return Err(GridError::CascadeLimit { budget });
            }
            self.execute(job, stack)?;
        }
        Ok(())
    }

    /// Push the later item of every overlapping pair below the earlier one.
    fn settle(
        &mut self,
        stack: &mut Vec<Job>,
        spent: &mut usize,
        budget: usize,
        seeds: &[ItemId],
        before: &GridModel,
    ) -> Result<()> {
        loop {
            let overlap = if self.unsettled {
                self.model.first_overlap()
            } else {
                let touched = self.touched_since(before, seeds);
                self.model.first_overlap_among(&touched)
            };
            let Some((above, below)) = overlap else {
                break;
            };
            let Some(region) = self.model.region_of(above) else {
                break;
            };
            stack.push(Job::Step {
                item: below,
                target_row: region.bottom(),
                ignore: IgnoreSet::from_slice(&[above]),
            });
            self.drain(stack, spent, budget)?;
        }
        Ok(())
    }

    /// Seed items plus every item whose position or committed cell differs
    /// from `before`.
    fn touched_since(&self, before: &GridModel, seeds: &[ItemId]) -> Vec<ItemId> {
        let mut touched: Vec<ItemId> = seeds.to_vec();
        for &id in self.model.registry() {
            if touched.contains(&id) {
                continue;
            }
            let now = self.model.get(id).map(|item| (item.origin, item.committed));
            let then = before.get(id).map(|item| (item.origin, item.committed));
            if now != then {
                touched.push(id);
            }
        }
        touched
    }

    fn execute(&mut self, job: Job, stack: &mut Vec<Job>) -> Result<()> {
        match job {
            Job::Place {
                item,
                target,
                ignore,
                is_drop,
            } => self.exec_place(item, target, ignore, is_drop, stack),
            Job::Commit { item } => {
                self.exec_commit(item, stack);
                Ok(())
            }
            Job::Resolve {
                item,
                ignore,
                is_drop,
            } => {
                self.exec_resolve(item, &ignore, is_drop, stack);
                Ok(())
            }
            Job::MoveDown {
                item,
                target_row,
                ignore,
            } => {
                if self
                    .model
                    .get(item)
                    .and_then(GridItem::row)
                    .is_some_and(|row| row < target_row)
                {
                    stack.push(Job::Step {
                        item,
                        target_row,
                        ignore,
                    });
                }
                Ok(())
            }
            Job::Step {
                item,
                target_row,
                ignore,
            } => {
                let Some(entry) = self.model.get_mut(item) else {
                    return Ok(());
                };
                let Some(origin) = entry.origin.as_mut() else {
                    return Ok(());
                };
                if origin.row < target_row {
                    origin.row += 1;
                    stack.push(Job::Step {
                        item,
                        target_row,
                        ignore: ignore.clone(),
                    });
                    stack.push(Job::Resolve {
                        item,
                        ignore,
                        is_drop: false,
                    });
                } else {
                    let cell = *origin;
                    stack.push(Job::Place {
                        item,
                        target: Some(cell),
                        ignore,
                        is_drop: false,
                    });
                }
                Ok(())
            }
        }
    }

    fn exec_place(
        &mut self,
        item: ItemId,
        target: Option<Cell>,
        ignore: IgnoreSet,
        is_drop: bool,
        stack: &mut Vec<Job>,
    ) -> Result<()> {
        let current = self.model.get(item).ok_or(GridError::UnknownItem(item))?;
        let mut target = match target.or(current.origin) {
            Some(cell) => cell,
            None => {
                let cell = self.find_free_cell(item)?;
                #[cfg(feature = "tracing")]
                debug!(item = %item, row = cell.row, col = cell.col, "auto placed");
                cell
            }
        };
        let (size_x, size_y) = self.model.size_of(item).unwrap_or((1, 1));
        if !self.model.can_occupy(size_x, size_y, target.row, target.col) {
            target.col = target.col.min(self.model.columns().saturating_sub(size_x));
            target.row = target.row.min(self.model.max_rows().saturating_sub(size_y));
        }

        let committed = self.model.get(item).and_then(GridItem::committed);
        if committed == Some(target) && self.model.cell_holds(target, item) {
            if let Some(entry) = self.model.get_mut(item) {
                entry.origin = Some(target);
            }
            return Ok(());
        }

        self.model.detach(item);
        if let Some(entry) = self.model.get_mut(item) {
            entry.origin = Some(target);
            entry.committed = Some(target);
        }
        stack.push(Job::Commit { item });
        stack.push(Job::Resolve {
            item,
            ignore,
            is_drop,
        });
        Ok(())
    }

    fn exec_commit(&mut self, item: ItemId, stack: &mut Vec<Job>) {
        // A cascade may have moved the item since its placement began; commit
        // wherever it is now.
        let Some(origin) = self.model.get(item).and_then(GridItem::origin) else {
            return;
        };
        self.model.assign(item, origin);

        let delta = self
            .moving
            .and_then(|id| self.model.size_of(id))
            .map_or(0, |(_, size_y)| size_y as isize);
        self.scheduler.request(LayoutRequest::new(delta));

        if self.moving == Some(item)
            && let Some(cell) = self.float_target(item)
        {
            stack.push(Job::Place {
                item,
                target: Some(cell),
                ignore: IgnoreSet::new(),
                is_drop: false,
            });
        }
    }

    fn exec_resolve(&mut self, item: ItemId, ignore: &IgnoreSet, is_drop: bool, stack: &mut Vec<Job>) {
        let Some(region) = self.model.region_of(item) else {
            return;
        };
        let mut widened = ignore.clone();
        if !widened.contains(&item) {
            widened.push(item);
        }
        let overlapping =
            self.model
                .items_in(region.row, region.col, region.size_x, region.size_y, &widened);

        if self.loaded && self.moving != Some(item) && !is_drop {
            // Make room above: settle the lowest overlapping item that starts
            // above this one instead of pushing everything down.
            let mut top: Option<(ItemId, usize)> = None;
            for &other in &overlapping {
                let Some(row) = self.model.get(other).and_then(GridItem::row) else {
                    continue;
                };
                if row < region.row && top.is_none_or(|(_, best)| row > best) {
                    top = Some((other, row));
                }
            }
            if let Some((top, _)) = top {
                let narrowed: IgnoreSet = ignore.iter().copied().filter(|&id| id != item).collect();
                stack.push(Job::Resolve {
                    item: top,
                    ignore: narrowed,
                    is_drop: false,
                });
                if let Some(entry) = self.model.get_mut(item) {
                    entry.rendered = true;
                }
                return;
            }
        }

        self.push_move_down(stack, &overlapping, region.bottom(), &widened);
    }

    /// Queue moves for `ids` so each column group's top lands on
    /// `target_row`, keeping offsets within a group.
    ///
    /// Targets are fixed before any item moves, so an item already carried
    /// down by an earlier move in the batch is not moved again.
    fn push_move_down(&self, stack: &mut Vec<Job>, ids: &[ItemId], target_row: usize, ignore: &IgnoreSet) {
        let mut items: Vec<(ItemId, Cell)> = ids
            .iter()
            .filter_map(|&id| self.model.get(id)?.origin.map(|cell| (id, cell)))
            .collect();
        if items.is_empty() {
            return;
        }
        items.sort_by_key(|(_, cell)| cell.row);

        let mut top_rows: FxHashMap<usize, usize> = FxHashMap::default();
        for (_, cell) in &items {
            top_rows
                .entry(cell.col)
                .and_modify(|top| *top = (*top).min(cell.row))
                .or_insert(cell.row);
        }

        let mut jobs = Vec::with_capacity(items.len());
        let mut running = ignore.clone();
        for &(id, cell) in &items {
            let top = top_rows.get(&cell.col).copied().unwrap_or(cell.row);
            jobs.push(Job::MoveDown {
                item: id,
                target_row: (cell.row + target_row).saturating_sub(top),
                ignore: running.clone(),
            });
            running.push(id);
        }
        stack.extend(jobs.into_iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Axis, Size};

    fn engine() -> PlacementEngine {
        PlacementEngine::from_config(&GridConfig::default().with_rows(1, 100))
    }

    fn add_at(engine: &mut PlacementEngine, row: usize, col: usize, sx: usize, sy: usize) -> ItemId {
        let id = engine.insert(GridItem::new(sx, sy));
        engine.place(id, Some(Cell::new(row, col))).unwrap();
        id
    }

    fn origin(engine: &PlacementEngine, id: ItemId) -> Cell {
        engine.model().get(id).and_then(GridItem::origin).unwrap()
    }

    fn assert_no_overlap(engine: &PlacementEngine) {
        assert_eq!(engine.model().first_overlap(), None);
    }

    #[test]
    fn auto_place_is_row_major_first_fit() {
        let mut e = engine();
        let a = e.insert(GridItem::new(2, 1));
        let b = e.insert(GridItem::new(2, 1));
        assert_eq!(e.auto_place(a).unwrap(), Cell::new(0, 0));
        assert_eq!(e.auto_place(b).unwrap(), Cell::new(0, 2));
    }

    #[test]
    fn place_without_position_auto_places() {
        let mut e = engine();
        add_at(&mut e, 0, 0, 6, 1);
        let b = e.insert(GridItem::new(1, 1));
        e.place(b, None).unwrap();
        assert_eq!(origin(&e, b), Cell::new(1, 0));
    }

    #[test]
    fn auto_place_fails_when_full() {
        let mut e = PlacementEngine::from_config(&GridConfig::default().with_columns(2).with_rows(1, 1));
        add_at(&mut e, 0, 0, 2, 1);
        let b = e.insert(GridItem::new(1, 1));
        assert_eq!(
            e.auto_place(b),
            Err(GridError::NoFreeCell { size_x: 1, size_y: 1 })
        );
    }

    #[test]
    fn drop_pushes_overlapped_item_below() {
        let mut e = engine();
        let a = add_at(&mut e, 0, 0, 2, 2);
        let b = e.insert(GridItem::new(2, 1));
        e.place_with(b, Some(Cell::new(0, 0)), &[], true).unwrap();
        assert_eq!(origin(&e, b), Cell::new(0, 0));
        assert_eq!(origin(&e, a), Cell::new(1, 0));
        assert_no_overlap(&e);
    }

    #[test]
    fn push_cascades_through_a_column() {
        let mut e = engine();
        let a = add_at(&mut e, 0, 0, 1, 1);
        let b = add_at(&mut e, 1, 0, 1, 1);
        let c = add_at(&mut e, 2, 0, 1, 1);
        let d = e.insert(GridItem::new(1, 2));
        e.place(d, Some(Cell::new(0, 0))).unwrap();
        assert_eq!(origin(&e, d), Cell::new(0, 0));
        assert_eq!(origin(&e, a), Cell::new(2, 0));
        assert_eq!(origin(&e, b), Cell::new(3, 0));
        assert_eq!(origin(&e, c), Cell::new(4, 0));
    }

    #[test]
    fn push_keeps_offsets_within_column_group() {
        let mut e = engine();
        let a = add_at(&mut e, 0, 0, 1, 1);
        let b = add_at(&mut e, 2, 0, 1, 1);
        let wide = e.insert(GridItem::new(1, 3));
        e.move_items_down(&[a, b], 4, &[wide]).unwrap();
        let (ra, rb) = (origin(&e, a).row, origin(&e, b).row);
        assert_eq!(ra, 4);
        assert_eq!(rb - ra, 2);
    }

    #[test]
    fn drop_on_staggered_group_leaves_no_overlap() {
        let mut e = engine();
        let s = add_at(&mut e, 0, 0, 2, 1);
        let a = add_at(&mut e, 1, 1, 1, 1);
        let b = e.insert(GridItem::new(2, 2));
        e.place_with(b, Some(Cell::new(0, 0)), &[], true).unwrap();
        assert_eq!(origin(&e, b), Cell::new(0, 0));
        assert!(origin(&e, s).row >= 2);
        assert!(origin(&e, a).row >= 2);
        assert_no_overlap(&e);
    }

    #[test]
    fn placing_twice_is_a_no_op() {
        let mut e = engine();
        let a = add_at(&mut e, 0, 0, 2, 1);
        let b = add_at(&mut e, 1, 0, 2, 1);
        e.place(a, Some(Cell::new(0, 0))).unwrap();
        e.place(a, Some(Cell::new(0, 0))).unwrap();
        assert_eq!(origin(&e, b), Cell::new(1, 0));
    }

    #[test]
    fn out_of_bounds_target_is_clamped() {
        let mut e = engine();
        let a = e.insert(GridItem::new(3, 2));
        e.place(a, Some(Cell::new(150, 5))).unwrap();
        assert_eq!(origin(&e, a), Cell::new(98, 3));
    }

    #[test]
    fn float_all_up_compacts_and_converges() {
        let mut e = engine();
        let a = add_at(&mut e, 4, 0, 2, 1);
        let b = add_at(&mut e, 7, 1, 2, 2);
        e.float_all_up().unwrap();
        assert_eq!(origin(&e, a), Cell::new(0, 0));
        assert_eq!(origin(&e, b), Cell::new(1, 1));
        e.float_all_up().unwrap();
        assert_eq!(origin(&e, b), Cell::new(1, 1));
    }

    #[test]
    fn float_disabled_keeps_positions() {
        let mut e = PlacementEngine::from_config(&GridConfig::default().with_modes(true, false, false));
        let a = add_at(&mut e, 4, 0, 1, 1);
        e.float_all_up().unwrap();
        assert_eq!(origin(&e, a), Cell::new(4, 0));
    }

    #[test]
    fn swap_trades_positions() {
        let mut e = engine();
        let a = add_at(&mut e, 0, 0, 2, 1);
        let b = add_at(&mut e, 0, 2, 2, 1);
        e.swap(a, b).unwrap();
        assert_eq!(origin(&e, a), Cell::new(0, 2));
        assert_eq!(origin(&e, b), Cell::new(0, 0));
        assert!(e.model().cell_holds(Cell::new(0, 2), a));
    }

    #[test]
    fn loaded_placement_makes_room_above() {
        let mut e = engine();
        let tall = add_at(&mut e, 0, 0, 1, 2);
        e.set_loaded(true);
        let x = e.insert(GridItem::new(1, 1));
        e.place(x, Some(Cell::new(1, 0))).unwrap();
        assert!(e.model().get(x).unwrap().is_rendered());
        assert_eq!(origin(&e, tall), Cell::new(0, 0));
        assert_eq!(origin(&e, x), Cell::new(2, 0));
        assert_no_overlap(&e);
    }

    #[test]
    fn moving_item_floats_on_commit() {
        let mut e = engine();
        let a = add_at(&mut e, 3, 0, 1, 1);
        e.set_moving(Some(a));
        e.place(a, Some(Cell::new(5, 0))).unwrap();
        assert_eq!(origin(&e, a), Cell::new(0, 0));
    }

    #[test]
    fn height_tracks_occupied_extent() {
        let mut e = engine();
        assert_eq!(e.update_height(0, None), 1);
        let a = add_at(&mut e, 0, 0, 1, 3);
        add_at(&mut e, 1, 1, 1, 1);
        assert_eq!(e.update_height(0, None), 3);
        assert_eq!(e.update_height(2, None), 5);
        assert_eq!(e.update_height(-2, Some(a)), 2);
        assert_eq!(e.update_height(-2, None), 5);
    }

    #[test]
    fn height_clamped_to_max_rows() {
        let mut e = PlacementEngine::from_config(&GridConfig::default().with_rows(4, 10));
        add_at(&mut e, 8, 0, 1, 2);
        assert_eq!(e.update_height(5, None), 10);
        e.clear();
        assert_eq!(e.update_height(0, None), 4);
    }

    #[test]
    fn placements_request_a_single_pass() {
        let mut e = engine();
        add_at(&mut e, 0, 0, 1, 1);
        add_at(&mut e, 0, 1, 1, 1);
        assert!(e.scheduler().is_pending());
        assert!(e.scheduler().dropped() >= 1);
    }

    #[test]
    fn unknown_item_is_rejected() {
        let mut e = engine();
        let a = e.insert(GridItem::new(1, 1));
        e.remove(a).unwrap();
        assert_eq!(e.place(a, None), Err(GridError::UnknownItem(a)));
        assert_eq!(e.remove(a).unwrap_err(), GridError::UnknownItem(a));
    }

    #[test]
    fn failed_cascade_restores_the_model() {
        let mut e = PlacementEngine::from_config(&GridConfig::default().with_columns(1).with_rows(1, 3));
        let column: Vec<ItemId> = (0..3).map(|row| add_at(&mut e, row, 0, 1, 1)).collect();
        let extra = e.insert(GridItem::new(1, 1));

        let err = e.place_with(extra, Some(Cell::new(0, 0)), &[], true).unwrap_err();
        assert!(matches!(err, GridError::CascadeLimit { .. }), "{err:?}");

        for (row, &id) in column.iter().enumerate() {
            let cell = Cell::new(row, 0);
            let item = e.model().get(id).unwrap();
            assert_eq!(item.origin(), Some(cell));
            assert_eq!(item.committed(), Some(cell));
            assert!(e.model().cell_holds(cell, id));
        }
        assert_eq!(e.model().get(extra).and_then(GridItem::committed), None);
        assert!(!e.model().registry().contains(&extra));
        assert!(matches!(e.auto_place(extra), Err(GridError::NoFreeCell { .. })));
        assert_no_overlap(&e);
    }

    #[test]
    fn direct_edits_get_a_full_settle() {
        let mut e = engine();
        let a = add_at(&mut e, 0, 0, 2, 1);
        let b = add_at(&mut e, 0, 2, 2, 1);
        let c = add_at(&mut e, 3, 0, 1, 1);
        // Widen `a` behind the engine's back so it overlaps `b`.
        if let Some(item) = e.model_mut().get_mut(a) {
            item.set_size(Axis::X, Size::Fixed(3));
        }
        e.place(c, Some(Cell::new(5, 0))).unwrap();
        assert_eq!(origin(&e, a), Cell::new(0, 0));
        assert_eq!(origin(&e, b), Cell::new(1, 2));
        assert_no_overlap(&e);
    }
}
