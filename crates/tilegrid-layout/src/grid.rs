#![forbid(unsafe_code)]

//! Grid session.
//!
//! [`Grid`] ties the engine to the outside world: it resolves cell metrics
//! from the container width, measures content through a [`ContentProbe`],
//! runs coalesced layout passes, tracks the load/destroy lifecycle and queues
//! [`GridEvent`]s for the rendering layer.
//!
//! # Lifecycle
//!
//! ```text
//! Loading ──finish_loading──▶ Loaded ──destroy──▶ Destroyed
//!    └──────────────────destroy──────────────────────┘
//! ```
//!
//! While loading, placements push overlapping items down and no float pass
//! runs. Once loaded, layout passes float everything up. Every operation on a
//! destroyed grid fails with [`GridError::Destroyed`].
//!
//! # Layout passes
//!
//! Mutations only *request* a pass; [`Grid::flush`] runs it. Call `flush`
//! once per input tick.

use std::fmt;

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::config::{Dimension, GridConfig, GridOptions};
use crate::error::{GridError, MAX_FIT_ATTEMPTS, Result};
use crate::engine::PlacementEngine;
use crate::events::GridEvent;
use crate::item::{Axis, Cell, GridItem, ItemId, ItemSummary, PixelExtent, Size};
use crate::metrics::{CellMetrics, Rounding, auto_column_width, resolve_row_height};
use crate::model::Region;
use crate::probe::ContentProbe;
use crate::schedule::{Debounce, FollowUp, LayoutRequest, RESIZE_DEBOUNCE};

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridState {
    Loading,
    Loaded,
    Destroyed,
}

/// A configured grid with its items, metrics and pending notifications.
pub struct Grid {
    pub(crate) config: GridConfig,
    pub(crate) engine: PlacementEngine,
    pub(crate) state: GridState,
    pub(crate) events: Vec<GridEvent>,
    probe: Option<Box<dyn ContentProbe>>,
    metrics: Option<CellMetrics>,
    /// Width the metrics were resolved for.
    current_width: Option<f64>,
    /// Last container width seen by the resize path.
    container_width: Option<f64>,
    resize: Debounce<f64>,
    resize_in_progress: bool,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("state", &self.state)
            .field("items", &self.engine.model().len())
            .field("height", &self.engine.height())
            .field("metrics", &self.metrics)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl Grid {
    /// Create an empty grid in the loading state.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        let engine = PlacementEngine::from_config(&config);
        Self {
            config,
            engine,
            state: GridState::Loading,
            events: Vec::new(),
            probe: None,
            metrics: None,
            current_width: None,
            container_width: None,
            resize: Debounce::new(RESIZE_DEBOUNCE),
            resize_in_progress: false,
        }
    }

    /// Attach a content probe.
    #[must_use]
    pub fn with_probe(mut self, probe: impl ContentProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    // ── State ───────────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    #[inline]
    pub fn engine(&self) -> &PlacementEngine {
        &self.engine
    }

    #[inline]
    pub fn state(&self) -> GridState {
        self.state
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.state == GridState::Loaded
    }

    #[inline]
    pub fn is_mobile(&self) -> bool {
        self.config.is_mobile
    }

    #[inline]
    pub fn metrics(&self) -> Option<&CellMetrics> {
        self.metrics.as_ref()
    }

    #[inline]
    pub fn current_width(&self) -> Option<f64> {
        self.current_width
    }

    /// Grid height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.engine.height()
    }

    /// Grid height in pixels, once metrics are known.
    pub fn pixel_height(&self) -> Option<f64> {
        self.metrics
            .map(|m| m.grid_pixel_height(self.engine.height()))
    }

    /// Pixel height of an item's box.
    ///
    /// `None` means the content decides: the item is `Auto` tall, or the grid
    /// is in mobile mode and `save_item_height_in_mobile` is off. Also `None`
    /// before metrics are known.
    pub fn item_pixel_height(&self, id: ItemId) -> Option<f64> {
        let item = self.item(id)?;
        if item.size_y.is_auto() || (self.config.is_mobile && !self.config.save_item_height_in_mobile) {
            return None;
        }
        let metrics = self.metrics.as_ref()?;
        let rows = item.effective_size_y(Some(metrics));
        Some(rows as f64 * metrics.row_height - f64::from(metrics.margins.row))
    }

    /// Take queued notifications.
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub(crate) fn live(&self) -> Result<()> {
        if self.state == GridState::Destroyed {
            Err(GridError::Destroyed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn item_ref(&self, id: ItemId) -> Result<&GridItem> {
        self.engine.model().get(id).ok_or(GridError::UnknownItem(id))
    }

    /// Whether drag gestures are currently allowed.
    pub fn can_drag(&self) -> bool {
        !self.config.is_mobile && self.config.draggable.enabled
    }

    /// Whether resize gestures are currently allowed.
    pub fn can_resize(&self) -> bool {
        !self.config.is_mobile && self.config.resizable.enabled
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Merge options, re-apply bounds and refresh metrics.
    pub fn set_options(&mut self, options: GridOptions) -> Result<()> {
        self.live()?;
        let floating = self.config.floating;
        self.config.merge(options);
        self.engine.configure(&self.config);
        self.refresh(None);
        self.emit(GridEvent::OptionsChanged);
        if self.is_loaded() && floating != self.config.floating {
            self.engine.float_all_up()?;
        }
        Ok(())
    }

    /// Leave the loading state and compact the layout.
    pub fn finish_loading(&mut self) -> Result<()> {
        self.live()?;
        if self.state == GridState::Loaded {
            return Ok(());
        }
        self.state = GridState::Loaded;
        self.engine.set_loaded(true);
        #[cfg(feature = "tracing")]
        debug!(items = self.engine.model().len(), "grid loaded");
        self.emit(GridEvent::LoadedChanged { loaded: true });
        self.engine.float_all_up()
    }

    /// Drop every item; the grid is unusable afterwards.
    pub fn destroy(&mut self) {
        if self.state == GridState::Destroyed {
            return;
        }
        #[cfg(feature = "tracing")]
        debug!(items = self.engine.model().len(), "grid destroyed");
        self.engine.clear();
        self.probe = None;
        self.state = GridState::Destroyed;
    }

    /// Resolve cell metrics for a container width.
    ///
    /// A configured pixel width takes precedence over the container. Returns
    /// `false` when no width is known.
    pub fn refresh(&mut self, container_width: Option<f64>) -> bool {
        if self.state == GridState::Destroyed {
            return false;
        }
        let width = match self.config.width {
            Dimension::Px(px) => Some(px),
            Dimension::Auto => container_width.or(self.current_width),
        };
        let Some(width) = width.filter(|w| *w > 0.0) else {
            return false;
        };
        self.current_width = Some(width);

        let col_width = match self.config.col_width {
            Dimension::Auto => auto_column_width(
                width,
                self.config.columns,
                self.config.margins,
                self.config.outer_margin,
            ),
            Dimension::Px(px) => px,
        };
        let metrics = CellMetrics {
            col_width,
            row_height: resolve_row_height(self.config.row_height, col_width),
            margins: self.config.margins,
            outer_margin: self.config.outer_margin,
        };
        self.metrics = Some(metrics);
        self.engine.model_mut().set_metrics(Some(metrics));

        let mobile = self.config.mobile_mode_enabled && width <= self.config.mobile_break_point;
        if mobile != self.config.is_mobile {
            self.config.is_mobile = mobile;
            self.emit(GridEvent::MobileChanged { mobile });
        }
        true
    }

    /// Record a container width change; applied by [`poll_resize`](Self::poll_resize)
    /// once the input has been quiet for the debounce window.
    pub fn notify_container_width(&mut self, width: f64, now: Instant) {
        self.resize.trigger(width, now);
        self.resize_in_progress = true;
    }

    /// Apply a debounced container resize. Returns whether metrics changed.
    pub fn poll_resize(&mut self, now: Instant) -> Result<bool> {
        self.live()?;
        let Some(width) = self.resize.poll(now) else {
            return Ok(false);
        };
        self.resize_in_progress = false;
        if width <= 0.0
            || self.container_width == Some(width)
            || self.engine.moving_item().is_some()
        {
            return Ok(false);
        }
        self.container_width = Some(width);
        if !self.refresh(Some(width)) {
            return Ok(false);
        }
        self.emit(GridEvent::Resized { width });
        Ok(true)
    }

    #[inline]
    pub fn is_resize_in_progress(&self) -> bool {
        self.resize_in_progress
    }

    // ── Scheduling ──────────────────────────────────────────────────────

    /// Ask for a layout pass reserving `delta` extra rows.
    pub fn request_layout(&mut self, delta: isize) -> bool {
        self.engine.request_layout(LayoutRequest::new(delta))
    }

    /// Run the pending layout pass, if any, plus at most one follow-up.
    pub fn flush(&mut self) -> Result<bool> {
        self.live()?;
        let Some(request) = self.engine.scheduler_mut().begin() else {
            return Ok(false);
        };
        let height = self.run_pass(request.delta)?;
        if let Some(FollowUp::ReserveIfUnchanged {
            previous_height,
            rows,
        }) = request.follow_up
            && height == previous_height
            && self.engine.request_layout(LayoutRequest::new(rows))
            && let Some(next) = self.engine.scheduler_mut().begin()
        {
            self.run_pass(next.delta)?;
        }
        Ok(true)
    }

    fn run_pass(&mut self, delta: isize) -> Result<usize> {
        let floated = if self.engine.is_loaded() {
            self.engine.float_all_up()
        } else {
            Ok(())
        };
        let height = self.engine.update_height(delta, None);
        self.engine.scheduler_mut().finish();
        floated?;
        #[cfg(feature = "tracing")]
        trace!(delta, height, "layout pass");
        self.emit(GridEvent::LayoutChanged { height });
        Ok(height)
    }

    // ── Items ───────────────────────────────────────────────────────────

    /// A fresh item with the configured default size.
    #[must_use]
    pub fn new_item(&self) -> GridItem {
        GridItem::new(self.config.default_size_x, self.config.default_size_y)
    }

    /// Add an item, clamp its size and place it (auto-placed when it has no
    /// position).
    pub fn add_item(&mut self, item: GridItem) -> Result<ItemId> {
        self.live()?;
        let target = item.origin();
        let (size_x, size_y) = (item.size_x, item.size_y);
        let id = self.engine.insert(item);
        self.remeasure(id)?;
        self.set_size(id, Axis::X, size_x)?;
        self.set_size(id, Axis::Y, size_y)?;
        let placed = match target {
            Some(cell) => self.engine.place(id, Some(cell)),
            None => self.engine.auto_place(id).map(|_| ()),
        };
        if let Err(err) = placed {
            let _ = self.engine.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Add a batch of persisted items in order.
    pub fn load(&mut self, summaries: &[ItemSummary]) -> Result<Vec<ItemId>> {
        summaries
            .iter()
            .map(|&summary| self.add_item(GridItem::from_summary(summary)))
            .collect()
    }

    /// Remove an item and schedule a layout pass.
    pub fn remove_item(&mut self, id: ItemId) -> Result<GridItem> {
        self.live()?;
        self.engine.remove(id)
    }

    #[inline]
    pub fn item(&self, id: ItemId) -> Option<&GridItem> {
        self.engine.model().get(id)
    }

    /// Placed items with their summaries, row-major.
    pub fn placed(&self) -> Vec<(ItemId, ItemSummary)> {
        let model = self.engine.model();
        model
            .placed_row_major()
            .into_iter()
            .filter_map(|id| model.get(id)?.summary().map(|s| (id, s)))
            .collect()
    }

    /// Persisted form of every placed item, row-major.
    pub fn summaries(&self) -> Vec<ItemSummary> {
        self.placed().into_iter().map(|(_, s)| s).collect()
    }

    /// Effective footprint of an item.
    pub fn region(&self, id: ItemId) -> Option<Region> {
        self.engine.model().region_of(id)
    }

    // ── Placement (delegated) ───────────────────────────────────────────

    /// Move an item to `(row, col)`, pushing or making room as needed.
    pub fn move_item(&mut self, id: ItemId, row: usize, col: usize) -> Result<()> {
        self.live()?;
        self.engine.place(id, Some(Cell::new(row, col)))
    }

    pub fn place(&mut self, id: ItemId, target: Option<Cell>, ignore: &[ItemId], is_drop: bool) -> Result<()> {
        self.live()?;
        self.engine.place_with(id, target, ignore, is_drop)
    }

    pub fn auto_place(&mut self, id: ItemId) -> Result<Cell> {
        self.live()?;
        self.engine.auto_place(id)
    }

    pub fn resolve_overlaps(&mut self, id: ItemId) -> Result<()> {
        self.live()?;
        self.engine.resolve_overlaps(id, &[], false)
    }

    pub fn swap(&mut self, a: ItemId, b: ItemId) -> Result<()> {
        self.live()?;
        self.engine.swap(a, b)
    }

    pub fn float_all_up(&mut self) -> Result<()> {
        self.live()?;
        self.engine.float_all_up()
    }

    pub fn update_height(&mut self, delta: isize, item: Option<ItemId>) -> Result<usize> {
        self.live()?;
        Ok(self.engine.update_height(delta, item))
    }

    pub fn items_in(&self, row: usize, col: usize, size_x: usize, size_y: usize, excluding: &[ItemId]) -> Vec<ItemId> {
        self.engine.model().items_in(row, col, size_x, size_y, excluding)
    }

    pub fn bounding_box(&self, ids: &[ItemId]) -> Option<Region> {
        self.engine.model().bounding_box(ids)
    }

    pub fn pixels_to_rows(&self, pixels: f64, rounding: Rounding, for_drag: bool) -> Option<i64> {
        self.metrics
            .map(|m| m.pixels_to_rows(pixels, rounding, for_drag))
    }

    pub fn pixels_to_columns(&self, pixels: f64, rounding: Rounding) -> Option<i64> {
        self.metrics.map(|m| m.pixels_to_columns(pixels, rounding))
    }

    // ── Sizing ──────────────────────────────────────────────────────────

    /// Store a content measurement.
    pub fn set_content_extent(&mut self, id: ItemId, extent: Option<PixelExtent>) -> Result<()> {
        self.live()?;
        let entry = self
            .engine
            .model_mut()
            .get_mut(id)
            .ok_or(GridError::UnknownItem(id))?;
        entry.content = extent;
        Ok(())
    }

    /// Re-measure an item through the probe, if one is attached.
    pub fn remeasure(&mut self, id: ItemId) -> Result<()> {
        let item = self.item_ref(id)?;
        let Some(probe) = self.probe.as_ref() else {
            return Ok(());
        };
        let summary = ItemSummary {
            row: item.row().unwrap_or(0),
            col: item.col().unwrap_or(0),
            size_x: item.size_x,
            size_y: item.size_y,
        };
        let extent = probe.measure(id, &summary);
        self.set_content_extent(id, extent)
    }

    /// Validate and store one size axis.
    ///
    /// `Fixed(0)` falls back to the configured default. Content larger than
    /// the requested size wins. The value is clamped by the intersection of
    /// item and grid bounds. Returns the signed change against the stored
    /// size, or against the last validated value when the stored size is
    /// unchanged or `Auto`.
    pub fn set_size(&mut self, id: ItemId, axis: Axis, size: Size) -> Result<isize> {
        self.live()?;
        let item = self.item_ref(id)?;
        let content = item
            .content_cells(axis, self.metrics.as_ref())
            .unwrap_or(0);
        let (default, grid_min, grid_max, limit) = match axis {
            Axis::X => (
                self.config.default_size_x,
                self.config.min_size_x,
                self.config.max_size_x,
                self.config.columns,
            ),
            Axis::Y => (
                self.config.default_size_y,
                self.config.min_size_y,
                self.config.max_size_y,
                self.config.max_rows,
            ),
        };

        let mut value = match size {
            Size::Auto => content,
            Size::Fixed(0) => default.max(content),
            Size::Fixed(n) => n.max(content),
        };
        if axis == Axis::X {
            let col = item.col().unwrap_or(0);
            if col + value > self.config.columns {
                value = self.config.columns.saturating_sub(col);
            }
        }

        let positive = |bound: Option<usize>| bound.filter(|&b| b > 0);
        let mut max = limit;
        if let Some(m) = positive(item.max_size(axis)) {
            max = max.min(m);
        }
        if let Some(m) = positive(grid_max) {
            max = max.min(m);
        }
        let mut min = 0;
        if let Some(m) = positive(item.min_size(axis)) {
            min = min.max(m);
        }
        if let Some(m) = positive(grid_min) {
            min = min.max(m);
        }
        let value = value.min(max).max(min);

        let last = match axis {
            Axis::X => item.last_size_x,
            Axis::Y => item.last_size_y,
        };
        let mut changed = match item.size(axis) {
            Size::Fixed(stored) => value as isize - stored as isize,
            Size::Auto => 0,
        };
        if changed == 0
            && let Some(last) = last
        {
            changed = value as isize - last as isize;
        }

        let entry = self
            .engine
            .model_mut()
            .get_mut(id)
            .ok_or(GridError::UnknownItem(id))?;
        *entry.last_size_mut(axis) = Some(value);
        if !size.is_auto() {
            entry.set_size(axis, Size::Fixed(value));
        }
        Ok(changed)
    }

    /// [`set_size`](Self::set_size) from user input; empty input is ignored.
    pub fn set_size_str(&mut self, id: ItemId, axis: Axis, input: &str) -> Result<Option<isize>> {
        match Size::parse(input) {
            Some(size) => self.set_size(id, axis, size).map(Some),
            None => Ok(None),
        }
    }

    /// Change an item's configured size and re-resolve its neighbours.
    ///
    /// Returns whether anything changed. During a gesture the requested
    /// layout pass reserves the added rows (one placeholder row when
    /// shrinking).
    pub fn resize_item(&mut self, id: ItemId, size_x: Size, size_y: Size) -> Result<bool> {
        self.live()?;
        let (old_x, old_y) = {
            let item = self.item_ref(id)?;
            (item.size_x, item.size_y)
        };
        if let Some(entry) = self.engine.model_mut().get_mut(id) {
            entry.size_x = size_x;
            entry.size_y = size_y;
        }
        let changed_x = self.set_size(id, Axis::X, size_x)? != 0 || old_x.is_auto() != size_x.is_auto();
        let delta_y = self.set_size(id, Axis::Y, size_y)?;
        let changed_y = delta_y != 0 || old_y.is_auto() != size_y.is_auto();
        if !(changed_x || changed_y) {
            return Ok(false);
        }

        if self.engine.moving_item().is_some() {
            let mut request = LayoutRequest::new(if delta_y > 0 { delta_y } else { 1 });
            if delta_y > 0 {
                request = request.with_follow_up(FollowUp::ReserveIfUnchanged {
                    previous_height: self.engine.height(),
                    rows: delta_y + 1,
                });
            }
            self.engine.request_layout(request);
        } else {
            self.engine.request_layout(LayoutRequest::new(0));
        }
        self.engine.resolve_overlaps(id, &[], false)?;
        self.emit(GridEvent::ItemResized { item: id });
        Ok(true)
    }

    /// Grow an item's height until its content fits horizontally.
    ///
    /// Skipped while a gesture, a layout pass or a container resize is in
    /// flight. Returns whether the item was adjusted.
    pub fn fit_content(&mut self, id: ItemId) -> Result<bool> {
        self.live()?;
        self.remeasure(id)?;
        if self.engine.moving_item().is_some()
            || self.engine.scheduler().is_busy()
            || self.resize_in_progress
            || !self.overflows(id)?
        {
            return Ok(false);
        }

        let mut attempts = 0;
        while attempts < MAX_FIT_ATTEMPTS && self.overflows(id)? {
            attempts += 1;
            let item = self.item_ref(id)?;
            let next = match item.size_y {
                Size::Fixed(n) => n + 1,
                Size::Auto => item.effective_size_y(self.metrics.as_ref()) + 1,
            };
            self.set_size(id, Axis::Y, Size::Fixed(next))?;
            self.remeasure(id)?;
        }
        if attempts >= MAX_FIT_ATTEMPTS {
            #[cfg(feature = "tracing")]
            warn!(item = %id, attempts, "content keeps outgrowing its columns");
            return Err(GridError::RunawayGrowth { item: id, attempts });
        }

        self.engine.request_layout(LayoutRequest::new(0));
        self.engine.resolve_overlaps(id, &[], false)?;
        self.emit(GridEvent::ItemResized { item: id });
        Ok(true)
    }

    fn overflows(&self, id: ItemId) -> Result<bool> {
        let item = self.item_ref(id)?;
        let content = item
            .content_cells(Axis::X, self.metrics.as_ref())
            .unwrap_or(0);
        Ok(content + item.col().unwrap_or(0) > self.config.columns)
    }
}
