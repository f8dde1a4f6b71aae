#![forbid(unsafe_code)]

//! Coalesced layout passes and debouncing.
//!
//! Every placement asks for a layout pass (float everything up, recompute the
//! height). A burst of placements inside one interaction must produce a single
//! pass, so [`LayoutScheduler`] keeps at most one request: while a pass is
//! pending or running, further requests are dropped. The owner decides when
//! to run the pass, typically once at the end of an input tick.
//!
//! [`Debounce`] covers container resizes: the latest value wins and fires
//! only after the input has been quiet for the configured window. Time is
//! passed in by the caller, so tests drive it with synthetic instants.

use web_time::{Duration, Instant};

/// Quiet window for container resize notifications.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Work to perform after a pass, depending on its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// If the pass left the height at `previous_height`, request another pass
    /// reserving `rows` extra rows.
    ReserveIfUnchanged {
        previous_height: usize,
        rows: isize,
    },
}

/// A requested layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRequest {
    /// Height delta handed to the height recompute.
    pub delta: isize,
    pub follow_up: Option<FollowUp>,
}

impl LayoutRequest {
    #[inline]
    #[must_use]
    pub const fn new(delta: isize) -> Self {
        Self {
            delta,
            follow_up: None,
        }
    }

    #[must_use]
    pub const fn with_follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}

/// Single-slot layout pass scheduler.
#[derive(Debug, Clone, Default)]
pub struct LayoutScheduler {
    pending: Option<LayoutRequest>,
    running: bool,
    dropped: u64,
}

impl LayoutScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a pass. Returns `false` if it was dropped because one is already
    /// pending or running.
    pub fn request(&mut self, request: LayoutRequest) -> bool {
        if self.pending.is_some() || self.running {
            self.dropped += 1;
            return false;
        }
        self.pending = Some(request);
        true
    }

    /// Take the pending request and mark the pass as running.
    pub fn begin(&mut self) -> Option<LayoutRequest> {
        let request = self.pending.take()?;
        self.running = true;
        Some(request)
    }

    /// Mark the running pass as complete.
    pub fn finish(&mut self) {
        self.running = false;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a pass is pending or running.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.running
    }

    /// Requests dropped so far.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Forget any pending pass.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.running = false;
    }
}

/// Trailing-edge debouncer.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record a value; restarts the quiet window.
    pub fn trigger(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Emit the latest value once the window has elapsed since the last
    /// trigger.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let (_, at) = self.pending.as_ref()?;
        if now.saturating_duration_since(*at) < self.window {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl<T> Default for Debounce<T> {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}
