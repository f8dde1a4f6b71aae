#![forbid(unsafe_code)]

//! Notifications for the rendering layer.

use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// A point-in-time notification emitted by a [`Grid`](crate::Grid).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GridEvent {
    /// A layout pass ran; `height` is the new height in rows.
    LayoutChanged { height: usize },
    LoadedChanged { loaded: bool },
    MobileChanged { mobile: bool },
    /// An item's size changed and its neighbours were re-resolved.
    ItemResized { item: ItemId },
    /// A debounced container resize was applied.
    Resized { width: f64 },
    /// Options were merged.
    OptionsChanged,
}
