#![forbid(unsafe_code)]

//! Content measurement hook.

use crate::item::{ItemId, ItemSummary, PixelExtent};

/// Reports the rendered scroll extent of an item's content.
///
/// Returning `None` means "not measured"; the item then sizes from its
/// configured dimensions alone.
pub trait ContentProbe {
    fn measure(&self, id: ItemId, item: &ItemSummary) -> Option<PixelExtent>;
}

impl<F> ContentProbe for F
where
    F: Fn(ItemId, &ItemSummary) -> Option<PixelExtent>,
{
    fn measure(&self, id: ItemId, item: &ItemSummary) -> Option<PixelExtent> {
        self(id, item)
    }
}

/// Probe that never measures anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl ContentProbe for NoContent {
    fn measure(&self, _id: ItemId, _item: &ItemSummary) -> Option<PixelExtent> {
        None
    }
}
