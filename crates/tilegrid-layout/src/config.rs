#![forbid(unsafe_code)]

//! Grid configuration.
//!
//! [`GridConfig`] is the resolved snapshot the engine consumes. Callers that
//! only want to change a few options build a [`GridOptions`] (every field
//! optional, deserializable from JSON) and apply it with
//! [`GridConfig::merge`].
//!
//! # Merge rules
//!
//! - Top-level fields present in the options replace the current value.
//! - `draggable` / `resizable` merge field by field.
//! - Margins must have exactly two entries, otherwise they become `[0, 0]`.
//!   Each entry is read like an integer prefix (`"12px"` is 12); anything
//!   unreadable is 0.
//! - `columns` and `max_rows` never drop below 1, and `min_rows` never
//!   exceeds `max_rows`.

use serde::{Deserialize, Serialize};

/// Pixel gaps between cells, `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Margins {
    /// Vertical gap.
    pub row: i32,
    /// Horizontal gap.
    pub col: i32,
}

impl Margins {
    /// Create a margin pair.
    #[inline]
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Normalize user supplied margins.
    #[must_use]
    pub fn normalize(values: &[MarginValue]) -> Self {
        match values {
            [row, col] => Self::new(row.as_int(), col.as_int()),
            _ => Self::new(0, 0),
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

impl From<[i32; 2]> for Margins {
    fn from([row, col]: [i32; 2]) -> Self {
        Self::new(row, col)
    }
}

impl From<Margins> for [i32; 2] {
    fn from(m: Margins) -> Self {
        [m.row, m.col]
    }
}

/// A raw margin entry as it appears in an options object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarginValue {
    /// A number; fractions truncate.
    Number(f64),
    /// A string read by its integer prefix.
    Text(String),
}

impl MarginValue {
    fn as_int(&self) -> i32 {
        match self {
            Self::Number(n) if n.is_finite() => n.trunc() as i32,
            Self::Number(_) => 0,
            Self::Text(text) => parse_int_prefix(text).unwrap_or(0),
        }
    }
}

impl From<i32> for MarginValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

/// Read a leading (optionally signed) integer, skipping leading whitespace.
fn parse_int_prefix(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<i32>().ok().map(|v| sign * v)
}

/// A pixel dimension that may be derived from the container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "DimensionRepr")]
pub enum Dimension {
    /// Derived from the container.
    #[default]
    Auto,
    /// Fixed pixel value.
    Px(f64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Px(f64),
    Text(String),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = String;

    fn try_from(repr: DimensionRepr) -> Result<Self, Self::Error> {
        match repr {
            DimensionRepr::Px(px) => Ok(Self::Px(px)),
            DimensionRepr::Text(text) if text.trim() == "auto" => Ok(Self::Auto),
            DimensionRepr::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(Self::Px)
                .map_err(|_| format!("invalid dimension {text:?}")),
        }
    }
}

impl From<Dimension> for DimensionRepr {
    fn from(dim: Dimension) -> Self {
        match dim {
            Dimension::Auto => Self::Text("auto".to_string()),
            Dimension::Px(px) => Self::Px(px),
        }
    }
}

/// Configured row height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr", into = "DimensionRepr")]
pub enum RowHeight {
    /// Fixed pixel height.
    Px(f64),
    /// Same as the column width (`"match"`).
    #[default]
    Match,
    /// Column width times a factor (`"*2"`).
    Times(f64),
    /// Column width divided by a divisor (`"/2"`).
    Divide(f64),
}

impl RowHeight {
    /// Parse `"match"`, `"*N"`, `"/N"` or a pixel value.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if compact == "match" {
            return Some(Self::Match);
        }
        if let Some(factor) = compact.strip_prefix('*') {
            return factor.parse().ok().map(Self::Times);
        }
        if let Some(divisor) = compact.strip_prefix('/') {
            return divisor.parse().ok().map(Self::Divide);
        }
        compact.parse().ok().map(Self::Px)
    }
}

impl TryFrom<DimensionRepr> for RowHeight {
    type Error = String;

    fn try_from(repr: DimensionRepr) -> Result<Self, Self::Error> {
        match repr {
            DimensionRepr::Px(px) => Ok(Self::Px(px)),
            DimensionRepr::Text(text) => {
                Self::parse(&text).ok_or_else(|| format!("invalid row height {text:?}"))
            }
        }
    }
}

impl From<RowHeight> for DimensionRepr {
    fn from(height: RowHeight) -> Self {
        match height {
            RowHeight::Px(px) => Self::Px(px),
            RowHeight::Match => Self::Text("match".to_string()),
            RowHeight::Times(f) => Self::Text(format!("*{f}")),
            RowHeight::Divide(d) => Self::Text(format!("/{d}")),
        }
    }
}

/// A resize handle position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    /// Every handle, in default order.
    pub const ALL: [Self; 8] = [
        Self::S,
        Self::E,
        Self::N,
        Self::W,
        Self::SE,
        Self::NE,
        Self::SW,
        Self::NW,
    ];
}

/// Drag behaviour.
///
/// Only `enabled` is read here. The scroll and handle settings are carried
/// for the pointer layer that turns pointer motion into cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub enabled: bool,
    /// Pixels from the viewport edge at which auto-scroll starts.
    pub scroll_sensitivity: u32,
    /// Auto-scroll speed.
    pub scroll_speed: u32,
    /// Selector of the drag handle, if restricted.
    pub handle: Option<String>,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scroll_sensitivity: 20,
            scroll_speed: 15,
            handle: None,
        }
    }
}

/// Resize behaviour.
///
/// `handles` is carried for the rendering layer, which decides where resize
/// handles are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub enabled: bool,
    pub handles: Vec<ResizeHandle>,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            handles: ResizeHandle::ALL.to_vec(),
        }
    }
}

/// Resolved grid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: usize,
    /// Push overlapping items out of the way instead of blocking the move.
    pub pushing: bool,
    /// Compact items toward row 0 after each layout pass.
    pub floating: bool,
    /// Same-size items trade places instead of being pushed.
    pub swapping: bool,
    pub width: Dimension,
    pub col_width: Dimension,
    pub row_height: RowHeight,
    pub margins: Margins,
    pub outer_margin: bool,
    /// Query overlaps by scanning the item registry instead of probing cells.
    pub sparse: bool,
    pub is_mobile: bool,
    pub mobile_break_point: f64,
    pub mobile_mode_enabled: bool,
    pub min_rows: usize,
    pub max_rows: usize,
    pub default_size_x: usize,
    pub default_size_y: usize,
    pub min_size_x: Option<usize>,
    pub max_size_x: Option<usize>,
    pub min_size_y: Option<usize>,
    pub max_size_y: Option<usize>,
    /// Keep the computed item height in mobile mode (see
    /// [`Grid::item_pixel_height`](crate::Grid::item_pixel_height)).
    pub save_item_height_in_mobile: bool,
    pub resizable: ResizeConfig,
    pub draggable: DragConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 6,
            pushing: true,
            floating: true,
            swapping: false,
            width: Dimension::Auto,
            col_width: Dimension::Auto,
            row_height: RowHeight::Match,
            margins: Margins::default(),
            outer_margin: true,
            sparse: false,
            is_mobile: false,
            mobile_break_point: 600.0,
            mobile_mode_enabled: true,
            min_rows: 1,
            max_rows: 100,
            default_size_x: 2,
            default_size_y: 1,
            min_size_x: Some(1),
            max_size_x: None,
            min_size_y: Some(1),
            max_size_y: None,
            save_item_height_in_mobile: false,
            resizable: ResizeConfig::default(),
            draggable: DragConfig::default(),
        }
    }
}

impl GridConfig {
    /// Set the column count.
    #[must_use]
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    /// Set the row bounds.
    #[must_use]
    pub fn with_rows(mut self, min_rows: usize, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self.min_rows = min_rows.min(self.max_rows);
        self
    }

    /// Set the mode flags.
    #[must_use]
    pub fn with_modes(mut self, pushing: bool, floating: bool, swapping: bool) -> Self {
        self.pushing = pushing;
        self.floating = floating;
        self.swapping = swapping;
        self
    }

    /// Select the sparse query strategy.
    #[must_use]
    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Apply a partial update.
    pub fn merge(&mut self, options: GridOptions) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = options.$field { self.$field = v; })*
            };
        }
        take!(
            columns,
            pushing,
            floating,
            swapping,
            width,
            col_width,
            row_height,
            outer_margin,
            sparse,
            is_mobile,
            mobile_break_point,
            mobile_mode_enabled,
            min_rows,
            max_rows,
            default_size_x,
            default_size_y,
            min_size_x,
            max_size_x,
            min_size_y,
            max_size_y,
            save_item_height_in_mobile,
        );
        if let Some(margins) = options.margins {
            self.margins = Margins::normalize(&margins);
        }
        if let Some(drag) = options.draggable {
            if let Some(v) = drag.enabled {
                self.draggable.enabled = v;
            }
            if let Some(v) = drag.scroll_sensitivity {
                self.draggable.scroll_sensitivity = v;
            }
            if let Some(v) = drag.scroll_speed {
                self.draggable.scroll_speed = v;
            }
            if let Some(v) = drag.handle {
                self.draggable.handle = Some(v);
            }
        }
        if let Some(resize) = options.resizable {
            if let Some(v) = resize.enabled {
                self.resizable.enabled = v;
            }
            if let Some(v) = resize.handles {
                self.resizable.handles = v;
            }
        }
        self.columns = self.columns.max(1);
        self.max_rows = self.max_rows.max(1);
        self.min_rows = self.min_rows.min(self.max_rows);
    }

    /// Merged copy.
    #[must_use]
    pub fn merged(mut self, options: GridOptions) -> Self {
        self.merge(options);
        self
    }
}

/// Partial drag options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragOptions {
    pub enabled: Option<bool>,
    pub scroll_sensitivity: Option<u32>,
    pub scroll_speed: Option<u32>,
    pub handle: Option<String>,
}

/// Partial resize options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeOptions {
    pub enabled: Option<bool>,
    pub handles: Option<Vec<ResizeHandle>>,
}

/// Partial configuration, as supplied by a caller.
///
/// `min/max_size_*` use a nested `Option` so an explicit `null` can clear a
/// bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub columns: Option<usize>,
    pub pushing: Option<bool>,
    pub floating: Option<bool>,
    pub swapping: Option<bool>,
    pub width: Option<Dimension>,
    pub col_width: Option<Dimension>,
    pub row_height: Option<RowHeight>,
    pub margins: Option<Vec<MarginValue>>,
    pub outer_margin: Option<bool>,
    pub sparse: Option<bool>,
    pub is_mobile: Option<bool>,
    pub mobile_break_point: Option<f64>,
    pub mobile_mode_enabled: Option<bool>,
    pub min_rows: Option<usize>,
    pub max_rows: Option<usize>,
    pub default_size_x: Option<usize>,
    pub default_size_y: Option<usize>,
    #[serde(deserialize_with = "explicit_null")]
    pub min_size_x: Option<Option<usize>>,
    #[serde(deserialize_with = "explicit_null")]
    pub max_size_x: Option<Option<usize>>,
    #[serde(deserialize_with = "explicit_null")]
    pub min_size_y: Option<Option<usize>>,
    #[serde(deserialize_with = "explicit_null")]
    pub max_size_y: Option<Option<usize>>,
    pub save_item_height_in_mobile: Option<bool>,
    pub draggable: Option<DragOptions>,
    pub resizable: Option<ResizeOptions>,
}

/// A present key (even `null`) becomes `Some(..)`; absence stays `None`
/// through `#[serde(default)]`.
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<usize>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<usize>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let c = GridConfig::default();
        assert_eq!(c.columns, 6);
        assert!(c.pushing && c.floating && !c.swapping);
        assert_eq!(c.margins, Margins::new(10, 10));
        assert_eq!((c.min_rows, c.max_rows), (1, 100));
        assert_eq!((c.default_size_x, c.default_size_y), (2, 1));
        assert_eq!(c.resizable.handles.len(), 8);
        assert_eq!(c.draggable.scroll_sensitivity, 20);
    }

    #[test]
    fn merge_replaces_top_level_and_deep_merges_nested() {
        let mut c = GridConfig::default();
        c.merge(GridOptions {
            columns: Some(12),
            draggable: Some(DragOptions {
                enabled: Some(false),
                ..DragOptions::default()
            }),
            ..GridOptions::default()
        });
        assert_eq!(c.columns, 12);
        assert!(!c.draggable.enabled);
        assert_eq!(c.draggable.scroll_speed, 15);
        assert!(c.resizable.enabled);
    }

    #[test]
    fn malformed_margins_normalize_to_zero() {
        let mut c = GridConfig::default();
        c.merge(GridOptions {
            margins: Some(vec![MarginValue::from(5)]),
            ..GridOptions::default()
        });
        assert_eq!(c.margins, Margins::new(0, 0));

        c.merge(GridOptions {
            margins: Some(vec![
                MarginValue::Text("12px".into()),
                MarginValue::Text("wide".into()),
            ]),
            ..GridOptions::default()
        });
        assert_eq!(c.margins, Margins::new(12, 0));

        c.merge(GridOptions {
            margins: Some(vec![MarginValue::Number(7.9), MarginValue::Number(-3.2)]),
            ..GridOptions::default()
        });
        assert_eq!(c.margins, Margins::new(7, -3));
    }

    #[test]
    fn merge_keeps_bounds_consistent() {
        let mut c = GridConfig::default();
        c.merge(GridOptions {
            columns: Some(0),
            min_rows: Some(50),
            max_rows: Some(10),
            ..GridOptions::default()
        });
        assert_eq!(c.columns, 1);
        assert_eq!((c.min_rows, c.max_rows), (10, 10));
    }

    #[test]
    fn options_from_json() {
        let opts: GridOptions = serde_json::from_str(
            r#"{"columns": 8, "row_height": "*2", "margins": ["4", 6],
                "max_size_x": null, "resizable": {"handles": ["se"]}}"#,
        )
        .unwrap();
        assert_eq!(opts.max_size_x, Some(None));
        assert_eq!(opts.min_size_x, None);

        let mut c = GridConfig::default();
        c.max_size_x = Some(3);
        c.merge(opts);
        assert_eq!(c.columns, 8);
        assert_eq!(c.row_height, RowHeight::Times(2.0));
        assert_eq!(c.margins, Margins::new(4, 6));
        assert_eq!(c.max_size_x, None);
        assert_eq!(c.resizable.handles, vec![ResizeHandle::SE]);
    }

    #[test]
    fn row_height_parsing() {
        assert_eq!(RowHeight::parse("match"), Some(RowHeight::Match));
        assert_eq!(RowHeight::parse("* 3"), Some(RowHeight::Times(3.0)));
        assert_eq!(RowHeight::parse("/2"), Some(RowHeight::Divide(2.0)));
        assert_eq!(RowHeight::parse("40"), Some(RowHeight::Px(40.0)));
        assert_eq!(RowHeight::parse("tall"), None);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let c = GridConfig::default().with_columns(4).with_sparse(true);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains(r#""width":"auto""#));
        let back: GridConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
