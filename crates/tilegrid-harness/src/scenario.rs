#![forbid(unsafe_code)]

//! Scenario format.
//!
//! A scenario is JSONL: one [`Step`] per line, tagged by `op`. Blank lines
//! and lines starting with `#` or `//` are skipped. Items are referred to by
//! the name given in their `add` step.
//!
//! ```text
//! {"op":"add","name":"a","size_x":2,"size_y":1}
//! {"op":"add","name":"b","size_x":2,"size_y":2,"row":0,"col":0}
//! {"op":"expect","positions":{"a":[2,0],"b":[0,0]},"height":3}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tilegrid_layout::{GridOptions, ItemSummary, Size};

use crate::error::{HarnessError, Result};

/// One scenario step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Merge grid options.
    Config { options: GridOptions },
    /// Leave the loading state.
    Loaded,
    /// Add an item; auto-placed unless both `row` and `col` are given.
    Add {
        name: String,
        #[serde(default)]
        size_x: Option<Size>,
        #[serde(default)]
        size_y: Option<Size>,
        #[serde(default)]
        row: Option<usize>,
        #[serde(default)]
        col: Option<usize>,
    },
    /// Move an item, pushing whatever is in the way.
    Place { name: String, row: usize, col: usize },
    /// Move an item to the first free cell.
    AutoPlace { name: String },
    Remove { name: String },
    /// Change an item's configured size.
    Resize { name: String, size_x: Size, size_y: Size },
    /// Drag an item along `path` and drop it on the last cell.
    Drag { name: String, path: Vec<[usize; 2]> },
    /// Resize through the gesture path.
    DragResize {
        name: String,
        row: usize,
        col: usize,
        size_x: usize,
        size_y: usize,
    },
    /// Add a batch of persisted items.
    Load { items: Vec<NamedSummary> },
    /// Request a layout pass reserving `delta` rows and run it.
    Flush {
        #[serde(default)]
        delta: isize,
    },
    /// Float every item up.
    Float,
    /// Check the current layout.
    Expect(Expectation),
}

/// A persisted item with its scenario name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSummary {
    pub name: String,
    pub row: usize,
    pub col: usize,
    pub size_x: Size,
    pub size_y: Size,
}

impl NamedSummary {
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            row: self.row,
            col: self.col,
            size_x: self.size_x,
            size_y: self.size_y,
        }
    }
}

/// Assertions of an `expect` step. Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectation {
    /// Layout checksum as 16 hex digits.
    pub checksum: Option<String>,
    pub height: Option<usize>,
    /// Origins of named items as `[row, col]`.
    pub positions: Option<BTreeMap<String, [usize; 2]>>,
    /// Every placed item, row-major.
    pub summaries: Option<Vec<ItemSummary>>,
}

/// Parse a scenario into `(line, step)` pairs; lines are 1-based.
pub fn parse_scenario(source: &str) -> Result<Vec<(usize, Step)>> {
    let mut steps = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }
        let step = serde_json::from_str(trimmed).map_err(|err| HarnessError::Parse {
            line: idx + 1,
            message: err.to_string(),
        })?;
        steps.push((idx + 1, step));
    }
    if steps.is_empty() {
        return Err(HarnessError::Empty);
    }
    Ok(steps)
}
