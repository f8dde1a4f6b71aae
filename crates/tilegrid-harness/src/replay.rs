#![forbid(unsafe_code)]

//! Scenario replay.
//!
//! [`Replayer`] drives a [`Grid`] through scenario steps. After every step it
//! runs the pending layout pass, checks that no two items overlap and
//! updates a checksum of the layout. The checksum is FNV-1a over the
//! row-major item summaries, so two runs of the same scenario agree exactly.
//!
//! Designed for CI use: non-interactive, bounded, and deterministic.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use tilegrid_layout::{Axis, Cell, Grid, GridConfig, GridError, GridItem, ItemId, ItemSummary, Size};

use crate::error::{HarnessError, Result};
use crate::scenario::{Expectation, Step, parse_scenario};

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// `Auto` sizes hash as this value.
const AUTO_SIZE_TAG: u64 = u64::MAX;

fn fnv1a_update(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(FNV_PRIME);
    }
}

fn size_word(size: Size) -> u64 {
    match size {
        Size::Fixed(n) => n as u64,
        Size::Auto => AUTO_SIZE_TAG,
    }
}

/// FNV-1a checksum of a row-major summary list.
pub fn layout_checksum(summaries: &[ItemSummary]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    fnv1a_update(&mut hash, &(summaries.len() as u64).to_le_bytes());
    for s in summaries {
        fnv1a_update(&mut hash, &(s.row as u64).to_le_bytes());
        fnv1a_update(&mut hash, &(s.col as u64).to_le_bytes());
        fnv1a_update(&mut hash, &size_word(s.size_x).to_le_bytes());
        fnv1a_update(&mut hash, &size_word(s.size_y).to_le_bytes());
    }
    hash
}

/// Result summary for a replay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub items: usize,
    pub height: usize,
    pub checksum: u64,
}

/// Applies scenario steps to a grid.
#[derive(Debug)]
pub struct Replayer {
    grid: Grid,
    names: BTreeMap<String, ItemId>,
    steps: usize,
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl Replayer {
    pub fn new(config: GridConfig) -> Self {
        Self {
            grid: Grid::new(config),
            names: BTreeMap::new(),
            steps: 0,
        }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Id of a named item.
    pub fn id(&self, name: &str) -> Option<ItemId> {
        self.names.get(name).copied()
    }

    pub fn checksum(&self) -> u64 {
        layout_checksum(&self.grid.summaries())
    }

    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            steps: self.steps,
            items: self.grid.engine().model().len(),
            height: self.grid.height(),
            checksum: self.checksum(),
        }
    }

    /// Apply one step read from scenario line `line`.
    pub fn apply(&mut self, line: usize, step: &Step) -> Result<()> {
        let grid_err = |source: GridError| HarnessError::Grid { line, source };
        trace!(line, ?step, "step");

        match step {
            Step::Config { options } => self.grid.set_options(options.clone()).map_err(grid_err)?,
            Step::Loaded => self.grid.finish_loading().map_err(grid_err)?,
            Step::Add {
                name,
                size_x,
                size_y,
                row,
                col,
            } => {
                if self.names.contains_key(name) {
                    return Err(HarnessError::DuplicateName {
                        line,
                        name: name.clone(),
                    });
                }
                let defaults = self.grid.new_item();
                let mut item = GridItem::new(1, 1).with_size(
                    size_x.unwrap_or(defaults.size(Axis::X)),
                    size_y.unwrap_or(defaults.size(Axis::Y)),
                );
                if let (Some(row), Some(col)) = (row, col) {
                    item = item.at(*row, *col);
                }
                let id = self.grid.add_item(item).map_err(grid_err)?;
                self.names.insert(name.clone(), id);
            }
            Step::Place { name, row, col } => {
                let id = self.lookup(line, name)?;
                self.grid.move_item(id, *row, *col).map_err(grid_err)?;
            }
            Step::AutoPlace { name } => {
                let id = self.lookup(line, name)?;
                self.grid.auto_place(id).map_err(grid_err)?;
            }
            Step::Remove { name } => {
                let id = self.lookup(line, name)?;
                self.grid.remove_item(id).map_err(grid_err)?;
                self.names.remove(name);
            }
            Step::Resize {
                name,
                size_x,
                size_y,
            } => {
                let id = self.lookup(line, name)?;
                self.grid.resize_item(id, *size_x, *size_y).map_err(grid_err)?;
            }
            Step::Drag { name, path } => {
                let id = self.lookup(line, name)?;
                if self.grid.begin_drag(id).map_err(grid_err)? {
                    // Each pointer move is its own input tick.
                    for &[row, col] in path {
                        self.grid.drag_to(id, row, col).map_err(grid_err)?;
                        self.grid.flush().map_err(grid_err)?;
                    }
                    let drop = match path.last() {
                        Some(&[row, col]) => Cell::new(row, col),
                        None => self
                            .grid
                            .item(id)
                            .and_then(GridItem::origin)
                            .unwrap_or(Cell::new(0, 0)),
                    };
                    self.grid.end_drag(id, drop.row, drop.col).map_err(grid_err)?;
                }
            }
            Step::DragResize {
                name,
                row,
                col,
                size_x,
                size_y,
            } => {
                let id = self.lookup(line, name)?;
                if self.grid.begin_resize(id).map_err(grid_err)? {
                    self.grid
                        .resize_to(id, *row, *col, *size_x, *size_y)
                        .map_err(grid_err)?;
                    self.grid.flush().map_err(grid_err)?;
                    self.grid.end_resize(id).map_err(grid_err)?;
                }
            }
            Step::Load { items } => {
                if let Some(dup) = items.iter().find(|i| self.names.contains_key(&i.name)) {
                    return Err(HarnessError::DuplicateName {
                        line,
                        name: dup.name.clone(),
                    });
                }
                let summaries: Vec<ItemSummary> = items.iter().map(|i| i.summary()).collect();
                let ids = self.grid.load(&summaries).map_err(grid_err)?;
                for (item, id) in items.iter().zip(ids) {
                    self.names.insert(item.name.clone(), id);
                }
            }
            Step::Flush { delta } => {
                self.grid.request_layout(*delta);
            }
            Step::Float => self.grid.float_all_up().map_err(grid_err)?,
            Step::Expect(expectation) => self.check(line, expectation)?,
        }

        self.grid.flush().map_err(grid_err)?;
        if let Some((first, second)) = self.grid.engine().model().first_overlap() {
            return Err(HarnessError::Overlap {
                line,
                first,
                second,
            });
        }
        self.steps += 1;
        Ok(())
    }

    fn lookup(&self, line: usize, name: &str) -> Result<ItemId> {
        self.id(name).ok_or_else(|| HarnessError::UnknownName {
            line,
            name: name.to_string(),
        })
    }

    fn check(&self, line: usize, expectation: &Expectation) -> Result<()> {
        if let Some(expected) = expectation.height
            && expected != self.grid.height()
        {
            return Err(HarnessError::Mismatch {
                line,
                what: "height",
                expected: expected.to_string(),
                actual: self.grid.height().to_string(),
            });
        }
        if let Some(positions) = &expectation.positions {
            for (name, &[row, col]) in positions {
                let id = self.lookup(line, name)?;
                let actual = self.grid.item(id).and_then(GridItem::origin);
                if actual != Some(Cell::new(row, col)) {
                    return Err(HarnessError::Mismatch {
                        line,
                        what: "position",
                        expected: format!("{name} at [{row}, {col}]"),
                        actual: match actual {
                            Some(cell) => format!("{name} at [{}, {}]", cell.row, cell.col),
                            None => format!("{name} unplaced"),
                        },
                    });
                }
            }
        }
        let summaries = self.grid.summaries();
        if let Some(expected) = &expectation.summaries
            && *expected != summaries
        {
            return Err(HarnessError::Mismatch {
                line,
                what: "summaries",
                expected: format!("{expected:?}"),
                actual: format!("{summaries:?}"),
            });
        }
        if let Some(expected) = &expectation.checksum {
            let actual = format!("{:016x}", layout_checksum(&summaries));
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(HarnessError::Mismatch {
                    line,
                    what: "checksum",
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Replay scenario text on a default grid.
pub fn replay_str(source: &str) -> Result<ReplaySummary> {
    let steps = parse_scenario(source)?;
    let mut replayer = Replayer::default();
    for (line, step) in &steps {
        replayer.apply(*line, step)?;
    }
    let summary = replayer.summary();
    debug!(
        steps = summary.steps,
        height = summary.height,
        checksum = %format_args!("{:016x}", summary.checksum),
        "scenario replayed"
    );
    Ok(summary)
}

/// Replay a scenario file.
pub fn replay_file(path: impl AsRef<Path>) -> Result<ReplaySummary> {
    let source = fs::read_to_string(path)?;
    replay_str(&source)
}
