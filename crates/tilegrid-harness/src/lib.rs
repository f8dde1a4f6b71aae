#![forbid(unsafe_code)]

//! Deterministic scenario replay for `tilegrid-layout`.
//!
//! Scenarios are JSONL step lists (see [`scenario`]). [`replay`] applies them
//! to a [`tilegrid_layout::Grid`], checks the no-overlap invariant after every
//! step and verifies `expect` steps against positions, summaries, height or
//! a layout checksum. The `tilegrid-replay` binary runs scenario files from
//! the command line.

pub mod error;
pub mod replay;
pub mod scenario;

pub use error::{HarnessError, Result};
pub use replay::{ReplaySummary, Replayer, layout_checksum, replay_file, replay_str};
pub use scenario::{Expectation, NamedSummary, Step, parse_scenario};
