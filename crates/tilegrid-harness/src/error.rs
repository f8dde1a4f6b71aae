#![forbid(unsafe_code)]

use std::fmt;
use std::io;

use tilegrid_layout::{GridError, ItemId};

/// Failure while loading or replaying a scenario.
#[derive(Debug)]
pub enum HarnessError {
    Io(io::Error),
    /// A line is not a valid step.
    Parse { line: usize, message: String },
    /// The grid rejected a step.
    Grid { line: usize, source: GridError },
    /// A step names an item that was never added.
    UnknownName { line: usize, name: String },
    /// An `add` reuses a name.
    DuplicateName { line: usize, name: String },
    /// An `expect` step did not hold.
    Mismatch {
        line: usize,
        what: &'static str,
        expected: String,
        actual: String,
    },
    /// Two items overlap after a step.
    Overlap { line: usize, first: ItemId, second: ItemId },
    /// The scenario has no steps.
    Empty,
}

impl HarnessError {
    /// Scenario line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. }
            | Self::Grid { line, .. }
            | Self::UnknownName { line, .. }
            | Self::DuplicateName { line, .. }
            | Self::Mismatch { line, .. }
            | Self::Overlap { line, .. } => Some(*line),
            Self::Io(_) | Self::Empty => None,
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::Parse { line, message } => write!(f, "invalid step at line {line}: {message}"),
            Self::Grid { line, source } => write!(f, "grid error at line {line}: {source}"),
            Self::UnknownName { line, name } => write!(f, "unknown item {name:?} at line {line}"),
            Self::DuplicateName { line, name } => {
                write!(f, "item {name:?} added twice (line {line})")
            }
            Self::Mismatch {
                line,
                what,
                expected,
                actual,
            } => write!(
                f,
                "{what} mismatch at line {line}: expected {expected}, got {actual}"
            ),
            Self::Overlap {
                line,
                first,
                second,
            } => write!(f, "{first} overlaps {second} after line {line}"),
            Self::Empty => write!(f, "scenario has no steps"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Grid { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for HarnessError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_line() {
        let err = HarnessError::Mismatch {
            line: 7,
            what: "height",
            expected: "3".into(),
            actual: "4".into(),
        };
        assert_eq!(err.to_string(), "height mismatch at line 7: expected 3, got 4");
        assert_eq!(err.line(), Some(7));
        assert_eq!(HarnessError::Empty.line(), None);
    }

    #[test]
    fn grid_errors_are_sources() {
        use std::error::Error;
        let err = HarnessError::Grid {
            line: 2,
            source: GridError::Destroyed,
        };
        assert!(err.source().is_some());
    }
}
