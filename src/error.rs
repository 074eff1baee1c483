//! Error types for coinwalk.

use thiserror::Error;

use crate::board::Cell;

/// Result type alias for coinwalk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the estimation pipeline can surface.
///
/// All of these are fatal for the run: there is no I/O in the core, so
/// nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Board geometry is invalid, or a coin is out of bounds or on a wall.
    #[error("invalid board{}: {reason}", fmt_cell(.cell))]
    InvalidBoard {
        /// Offending cell, when the problem is tied to one.
        cell: Option<Cell>,
        /// What is wrong with it.
        reason: String,
    },

    /// Two coins that must be connected are not.
    #[error("coin at {to} is unreachable from coin at {from}")]
    UnreachableCoin { from: Cell, to: Cell },

    /// The universe cannot supply K coins.
    #[error("cannot sample {requested} coins from a universe of {available}")]
    InsufficientCoins { available: usize, requested: usize },

    /// Estimator parameters make no sense.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    pub(crate) fn board(cell: Option<Cell>, reason: impl Into<String>) -> Self {
        Error::InvalidBoard {
            cell,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }
}

fn fmt_cell(cell: &Option<Cell>) -> String {
    cell.map(|c| format!(" at {c}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_coordinates() {
        let err = Error::UnreachableCoin {
            from: Cell::new(0, 0),
            to: Cell::new(3, 4),
        };
        assert_eq!(err.to_string(), "coin at (3,4) is unreachable from coin at (0,0)");

        let err = Error::board(Some(Cell::new(1, 2)), "coin on a wall");
        assert_eq!(err.to_string(), "invalid board at (1,2): coin on a wall");

        let err = Error::board(None, "no rows");
        assert_eq!(err.to_string(), "invalid board: no rows");
    }
}
