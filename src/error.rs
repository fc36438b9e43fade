//! Error taxonomy shared by the search engine and the replanning controllers.

use grid_util::point::Point;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplanError {
    /// No path connects the endpoints under the currently known map.
    NotFound,
    /// Backtracking ran out of earlier positions to retreat to.
    StuckAtStart,
    /// The start or goal of a run or query is blocked.
    InvalidEndpoint {
        /// The blocked endpoint.
        cell: Point,
    },
    /// A coordinate lies outside of the grid.
    OutOfBounds {
        /// The offending coordinate.
        cell: Point,
        /// Side length of the square grid.
        size: usize,
    },
    /// The grid could not be constructed.
    InvalidGrid {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for ReplanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "target not reachable with current knowledge"),
            Self::StuckAtStart => write!(f, "stuck at start position"),
            Self::InvalidEndpoint { cell } => {
                write!(f, "endpoint ({}, {}) is blocked", cell.x, cell.y)
            }
            Self::OutOfBounds { cell, size } => write!(
                f,
                "cell ({}, {}) out of bounds for {size}x{size} grid",
                cell.x, cell.y
            ),
            Self::InvalidGrid { reason } => write!(f, "invalid grid: {reason}"),
        }
    }
}

impl std::error::Error for ReplanError {}
