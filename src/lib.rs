//! # grid_replanning
//!
//! Navigation of an agent over a square grid whose obstacles are only partially known. The agent
//! starts out assuming every cell is free, senses its four cardinal neighbours as it moves and
//! replans with A* whenever the planned path turns out to be blocked. Three strategies are
//! provided on top of a shared A* engine:
//!
//! - [Repeated Forward A*](replan::forward::RepeatedForward) searches from the agent to the goal.
//! - [Repeated Backward A*](replan::backward::RepeatedBackward) searches from the goal to the
//!   agent and walks the reversed path.
//! - [Adaptive A*](replan::adaptive::AdaptiveAstar) searches forward but keeps a
//!   [heuristic table](solver::heuristic_table::HeuristicTable) that is strengthened after
//!   every search.
//!
//! Movement is restricted to the 4-neighbourhood with unit cost. Cells are [Point]s where `x` is
//! the row and `y` the column.
pub mod astar;
pub mod error;
pub mod grid;
pub mod knowledge;
pub mod replan;
pub mod solver;

pub use error::ReplanError;
pub use grid::GridMap;
pub use grid_util::point::Point;
pub use knowledge::{KnownGrid, ObstacleMemory};
pub use replan::{Algorithm, Navigation, Outcome, Replanner};

use itertools::Itertools;

/// Cost of a single move between 4-adjacent cells.
pub const MOVE_COST: usize = 1;

/// Row and column offsets of the 4-neighbourhood in expansion order: up, down, left, right.
pub const NEUMANN_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// The 4-neighbourhood of a point, ignoring grid bounds.
pub fn neumann_neighborhood(point: &Point) -> [Point; 4] {
    NEUMANN_OFFSETS.map(|(dx, dy)| Point::new(point.x + dx, point.y + dy))
}

pub fn manhattan_distance(p1: &Point, p2: &Point) -> usize {
    ((p1.x - p2.x).unsigned_abs() + (p1.y - p2.y).unsigned_abs()) as usize
}

pub fn is_four_adjacent(p1: &Point, p2: &Point) -> bool {
    manhattan_distance(p1, p2) == 1
}

/// Checks that every consecutive pair of a trace are 4-adjacent and free in `world`.
pub fn trace_is_valid(trace: &[Point], world: &GridMap) -> bool {
    trace.iter().all(|p| world.can_move_to(*p))
        && trace
            .iter()
            .tuple_windows()
            .all(|(a, b)| is_four_adjacent(a, b))
}
