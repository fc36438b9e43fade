use grid_util::point::Point;

use crate::{manhattan_distance, solver::Heuristic, MOVE_COST};

/// The [Manhattan distance](https://en.wikipedia.org/wiki/Taxicab_geometry) scaled by the move
/// cost: admissible and consistent on any 4-connected grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct Manhattan;

impl Heuristic for Manhattan {
    fn estimate(&self, cell: &Point, goal: &Point) -> usize {
        manhattan_distance(cell, goal) * MOVE_COST
    }
}
