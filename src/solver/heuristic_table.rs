use grid_util::point::Point;
use log::trace;

use crate::solver::{Heuristic, Manhattan, Plan};

/// Per-cell heuristic values towards a fixed goal, as kept by Adaptive A* across all of its
/// searches. Seeded with the Manhattan distance; values are only ever raised.
#[derive(Clone, Debug)]
pub struct HeuristicTable {
    size: usize,
    goal: Point,
    values: Vec<usize>,
}

impl HeuristicTable {
    pub fn new(size: usize, goal: Point) -> HeuristicTable {
        let values = (0..size * size)
            .map(|ix| {
                let cell = Point::new((ix / size) as i32, (ix % size) as i32);
                Manhattan.estimate(&cell, &goal)
            })
            .collect();
        HeuristicTable { size, goal, values }
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    fn ix(&self, cell: &Point) -> Option<usize> {
        let in_bounds = cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.size
            && (cell.y as usize) < self.size;
        in_bounds.then(|| cell.x as usize * self.size + cell.y as usize)
    }

    /// Cells outside of the table fall back to the Manhattan distance.
    pub fn get(&self, cell: &Point) -> usize {
        match self.ix(cell) {
            Some(ix) => self.values[ix],
            None => Manhattan.estimate(cell, &self.goal),
        }
    }

    /// Raises the value of a cell. Returns `true` if the stored value changed.
    pub fn raise(&mut self, cell: &Point, value: usize) -> bool {
        match self.ix(cell) {
            Some(ix) if value > self.values[ix] => {
                self.values[ix] = value;
                true
            }
            _ => false,
        }
    }

    /// Sets `h(s) = cost - g(s)` for every cell `s` the plan's search expanded. Since the
    /// search towards the goal expanded `s` at cost `g(s)`, the goal lies at most `cost - g(s)`
    /// away from it. Returns the number of raised cells.
    pub fn update_from_plan(&mut self, plan: &Plan) -> usize {
        debug_assert_eq!(plan.goal(), Some(&self.goal));
        let raised = plan
            .closed
            .iter()
            .filter(|&(cell, &g)| self.raise(cell, plan.cost.saturating_sub(g)))
            .count();
        trace!(
            "Raised {} of {} expanded heuristic values",
            raised,
            plan.closed.len()
        );
        raised
    }
}

impl Heuristic for HeuristicTable {
    fn estimate(&self, cell: &Point, goal: &Point) -> usize {
        debug_assert_eq!(*goal, self.goal);
        self.get(cell)
    }
}
