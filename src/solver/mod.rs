use crate::astar::{astar, FxIndexMap, SearchRecord};
use crate::error::ReplanError;
use crate::knowledge::KnownGrid;
use crate::{MOVE_COST, NEUMANN_OFFSETS};
use grid_util::point::Point;
use log::debug;

pub mod astar;
pub mod heuristic_table;

pub use self::astar::Manhattan;
pub use self::heuristic_table::HeuristicTable;

/// Estimates the remaining cost from `cell` to `goal`. Estimates handed to [search] have to be
/// admissible for the map searched on for the returned path to be optimal.
pub trait Heuristic {
    fn estimate(&self, cell: &Point, goal: &Point) -> usize;
}

impl<H: Heuristic + ?Sized> Heuristic for &H {
    fn estimate(&self, cell: &Point, goal: &Point) -> usize {
        (**self).estimate(cell, goal)
    }
}

/// A path planned on a [KnownGrid] together with the bookkeeping of the search that found it.
#[derive(Clone, Debug)]
pub struct Plan {
    /// Cells from start to goal, both inclusive.
    pub path: Vec<Point>,
    pub cost: usize,
    /// Expanded cells with their cost from the start at expansion time.
    pub closed: FxIndexMap<Point, usize>,
    pub expanded: usize,
}

impl Plan {
    /// Turns the record of a finished search into a plan, or [ReplanError::NotFound] if the
    /// search exhausted its frontier.
    pub fn from_record(record: SearchRecord<Point, usize>) -> Result<Plan, ReplanError> {
        match record.result {
            Some((path, cost)) => Ok(Plan {
                path,
                cost,
                closed: record.closed,
                expanded: record.expanded,
            }),
            None => Err(ReplanError::NotFound),
        }
    }

    pub fn start(&self) -> Option<&Point> {
        self.path.first()
    }

    pub fn goal(&self) -> Option<&Point> {
        self.path.last()
    }
}

/// Free in-bounds 4-neighbours of `node` in `map`, each with the unit move cost.
pub fn successors<'a>(
    map: &'a KnownGrid,
    node: &Point,
) -> impl Iterator<Item = (Point, usize)> + 'a {
    let node = *node;
    NEUMANN_OFFSETS
        .into_iter()
        .map(move |(dx, dy)| Point::new(node.x + dx, node.y + dy))
        .filter(|p| map.can_move_to(*p))
        .map(|p| (p, MOVE_COST))
}

fn check_endpoints(map: &KnownGrid, start: &Point, goal: &Point) -> Result<(), ReplanError> {
    for cell in [start, goal] {
        if !map.in_bounds(cell) {
            return Err(ReplanError::OutOfBounds {
                cell: *cell,
                size: map.size(),
            });
        }
    }
    for cell in [start, goal] {
        if map.is_blocked(cell) {
            return Err(ReplanError::InvalidEndpoint { cell: *cell });
        }
    }
    Ok(())
}

/// Runs A* on `map` and keeps the full record, also when the goal could not be reached. Fails
/// only if an endpoint is out of bounds or blocked.
pub fn search_record<H: Heuristic + ?Sized>(
    map: &KnownGrid,
    start: Point,
    goal: Point,
    heuristic: &H,
) -> Result<SearchRecord<Point, usize>, ReplanError> {
    check_endpoints(map, &start, &goal)?;
    let record = astar(
        &start,
        |node| successors(map, node),
        |point| heuristic.estimate(point, &goal),
        |point| *point == goal,
    );
    match &record.result {
        Some((_, cost)) => debug!(
            "Planned ({}, {}) -> ({}, {}): cost {}, {} expansions",
            start.x, start.y, goal.x, goal.y, cost, record.expanded
        ),
        None => debug!(
            "No path ({}, {}) -> ({}, {}) after {} expansions",
            start.x, start.y, goal.x, goal.y, record.expanded
        ),
    }
    Ok(record)
}

/// Computes a shortest 4-connected path from `start` to `goal` on the agent's current map.
pub fn search<H: Heuristic + ?Sized>(
    map: &KnownGrid,
    start: Point,
    goal: Point,
    heuristic: &H,
) -> Result<Plan, ReplanError> {
    Plan::from_record(search_record(map, start, goal, heuristic)?)
}

/// Cost of walking a path, one [MOVE_COST] per step.
pub fn path_cost(path: &[Point]) -> usize {
    path.len().saturating_sub(1) * MOVE_COST
}
