//! The agent's belief about the grid and the sensing step that refines it.
use crate::grid::GridMap;
use crate::neumann_neighborhood;
use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::IndexSet;
use log::debug;

type FxIndexSet<K> = IndexSet<K, FxBuildHasher>;

/// Cells confirmed to be blocked, in the order they were discovered.
#[derive(Clone, Debug, Default)]
pub struct ObstacleMemory {
    cells: FxIndexSet<Point>,
}

impl ObstacleMemory {
    /// Returns `true` if the cell was not known to be blocked before.
    pub fn insert(&mut self, cell: Point) -> bool {
        self.cells.insert(cell)
    }
    pub fn contains(&self, cell: &Point) -> bool {
        self.cells.contains(cell)
    }
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.cells.iter()
    }
}

/// [KnownGrid] is the agent's map of the world. It starts out optimistic, with every cell free,
/// and only ever learns about new obstacles: there is no way to free a cell again, so a blocked
/// cell stays blocked for the rest of the run.
#[derive(Clone, Debug)]
pub struct KnownGrid {
    size: usize,
    blocked: Vec<bool>,
    obstacles: ObstacleMemory,
}

impl KnownGrid {
    pub fn new(size: usize) -> KnownGrid {
        KnownGrid {
            size,
            blocked: vec![false; size * size],
            obstacles: ObstacleMemory::default(),
        }
    }

    /// An all-free belief with the same shape as `world`.
    pub fn for_world(world: &GridMap) -> KnownGrid {
        KnownGrid::new(world.size())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, point: &Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as usize) < self.size
            && (point.y as usize) < self.size
    }

    fn ix(&self, point: &Point) -> usize {
        point.x as usize * self.size + point.y as usize
    }

    /// Points outside of the grid count as blocked.
    pub fn is_blocked(&self, point: &Point) -> bool {
        !self.in_bounds(point) || self.blocked[self.ix(point)]
    }

    pub fn can_move_to(&self, point: Point) -> bool {
        !self.is_blocked(&point)
    }

    pub fn obstacles(&self) -> &ObstacleMemory {
        &self.obstacles
    }

    /// Records an obstacle. Returns `true` if it was not known before.
    pub fn mark_blocked(&mut self, point: Point) -> bool {
        if !self.in_bounds(&point) {
            return false;
        }
        let ix = self.ix(&point);
        self.blocked[ix] = true;
        self.obstacles.insert(point)
    }

    /// Reveals the true state of `at` and its in-bounds 4-neighbours. Returns the number of
    /// obstacles that were not known before; sensing the same place twice changes nothing.
    pub fn sense(&mut self, world: &GridMap, at: Point) -> usize {
        let revealed = std::iter::once(at)
            .chain(neumann_neighborhood(&at))
            .filter(|p| self.in_bounds(p) && world.is_blocked(p))
            .collect::<Vec<_>>();
        let discovered = revealed
            .into_iter()
            .filter(|p| self.mark_blocked(*p))
            .count();
        if discovered > 0 {
            debug!(
                "Sensed {} new obstacle(s) around ({}, {}), {} known",
                discovered,
                at.x,
                at.y,
                self.obstacles.len()
            );
        }
        discovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> GridMap {
        //  ___
        // |.#.|
        // |##.|
        // |...|
        //  ___
        GridMap::from_rows(vec![
            vec![false, true, false],
            vec![true, true, false],
            vec![false, false, false],
        ])
        .unwrap()
    }

    #[test]
    fn starts_optimistic() {
        let known = KnownGrid::for_world(&world());
        assert_eq!(known.size(), 3);
        assert!(known.can_move_to(Point::new(1, 1)));
        assert!(known.obstacles().is_empty());
    }

    #[test]
    fn sensing_reveals_cardinal_neighbours_only() {
        let world = world();
        let mut known = KnownGrid::for_world(&world);
        assert_eq!(known.sense(&world, Point::new(0, 0)), 2);
        assert!(known.is_blocked(&Point::new(0, 1)));
        assert!(known.is_blocked(&Point::new(1, 0)));
        // Diagonal neighbour stays unknown
        assert!(!known.is_blocked(&Point::new(1, 1)));
        assert_eq!(
            known.obstacles().iter().copied().collect::<Vec<_>>(),
            vec![Point::new(1, 0), Point::new(0, 1)]
        );
    }

    #[test]
    fn sensing_is_idempotent() {
        let world = world();
        let mut known = KnownGrid::for_world(&world);
        known.sense(&world, Point::new(2, 1));
        let before = known.obstacles().len();
        assert_eq!(known.sense(&world, Point::new(2, 1)), 0);
        assert_eq!(known.obstacles().len(), before);
    }

    #[test]
    fn knowledge_never_reverts() {
        let world = world();
        let mut known = KnownGrid::for_world(&world);
        // Free in the world, but once marked it must stay blocked
        assert!(known.mark_blocked(Point::new(2, 2)));
        assert!(!known.mark_blocked(Point::new(2, 2)));
        known.sense(&world, Point::new(2, 1));
        known.sense(&world, Point::new(1, 2));
        assert!(known.is_blocked(&Point::new(2, 2)));
        assert!(known.obstacles().contains(&Point::new(2, 2)));
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut known = KnownGrid::new(2);
        assert!(!known.mark_blocked(Point::new(2, 0)));
        assert!(known.is_blocked(&Point::new(-1, 0)));
        assert!(known.obstacles().is_empty());
    }
}
