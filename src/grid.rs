use crate::error::ReplanError;
use crate::neumann_neighborhood;
use core::fmt;
use grid_util::point::Point;
use petgraph::unionfind::UnionFind;

/// [GridMap] is the ground truth the agent navigates in: a square grid of [bool] values where
/// `true` marks a blocked cell. It maintains information about 4-connected components using a
/// [UnionFind] structure so that reachability can be answered without searching.
///
/// Indexing is row-major with `x` as the row and `y` as the column.
#[derive(Clone, Debug)]
pub struct GridMap {
    size: usize,
    cells: Vec<bool>,
    components: UnionFind<usize>,
}

impl GridMap {
    /// An obstacle-free `size` by `size` grid.
    pub fn new(size: usize) -> Result<GridMap, ReplanError> {
        if size == 0 {
            return Err(ReplanError::InvalidGrid {
                reason: "grid must have at least one cell".to_owned(),
            });
        }
        let mut grid = GridMap {
            size,
            cells: vec![false; size * size],
            components: UnionFind::new(size * size),
        };
        grid.generate_components();
        Ok(grid)
    }

    /// Builds a grid from rows of blocked flags, `rows[x][y]`. The rows must form a non-empty
    /// square.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<GridMap, ReplanError> {
        let size = rows.len();
        if let Some((x, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(ReplanError::InvalidGrid {
                reason: format!("row {x} has {} cells, expected {size}", row.len()),
            });
        }
        let mut grid = GridMap::new(size)?;
        grid.cells = rows.into_iter().flatten().collect();
        grid.generate_components();
        Ok(grid)
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

    /// Rejects points outside of the grid.
    pub fn check_in_bounds(&self, point: &Point) -> Result<(), ReplanError> {
        if self.in_bounds(point) {
            Ok(())
        } else {
            Err(ReplanError::OutOfBounds {
                cell: *point,
                size: self.size,
            })
        }
    }

    pub fn get_ix_point(&self, point: &Point) -> usize {
        point.x as usize * self.size + point.y as usize
    }

    /// Points outside of the grid count as blocked.
    pub fn is_blocked(&self, point: &Point) -> bool {
        !self.in_bounds(point) || self.cells[self.get_ix_point(point)]
    }

    pub fn can_move_to(&self, point: Point) -> bool {
        !self.is_blocked(&point)
    }

    /// In-bounds 4-neighbours of a point in expansion order.
    pub fn neighbours(&self, point: &Point) -> impl Iterator<Item = Point> + '_ {
        neumann_neighborhood(point)
            .into_iter()
            .filter(|p| self.in_bounds(p))
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|&&b| b).count()
    }

    pub fn rows(&self) -> Vec<Vec<bool>> {
        self.cells.chunks(self.size).map(<[bool]>::to_vec).collect()
    }

    /// Updates a cell. Freeing a cell joins it with its free neighbours; blocking a free cell can
    /// split a component, so the components are regenerated. Points outside of the grid are
    /// ignored.
    pub fn set(&mut self, point: Point, blocked: bool) {
        if !self.in_bounds(&point) {
            return;
        }
        let ix = self.get_ix_point(&point);
        let was_blocked = self.cells[ix];
        self.cells[ix] = blocked;
        if blocked {
            if !was_blocked {
                self.generate_components();
            }
        } else {
            let free_neighbours = self
                .neighbours(&point)
                .filter(|n| self.can_move_to(*n))
                .map(|n| self.get_ix_point(&n))
                .collect::<Vec<_>>();
            for n_ix in free_neighbours {
                self.components.union(ix, n_ix);
            }
        }
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }

    /// Checks if start and goal are not on the same component. Blocked or out-of-bounds
    /// endpoints are unreachable.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.can_move_to(*start) && self.can_move_to(*goal) {
            let start_ix = self.get_ix_point(start);
            let goal_ix = self.get_ix_point(goal);
            !self.components.equiv(start_ix, goal_ix)
        } else {
            true
        }
    }

    /// Generates a new [UnionFind] structure and links up free 4-neighbours to the same
    /// components.
    fn generate_components(&mut self) {
        let n = self.size;
        self.components = UnionFind::new(n * n);
        for x in 0..n as i32 {
            for y in 0..n as i32 {
                let point = Point::new(x, y);
                if !self.can_move_to(point) {
                    continue;
                }
                let parent_ix = self.get_ix_point(&point);
                for p in [Point::new(x + 1, y), Point::new(x, y + 1)] {
                    if self.can_move_to(p) {
                        let ix = self.get_ix_point(&p);
                        self.components.union(parent_ix, ix);
                    }
                }
            }
        }
    }

    /// Textual rendering of the grid with a trace drawn on top of it.
    pub fn render_trace<'a>(&'a self, trace: &'a [Point]) -> TraceView<'a> {
        TraceView { grid: self, trace }
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render_trace(&[]))
    }
}

/// Draws the grid row by row: `#` blocked, `.` free, `*` visited, `S`/`G` first and last cell
/// of the trace.
pub struct TraceView<'a> {
    grid: &'a GridMap,
    trace: &'a [Point],
}

impl fmt::Display for TraceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let n = self.grid.size;
        let mut tiles = self
            .grid
            .cells
            .iter()
            .map(|&b| if b { '#' } else { '.' })
            .collect::<Vec<char>>();
        for p in self.trace.iter().filter(|p| self.grid.in_bounds(p)) {
            tiles[self.grid.get_ix_point(p)] = '*';
        }
        if let Some(first) = self.trace.first().filter(|p| self.grid.in_bounds(p)) {
            tiles[self.grid.get_ix_point(first)] = 'S';
        }
        if let Some(last) = self.trace.last().filter(|p| self.grid.in_bounds(p)) {
            if self.trace.len() > 1 {
                tiles[self.grid.get_ix_point(last)] = 'G';
            }
        }
        for row in tiles.chunks(n) {
            writeln!(f, "{}", row.iter().collect::<String>())?;
        }
        Ok(())
    }
}
