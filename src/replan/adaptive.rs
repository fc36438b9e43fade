use grid_util::point::Point;

use crate::error::ReplanError;
use crate::grid::GridMap;
use crate::replan::{Agent, ControllerState, Navigation, Replanner, Walk};
use crate::solver::HeuristicTable;

/// Adaptive A*: Repeated Forward A* that keeps a heuristic table for its goal across searches.
/// After every successful search the values of all expanded cells are raised to
/// `cost - g(s)`, which keeps them admissible and consistent while focusing later searches.
///
/// Since the agent's map only ever gains obstacles, a search that finds no path means there is
/// none in the world either, and the run fails right away.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdaptiveAstar;

impl AdaptiveAstar {
    pub fn new() -> AdaptiveAstar {
        AdaptiveAstar
    }
}

struct AdaptiveRun<'w> {
    agent: Agent<'w>,
    table: HeuristicTable,
}

impl<'w> AdaptiveRun<'w> {
    fn new(agent: Agent<'w>, size: usize) -> AdaptiveRun<'w> {
        let table = HeuristicTable::new(size, agent.goal());
        AdaptiveRun { agent, table }
    }

    /// Plans with the learned values, updates them from the search and walks the plan.
    fn step(&mut self) -> Result<Walk, ReplanError> {
        let plan = self
            .agent
            .plan(self.agent.current(), self.agent.goal(), &self.table)?;
        self.table.update_from_plan(&plan);
        let walk = self.agent.walk(&plan.path);
        if !walk.reached_goal {
            self.agent.set_state(ControllerState::Planning);
        }
        Ok(walk)
    }
}

impl Replanner for AdaptiveAstar {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn navigate(
        &self,
        world: &GridMap,
        start: Point,
        goal: Point,
    ) -> Result<Navigation, ReplanError> {
        let agent = Agent::new(self.name(), world, start, goal)?;
        if let Some(cell) = agent.blocked_endpoint() {
            return Ok(agent.fail(ReplanError::InvalidEndpoint { cell }));
        }
        let mut run = AdaptiveRun::new(agent, world.size());
        run.agent.sense();

        while !run.agent.at_goal() {
            if let Err(e) = run.step() {
                return Ok(run.agent.fail(e));
            }
        }
        Ok(run.agent.succeed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replan::Outcome;
    use crate::solver::{search, Manhattan};
    use crate::{neumann_neighborhood, trace_is_valid, MOVE_COST};

    fn grid(rows: &[&str]) -> GridMap {
        GridMap::from_rows(
            rows.iter()
                .map(|r| r.bytes().map(|b| b == b'#').collect())
                .collect(),
        )
        .unwrap()
    }

    fn cells(size: usize) -> impl Iterator<Item = Point> {
        let size = size as i32;
        (0..size).flat_map(move |x| (0..size).map(move |y| Point::new(x, y)))
    }

    #[test]
    fn empty_grid_is_walked_in_one_go() {
        let world = GridMap::new(5).unwrap();
        let nav = AdaptiveAstar::new()
            .navigate(&world, Point::new(0, 0), Point::new(4, 4))
            .unwrap();
        assert!(nav.success());
        assert_eq!(nav.trace.len(), 9);
        assert_eq!(nav.stats.searches, 1);
    }

    /// Heuristic values never drop between searches, stay below the true distance on the
    /// agent's map and remain consistent between free neighbours.
    #[test]
    fn learned_values_are_monotone_admissible_and_consistent() {
        let world = grid(&[
            "......", //
            ".####.", //
            ".#..#.", //
            ".#.##.", //
            ".#....", //
            "......",
        ]);
        let goal = Point::new(2, 2);
        let agent = Agent::new("adaptive", &world, Point::new(0, 0), goal).unwrap();
        let mut run = AdaptiveRun::new(agent, world.size());
        run.agent.sense();

        let mut steps = 0;
        while !run.agent.at_goal() {
            let before = run.table.clone();
            run.step().unwrap();
            steps += 1;
            for cell in cells(world.size()) {
                assert!(run.table.get(&cell) >= before.get(&cell));
                if !run.agent.known().can_move_to(cell) {
                    continue;
                }
                if let Ok(plan) = search(run.agent.known(), cell, goal, &Manhattan) {
                    assert!(run.table.get(&cell) <= plan.cost);
                }
                for n in neumann_neighborhood(&cell) {
                    if run.agent.known().can_move_to(n) {
                        assert!(run.table.get(&cell) <= MOVE_COST + run.table.get(&n));
                    }
                }
            }
            assert!(steps < 50);
        }
        assert!(steps > 1);
        assert!(trace_is_valid(run.agent.trace(), &world));
    }

    #[test]
    fn unreachable_goal_fails_without_backtracking() {
        // |S...|
        // |..#.|
        // |.#G#|
        // |..#.|
        let world = grid(&[
            "....", //
            "..#.", //
            ".#.#", //
            "..#.",
        ]);
        let goal = Point::new(2, 2);
        let nav = AdaptiveAstar::new()
            .navigate(&world, Point::new(0, 0), goal)
            .unwrap();
        assert_eq!(nav.outcome, Outcome::Failed(ReplanError::NotFound));
        assert_eq!(nav.stats.backtracks, 0);
        assert!(!nav.trace.contains(&goal));
        assert!(trace_is_valid(&nav.trace, &world));
    }

    #[test]
    fn blocked_start_fails_immediately() {
        let world = grid(&["#..", "...", "..."]);
        let start = Point::new(0, 0);
        let nav = AdaptiveAstar::new()
            .navigate(&world, start, Point::new(2, 2))
            .unwrap();
        assert_eq!(nav.trace, vec![start]);
        assert!(!nav.success());
    }
}
