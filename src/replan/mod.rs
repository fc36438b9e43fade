//! Replanning controllers: plan on the known map, walk the plan while sensing, and replan or
//! backtrack when the world turns out to differ from what the agent believed.
use crate::error::ReplanError;
use crate::grid::GridMap;
use crate::knowledge::KnownGrid;
use crate::solver::{search_record, Heuristic, Plan};
use core::fmt;
use grid_util::point::Point;
use log::{debug, info, trace, warn};
use std::str::FromStr;

pub mod adaptive;
pub mod backward;
pub mod forward;

use self::adaptive::AdaptiveAstar;
use self::backward::RepeatedBackward;
use self::forward::RepeatedForward;

/// A strategy that drives an agent from `start` to `goal` through `world`, which it only
/// learns about by sensing. Runs share no state, so a single replanner can serve many runs on
/// many threads.
pub trait Replanner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs the agent to completion. Out-of-bounds endpoints are rejected with an error before
    /// the run starts; every other way a run can end is reported through the returned
    /// [Navigation].
    fn navigate(
        &self,
        world: &GridMap,
        start: Point,
        goal: Point,
    ) -> Result<Navigation, ReplanError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Reached,
    Failed(ReplanError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationStats {
    /// A* calls, successful or not.
    pub searches: usize,
    /// Expansions summed over all searches.
    pub expanded: usize,
    /// Walks cut short by an obstacle on the planned path.
    pub blocked_steps: usize,
    /// Steps taken back towards the start.
    pub backtracks: usize,
}

/// The result of a single run.
#[derive(Clone, Debug)]
pub struct Navigation {
    /// Every cell the agent occupied, in order, starting with the start. On failure this is the
    /// partial trace up to the point of failure.
    pub trace: Vec<Point>,
    pub outcome: Outcome,
    /// The agent's map at the end of the run.
    pub known: KnownGrid,
    pub stats: NavigationStats,
}

impl Navigation {
    pub fn success(&self) -> bool {
        self.outcome == Outcome::Reached
    }

    pub fn failure(&self) -> Option<&ReplanError> {
        match &self.outcome {
            Outcome::Reached => None,
            Outcome::Failed(e) => Some(e),
        }
    }

    /// Number of moves the agent made, including steps back.
    pub fn moves(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }
}

/// States shared by all controllers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Planning,
    Walking,
    Backtracking,
    Succeeded,
    Failed,
}

impl ControllerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ControllerState::Succeeded | ControllerState::Failed)
    }

    pub fn can_transition_to(self, next: ControllerState) -> bool {
        use self::ControllerState::*;
        matches!(
            (self, next),
            (Planning, Walking)
                | (Planning, Backtracking)
                | (Planning, Failed)
                // start equals goal
                | (Planning, Succeeded)
                | (Walking, Walking)
                | (Walking, Planning)
                | (Walking, Succeeded)
                // a walk that did not get a single step done
                | (Walking, Backtracking)
                | (Backtracking, Planning)
                | (Backtracking, Failed)
        )
    }
}

/// How far a walk along a plan got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Walk {
    pub moves: usize,
    pub reached_goal: bool,
}

/// Everything a single run owns: the agent's position, its map, the trace and bookkeeping.
pub(crate) struct Agent<'w> {
    name: &'static str,
    world: &'w GridMap,
    goal: Point,
    current: Point,
    known: KnownGrid,
    trace: Vec<Point>,
    state: ControllerState,
    stats: NavigationStats,
}

impl<'w> Agent<'w> {
    pub fn new(
        name: &'static str,
        world: &'w GridMap,
        start: Point,
        goal: Point,
    ) -> Result<Agent<'w>, ReplanError> {
        world.check_in_bounds(&start)?;
        world.check_in_bounds(&goal)?;
        info!(
            "{}: navigating ({}, {}) -> ({}, {}) on {}x{} grid",
            name,
            start.x,
            start.y,
            goal.x,
            goal.y,
            world.size(),
            world.size()
        );
        Ok(Agent {
            name,
            world,
            goal,
            current: start,
            known: KnownGrid::for_world(world),
            trace: vec![start],
            state: ControllerState::Planning,
            stats: NavigationStats::default(),
        })
    }

    pub fn current(&self) -> Point {
        self.current
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    pub fn at_goal(&self) -> bool {
        self.current == self.goal
    }

    pub fn trace(&self) -> &[Point] {
        &self.trace
    }

    pub fn known(&self) -> &KnownGrid {
        &self.known
    }

    /// The first endpoint that is blocked in the world, if any.
    pub fn blocked_endpoint(&self) -> Option<Point> {
        [self.current, self.goal]
            .into_iter()
            .find(|p| self.world.is_blocked(p))
    }

    pub fn set_state(&mut self, next: ControllerState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        trace!("{}: {:?} -> {:?}", self.name, self.state, next);
        self.state = next;
    }

    /// Senses around the agent's position.
    pub fn sense(&mut self) -> usize {
        self.known.sense(self.world, self.current)
    }

    /// Senses around an arbitrary cell.
    pub fn survey(&mut self, at: Point) -> usize {
        self.known.sense(self.world, at)
    }

    /// Plans on the agent's current map.
    pub fn plan<H: Heuristic + ?Sized>(
        &mut self,
        from: Point,
        to: Point,
        heuristic: &H,
    ) -> Result<Plan, ReplanError> {
        let record = search_record(&self.known, from, to, heuristic)?;
        self.stats.searches += 1;
        self.stats.expanded += record.expanded;
        Plan::from_record(record)
    }

    /// Checks the next cell of a plan against the world before moving into it. A blocked cell
    /// is recorded in the agent's map.
    fn next_is_blocked(&mut self, next: Point) -> bool {
        self.sense();
        if self.world.is_blocked(&next) {
            self.known.mark_blocked(next);
            self.stats.blocked_steps += 1;
            debug!(
                "{}: ({}, {}) is blocked, replanning from ({}, {})",
                self.name, next.x, next.y, self.current.x, self.current.y
            );
            true
        } else {
            false
        }
    }

    fn commit(&mut self, next: Point) {
        self.current = next;
        self.trace.push(next);
        self.sense();
    }

    /// Follows `path`, whose first cell is the agent's position, until it is blocked or the
    /// goal is reached.
    pub fn walk(&mut self, path: &[Point]) -> Walk {
        debug_assert_eq!(path.first(), Some(&self.current));
        self.set_state(ControllerState::Walking);
        let mut moves = 0;
        for &next in path.iter().skip(1) {
            if self.next_is_blocked(next) {
                break;
            }
            self.commit(next);
            moves += 1;
            if self.at_goal() {
                return Walk {
                    moves,
                    reached_goal: true,
                };
            }
            self.set_state(ControllerState::Walking);
        }
        Walk {
            moves,
            reached_goal: false,
        }
    }

    /// Moves back to an earlier, adjacent cell and appends it to the trace.
    pub fn retreat_to(&mut self, cell: Point) {
        debug!(
            "{}: backtracking ({}, {}) -> ({}, {})",
            self.name, self.current.x, self.current.y, cell.x, cell.y
        );
        self.stats.backtracks += 1;
        self.commit(cell);
    }

    /// Drops the last cell of the trace and moves back to the one before it. Returns `false`
    /// if the trace holds nothing but the start.
    pub fn retract(&mut self) -> bool {
        if self.trace.len() <= 1 {
            return false;
        }
        self.trace.pop();
        let previous = self.trace[self.trace.len() - 1];
        debug!(
            "{}: backtracking ({}, {}) -> ({}, {})",
            self.name, self.current.x, self.current.y, previous.x, previous.y
        );
        self.current = previous;
        self.stats.backtracks += 1;
        self.sense();
        true
    }

    pub fn succeed(mut self) -> Navigation {
        self.set_state(ControllerState::Succeeded);
        info!(
            "{}: reached goal in {} moves ({} searches, {} expansions)",
            self.name,
            self.trace().len() - 1,
            self.stats.searches,
            self.stats.expanded
        );
        self.finish(Outcome::Reached)
    }

    pub fn fail(mut self, error: ReplanError) -> Navigation {
        self.set_state(ControllerState::Failed);
        warn!(
            "{}: {} at ({}, {}), {} known obstacles",
            self.name,
            error,
            self.current.x,
            self.current.y,
            self.known().obstacles().len()
        );
        self.finish(Outcome::Failed(error))
    }

    fn finish(self, outcome: Outcome) -> Navigation {
        Navigation {
            trace: self.trace,
            outcome,
            known: self.known,
            stats: self.stats,
        }
    }
}

/// The available strategies, for drivers that pick one by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Forward,
    Backward,
    Adaptive,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Forward, Algorithm::Backward, Algorithm::Adaptive];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Forward => "forward",
            Algorithm::Backward => "backward",
            Algorithm::Adaptive => "adaptive",
        }
    }

    /// The strategy with its default configuration.
    pub fn replanner(self) -> Box<dyn Replanner> {
        match self {
            Algorithm::Forward => Box::new(RepeatedForward::new()),
            Algorithm::Backward => Box::new(RepeatedBackward::new()),
            Algorithm::Adaptive => Box::new(AdaptiveAstar::new()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown algorithm {s:?}, expected forward, backward or adaptive"))
    }
}

#[cfg(test)]
mod tests {
    use super::ControllerState::*;
    use super::*;

    #[test]
    fn transition_table() {
        assert!(Planning.can_transition_to(Walking));
        assert!(Planning.can_transition_to(Backtracking));
        assert!(Planning.can_transition_to(Failed));
        assert!(Walking.can_transition_to(Walking));
        assert!(Walking.can_transition_to(Planning));
        assert!(Walking.can_transition_to(Succeeded));
        assert!(Backtracking.can_transition_to(Planning));
        assert!(Backtracking.can_transition_to(Failed));

        assert!(!Backtracking.can_transition_to(Walking));
        assert!(!Walking.can_transition_to(Failed));
        for state in [Planning, Walking, Backtracking, Succeeded, Failed] {
            assert!(!Succeeded.can_transition_to(state));
            assert!(!Failed.can_transition_to(state));
        }
        assert!(Succeeded.is_terminal() && Failed.is_terminal());
        assert!(!Backtracking.is_terminal());
    }

    #[test]
    fn algorithm_names() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>(), Ok(algorithm));
            assert_eq!(algorithm.replanner().name(), algorithm.name());
        }
        assert_eq!("Adaptive".parse::<Algorithm>(), Ok(Algorithm::Adaptive));
        assert!("dijkstra".parse::<Algorithm>().is_err());
    }

    #[test]
    fn walk_stops_in_front_of_obstacle() {
        // |S.#|
        // |...|
        // |..G|
        let world = GridMap::from_rows(vec![
            vec![false, false, true],
            vec![false, false, false],
            vec![false, false, false],
        ])
        .unwrap();
        let mut agent = Agent::new("test", &world, Point::new(0, 0), Point::new(2, 2)).unwrap();
        agent.sense();
        let path = [Point::new(0, 0), Point::new(0, 1), Point::new(0, 2)];
        let walk = agent.walk(&path);
        assert_eq!(
            walk,
            Walk {
                moves: 1,
                reached_goal: false
            }
        );
        assert_eq!(agent.current(), Point::new(0, 1));
        assert_eq!(agent.state, Walking);
        assert!(agent.known().is_blocked(&Point::new(0, 2)));
        assert_eq!(agent.trace(), &[Point::new(0, 0), Point::new(0, 1)]);
    }

    #[test]
    fn retract_keeps_the_start() {
        let world = GridMap::new(3).unwrap();
        let mut agent = Agent::new("test", &world, Point::new(0, 0), Point::new(2, 2)).unwrap();
        agent.walk(&[Point::new(0, 0), Point::new(1, 0)]);
        assert!(agent.retract());
        assert_eq!(agent.current(), Point::new(0, 0));
        assert!(!agent.retract());
        assert_eq!(agent.trace(), &[Point::new(0, 0)]);
    }

    #[test]
    fn endpoints_out_of_bounds() {
        let world = GridMap::new(3).unwrap();
        assert!(matches!(
            Agent::new("test", &world, Point::new(0, 3), Point::new(0, 0)),
            Err(ReplanError::OutOfBounds { .. })
        ));
    }
}
