use grid_util::point::Point;

use crate::error::ReplanError;
use crate::grid::GridMap;
use crate::replan::{Agent, ControllerState, Navigation, Replanner};
use crate::solver::Manhattan;

/// Repeated Forward A*: plans from the agent to the goal with the Manhattan distance, walks the
/// plan and replans whenever the next cell turns out to be blocked. When no path exists under
/// the current knowledge the agent retraces its own steps one cell at a time, remembering the
/// cells it walked through in a separate history.
#[derive(Clone, Debug)]
pub struct RepeatedForward {
    /// Also sense around the goal before the first plan.
    pub survey_goal: bool,
}

impl RepeatedForward {
    pub fn new() -> RepeatedForward {
        RepeatedForward { survey_goal: true }
    }
}

impl Default for RepeatedForward {
    fn default() -> Self {
        Self::new()
    }
}

/// Steps back to the previous cell of the walk history. Returns `false` when the history holds
/// nothing but the start.
fn step_back(agent: &mut Agent, history: &mut Vec<Point>) -> bool {
    if history.len() <= 1 {
        return false;
    }
    history.pop();
    let previous = history[history.len() - 1];
    agent.retreat_to(previous);
    true
}

impl Replanner for RepeatedForward {
    fn name(&self) -> &'static str {
        "forward"
    }

    fn navigate(
        &self,
        world: &GridMap,
        start: Point,
        goal: Point,
    ) -> Result<Navigation, ReplanError> {
        let mut agent = Agent::new(self.name(), world, start, goal)?;
        if let Some(cell) = agent.blocked_endpoint() {
            return Ok(agent.fail(ReplanError::InvalidEndpoint { cell }));
        }
        agent.sense();
        if self.survey_goal {
            agent.survey(goal);
        }
        let mut history = vec![start];

        while !agent.at_goal() {
            let plan = match agent.plan(agent.current(), goal, &Manhattan) {
                Ok(plan) => plan,
                Err(ReplanError::NotFound) => {
                    agent.set_state(ControllerState::Backtracking);
                    if !step_back(&mut agent, &mut history) {
                        return Ok(agent.fail(ReplanError::StuckAtStart));
                    }
                    agent.set_state(ControllerState::Planning);
                    continue;
                }
                Err(e) => return Ok(agent.fail(e)),
            };

            let walk = agent.walk(&plan.path);
            history.extend_from_slice(&plan.path[1..=walk.moves]);
            if walk.reached_goal {
                break;
            }
            if walk.moves == 0 {
                agent.set_state(ControllerState::Backtracking);
                if !step_back(&mut agent, &mut history) {
                    return Ok(agent.fail(ReplanError::StuckAtStart));
                }
            }
            agent.set_state(ControllerState::Planning);
        }
        Ok(agent.succeed())
    }
}
