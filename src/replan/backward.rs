use grid_util::point::Point;

use crate::error::ReplanError;
use crate::grid::GridMap;
use crate::replan::{Agent, ControllerState, Navigation, Replanner};
use crate::solver::Manhattan;

/// Repeated Backward A*: every search runs from the goal towards the agent, and the agent walks
/// the reversed path. When no path exists under the current knowledge the agent drops the last
/// cell of its trace and moves back to the one before it.
#[derive(Clone, Debug)]
pub struct RepeatedBackward {
    /// Also sense around the goal before the first plan.
    pub survey_goal: bool,
}

impl RepeatedBackward {
    pub fn new() -> RepeatedBackward {
        RepeatedBackward { survey_goal: true }
    }
}

impl Default for RepeatedBackward {
    fn default() -> Self {
        Self::new()
    }
}

impl Replanner for RepeatedBackward {
    fn name(&self) -> &'static str {
        "backward"
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

        while !agent.at_goal() {
            let moves = match agent.plan(goal, agent.current(), &Manhattan) {
                Ok(plan) => {
                    let mut path = plan.path;
                    path.reverse();
                    let walk = agent.walk(&path);
                    if walk.reached_goal {
                        break;
                    }
                    walk.moves
                }
                Err(ReplanError::NotFound) => 0,
                Err(e) => return Ok(agent.fail(e)),
            };
            if moves == 0 {
                agent.set_state(ControllerState::Backtracking);
                if !agent.retract() {
                    return Ok(agent.fail(ReplanError::StuckAtStart));
                }
            }
            agent.set_state(ControllerState::Planning);
        }
        Ok(agent.succeed())
    }
}
