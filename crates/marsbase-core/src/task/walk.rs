use serde::{Deserialize, Serialize};

use super::{StepOutcome, Task, TaskContext, TaskError, TaskKind, TaskPhase};
use crate::components::{BuildingId, Location};

const NAME: &str = "Walk";

/// Moves the worker to another building. Only ever runs as a subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkTask {
    destination: BuildingId,
    remaining: f64,
}

impl WalkTask {
    pub fn create(destination: BuildingId, walk_time: f64) -> Task {
        Task::new(
            NAME,
            format!("Walking to {}", destination),
            TaskPhase::Walking,
            0.0,
            TaskKind::Walk(WalkTask {
                destination,
                remaining: walk_time.max(0.0),
            }),
        )
    }

    pub fn destination(&self) -> BuildingId {
        self.destination
    }

    pub(super) fn step(
        &mut self,
        phase: TaskPhase,
        time: f64,
        ctx: &mut TaskContext,
    ) -> Result<StepOutcome, TaskError> {
        if phase != TaskPhase::Walking {
            return Err(TaskError::unexpected_phase(NAME, phase));
        }
        if time < self.remaining {
            self.remaining -= time;
            return Ok(StepOutcome::Continue { leftover: 0.0 });
        }

        // Arrival. Check the destination still exists before moving there.
        ctx.building_entity(self.destination)?;
        let leftover = time - self.remaining;
        self.remaining = 0.0;
        *ctx.world.get::<&mut Location>(ctx.worker)? = Location::in_building(self.destination);
        Ok(StepOutcome::Finished { leftover })
    }
}
