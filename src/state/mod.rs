//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `PipelineStage`: the linear stage machine a harvest run moves through
//! - `StageTracker`: holds the current stage and rejects invalid transitions

mod pipeline_stage;

pub use pipeline_stage::PipelineStage;

use crate::HarvestError;

/// Current stage of one run, advanced only along valid transitions
#[derive(Debug, Default)]
pub struct StageTracker {
    stage: PipelineStage,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PipelineStage {
        self.stage
    }

    /// Moves to `to`, or fails with `InvalidTransition`
    pub fn advance(&mut self, to: PipelineStage) -> Result<(), HarvestError> {
        if !self.stage.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                from: self.stage,
                to,
            });
        }
        tracing::debug!(from = %self.stage, to = %to, "Pipeline stage change");
        self.stage = to;
        Ok(())
    }

    /// Marks the run failed unless it already finished
    pub fn fail(&mut self) {
        if !self.stage.is_terminal() {
            self.stage = PipelineStage::Failed;
        }
    }
}
