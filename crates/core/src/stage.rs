use serde::{Deserialize, Serialize};

use crate::error::{CampaignError, CampaignResult};

/// Lifecycle of a single pipeline run. Transitions are strictly linear.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    CopyGenerated,
    PromptsSynthesized,
    ImagesRendering,
    ImagesComplete,
    Scored,
    Ranked,
}

impl PipelineStage {
    /// The stage that follows this one, or `None` for the terminal stage.
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Idle => Some(PipelineStage::CopyGenerated),
            PipelineStage::CopyGenerated => Some(PipelineStage::PromptsSynthesized),
            PipelineStage::PromptsSynthesized => Some(PipelineStage::ImagesRendering),
            PipelineStage::ImagesRendering => Some(PipelineStage::ImagesComplete),
            PipelineStage::ImagesComplete => Some(PipelineStage::Scored),
            PipelineStage::Scored => Some(PipelineStage::Ranked),
            PipelineStage::Ranked => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == PipelineStage::Ranked
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::CopyGenerated => "copy_generated",
            PipelineStage::PromptsSynthesized => "prompts_synthesized",
            PipelineStage::ImagesRendering => "images_rendering",
            PipelineStage::ImagesComplete => "images_complete",
            PipelineStage::Scored => "scored",
            PipelineStage::Ranked => "ranked",
        }
    }
}

/// Guards a run's stage so work cannot be skipped or repeated.
#[derive(Debug, Clone)]
pub struct StageTracker {
    stage: PipelineStage,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            stage: PipelineStage::Idle,
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.stage
    }

    /// Move to `to`, which must be the immediate successor of the current stage.
    pub fn advance(&mut self, to: PipelineStage) -> CampaignResult<()> {
        if self.stage.next() != Some(to) {
            return Err(CampaignError::InvariantViolation(format!(
                "invalid stage transition {} -> {}",
                self.stage.as_str(),
                to.as_str()
            )));
        }
        tracing::debug!(from = self.stage.as_str(), to = to.as_str(), "pipeline stage");
        self.stage = to;
        Ok(())
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}
