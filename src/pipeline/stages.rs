/*!
 * Stage state machines for the two pipeline flows.
 *
 * A `StageMachine` can only move forward through its flow's stage list, so
 * the orchestrator cannot skip a stage or go back to an earlier one.
 */

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::errors::{PipelineError, StageFailure};

/// A pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Admission checks (identity, arguments) before the flow starts
    Request,
    Fetching,
    Recognizing,
    Translating,
    Persisting,
    Loading,
    Synthesizing,
    Storing,
    Updating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Request => "request",
            Stage::Fetching => "fetching",
            Stage::Recognizing => "recognizing",
            Stage::Translating => "translating",
            Stage::Persisting => "persisting",
            Stage::Loading => "loading",
            Stage::Synthesizing => "synthesizing",
            Stage::Storing => "storing",
            Stage::Updating => "updating",
        };
        f.write_str(label)
    }
}

/// The two pipeline entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    ExtractAndTranslate,
    SynthesizeAudio,
}

impl Flow {
    /// Stages of the flow, in execution order
    pub fn stages(self) -> &'static [Stage] {
        match self {
            Flow::ExtractAndTranslate => &[Stage::Fetching, Stage::Recognizing, Stage::Translating, Stage::Persisting],
            Flow::SynthesizeAudio => &[Stage::Loading, Stage::Synthesizing, Stage::Storing, Stage::Updating],
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::ExtractAndTranslate => write!(f, "extract-and-translate"),
            Flow::SynthesizeAudio => write!(f, "synthesize-audio"),
        }
    }
}

/// Observable state of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Running(Stage),
    Done,
    Failed(Stage),
}

/// Forward-only cursor over a flow's stages
#[derive(Debug)]
pub struct StageMachine {
    flow: Flow,
    position: usize,
    state: StageState,
}

impl StageMachine {
    /// Start the flow in its first stage
    pub fn start(flow: Flow) -> Self {
        let first = flow.stages()[0];
        debug!("{}: entering {}", flow, first);
        Self {
            flow,
            position: 0,
            state: StageState::Running(first),
        }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    /// Stage the flow is in (or ended in)
    pub fn current(&self) -> Stage {
        self.flow.stages()[self.position]
    }

    /// Move to the next stage; after the last stage the flow is `Done`
    ///
    /// Has no effect once the flow is terminal.
    pub fn advance(&mut self) -> StageState {
        if !matches!(self.state, StageState::Running(_)) {
            return self.state;
        }

        let stages = self.flow.stages();
        if self.position + 1 < stages.len() {
            self.position += 1;
            let next = stages[self.position];
            debug!("{}: entering {}", self.flow, next);
            self.state = StageState::Running(next);
        } else {
            debug!("{}: done", self.flow);
            self.state = StageState::Done;
        }
        self.state
    }

    /// End the flow in the current stage and build the failure to report
    pub fn fail(&mut self, error: impl Into<PipelineError>) -> StageFailure {
        let stage = self.current();
        self.state = StageState::Failed(stage);
        let failure = StageFailure::new(stage, error);
        debug!("{}: {}", self.flow, failure);
        failure
    }
}
