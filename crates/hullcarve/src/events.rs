//! Progress and result messages emitted by a reconstruction run.

use hullcarve_core::{Failure, FailureKind, Mesh};
use serde::{Deserialize, Serialize};

/// A pipeline stage that reports progress when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    ExtractingSilhouettes,
    Carving,
    Meshing,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 3] = [Stage::ExtractingSilhouettes, Stage::Carving, Stage::Meshing];

    /// Short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ExtractingSilhouettes => "extracting silhouettes",
            Self::Carving => "carving",
            Self::Meshing => "meshing",
        }
    }

    /// Overall completion once this stage is done, in percent.
    ///
    /// Carving dominates the run time, so it gets the largest share.
    pub fn completed_percent(self) -> f32 {
        match self {
            Self::ExtractingSilhouettes => 10.0,
            Self::Carving => 60.0,
            Self::Meshing => 100.0,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress notification: a completed stage and an optional overall percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub stage: Stage,
    pub percent: Option<f32>,
}

impl Progress {
    /// Progress for a completed stage, with its overall percentage.
    pub fn completed(stage: Stage) -> Self {
        Self {
            stage,
            percent: Some(stage.completed_percent()),
        }
    }
}

/// A message from a reconstruction run.
///
/// A run emits at most one [`PipelineEvent::Progress`] per stage in stage order, then
/// exactly one terminal message unless it was cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineEvent {
    Progress(Progress),
    Completed(Mesh),
    Failed(Failure),
}

impl PipelineEvent {
    /// Whether this is the last message of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

/// Lifecycle of a single reconstruction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    ExtractingSilhouettes,
    Carving,
    Meshing,
    Done,
    Failed(FailureKind),
}

impl PipelineState {
    /// The state after the current stage completes. Terminal states stay put.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::ExtractingSilhouettes,
            Self::ExtractingSilhouettes => Self::Carving,
            Self::Carving => Self::Meshing,
            Self::Meshing | Self::Done => Self::Done,
            Self::Failed(kind) => Self::Failed(kind),
        }
    }

    /// The state after a failure; `Idle` and terminal states cannot fail.
    #[must_use]
    pub fn fail(self, kind: FailureKind) -> Self {
        match self {
            Self::ExtractingSilhouettes | Self::Carving | Self::Meshing => Self::Failed(kind),
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// The stage running in this state, if any.
    pub fn stage(self) -> Option<Stage> {
        match self {
            Self::ExtractingSilhouettes => Some(Stage::ExtractingSilhouettes),
            Self::Carving => Some(Stage::Carving),
            Self::Meshing => Some(Stage::Meshing),
            _ => None,
        }
    }
}
