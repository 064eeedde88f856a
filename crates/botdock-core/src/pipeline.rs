//! Pipeline lifecycle.
//!
//! ```text
//! BuildPending ─▶ Building ─┬─▶ BuildFailed            (terminal)
//!                           └─▶ BuildSucceeded ─▶ Packaging ─▶ Packaged (terminal)
//! ```
//!
//! There is no partial-packaging state: a packaging step that does not reach
//! `Packaged` leaves no image behind.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    BuildPending,
    Building,
    BuildFailed,
    BuildSucceeded,
    Packaging,
    Packaged,
}

impl PipelineState {
    pub const ALL: [PipelineState; 6] = [
        Self::BuildPending,
        Self::Building,
        Self::BuildFailed,
        Self::BuildSucceeded,
        Self::Packaging,
        Self::Packaged,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::BuildFailed | Self::Packaged)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (BuildPending, Building)
                | (Building, BuildFailed)
                | (Building, BuildSucceeded)
                | (BuildSucceeded, Packaging)
                | (Packaging, Packaged)
        )
    }

    pub fn transition(self, next: Self) -> crate::Result<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(crate::Error::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BuildPending => "BUILD_PENDING",
            Self::Building => "BUILDING",
            Self::BuildFailed => "BUILD_FAILED",
            Self::BuildSucceeded => "BUILD_SUCCEEDED",
            Self::Packaging => "PACKAGING",
            Self::Packaged => "PACKAGED",
        };
        f.write_str(s)
    }
}

/// One pipeline invocation: the current state plus every state visited.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    history: Vec<PipelineState>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            history: vec![PipelineState::BuildPending],
        }
    }

    pub fn state(&self) -> PipelineState {
        // history is never empty: `new` seeds it and `advance` only appends
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineState::BuildPending)
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn advance(&mut self, next: PipelineState) -> crate::Result<PipelineState> {
        let next = self.state().transition(next)?;
        tracing::debug!(from = %self.state(), to = %next, "pipeline transition");
        self.history.push(next);
        Ok(next)
    }

    pub fn succeeded(&self) -> bool {
        self.state() == PipelineState::Packaged
    }
}
