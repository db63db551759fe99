//! Observable retry progress.

use serde::Serialize;

/// Position in the `Idle -> Running -> Succeeded | Failed` state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPhase {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

// == Retry State ==
/// Snapshot of a retry run as seen by observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryState<T> {
    /// Result of the successful attempt
    pub data: Option<T>,
    pub is_loading: bool,
    /// Display-ready failure description
    pub error: Option<String>,
    /// Attempts made beyond the first
    pub retry_count: u32,
    pub phase: RetryPhase,
}

impl<T> Default for RetryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            retry_count: 0,
            phase: RetryPhase::Idle,
        }
    }
}

impl<T> RetryState<T> {
    pub(crate) fn running() -> Self {
        Self {
            is_loading: true,
            phase: RetryPhase::Running,
            ..Self::default()
        }
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.error = None;
        self.is_loading = false;
        self.phase = RetryPhase::Succeeded;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.data = None;
        self.error = Some(message);
        self.is_loading = false;
        self.phase = RetryPhase::Failed;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, RetryPhase::Succeeded | RetryPhase::Failed)
    }
}
