use serde::Serialize;

/// Lifecycle of one remote job as seen by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum JobState {
    Submitted,
    Polling { attempt: u32 },
    Succeeded,
    Failed,
    TimedOut,
    TransportError,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Submitted | JobState::Polling { .. })
    }
}

/// Remote job id plus the state last observed for it. Lives for one `run`.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub id: String,
    state: JobState,
    attempts: u32,
}

impl JobHandle {
    pub fn new(id: String) -> Self {
        JobHandle { id, state: JobState::Submitted, attempts: 0 }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Status queries answered so far. Survives the move to a terminal state.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Apply `next`, refusing moves out of a terminal state and attempt
    /// counters that go backwards.
    pub fn transition(&mut self, next: JobState) -> bool {
        let allowed = match (self.state, next) {
            (current, _) if current.is_terminal() => false,
            (JobState::Polling { attempt: prev }, JobState::Polling { attempt }) => attempt >= prev,
            (_, JobState::Submitted) => false,
            _ => true,
        };
        if allowed {
            tracing::debug!(job_id = %self.id, from = ?self.state, to = ?next, "Job state change");
            if let JobState::Polling { attempt } = next {
                self.attempts = attempt;
            }
            self.state = next;
        } else {
            tracing::warn!(job_id = %self.id, from = ?self.state, to = ?next, "Rejected job state change");
        }
        allowed
    }
}
