use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TeamRunError};

/// Macro phase of a team run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimePhase {
    #[default]
    Planning,
    Executing,
    Reconciling,
    /// Waiting for human input. The run is suspended until a response arrives.
    AwaitUser,
    Failed,
    Completed,
}

impl RuntimePhase {
    pub fn allowed_transitions(&self) -> &'static [RuntimePhase] {
        use RuntimePhase::*;
        match self {
            Planning => &[Executing, AwaitUser, Failed],
            Executing => &[Reconciling, AwaitUser, Failed],
            Reconciling => &[Planning, AwaitUser, Failed, Completed],
            AwaitUser => &[Planning, Failed],
            Failed => &[],
            Completed => &[],
        }
    }

    pub fn can_transition_to(&self, target: RuntimePhase) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RuntimePhase::Failed | RuntimePhase::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Executing => "executing",
            Self::Reconciling => "reconciling",
            Self::AwaitUser => "await_user",
            Self::Failed => "failed",
            Self::Completed => "completed",
        }
    }

    /// Errors with a descriptive message when the transition is not in the
    /// table; returns normally otherwise.
    pub fn assert_valid_transition(from: RuntimePhase, to: RuntimePhase) -> Result<()> {
        if from.can_transition_to(to) {
            return Ok(());
        }

        let allowed = if from.allowed_transitions().is_empty() {
            "none (terminal phase)".to_string()
        } else {
            from.allowed_transitions()
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        Err(TeamRunError::InvalidPhaseTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
            allowed,
        })
    }
}

impl fmt::Display for RuntimePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stateful wrapper over the transition table for a single run.
///
/// A failed transition leaves the current phase unchanged; once a terminal
/// phase is reached no further transition succeeds.
#[derive(Debug, Clone)]
pub struct RuntimePhaseMachine {
    current: RuntimePhase,
}

impl Default for RuntimePhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimePhaseMachine {
    pub fn new() -> Self {
        Self {
            current: RuntimePhase::Planning,
        }
    }

    /// Starts from a caller-supplied phase, e.g. when resuming from a
    /// checkpoint.
    pub fn with_initial(phase: RuntimePhase) -> Self {
        Self { current: phase }
    }

    pub fn current(&self) -> RuntimePhase {
        self.current
    }

    pub fn transition_to(&mut self, next: RuntimePhase) -> Result<RuntimePhase> {
        RuntimePhase::assert_valid_transition(self.current, next)?;
        info!(from = %self.current, to = %next, "Runtime phase transition");
        self.current = next;
        Ok(next)
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn allowed_transitions(&self) -> &'static [RuntimePhase] {
        self.current.allowed_transitions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(RuntimePhase::Planning.can_transition_to(RuntimePhase::Executing));
        assert!(RuntimePhase::Executing.can_transition_to(RuntimePhase::Reconciling));
        assert!(RuntimePhase::Reconciling.can_transition_to(RuntimePhase::Completed));
        assert!(RuntimePhase::Reconciling.can_transition_to(RuntimePhase::Planning));
        assert!(RuntimePhase::AwaitUser.can_transition_to(RuntimePhase::Planning));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!RuntimePhase::Planning.can_transition_to(RuntimePhase::Completed));
        assert!(!RuntimePhase::Executing.can_transition_to(RuntimePhase::Planning));
        assert!(!RuntimePhase::AwaitUser.can_transition_to(RuntimePhase::Executing));
        assert!(!RuntimePhase::Failed.can_transition_to(RuntimePhase::Planning));
        assert!(!RuntimePhase::Completed.can_transition_to(RuntimePhase::Executing));
    }

    #[test]
    fn test_terminal_phases() {
        assert!(RuntimePhase::Failed.is_terminal());
        assert!(RuntimePhase::Completed.is_terminal());
        assert!(!RuntimePhase::Planning.is_terminal());
        assert!(!RuntimePhase::AwaitUser.is_terminal());
    }

    #[test]
    fn test_assert_message_lists_allowed() {
        let err = RuntimePhase::assert_valid_transition(
            RuntimePhase::Planning,
            RuntimePhase::Completed,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid runtime phase transition: \"planning\" -> \"completed\". \
             Allowed transitions from \"planning\": executing, await_user, failed."
        );
    }

    #[test]
    fn test_assert_message_for_terminal_phase() {
        let err =
            RuntimePhase::assert_valid_transition(RuntimePhase::Failed, RuntimePhase::Planning)
                .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid runtime phase transition: \"failed\" -> \"planning\". \
             Allowed transitions from \"failed\": none (terminal phase)."
        );
    }

    #[test]
    fn test_machine_defaults_to_planning() {
        let machine = RuntimePhaseMachine::new();
        assert_eq!(machine.current(), RuntimePhase::Planning);
        assert!(!machine.is_terminal());
    }

    #[test]
    fn test_machine_rejects_shortcut_to_completed() {
        let mut machine = RuntimePhaseMachine::new();
        assert!(machine.transition_to(RuntimePhase::Completed).is_err());
        assert_eq!(machine.current(), RuntimePhase::Planning);
    }

    #[test]
    fn test_machine_full_happy_path() {
        let mut machine = RuntimePhaseMachine::new();
        machine.transition_to(RuntimePhase::Executing).unwrap();
        machine.transition_to(RuntimePhase::Reconciling).unwrap();
        let last = machine.transition_to(RuntimePhase::Completed).unwrap();
        assert_eq!(last, RuntimePhase::Completed);
        assert!(machine.is_terminal());
        assert!(machine.allowed_transitions().is_empty());
    }

    #[test]
    fn test_machine_with_initial_phase() {
        let mut machine = RuntimePhaseMachine::with_initial(RuntimePhase::Executing);
        assert_eq!(machine.current(), RuntimePhase::Executing);
        machine.transition_to(RuntimePhase::Reconciling).unwrap();
    }
}
