//! Lifecycle state machine.

use std::fmt;

/// Coordinator lifecycle state.
///
/// ```text
/// Starting → Running → Draining → Stopped
///     └──────────┴──────────────────↗  (listener failure)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Coordinator created, listener not yet serving.
    Starting,
    /// Accepting and processing work.
    Running,
    /// No new work admitted; in-flight work finishing.
    Draining,
    /// Terminal.
    Stopped,
}

impl LifecycleState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Starting, Running)
                | (Running, Draining)
                | (Draining, Stopped)
                | (Starting, Stopped)
                | (Running, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Stopped
    }

    /// Numeric code for the state gauge.
    pub fn code(self) -> u8 {
        match self {
            LifecycleState::Starting => 0,
            LifecycleState::Running => 1,
            LifecycleState::Draining => 2,
            LifecycleState::Stopped => 3,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleState::*;

    #[test]
    fn forward_transitions_only() {
        assert!(Starting.can_transition_to(Running));
        assert!(Running.can_transition_to(Draining));
        assert!(Draining.can_transition_to(Stopped));
        assert!(Running.can_transition_to(Stopped));

        assert!(!Draining.can_transition_to(Running));
        assert!(!Stopped.can_transition_to(Starting));
        assert!(!Stopped.can_transition_to(Stopped));
        assert!(!Starting.can_transition_to(Draining));
    }

    #[test]
    fn only_stopped_is_terminal() {
        assert!(Stopped.is_terminal());
        assert!(!Draining.is_terminal());
        assert_eq!(Draining.to_string(), "draining");
    }
}
