//! Recorder state machine

use std::fmt;
use thiserror::Error;

use crate::domain::error::CaptureError;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Starting,
    Recording,
    Stopping,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: RecorderState,
    pub action: &'static str,
}

impl From<InvalidStateTransition> for CaptureError {
    fn from(err: InvalidStateTransition) -> Self {
        match err.current_state {
            RecorderState::Idle => CaptureError::NotRecording,
            _ => CaptureError::AlreadyRecording,
        }
    }
}

/// Recorder lifecycle entity.
///
/// State machine:
///   IDLE -> STARTING (begin_start)
///   STARTING -> RECORDING (start_succeeded)
///   STARTING -> IDLE (start_failed)
///   RECORDING -> STOPPING (begin_stop)
///   STOPPING -> IDLE (stop_finished)
#[derive(Debug, Default)]
pub struct RecorderLifecycle {
    state: RecorderState,
}

impl RecorderLifecycle {
    /// Create a lifecycle in idle state
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Check if currently idle
    pub fn is_idle(&self) -> bool {
        self.state == RecorderState::Idle
    }

    fn transition(
        &mut self,
        from: RecorderState,
        to: RecorderState,
        action: &'static str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Transition from IDLE to STARTING
    pub fn begin_start(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RecorderState::Idle, RecorderState::Starting, "start")
    }

    /// Transition from STARTING to RECORDING
    pub fn start_succeeded(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RecorderState::Starting, RecorderState::Recording, "finish starting")
    }

    /// Transition from STARTING back to IDLE
    pub fn start_failed(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RecorderState::Starting, RecorderState::Idle, "abort starting")
    }

    /// Transition from RECORDING to STOPPING
    pub fn begin_stop(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RecorderState::Recording, RecorderState::Stopping, "stop")
    }

    /// Transition from STOPPING to IDLE, whatever the drain outcome
    pub fn stop_finished(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RecorderState::Stopping, RecorderState::Idle, "finish stopping")
    }

    /// Return to IDLE from a transitional state whose operation never
    /// finished. Returns true if the state changed.
    pub fn interrupt(&mut self) -> bool {
        match self.state {
            RecorderState::Starting | RecorderState::Stopping => {
                self.state = RecorderState::Idle;
                true
            }
            RecorderState::Idle | RecorderState::Recording => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lifecycle_is_idle() {
        let lifecycle = RecorderLifecycle::new();
        assert!(lifecycle.is_idle());
        assert_eq!(lifecycle.state(), RecorderState::Idle);
    }

    #[test]
    fn full_cycle() {
        let mut lifecycle = RecorderLifecycle::new();
        lifecycle.begin_start().unwrap();
        assert_eq!(lifecycle.state(), RecorderState::Starting);
        lifecycle.start_succeeded().unwrap();
        assert_eq!(lifecycle.state(), RecorderState::Recording);
        lifecycle.begin_stop().unwrap();
        assert_eq!(lifecycle.state(), RecorderState::Stopping);
        lifecycle.stop_finished().unwrap();
        assert!(lifecycle.is_idle());

        // Can start another cycle
        lifecycle.begin_start().unwrap();
    }

    #[test]
    fn failed_start_returns_to_idle() {
        let mut lifecycle = RecorderLifecycle::new();
        lifecycle.begin_start().unwrap();
        lifecycle.start_failed().unwrap();
        assert!(lifecycle.is_idle());
    }

    #[test]
    fn stop_from_idle_fails_without_mutation() {
        let mut lifecycle = RecorderLifecycle::new();
        let err = lifecycle.begin_stop().unwrap_err();
        assert_eq!(err.current_state, RecorderState::Idle);
        assert!(lifecycle.is_idle());
    }

    #[test]
    fn start_from_recording_fails() {
        let mut lifecycle = RecorderLifecycle::new();
        lifecycle.begin_start().unwrap();
        lifecycle.start_succeeded().unwrap();

        let err = lifecycle.begin_start().unwrap_err();
        assert_eq!(err.current_state, RecorderState::Recording);
        assert_eq!(lifecycle.state(), RecorderState::Recording);
    }

    #[test]
    fn interrupt_only_resets_transitional_states() {
        let mut lifecycle = RecorderLifecycle::new();
        assert!(!lifecycle.interrupt());

        lifecycle.begin_start().unwrap();
        assert!(lifecycle.interrupt());
        assert!(lifecycle.is_idle());

        lifecycle.begin_start().unwrap();
        lifecycle.start_succeeded().unwrap();
        assert!(!lifecycle.interrupt());
        assert_eq!(lifecycle.state(), RecorderState::Recording);

        lifecycle.begin_stop().unwrap();
        assert!(lifecycle.interrupt());
        assert!(lifecycle.is_idle());
    }

    #[test]
    fn transition_errors_map_to_usage_errors() {
        let mut lifecycle = RecorderLifecycle::new();
        let err: CaptureError = lifecycle.begin_stop().unwrap_err().into();
        assert_eq!(err, CaptureError::NotRecording);

        lifecycle.begin_start().unwrap();
        let err: CaptureError = lifecycle.begin_start().unwrap_err().into();
        assert_eq!(err, CaptureError::AlreadyRecording);
    }

    #[test]
    fn state_display() {
        assert_eq!(RecorderState::Idle.to_string(), "idle");
        assert_eq!(RecorderState::Starting.to_string(), "starting");
        assert_eq!(RecorderState::Recording.to_string(), "recording");
        assert_eq!(RecorderState::Stopping.to_string(), "stopping");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: RecorderState::Stopping,
            action: "start",
        };
        let msg = err.to_string();
        assert!(msg.contains("start"));
        assert!(msg.contains("stopping"));
    }
}
