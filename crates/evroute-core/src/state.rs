use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a single `resolve` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvePhase {
    Init,
    Subscribed,
    Resolved,
    Absent,
    CreationFailed,
    StreamClosed,
    TimedOut,
}

impl ResolvePhase {
    /// No transition leaves a terminal phase
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl fmt::Display for ResolvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Attempted transition not present in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal resolve transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub from: ResolvePhase,
    pub to: ResolvePhase,
}

pub fn validate_transition(from: ResolvePhase, to: ResolvePhase) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: ResolvePhase) -> &'static [ResolvePhase] {
    use ResolvePhase::*;
    match from {
        Init => &[Subscribed, CreationFailed, StreamClosed],
        Subscribed => &[Subscribed, Resolved, Absent, StreamClosed, TimedOut],
        Resolved | Absent | CreationFailed | StreamClosed | TimedOut => &[],
    }
}

/// Phase tracker for one resolution, logging every step
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    current: ResolvePhase,
}

impl PhaseTracker {
    pub(crate) fn new() -> Self {
        Self {
            current: ResolvePhase::Init,
        }
    }

    pub(crate) fn current(&self) -> ResolvePhase {
        self.current
    }

    pub(crate) fn advance(&mut self, to: ResolvePhase) {
        match validate_transition(self.current, to) {
            Ok(()) => {
                tracing::trace!(from = %self.current, to = %to, "resolve phase");
                self.current = to;
            }
            Err(e) => {
                #[cfg(feature = "strict-debug")]
                panic!("{e}");

                #[cfg(not(feature = "strict-debug"))]
                tracing::error!("{e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        let mut tracker = PhaseTracker::new();
        tracker.advance(ResolvePhase::Subscribed);
        tracker.advance(ResolvePhase::Subscribed);
        tracker.advance(ResolvePhase::Resolved);
        assert_eq!(tracker.current(), ResolvePhase::Resolved);
        assert!(tracker.current().is_terminal());
    }

    #[test]
    fn terminal_phases_are_final() {
        for phase in [
            ResolvePhase::Resolved,
            ResolvePhase::Absent,
            ResolvePhase::CreationFailed,
            ResolvePhase::StreamClosed,
            ResolvePhase::TimedOut,
        ] {
            assert!(validate_transition(phase, ResolvePhase::Subscribed).is_err());
        }
    }

    #[test]
    fn creation_failure_skips_subscription() {
        assert!(validate_transition(ResolvePhase::Init, ResolvePhase::CreationFailed).is_ok());
        assert!(validate_transition(ResolvePhase::Init, ResolvePhase::Resolved).is_err());
        assert!(validate_transition(ResolvePhase::CreationFailed, ResolvePhase::Subscribed).is_err());
    }
}
