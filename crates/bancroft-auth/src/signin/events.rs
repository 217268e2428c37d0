//! Structured flow events.
//!
//! The orchestrator emits one event per state transition and one per
//! external-call boundary, through an injected sink. The default sink
//! logs via `tracing`; tests install [`RecordingSink`] and assert on the
//! emitted events instead of log text.

use std::sync::Mutex;

use crate::signin::state::SigninState;

/// Which external collaborator a call event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// The IdP token endpoint.
    TokenEndpoint,
    /// The IdP userinfo endpoint.
    UserInfo,
    /// The customer profile directory.
    CustomerProfile,
    /// The BPID-to-GUID director directory.
    DirectorDirectory,
    /// The OTP gateway.
    OtpGateway,
}

impl CallTarget {
    /// Stable name used in log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenEndpoint => "token_endpoint",
            Self::UserInfo => "userinfo",
            Self::CustomerProfile => "customer_profile",
            Self::DirectorDirectory => "director_directory",
            Self::OtpGateway => "otp_gateway",
        }
    }
}

/// One structured flow event.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// The session moved between flow states.
    StateChanged {
        /// State before the transition.
        from: SigninState,
        /// State after the transition.
        to: SigninState,
    },

    /// An external call completed successfully.
    CallSucceeded {
        /// The collaborator that was called.
        target: CallTarget,
    },

    /// An external call failed (including timeouts).
    CallFailed {
        /// The collaborator that was called.
        target: CallTarget,
        /// Failure detail.
        detail: String,
    },
}

/// Receives flow events as they happen.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn emit(&self, event: FlowEvent);
}

/// Sink that logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: FlowEvent) {
        match event {
            FlowEvent::StateChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "Sign-in state changed");
            }
            FlowEvent::CallSucceeded { target } => {
                tracing::debug!(target = target.as_str(), "External call succeeded");
            }
            FlowEvent::CallFailed { target, detail } => {
                tracing::warn!(target = target.as_str(), %detail, "External call failed");
            }
        }
    }
}

/// Sink that records events for assertions. Test support.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FlowEvent>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    #[must_use]
    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().expect("event sink poisoned").clone()
    }

    /// The state transitions emitted so far, in order.
    #[must_use]
    pub fn transitions(&self) -> Vec<(SigninState, SigninState)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FlowEvent::StateChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: FlowEvent) {
        self.events.lock().expect("event sink poisoned").push(event);
    }
}
