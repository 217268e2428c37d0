//! Sign-in flow coordination.
//!
//! - [`state`] - the flow state enum and transition table
//! - [`events`] - structured flow events and sinks
//! - [`orchestrator`] - the top-level coordinator

pub mod events;
pub mod orchestrator;
pub mod state;

pub use events::{CallTarget, EventSink, FlowEvent, RecordingSink, TracingSink};
pub use orchestrator::{CallbackParams, OtpSubmission, SigninOrchestrator};
pub use state::SigninState;
