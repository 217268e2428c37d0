//! Mobile OTP step-up verification.
//!
//! - [`codes`] - the fixed gateway response-code table
//! - [`envelope`] - thin XML envelope build and field extraction
//! - [`types`] - challenge lifecycle
//! - [`service`] - send/validate against the gateway

pub mod codes;
pub mod envelope;
pub mod service;
pub mod types;

pub use codes::{OtpResponseCode, SUCCESS_CODE};
pub use envelope::{EnvelopeError, EnvelopeFields, OtpFunction};
pub use service::{OtpOutcome, OtpService};
pub use types::{ChallengeState, OtpChallenge, mask_cell_number};
