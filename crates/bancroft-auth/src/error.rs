//! Error taxonomy for the sign-in flow.
//!
//! Every component converts its transport and protocol failures into a
//! [`SigninError`] at its own boundary; the orchestrator never sees a raw
//! `reqwest` error. The variants mirror the stages of the flow:
//!
//! - Configuration problems are fatal and not retryable
//! - IdP authorization and token exchange failures end the attempt
//! - Userinfo failures are non-fatal (the flow continues without claims)
//! - Director resolution failures are collected per item, never aborting
//! - OTP failures carry the message mapped from the gateway response code

use std::time::Duration;

use crate::signin::state::SigninState;

/// Errors that can occur during the sign-in and step-up flow.
#[derive(Debug, thiserror::Error)]
pub enum SigninError {
    /// Static configuration is missing or invalid. Fatal, not retryable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The IdP redirected back with `error`/`error_description`.
    /// Terminal; shown to the user, no session state is created.
    #[error("Authorization rejected by identity provider: {error} - {description}")]
    Authorization {
        /// The OAuth error code from the redirect (e.g. `access_denied`).
        error: String,
        /// Optional human-readable description from the IdP.
        description: String,
    },

    /// The `state` on the callback does not match the value stored for
    /// this session. Treated as a forged or replayed callback.
    #[error("Callback state does not match the stored authorization state")]
    CallbackStateMismatch,

    /// The token endpoint returned a non-2xx response, or the exchange
    /// could not complete. Terminal for this attempt; authorization codes
    /// are single-use, so the exchange is never retried.
    #[error("Token exchange failed: HTTP {status:?} - {body}")]
    TokenExchangeFailed {
        /// HTTP status from the token endpoint, if a response was received.
        status: Option<u16>,
        /// Response body or transport error detail, verbatim.
        body: String,
    },

    /// The userinfo request failed. Non-fatal: the flow continues without
    /// claims and downstream claim-dependent steps are skipped.
    #[error("Userinfo request failed: {0}")]
    UserInfoFailed(String),

    /// The customer profile for the signed-in identity (or the selected
    /// business record) could not be resolved. Fatal for the affected
    /// entity; surfaced as a retry-prompting error.
    #[error("Profile resolution failed: {0}")]
    ProfileResolutionFailed(String),

    /// A single director could not be resolved. Collected per item in
    /// [`DirectorResolution::failed`](crate::profile::DirectorResolution);
    /// never aborts the batch.
    #[error("Director resolution failed for {bp_id}: {reason}")]
    DirectorResolutionFailed {
        /// Business-partner identifier of the director that failed.
        bp_id: String,
        /// Why resolution failed for this director.
        reason: String,
    },

    /// Issuing an OTP challenge failed. The message is mapped through the
    /// fixed gateway response-code table.
    #[error("OTP issue failed: {0}")]
    OtpIssueFailed(String),

    /// Validating an OTP failed outside the mapped response codes, or the
    /// submitted challenge was superseded by a newer one.
    #[error("OTP validation failed: {0}")]
    OtpValidationFailed(String),

    /// A resend was requested before the cooldown elapsed.
    #[error("OTP resend throttled, retry in {remaining:?}")]
    OtpResendThrottled {
        /// Time left until a resend is accepted.
        remaining: Duration,
    },

    /// The requested state transition is not in the transition table.
    #[error("Illegal sign-in transition: {from} -> {to}")]
    IllegalTransition {
        /// State the session is currently in.
        from: SigninState,
        /// State that was requested.
        to: SigninState,
    },

    /// The session store failed, or the session is missing a required
    /// entry for the current step.
    #[error("Session error: {0}")]
    Session(String),
}

impl SigninError {
    /// Creates a `Configuration` error.
    #[must_use]
    pub fn configuration(detail: impl Into<String>) -> Self {
        Self::Configuration(detail.into())
    }

    /// Creates an `Authorization` error from callback parameters.
    #[must_use]
    pub fn authorization(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Authorization {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Creates a `Session` error.
    #[must_use]
    pub fn session(detail: impl Into<String>) -> Self {
        Self::Session(detail.into())
    }

    /// Creates a `DirectorResolutionFailed` error.
    #[must_use]
    pub fn director(bp_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DirectorResolutionFailed {
            bp_id: bp_id.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error ends the sign-in attempt and the user
    /// must restart from the welcome screen.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Authorization { .. }
                | Self::CallbackStateMismatch
                | Self::TokenExchangeFailed { .. }
                | Self::ProfileResolutionFailed(_)
        )
    }

    /// Returns `true` if the flow continues despite this error.
    #[must_use]
    pub fn is_non_fatal(&self) -> bool {
        matches!(
            self,
            Self::UserInfoFailed(_) | Self::DirectorResolutionFailed { .. }
        )
    }

    /// Returns `true` if this is an OTP-step error, shown inline next to
    /// the passcode input rather than resetting the flow.
    #[must_use]
    pub fn is_otp_error(&self) -> bool {
        matches!(
            self,
            Self::OtpIssueFailed(_) | Self::OtpValidationFailed(_) | Self::OtpResendThrottled { .. }
        )
    }
}
