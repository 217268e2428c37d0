//! Browser session storage.
//!
//! Session state is the only mutable shared resource of the flow. It is
//! written by the orchestrator at transition points, never concurrently
//! from two stages, and cleared on sign-out or expiry. The store is an
//! explicit injected interface rather than ambient global state so tests
//! can run against an in-memory fake.
//!
//! # Key schema
//!
//! | key                | value                                    |
//! |--------------------|------------------------------------------|
//! | `flow_state`       | current [`SigninState`](crate::signin::SigninState) |
//! | `pkce`             | [`PkceMaterial`](crate::oauth::PkceMaterial), single-use |
//! | `tokens`           | [`TokenResponse`](crate::oauth::TokenResponse) |
//! | `claims`           | [`UserProfile`](crate::oauth::UserProfile) |
//! | `customer_profile` | resolved [`CustomerProfile`](crate::profile::CustomerProfile) |
//! | `selected_profile` | party id chosen at business-profile selection |
//! | `directors`        | [`DirectorResolution`](crate::profile::DirectorResolution) |
//! | `otp_challenge`    | pending [`OtpChallenge`](crate::otp::OtpChallenge) |

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SigninError;

pub use memory::MemorySessionStore;

/// Opaque browser session identifier, carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a fresh random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a session id from its cookie representation.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Session`] if the value is not a UUID.
    pub fn parse(value: &str) -> Result<Self, SigninError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| SigninError::session("malformed session id"))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed session entry keys; the schema above is the complete list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Current sign-in flow state.
    FlowState,
    /// PKCE material for the in-flight authorization attempt.
    Pkce,
    /// Token response from the exchange.
    Tokens,
    /// Decoded identity claims.
    Claims,
    /// Resolved customer profile.
    CustomerProfile,
    /// Selected business profile (party id).
    SelectedProfile,
    /// Resolved director list.
    Directors,
    /// Pending OTP challenge.
    OtpChallenge,
}

impl SessionKey {
    /// Stable storage name of the key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlowState => "flow_state",
            Self::Pkce => "pkce",
            Self::Tokens => "tokens",
            Self::Claims => "claims",
            Self::CustomerProfile => "customer_profile",
            Self::SelectedProfile => "selected_profile",
            Self::Directors => "directors",
            Self::OtpChallenge => "otp_challenge",
        }
    }

    /// Keys holding authentication data, as opposed to flow bookkeeping.
    /// A terminal IdP error must leave all of these unset.
    #[must_use]
    pub fn data_keys() -> &'static [SessionKey] {
        &[
            Self::Pkce,
            Self::Tokens,
            Self::Claims,
            Self::CustomerProfile,
            Self::SelectedProfile,
            Self::Directors,
            Self::OtpChallenge,
        ]
    }
}

/// Storage interface for browser session entries.
///
/// Implementations must treat expired sessions as absent and may reap
/// them lazily. All methods are cancel-safe single operations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Reads one entry, or `None` if unset or the session has expired.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Session`] if the backend fails.
    async fn get(
        &self,
        session: SessionId,
        key: SessionKey,
    ) -> Result<Option<serde_json::Value>, SigninError>;

    /// Writes one entry, refreshing the session's idle expiry.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Session`] if the backend fails.
    async fn set(
        &self,
        session: SessionId,
        key: SessionKey,
        value: serde_json::Value,
    ) -> Result<(), SigninError>;

    /// Removes one entry, returning the previous value if any.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Session`] if the backend fails.
    async fn remove(
        &self,
        session: SessionId,
        key: SessionKey,
    ) -> Result<Option<serde_json::Value>, SigninError>;

    /// Clears every entry of the session (sign-out).
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Session`] if the backend fails.
    async fn clear(&self, session: SessionId) -> Result<(), SigninError>;
}
