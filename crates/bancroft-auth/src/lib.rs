//! # bancroft-auth
//!
//! Sign-in and step-up verification orchestration for the Bancroft
//! portal.
//!
//! This crate provides:
//! - OAuth2 Authorization Code + PKCE client flow against the external IdP
//! - Customer profile resolution with a partial-failure-tolerant director fan-out
//! - Mobile OTP step-up challenges against the mobile-auth gateway
//! - The sign-in state machine coordinating all of the above
//! - Typed browser-session storage with an in-memory implementation
//! - Axum HTTP handlers driving the flow
//!
//! ## Overview
//!
//! The flow is single-threaded and callback-driven: the browser is
//! redirected to the IdP, returns with an authorization code, and the
//! orchestrator runs the silent token-exchange / claims / profile
//! sequence, conditionally issuing an OTP challenge before the user
//! picks a business profile and enters the application. The only
//! intentional concurrency is the bounded director fan-out.
//!
//! ## Modules
//!
//! - [`config`] - flow configuration
//! - [`oauth`] - PKCE, authorization URL, token exchange, userinfo
//! - [`profile`] - customer profile resolution and director fan-out
//! - [`otp`] - OTP step-up service and the response-code table
//! - [`session`] - browser session storage
//! - [`signin`] - the state machine and orchestrator
//! - [`http`] - axum handlers for the flow routes

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod otp;
pub mod profile;
pub mod session;
pub mod signin;

pub use config::{DirectoryConfig, IdpConfig, OtpConfig, PortalConfig, SessionConfig};
pub use error::SigninError;
pub use http::{SigninFlowState, signin_router};
pub use oauth::{
    AuthorizationUrlBuilder, PkceChallenge, PkceMaterial, PkceVerifier, RandomToken, TokenClient,
    TokenResponse, UserInfoClient, UserProfile,
};
pub use otp::{ChallengeState, OtpChallenge, OtpOutcome, OtpResponseCode, OtpService};
pub use profile::{
    ContactMechanism, ContactMechanismType, CustomerProfile, CustomerProfileResolver,
    DirectorFailure, DirectorResolution, DirectoryClient, RelatedParty,
};
pub use session::{MemorySessionStore, SessionId, SessionKey, SessionStore};
pub use signin::{
    CallbackParams, EventSink, FlowEvent, OtpSubmission, RecordingSink, SigninOrchestrator,
    SigninState, TracingSink,
};

/// Type alias for sign-in flow results.
pub type AuthResult<T> = Result<T, SigninError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use bancroft_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{DirectoryConfig, IdpConfig, OtpConfig, PortalConfig, SessionConfig};
    pub use crate::error::SigninError;
    pub use crate::http::{SigninFlowState, signin_router};
    pub use crate::oauth::{PkceMaterial, TokenClient, TokenResponse, UserInfoClient, UserProfile};
    pub use crate::otp::{OtpChallenge, OtpOutcome, OtpResponseCode, OtpService};
    pub use crate::profile::{CustomerProfile, CustomerProfileResolver, DirectorResolution};
    pub use crate::session::{MemorySessionStore, SessionId, SessionKey, SessionStore};
    pub use crate::signin::{CallbackParams, SigninOrchestrator, SigninState};
}
