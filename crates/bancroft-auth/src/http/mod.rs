//! Axum HTTP surface for the sign-in flow.
//!
//! The browser drives the orchestrator through these routes; the
//! presentation layer only ever reads the flow state and the inline OTP
//! messages, never raw upstream errors.
//!
//! | route                  | method | purpose                               |
//! |------------------------|--------|---------------------------------------|
//! | `/signin/start`        | GET    | begin an attempt, redirect to the IdP |
//! | `/signin/callback`     | GET    | authorization callback                |
//! | `/signin/otp`          | POST   | submit a passcode                     |
//! | `/signin/otp/resend`   | POST   | supersede the pending challenge       |
//! | `/signin/profile`      | POST   | business-profile selection            |
//! | `/signin/state`        | GET    | current step for the presentation     |
//! | `/signout`             | POST   | clear the session                     |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::SessionConfig;
use crate::error::SigninError;
use crate::session::SessionId;
use crate::signin::SigninOrchestrator;

pub use handlers::{
    FlowResponse, OtpPrompt, OtpSubmitRequest, OtpSubmitResponse, SelectProfileRequest,
    callback_handler, otp_resend_handler, otp_submit_handler, select_profile_handler,
    signout_handler, start_signin_handler, state_handler,
};

/// Shared state for the sign-in routes.
#[derive(Clone)]
pub struct SigninFlowState {
    /// The flow coordinator.
    pub orchestrator: Arc<SigninOrchestrator>,

    /// Cookie settings for the browser session.
    pub session: SessionConfig,
}

/// Builds the sign-in router.
pub fn signin_router(state: SigninFlowState) -> Router {
    Router::new()
        .route("/signin/start", get(start_signin_handler))
        .route("/signin/callback", get(callback_handler))
        .route("/signin/otp", post(otp_submit_handler))
        .route("/signin/otp/resend", post(otp_resend_handler))
        .route("/signin/profile", post(select_profile_handler))
        .route("/signin/state", get(state_handler))
        .route("/signout", post(signout_handler))
        .with_state(state)
}

/// Reads the session id from the cookie jar, if present and well formed.
#[must_use]
pub(crate) fn session_from_jar(config: &SessionConfig, jar: &CookieJar) -> Option<SessionId> {
    jar.get(&config.cookie_name)
        .and_then(|cookie| SessionId::parse(cookie.value()).ok())
}

/// Builds the opaque session cookie.
pub(crate) fn session_cookie(config: &SessionConfig, session: SessionId) -> Cookie<'static> {
    let mut cookie = Cookie::new(config.cookie_name.clone(), session.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.cookie_secure);
    cookie
}

/// HTTP projection of a [`SigninError`].
///
/// Terminal errors carry `restart: true` so the presentation layer shows
/// the generic try-again screen and returns to the welcome state; OTP
/// errors keep the user on the passcode input.
#[derive(Debug)]
pub struct ApiError(pub SigninError);

impl From<SigninError> for ApiError {
    fn from(error: SigninError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SigninError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SigninError::Authorization { .. } | SigninError::CallbackStateMismatch => {
                StatusCode::UNAUTHORIZED
            }
            SigninError::TokenExchangeFailed { .. }
            | SigninError::UserInfoFailed(_)
            | SigninError::ProfileResolutionFailed(_)
            | SigninError::DirectorResolutionFailed { .. } => StatusCode::BAD_GATEWAY,
            SigninError::OtpIssueFailed(_) | SigninError::OtpValidationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            SigninError::OtpResendThrottled { .. } => StatusCode::TOO_MANY_REQUESTS,
            SigninError::IllegalTransition { .. } => StatusCode::CONFLICT,
            SigninError::Session(_) => StatusCode::BAD_REQUEST,
        };

        let body = axum::Json(serde_json::json!({
            "error": self.0.to_string(),
            "restart": self.0.is_terminal(),
        }));

        (status, body).into_response()
    }
}
