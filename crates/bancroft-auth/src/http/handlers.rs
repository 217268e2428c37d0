//! Sign-in route handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::error::SigninError;
use crate::http::{ApiError, SigninFlowState, session_cookie, session_from_jar};
use crate::session::SessionId;
use crate::signin::{CallbackParams, SigninState};

/// Current flow step, plus the OTP prompt while one is pending.
#[derive(Debug, Serialize)]
pub struct FlowResponse {
    /// Where the user is.
    pub state: SigninState,

    /// Prompt details while a passcode is awaited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<OtpPrompt>,
}

/// What the passcode screen needs to render.
#[derive(Debug, Serialize)]
pub struct OtpPrompt {
    /// Queue name to echo back on submission.
    pub queue_name: String,

    /// Masked delivery number.
    pub masked_cell_number: String,
}

/// Passcode submission body.
#[derive(Debug, Deserialize)]
pub struct OtpSubmitRequest {
    /// The submitted passcode.
    pub code: String,

    /// Queue name from the prompt; a stale value is rejected.
    #[serde(default)]
    pub queue_name: Option<String>,
}

/// Passcode submission result.
#[derive(Debug, Serialize)]
pub struct OtpSubmitResponse {
    /// Flow state after the submission.
    pub state: SigninState,

    /// Raw mapped response code.
    pub response_code: String,

    /// Inline message for the passcode input.
    pub message: String,

    /// `true` only for the canonical success code.
    pub verified: bool,
}

/// Business-profile selection body.
#[derive(Debug, Deserialize)]
pub struct SelectProfileRequest {
    /// Party id of the chosen business profile.
    pub party_id: String,
}

/// `GET /signin/start` - begin an attempt and redirect to the IdP.
///
/// Creates the browser session on first contact.
///
/// # Errors
///
/// Returns the mapped [`ApiError`] if the attempt cannot start.
pub async fn start_signin_handler(
    State(state): State<SigninFlowState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let session =
        session_from_jar(&state.session, &jar).unwrap_or_else(SessionId::new);

    let url = state.orchestrator.start_signin(session).await?;
    let jar = jar.add(session_cookie(&state.session, session));

    Ok((jar, Redirect::to(url.as_str())))
}

/// `GET /signin/callback` - process the authorization callback.
///
/// # Errors
///
/// Terminal failures map to `restart: true` responses; the session keeps
/// only its failed flow state.
pub async fn callback_handler(
    State(state): State<SigninFlowState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Json<FlowResponse>, ApiError> {
    let session = require_session(&state, &jar)?;

    let flow_state = state.orchestrator.handle_callback(session, &params).await?;
    let otp = otp_prompt(&state, session, flow_state).await?;

    Ok(Json(FlowResponse {
        state: flow_state,
        otp,
    }))
}

/// `POST /signin/otp` - validate a submitted passcode.
///
/// Non-success gateway outcomes are not errors: the response keeps the
/// flow on the OTP step and carries the mapped inline message.
///
/// # Errors
///
/// Returns the mapped [`ApiError`] for superseded challenges and
/// gateway transport failures.
pub async fn otp_submit_handler(
    State(state): State<SigninFlowState>,
    jar: CookieJar,
    Json(request): Json<OtpSubmitRequest>,
) -> Result<Json<OtpSubmitResponse>, ApiError> {
    let session = require_session(&state, &jar)?;

    let submission = state
        .orchestrator
        .submit_otp(session, &request.code, request.queue_name.as_deref())
        .await?;

    Ok(Json(OtpSubmitResponse {
        state: submission.state,
        response_code: submission.outcome.code.as_code().to_string(),
        message: submission.outcome.message().to_string(),
        verified: submission.outcome.code.is_success(),
    }))
}

/// `POST /signin/otp/resend` - supersede the pending challenge.
///
/// # Errors
///
/// Returns 429 inside the cooldown window; the flow stays on the OTP
/// step either way.
pub async fn otp_resend_handler(
    State(state): State<SigninFlowState>,
    jar: CookieJar,
) -> Result<Json<OtpPrompt>, ApiError> {
    let session = require_session(&state, &jar)?;

    let challenge = state.orchestrator.resend_otp(session).await?;

    Ok(Json(OtpPrompt {
        queue_name: challenge.queue_name.clone(),
        masked_cell_number: challenge.masked_cell_number(),
    }))
}

/// `POST /signin/profile` - record the business-profile selection and
/// enter the application.
///
/// # Errors
///
/// Returns the mapped [`ApiError`] when the selection record is missing
/// or unknown.
pub async fn select_profile_handler(
    State(state): State<SigninFlowState>,
    jar: CookieJar,
    Json(request): Json<SelectProfileRequest>,
) -> Result<Json<FlowResponse>, ApiError> {
    let session = require_session(&state, &jar)?;

    let flow_state = state
        .orchestrator
        .select_business_profile(session, &request.party_id)
        .await?;

    Ok(Json(FlowResponse {
        state: flow_state,
        otp: None,
    }))
}

/// `GET /signin/state` - current step for the presentation layer.
///
/// A browser without a session is on the welcome screen.
///
/// # Errors
///
/// Returns the mapped [`ApiError`] if the session store fails.
pub async fn state_handler(
    State(state): State<SigninFlowState>,
    jar: CookieJar,
) -> Result<Json<FlowResponse>, ApiError> {
    let Some(session) = session_from_jar(&state.session, &jar) else {
        return Ok(Json(FlowResponse {
            state: SigninState::Welcome,
            otp: None,
        }));
    };

    let flow_state = state.orchestrator.current_state(session).await?;
    let otp = otp_prompt(&state, session, flow_state).await?;

    Ok(Json(FlowResponse {
        state: flow_state,
        otp,
    }))
}

/// `POST /signout` - clear the session.
///
/// # Errors
///
/// Returns the mapped [`ApiError`] if the session store fails.
pub async fn signout_handler(
    State(state): State<SigninFlowState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<FlowResponse>), ApiError> {
    if let Some(session) = session_from_jar(&state.session, &jar) {
        state.orchestrator.sign_out(session).await?;
    }

    let jar = jar.remove(session_cookie(&state.session, SessionId::new()));
    Ok((
        jar,
        Json(FlowResponse {
            state: SigninState::Welcome,
            otp: None,
        }),
    ))
}

fn require_session(state: &SigninFlowState, jar: &CookieJar) -> Result<SessionId, ApiError> {
    session_from_jar(&state.session, jar)
        .ok_or_else(|| ApiError(SigninError::session("no browser session")))
}

async fn otp_prompt(
    state: &SigninFlowState,
    session: SessionId,
    flow_state: SigninState,
) -> Result<Option<OtpPrompt>, ApiError> {
    if flow_state != SigninState::OtpChallenge {
        return Ok(None);
    }
    let challenge = state.orchestrator.pending_challenge(session).await?;
    Ok(challenge.map(|c| OtpPrompt {
        queue_name: c.queue_name.clone(),
        masked_cell_number: c.masked_cell_number(),
    }))
}
