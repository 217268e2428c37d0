//! Sign-in flow orchestrator.
//!
//! The top-level coordinator. It owns no business logic of its own: it
//! sequences the PKCE/authorization, token exchange, userinfo, profile
//! resolution and OTP components in response to the browser callback and
//! user input, and persists their results into the session at transition
//! points. That separation keeps the state machine testable independent
//! of network behavior.
//!
//! # Callback processing
//!
//! `CALLBACK_PROCESSING` is not a user-visible step. When the callback
//! carries a `code` it runs, silently: token exchange, then userinfo
//! (non-fatal), then profile resolution, then — only for step-up
//! eligible parties — an OTP send. When the callback carries `error`
//! the flow stops terminally with the exact error recorded and no
//! session data populated.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use url::Url;

use crate::config::PortalConfig;
use crate::error::SigninError;
use crate::oauth::{
    AuthorizationUrlBuilder, PkceMaterial, TokenClient, TokenResponse, UserInfoClient, UserProfile,
};
use crate::otp::{ChallengeState, OtpChallenge, OtpOutcome, OtpService};
use crate::profile::{CustomerProfile, CustomerProfileResolver, DirectoryClient};
use crate::session::{SessionId, SessionKey, SessionStore};
use crate::signin::events::{CallTarget, EventSink, FlowEvent, TracingSink};
use crate::signin::state::SigninState;

/// Query parameters of the authorization callback redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code, on success.
    pub code: Option<String>,

    /// Echoed OAuth `state`, cross-checked against the stored value.
    pub state: Option<String>,

    /// Error code, when the IdP rejected the request.
    pub error: Option<String>,

    /// Optional human-readable error description.
    pub error_description: Option<String>,
}

/// Result of one OTP submission.
#[derive(Debug, Clone, Copy)]
pub struct OtpSubmission {
    /// Flow state after the submission.
    pub state: SigninState,

    /// The table-mapped gateway outcome, for inline display.
    pub outcome: OtpOutcome,
}

/// Coordinates the sign-in and step-up flow for browser sessions.
pub struct SigninOrchestrator {
    authorize: AuthorizationUrlBuilder,
    tokens: TokenClient,
    userinfo: UserInfoClient,
    profiles: CustomerProfileResolver,
    otp: OtpService,
    sessions: Arc<dyn SessionStore>,
    events: Arc<dyn EventSink>,
    otp_cooldown: Duration,
}

impl SigninOrchestrator {
    /// Builds an orchestrator from validated configuration.
    ///
    /// All components share one HTTP client carrying the configured
    /// request timeout; a stage that times out fails like any other
    /// error, it never stays pending.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Configuration`] if the configuration is
    /// incomplete or the HTTP client cannot be built.
    pub fn new(
        config: &PortalConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, SigninError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SigninError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            authorize: AuthorizationUrlBuilder::new(config.idp.clone()),
            tokens: TokenClient::new(config.idp.clone(), http.clone()),
            userinfo: UserInfoClient::new(config.idp.clone(), http.clone()),
            profiles: CustomerProfileResolver::new(
                DirectoryClient::new(config.directory.clone(), http.clone()),
                config.directory.max_concurrency,
            ),
            otp: OtpService::new(config.otp.clone(), http),
            sessions,
            events: Arc::new(TracingSink),
            otp_cooldown: config.otp.resend_cooldown,
        })
    }

    /// Replaces the event sink (tests install a recording sink).
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the session's current flow state (`Welcome` when unset).
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Session`] if the store fails.
    pub async fn current_state(&self, session: SessionId) -> Result<SigninState, SigninError> {
        Ok(self
            .load(session, SessionKey::FlowState)
            .await?
            .unwrap_or(SigninState::Welcome))
    }

    /// Returns the pending OTP challenge, if the session has one.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Session`] if the store fails.
    pub async fn pending_challenge(
        &self,
        session: SessionId,
    ) -> Result<Option<OtpChallenge>, SigninError> {
        self.load(session, SessionKey::OtpChallenge).await
    }

    /// Starts (or restarts) an authorization attempt.
    ///
    /// Any in-flight PKCE material and any pending OTP challenge are
    /// invalidated, fresh material is generated and stored, and the
    /// authorization URL to redirect the browser to is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::IllegalTransition`] when called
    /// mid-callback, or [`SigninError::Configuration`] if the client
    /// configuration is incomplete.
    pub async fn start_signin(&self, session: SessionId) -> Result<Url, SigninError> {
        self.transition(session, SigninState::Signin).await?;

        // Restarting supersedes everything from the previous attempt.
        for key in SessionKey::data_keys() {
            self.sessions.remove(session, *key).await?;
        }

        let material = PkceMaterial::generate();
        let url = self.authorize.build(&material)?;
        self.store(session, SessionKey::Pkce, &material).await?;

        tracing::info!(session = %session, "Authorization attempt started");
        Ok(url)
    }

    /// Processes the authorization callback.
    ///
    /// Returns the state the flow landed on: `OtpChallenge` for step-up
    /// eligible parties, otherwise `BusinessProfileSelection`.
    ///
    /// # Errors
    ///
    /// Terminal failures ([`SigninError::Authorization`],
    /// [`SigninError::CallbackStateMismatch`],
    /// [`SigninError::TokenExchangeFailed`],
    /// [`SigninError::ProfileResolutionFailed`],
    /// [`SigninError::OtpIssueFailed`]) leave the session in the
    /// `Failed` state with every data key cleared.
    pub async fn handle_callback(
        &self,
        session: SessionId,
        params: &CallbackParams,
    ) -> Result<SigninState, SigninError> {
        self.transition(session, SigninState::CallbackProcessing)
            .await?;

        if let Some(error) = &params.error {
            let description = params.error_description.clone().unwrap_or_default();
            return self
                .fail_terminal(session, SigninError::authorization(error, description))
                .await;
        }

        // The PKCE material is single-use: taken out of the session
        // before the exchange, so a replayed callback cannot spend the
        // same code twice.
        let Some(material) = self
            .take::<PkceMaterial>(session, SessionKey::Pkce)
            .await?
        else {
            return self
                .fail_terminal(
                    session,
                    SigninError::session("no authorization attempt in flight"),
                )
                .await;
        };

        if params.state.as_deref() != Some(material.state.as_str()) {
            return self
                .fail_terminal(session, SigninError::CallbackStateMismatch)
                .await;
        }

        let Some(code) = params.code.as_deref() else {
            return self
                .fail_terminal(
                    session,
                    SigninError::authorization("invalid_request", "callback carried no code"),
                )
                .await;
        };

        let tokens = match self.tokens.exchange(code, &material.verifier).await {
            Ok(tokens) => {
                self.events.emit(FlowEvent::CallSucceeded {
                    target: CallTarget::TokenEndpoint,
                });
                tokens
            }
            Err(e) => {
                self.events.emit(FlowEvent::CallFailed {
                    target: CallTarget::TokenEndpoint,
                    detail: e.to_string(),
                });
                return self.fail_terminal(session, e).await;
            }
        };
        self.store(session, SessionKey::Tokens, &tokens).await?;

        let claims = self.fetch_claims(session, &tokens).await?;
        let Some(claims) = claims else {
            // Documented fallback: without claims the claim-dependent
            // steps (profile resolution, step-up) are skipped.
            return self
                .transition(session, SigninState::BusinessProfileSelection)
                .await;
        };

        let profile = match self
            .profiles
            .resolve_by_identity(&claims.subject_id, &tokens.access_token)
            .await
        {
            Ok(profile) => {
                self.events.emit(FlowEvent::CallSucceeded {
                    target: CallTarget::CustomerProfile,
                });
                profile
            }
            Err(e) => {
                self.events.emit(FlowEvent::CallFailed {
                    target: CallTarget::CustomerProfile,
                    detail: e.to_string(),
                });
                return self.fail_terminal(session, e).await;
            }
        };
        self.store(session, SessionKey::CustomerProfile, &profile)
            .await?;

        if let Some(cell) = profile.cellphone().filter(|_| profile.is_step_up_eligible()) {
            let challenge = match self.otp.send(cell, &tokens.access_token).await {
                Ok(challenge) => {
                    self.events.emit(FlowEvent::CallSucceeded {
                        target: CallTarget::OtpGateway,
                    });
                    challenge
                }
                Err(e) => {
                    self.events.emit(FlowEvent::CallFailed {
                        target: CallTarget::OtpGateway,
                        detail: e.to_string(),
                    });
                    return self.fail_terminal(session, e).await;
                }
            };
            // Guard into OtpChallenge: a successfully issued challenge.
            self.store(session, SessionKey::OtpChallenge, &challenge)
                .await?;
            return self.transition(session, SigninState::OtpChallenge).await;
        }

        self.transition(session, SigninState::BusinessProfileSelection)
            .await
    }

    /// Validates a submitted passcode.
    ///
    /// On the canonical success code the flow advances to
    /// `BusinessProfileSelection`; every other mapped outcome leaves the
    /// flow in `OtpChallenge` with the inline message in the returned
    /// [`OtpSubmission`].
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::OtpValidationFailed`] when no challenge is
    /// pending, the supplied queue name belongs to a superseded
    /// challenge, or the gateway cannot be reached.
    pub async fn submit_otp(
        &self,
        session: SessionId,
        code: &str,
        queue_name: Option<&str>,
    ) -> Result<OtpSubmission, SigninError> {
        let state = self.current_state(session).await?;
        if state != SigninState::OtpChallenge {
            return Err(SigninError::session("sign-in is not at the OTP step"));
        }

        let mut challenge: OtpChallenge = self
            .load(session, SessionKey::OtpChallenge)
            .await?
            .ok_or_else(|| SigninError::OtpValidationFailed("no pending challenge".to_string()))?;

        if let Some(supplied) = queue_name
            && supplied != challenge.queue_name
        {
            return Err(SigninError::OtpValidationFailed(
                "challenge was superseded by a newer passcode".to_string(),
            ));
        }
        if !challenge.is_pending() {
            return Err(SigninError::OtpValidationFailed(
                "challenge is no longer pending".to_string(),
            ));
        }

        let access_token = self.access_token(session).await?;
        let outcome = match self
            .otp
            .validate(&challenge.cell_number, code, &challenge.queue_name, &access_token)
            .await
        {
            Ok(outcome) => {
                self.events.emit(FlowEvent::CallSucceeded {
                    target: CallTarget::OtpGateway,
                });
                outcome
            }
            Err(e) => {
                self.events.emit(FlowEvent::CallFailed {
                    target: CallTarget::OtpGateway,
                    detail: e.to_string(),
                });
                return Err(e);
            }
        };

        if outcome.code.is_success() {
            challenge.state = ChallengeState::Validated;
            self.store(session, SessionKey::OtpChallenge, &challenge)
                .await?;
            let state = self
                .transition(session, SigninState::BusinessProfileSelection)
                .await?;
            return Ok(OtpSubmission { state, outcome });
        }

        if outcome.code.is_blocking() {
            challenge.state = ChallengeState::Failed;
        }
        self.store(session, SessionKey::OtpChallenge, &challenge)
            .await?;

        Ok(OtpSubmission {
            state: SigninState::OtpChallenge,
            outcome,
        })
    }

    /// Issues a fresh challenge, superseding the pending one.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::OtpResendThrottled`] inside the cooldown
    /// window, or [`SigninError::OtpIssueFailed`] when the gateway
    /// refuses; neither resets the flow.
    pub async fn resend_otp(&self, session: SessionId) -> Result<OtpChallenge, SigninError> {
        let state = self.current_state(session).await?;
        if state != SigninState::OtpChallenge {
            return Err(SigninError::session("sign-in is not at the OTP step"));
        }

        if let Some(previous) = self.pending_or_spent_challenge(session).await?
            && let Some(remaining) =
                previous.resend_cooldown_remaining(self.otp_cooldown, OffsetDateTime::now_utc())
        {
            return Err(SigninError::OtpResendThrottled { remaining });
        }

        let profile: CustomerProfile = self
            .load(session, SessionKey::CustomerProfile)
            .await?
            .ok_or_else(|| SigninError::session("no customer profile in session"))?;
        let cell = profile
            .cellphone()
            .ok_or_else(|| SigninError::session("profile has no cellphone on record"))?;

        let access_token = self.access_token(session).await?;
        let challenge = match self.otp.send(cell, &access_token).await {
            Ok(challenge) => {
                self.events.emit(FlowEvent::CallSucceeded {
                    target: CallTarget::OtpGateway,
                });
                challenge
            }
            Err(e) => {
                self.events.emit(FlowEvent::CallFailed {
                    target: CallTarget::OtpGateway,
                    detail: e.to_string(),
                });
                return Err(e);
            }
        };

        // The new challenge supersedes the previous queue name entirely.
        self.store(session, SessionKey::OtpChallenge, &challenge)
            .await?;
        Ok(challenge)
    }

    /// Records the business-profile selection, resolves its directors
    /// and enters the application.
    ///
    /// The director fan-out is partial-failure tolerant: the stored
    /// [`DirectorResolution`](crate::profile::DirectorResolution) keeps
    /// successes and failures apart, and entry proceeds regardless.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::ProfileResolutionFailed`] when the session
    /// holds no resolved business record or the party id does not match
    /// it — checked before any network call.
    pub async fn select_business_profile(
        &self,
        session: SessionId,
        party_id: &str,
    ) -> Result<SigninState, SigninError> {
        let state = self.current_state(session).await?;
        if state != SigninState::BusinessProfileSelection {
            return Err(SigninError::session(
                "sign-in is not at business-profile selection",
            ));
        }

        let Some(profile) = self
            .load::<CustomerProfile>(session, SessionKey::CustomerProfile)
            .await?
        else {
            return Err(SigninError::ProfileResolutionFailed(
                "no business selection record in session".to_string(),
            ));
        };
        if profile.party_id != party_id {
            return Err(SigninError::ProfileResolutionFailed(format!(
                "unknown business profile {party_id}"
            )));
        }

        self.store(session, SessionKey::SelectedProfile, &party_id)
            .await?;

        let access_token = self.access_token(session).await?;
        let directors = self.profiles.resolve_directors(&profile, &access_token).await;
        for failure in &directors.failed {
            self.events.emit(FlowEvent::CallFailed {
                target: CallTarget::DirectorDirectory,
                detail: format!("{}: {}", failure.bp_id, failure.reason),
            });
        }
        if !profile.directors().is_empty() {
            self.events.emit(FlowEvent::CallSucceeded {
                target: CallTarget::DirectorDirectory,
            });
        }
        self.store(session, SessionKey::Directors, &directors).await?;

        self.transition(session, SigninState::Entered).await
    }

    /// Clears the session and returns to the welcome screen.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Session`] if the store fails.
    pub async fn sign_out(&self, session: SessionId) -> Result<(), SigninError> {
        let from = self.current_state(session).await?;
        self.sessions.clear(session).await?;
        self.events.emit(FlowEvent::StateChanged {
            from,
            to: SigninState::Welcome,
        });
        tracing::info!(session = %session, "Signed out");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Userinfo with the non-fatal failure policy applied.
    async fn fetch_claims(
        &self,
        session: SessionId,
        tokens: &TokenResponse,
    ) -> Result<Option<UserProfile>, SigninError> {
        match self.userinfo.fetch(&tokens.access_token).await {
            Ok(claims) => {
                self.events.emit(FlowEvent::CallSucceeded {
                    target: CallTarget::UserInfo,
                });
                self.store(session, SessionKey::Claims, &claims).await?;
                Ok(Some(claims))
            }
            Err(e) => {
                self.events.emit(FlowEvent::CallFailed {
                    target: CallTarget::UserInfo,
                    detail: e.to_string(),
                });
                tracing::warn!(error = %e, "Userinfo failed; continuing without claims");
                Ok(None)
            }
        }
    }

    /// Moves the flow along the transition table and emits the event.
    async fn transition(
        &self,
        session: SessionId,
        to: SigninState,
    ) -> Result<SigninState, SigninError> {
        let from = self.current_state(session).await?;
        let next = from.transition_to(to)?;
        self.store(session, SessionKey::FlowState, &next).await?;
        self.events.emit(FlowEvent::StateChanged { from, to: next });
        Ok(next)
    }

    /// Terminal failure: clears every data key, forces the `Failed`
    /// state and propagates the error.
    async fn fail_terminal(
        &self,
        session: SessionId,
        error: SigninError,
    ) -> Result<SigninState, SigninError> {
        for key in SessionKey::data_keys() {
            self.sessions.remove(session, *key).await?;
        }
        let from = self.current_state(session).await?;
        self.store(session, SessionKey::FlowState, &SigninState::Failed)
            .await?;
        self.events.emit(FlowEvent::StateChanged {
            from,
            to: SigninState::Failed,
        });
        tracing::warn!(session = %session, error = %error, "Sign-in attempt failed");
        Err(error)
    }

    async fn access_token(&self, session: SessionId) -> Result<String, SigninError> {
        let tokens: TokenResponse = self
            .load(session, SessionKey::Tokens)
            .await?
            .ok_or_else(|| SigninError::session("no token in session"))?;
        Ok(tokens.access_token)
    }

    /// The stored challenge regardless of its lifecycle state; the
    /// resend cooldown counts from the last issue either way.
    async fn pending_or_spent_challenge(
        &self,
        session: SessionId,
    ) -> Result<Option<OtpChallenge>, SigninError> {
        self.load(session, SessionKey::OtpChallenge).await
    }

    async fn load<T: DeserializeOwned>(
        &self,
        session: SessionId,
        key: SessionKey,
    ) -> Result<Option<T>, SigninError> {
        match self.sessions.get(session, key).await? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                SigninError::session(format!("corrupt session entry {}: {e}", key.as_str()))
            }),
            None => Ok(None),
        }
    }

    async fn take<T: DeserializeOwned>(
        &self,
        session: SessionId,
        key: SessionKey,
    ) -> Result<Option<T>, SigninError> {
        match self.sessions.remove(session, key).await? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                SigninError::session(format!("corrupt session entry {}: {e}", key.as_str()))
            }),
            None => Ok(None),
        }
    }

    async fn store<T: serde::Serialize>(
        &self,
        session: SessionId,
        key: SessionKey,
        value: &T,
    ) -> Result<(), SigninError> {
        let value = serde_json::to_value(value).map_err(|e| {
            SigninError::session(format!("unserializable session entry {}: {e}", key.as_str()))
        })?;
        self.sessions.set(session, key, value).await
    }
}
