//! Sign-in flow states and the transition table.
//!
//! One enum value says where the user is; transitions through
//! [`SigninState::transition_to`] are the only way session state moves
//! forward, and anything outside the table is an
//! [`IllegalTransition`](crate::error::SigninError::IllegalTransition)
//! rather than a silent view switch.

use serde::{Deserialize, Serialize};

use crate::error::SigninError;

/// Where the user is in the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigninState {
    /// Landing screen, nothing started.
    Welcome,

    /// An authorization attempt is in flight: PKCE material generated,
    /// browser redirected to the IdP.
    Signin,

    /// The callback arrived with a `code` (or `error`); the silent
    /// token-exchange / claims / profile sequence is running.
    CallbackProcessing,

    /// A passcode was issued and is awaiting validation.
    OtpChallenge,

    /// The user picks a business profile to enter with.
    BusinessProfileSelection,

    /// Application entered.
    Entered,

    /// Terminal failure; restart from the welcome screen.
    Failed,
}

impl SigninState {
    /// Returns `true` if the table allows moving to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: SigninState) -> bool {
        use SigninState::{
            BusinessProfileSelection, CallbackProcessing, Entered, Failed, OtpChallenge, Signin,
            Welcome,
        };
        match (self, next) {
            // Starting (or re-starting) an authorization attempt is
            // allowed from anywhere that is not mid-callback; restarting
            // invalidates in-flight PKCE material and pending challenges.
            (Welcome | Signin | OtpChallenge | BusinessProfileSelection | Failed | Entered, Signin) => {
                true
            }
            (Signin, CallbackProcessing) => true,
            (CallbackProcessing, OtpChallenge | BusinessProfileSelection | Failed) => true,
            (OtpChallenge, BusinessProfileSelection | Failed) => true,
            (BusinessProfileSelection, Entered | Failed) => true,
            // Sign-out.
            (Entered | Failed, Welcome) => true,
            _ => false,
        }
    }

    /// Moves to `next`, or reports the illegal transition.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::IllegalTransition`] when the table does not
    /// allow the move.
    pub fn transition_to(self, next: SigninState) -> Result<SigninState, SigninError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SigninError::IllegalTransition { from: self, to: next })
        }
    }

    /// Stable name of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Signin => "signin",
            Self::CallbackProcessing => "callback_processing",
            Self::OtpChallenge => "otp_challenge",
            Self::BusinessProfileSelection => "business_profile_selection",
            Self::Entered => "entered",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SigninState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_with_step_up() {
        let mut state = SigninState::Welcome;
        for next in [
            SigninState::Signin,
            SigninState::CallbackProcessing,
            SigninState::OtpChallenge,
            SigninState::BusinessProfileSelection,
            SigninState::Entered,
        ] {
            state = state.transition_to(next).unwrap();
        }
        assert_eq!(state, SigninState::Entered);
    }

    #[test]
    fn test_happy_path_without_step_up() {
        let state = SigninState::CallbackProcessing;
        assert!(state.can_transition_to(SigninState::BusinessProfileSelection));
    }

    #[test]
    fn test_callback_requires_signin_first() {
        let err = SigninState::Welcome
            .transition_to(SigninState::CallbackProcessing)
            .unwrap_err();
        assert!(matches!(
            err,
            SigninError::IllegalTransition {
                from: SigninState::Welcome,
                to: SigninState::CallbackProcessing,
            }
        ));
    }

    #[test]
    fn test_entered_cannot_jump_back_to_otp() {
        assert!(!SigninState::Entered.can_transition_to(SigninState::OtpChallenge));
        assert!(!SigninState::BusinessProfileSelection.can_transition_to(SigninState::OtpChallenge));
    }

    #[test]
    fn test_restart_signin_from_otp_challenge() {
        assert!(SigninState::OtpChallenge.can_transition_to(SigninState::Signin));
        assert!(SigninState::Failed.can_transition_to(SigninState::Signin));
    }

    #[test]
    fn test_mid_callback_cannot_restart() {
        assert!(!SigninState::CallbackProcessing.can_transition_to(SigninState::Signin));
    }

    #[test]
    fn test_sign_out_paths() {
        assert!(SigninState::Entered.can_transition_to(SigninState::Welcome));
        assert!(SigninState::Failed.can_transition_to(SigninState::Welcome));
        assert!(!SigninState::OtpChallenge.can_transition_to(SigninState::Welcome));
    }

    #[test]
    fn test_serde_names_are_snake_case() {
        let json = serde_json::to_string(&SigninState::BusinessProfileSelection).unwrap();
        assert_eq!(json, "\"business_profile_selection\"");
    }
}
