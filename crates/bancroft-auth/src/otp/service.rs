//! OTP step-up service.
//!
//! Sends and validates numeric passcodes against the mobile-auth
//! gateway, independently of the IdP token. Responses are interpreted
//! exclusively through the fixed table in [`codes`](crate::otp::codes).

use time::OffsetDateTime;

use crate::config::OtpConfig;
use crate::error::SigninError;
use crate::otp::codes::OtpResponseCode;
use crate::otp::envelope::{self, OtpFunction};
use crate::otp::types::{ChallengeState, OtpChallenge};

/// Outcome of a validation attempt, mapped through the response-code
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpOutcome {
    /// Interpreted response code.
    pub code: OtpResponseCode,
}

impl OtpOutcome {
    /// The message shown inline next to the passcode input.
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.code.user_message()
    }
}

/// Client for the OTP gateway.
pub struct OtpService {
    http: reqwest::Client,
    config: OtpConfig,
}

impl OtpService {
    /// Creates an OTP service sharing the given HTTP client.
    #[must_use]
    pub fn new(config: OtpConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    /// Issues a new passcode to a cellphone number.
    ///
    /// The gateway assigns a queue name scoping the challenge; it must be
    /// presented on validation. Issuing a new challenge supersedes any
    /// pending one for the session — the caller replaces its stored
    /// challenge with the returned one.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::OtpIssueFailed`] with the table-mapped
    /// message when the gateway refuses, answers without a queue name, or
    /// cannot be reached.
    pub async fn send(
        &self,
        cell_number: &str,
        auth_token: &str,
    ) -> Result<OtpChallenge, SigninError> {
        let body = envelope::build_envelope(
            OtpFunction::Generate,
            cell_number,
            &self.config.country_code,
            None,
            None,
        );

        let response_body = self
            .post_envelope(body, auth_token)
            .await
            .map_err(SigninError::OtpIssueFailed)?;

        let fields = envelope::extract_fields(&response_body)
            .map_err(|e| SigninError::OtpIssueFailed(e.to_string()))?;

        let code = OtpResponseCode::from_code(&fields.response_code);
        if !code.is_success() {
            return Err(SigninError::OtpIssueFailed(code.user_message().to_string()));
        }

        let queue_name = fields
            .queue_name
            .ok_or_else(|| SigninError::OtpIssueFailed("gateway returned no queue name".to_string()))?;

        tracing::info!(
            queue_name = %queue_name,
            cell = %crate::otp::types::mask_cell_number(cell_number),
            "OTP challenge issued"
        );

        Ok(OtpChallenge {
            cell_number: cell_number.to_string(),
            queue_name,
            response_code: fields.response_code,
            issued_at: OffsetDateTime::now_utc(),
            state: ChallengeState::Issued,
        })
    }

    /// Validates a submitted passcode against a `(cell_number,
    /// queue_name)` scope.
    ///
    /// Every parseable gateway answer is returned as an [`OtpOutcome`];
    /// only the caller decides whether a non-success outcome blocks,
    /// retries or merely informs.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::OtpValidationFailed`] when the gateway is
    /// unreachable or its response cannot be interpreted at all.
    pub async fn validate(
        &self,
        cell_number: &str,
        code: &str,
        queue_name: &str,
        auth_token: &str,
    ) -> Result<OtpOutcome, SigninError> {
        let body = envelope::build_envelope(
            OtpFunction::Validate,
            cell_number,
            &self.config.country_code,
            Some(queue_name),
            Some(code),
        );

        let response_body = self
            .post_envelope(body, auth_token)
            .await
            .map_err(SigninError::OtpValidationFailed)?;

        let fields = envelope::extract_fields(&response_body)
            .map_err(|e| SigninError::OtpValidationFailed(e.to_string()))?;

        let mapped = OtpResponseCode::from_code(&fields.response_code);
        tracing::info!(
            queue_name = %queue_name,
            response_code = %mapped,
            "OTP validation answered"
        );

        Ok(OtpOutcome { code: mapped })
    }

    async fn post_envelope(&self, body: String, auth_token: &str) -> Result<String, String> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(auth_token)
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| format!("gateway unreachable: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("gateway answered HTTP {status}"));
        }

        response
            .text()
            .await
            .map_err(|e| format!("gateway response unreadable: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_message_comes_from_table() {
        let outcome = OtpOutcome {
            code: OtpResponseCode::InvalidOtp,
        };
        assert_eq!(outcome.message(), "Invalid OTP, please try again");
    }
}
