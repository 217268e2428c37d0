//! Token exchange client.
//!
//! Trades an authorization code for tokens with a single form-encoded
//! POST. Authorization codes are single-use, so the exchange is made
//! exactly once per code: a failed exchange is surfaced as
//! [`SigninError::TokenExchangeFailed`] and never retried with the same
//! code.

use serde::{Deserialize, Serialize};

use crate::config::IdpConfig;
use crate::error::SigninError;
use crate::oauth::pkce::PkceVerifier;

/// Token response from the IdP token endpoint.
///
/// Treated as an opaque capability bounded by `expires_in`; signature
/// validation of the ID token is the IdP's responsibility and is not
/// reproduced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token presented to downstream services.
    pub access_token: String,

    /// The raw ID token, when the `openid` scope was granted.
    #[serde(default)]
    pub id_token: Option<String>,

    /// Token type, usually "Bearer".
    pub token_type: String,

    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Client for the IdP token endpoint.
pub struct TokenClient {
    http: reqwest::Client,
    idp: IdpConfig,
}

impl TokenClient {
    /// Creates a token client sharing the given HTTP client.
    #[must_use]
    pub fn new(idp: IdpConfig, http: reqwest::Client) -> Self {
        Self { http, idp }
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// One POST with `grant_type=authorization_code`, the code, the
    /// registered `redirect_uri` (byte-identical to the authorization
    /// request) and the PKCE verifier. No retry: a code that failed to
    /// exchange is spent.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::TokenExchangeFailed`] carrying the HTTP
    /// status and body verbatim; the error is not interpreted or
    /// repaired here.
    pub async fn exchange(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<TokenResponse, SigninError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.idp.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.idp.redirect_uri.as_str()),
            ("code_verifier", verifier.as_str()),
        ];

        tracing::debug!(endpoint = %self.idp.token_endpoint, "Exchanging authorization code");

        let response = self
            .http
            .post(&self.idp.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| SigninError::TokenExchangeFailed {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SigninError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| SigninError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                body: format!("failed to parse token response: {e}"),
            })
    }
}
