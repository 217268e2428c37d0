//! UserInfo client.
//!
//! Resolves a minimal identity claim set from an access token with a
//! single bearer GET. A failure here does not roll back the token
//! exchange: the orchestrator logs it and continues without claims,
//! skipping the downstream steps that need them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::IdpConfig;
use crate::error::SigninError;

/// Minimal identity claims resolved from the userinfo endpoint.
///
/// Derived once per token and immutable afterwards; `subject_id` keys
/// the customer profile lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Subject identifier (`sub` claim).
    #[serde(rename = "sub")]
    pub subject_id: String,

    /// Full name, when released by the IdP.
    #[serde(default)]
    pub name: Option<String>,

    /// Email address, when released by the IdP.
    #[serde(default)]
    pub email: Option<String>,

    /// Preferred username, when released by the IdP.
    #[serde(default)]
    pub preferred_username: Option<String>,

    /// Every other claim, untouched.
    #[serde(flatten)]
    pub raw_claims: HashMap<String, serde_json::Value>,
}

/// Client for the IdP userinfo endpoint.
pub struct UserInfoClient {
    http: reqwest::Client,
    idp: IdpConfig,
}

impl UserInfoClient {
    /// Creates a userinfo client sharing the given HTTP client.
    #[must_use]
    pub fn new(idp: IdpConfig, http: reqwest::Client) -> Self {
        Self { http, idp }
    }

    /// Fetches claims for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::UserInfoFailed`]. Callers treat this as
    /// non-fatal: the documented fallback is to continue without claims.
    pub async fn fetch(&self, access_token: &str) -> Result<UserProfile, SigninError> {
        let response = self
            .http
            .get(&self.idp.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SigninError::UserInfoFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SigninError::UserInfoFailed(format!("HTTP {status} - {body}")));
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| SigninError::UserInfoFailed(format!("failed to parse claims: {e}")))
    }
}
