//! Sign-in flow configuration.
//!
//! Configuration for the IdP client, the customer directory, the OTP
//! gateway and session handling. All sections deserialize with defaults
//! so a minimal TOML file only needs the endpoint and client values;
//! [`PortalConfig::validate`] rejects anything the flow cannot run
//! without.
//!
//! # Example (TOML)
//!
//! ```toml
//! [idp]
//! authorization_endpoint = "https://idp.example.com/authorize"
//! token_endpoint = "https://idp.example.com/token"
//! userinfo_endpoint = "https://idp.example.com/userinfo"
//! client_id = "portal-web"
//! redirect_uri = "https://portal.example.com/signin/callback"
//!
//! [directory]
//! profile_endpoint = "https://api.example.com/customers"
//! guid_lookup_endpoint = "https://api.example.com/customers/guid-lookup"
//!
//! [otp]
//! endpoint = "https://mobileauth.example.com/otp"
//! resend_cooldown = "30s"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SigninError;

/// Root configuration for the sign-in flow.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Identity provider client configuration.
    pub idp: IdpConfig,

    /// Customer profile directory configuration.
    pub directory: DirectoryConfig,

    /// OTP step-up gateway configuration.
    pub otp: OtpConfig,

    /// Browser session configuration.
    pub session: SessionConfig,

    /// Timeout applied to every outbound HTTP call.
    /// A stage that times out is treated as failed, never pending.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            idp: IdpConfig::default(),
            directory: DirectoryConfig::default(),
            otp: OtpConfig::default(),
            session: SessionConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PortalConfig {
    /// Validates that every value the flow cannot run without is present.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Configuration`] naming the first missing
    /// value. Nothing is ever silently omitted downstream; the flow
    /// refuses to start instead.
    pub fn validate(&self) -> Result<(), SigninError> {
        self.idp.validate()?;
        self.directory.validate()?;
        self.otp.validate()
    }
}

/// OAuth2 / OIDC client configuration for the external IdP.
///
/// `redirect_uri` must match the value registered with the IdP
/// byte-for-byte; the builder and the token client both use this exact
/// string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IdpConfig {
    /// Authorization endpoint the browser is redirected to.
    pub authorization_endpoint: String,

    /// Token endpoint for the code exchange.
    pub token_endpoint: String,

    /// Userinfo endpoint for claim resolution.
    pub userinfo_endpoint: String,

    /// Registered OAuth2 client identifier.
    pub client_id: String,

    /// Registered redirect URI, byte-identical to the IdP registration.
    pub redirect_uri: String,

    /// Requested scopes; joined with spaces in the authorization request.
    pub scopes: Vec<String>,
}

impl IdpConfig {
    /// Scopes requested when none are configured.
    #[must_use]
    pub fn default_scopes() -> Vec<String> {
        vec![
            "openid".to_string(),
            "email".to_string(),
            "profile".to_string(),
        ]
    }

    /// Returns the configured scopes, falling back to the defaults.
    #[must_use]
    pub fn effective_scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            Self::default_scopes()
        } else {
            self.scopes.clone()
        }
    }

    fn validate(&self) -> Result<(), SigninError> {
        for (value, name) in [
            (&self.authorization_endpoint, "idp.authorization_endpoint"),
            (&self.token_endpoint, "idp.token_endpoint"),
            (&self.userinfo_endpoint, "idp.userinfo_endpoint"),
            (&self.client_id, "idp.client_id"),
            (&self.redirect_uri, "idp.redirect_uri"),
        ] {
            if value.trim().is_empty() {
                return Err(SigninError::configuration(format!("missing {name}")));
            }
        }
        Ok(())
    }
}

/// Customer profile directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base URL for customer profile lookups.
    /// `GET {profile_endpoint}/{id}` resolves by identity subject;
    /// `GET {profile_endpoint}/guid/{bp_guid}` resolves by GUID.
    pub profile_endpoint: String,

    /// Endpoint for the BPID-to-GUID lookup.
    /// `POST {"bpId": ...}` returns the matching directory entries.
    pub guid_lookup_endpoint: String,

    /// Concurrency cap for the director fan-out.
    pub max_concurrency: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            profile_endpoint: String::new(),
            guid_lookup_endpoint: String::new(),
            max_concurrency: 4,
        }
    }
}

impl DirectoryConfig {
    fn validate(&self) -> Result<(), SigninError> {
        if self.profile_endpoint.trim().is_empty() {
            return Err(SigninError::configuration(
                "missing directory.profile_endpoint",
            ));
        }
        if self.guid_lookup_endpoint.trim().is_empty() {
            return Err(SigninError::configuration(
                "missing directory.guid_lookup_endpoint",
            ));
        }
        if self.max_concurrency == 0 {
            return Err(SigninError::configuration(
                "directory.max_concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}

/// OTP step-up gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OtpConfig {
    /// OTP gateway endpoint (XML envelope POST).
    pub endpoint: String,

    /// Country dialing code sent as `otp_country_code`.
    pub country_code: String,

    /// Minimum interval between resends. A UX throttle; a production
    /// gateway must enforce its own limit server-side.
    #[serde(with = "humantime_serde")]
    pub resend_cooldown: Duration,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            country_code: "27".to_string(),
            resend_cooldown: Duration::from_secs(30),
        }
    }
}

impl OtpConfig {
    fn validate(&self) -> Result<(), SigninError> {
        if self.endpoint.trim().is_empty() {
            return Err(SigninError::configuration("missing otp.endpoint"));
        }
        if self.country_code.trim().is_empty() {
            return Err(SigninError::configuration("missing otp.country_code"));
        }
        Ok(())
    }
}

/// Browser session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the opaque session cookie.
    pub cookie_name: String,

    /// Mark the session cookie `Secure`. Disable only for local testing.
    pub cookie_secure: bool,

    /// Idle expiry for session entries.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "bancroft_session".to_string(),
            cookie_secure: true,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}
