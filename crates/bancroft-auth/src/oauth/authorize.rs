//! Authorization URL builder.
//!
//! Assembles the IdP redirect URL from generated PKCE material and the
//! static client configuration. The registered `redirect_uri` is a hard
//! contract: the value placed in the URL is byte-identical to the
//! configured string, because a mismatch is a common cause of rejected
//! authorization requests.

use url::Url;

use crate::config::IdpConfig;
use crate::error::SigninError;
use crate::oauth::pkce::PkceMaterial;

/// Builds authorization redirect URLs for one configured IdP client.
#[derive(Debug, Clone)]
pub struct AuthorizationUrlBuilder {
    idp: IdpConfig,
}

impl AuthorizationUrlBuilder {
    /// Creates a builder for the given client configuration.
    #[must_use]
    pub fn new(idp: IdpConfig) -> Self {
        Self { idp }
    }

    /// Builds the authorization URL for one attempt's PKCE material.
    ///
    /// Emits `response_type=code`, the client id, the registered redirect
    /// URI, the scope list, `state`, `nonce`, `code_challenge` and
    /// `code_challenge_method=S256`, all percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::Configuration`] if a required value is
    /// missing or the endpoint does not parse; parameters are never
    /// silently omitted.
    pub fn build(&self, material: &PkceMaterial) -> Result<Url, SigninError> {
        for (value, name) in [
            (&self.idp.authorization_endpoint, "idp.authorization_endpoint"),
            (&self.idp.client_id, "idp.client_id"),
            (&self.idp.redirect_uri, "idp.redirect_uri"),
        ] {
            if value.trim().is_empty() {
                return Err(SigninError::configuration(format!("missing {name}")));
            }
        }

        let mut url = Url::parse(&self.idp.authorization_endpoint).map_err(|e| {
            SigninError::configuration(format!("invalid idp.authorization_endpoint: {e}"))
        })?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.idp.client_id);
            params.append_pair("redirect_uri", &self.idp.redirect_uri);
            params.append_pair("scope", &self.idp.effective_scopes().join(" "));
            params.append_pair("state", material.state.as_str());
            params.append_pair("nonce", material.nonce.as_str());
            params.append_pair("code_challenge", material.challenge.as_str());
            params.append_pair("code_challenge_method", "S256");
        }

        tracing::debug!(
            endpoint = %self.idp.authorization_endpoint,
            client_id = %self.idp.client_id,
            "Built authorization URL"
        );

        Ok(url)
    }
}
