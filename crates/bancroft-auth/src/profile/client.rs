//! Customer directory HTTP clients.
//!
//! Two lookups against the back-office directory, both Bearer-authenticated:
//!
//! - profile by identifier (identity subject or BPGUID)
//! - BPID-to-GUID resolution (`POST {"bpId": ...}`); only entries whose
//!   `httpStatus` is `"OK"` are usable

use serde::{Deserialize, Serialize};

use crate::config::DirectoryConfig;
use crate::error::SigninError;
use crate::profile::types::CustomerProfile;

/// Client for the customer profile directory.
pub struct DirectoryClient {
    http: reqwest::Client,
    config: DirectoryConfig,
}

/// Request body for the GUID lookup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GuidLookupRequest<'a> {
    bp_id: &'a str,
}

/// Response envelope of the GUID lookup.
#[derive(Debug, Deserialize)]
struct GuidLookupResponse {
    #[serde(default)]
    customers: Vec<GuidLookupEntry>,
}

/// One directory entry in a GUID lookup response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuidLookupEntry {
    #[serde(default)]
    bp_id: String,
    #[serde(default)]
    bp_guid: String,
    #[serde(default)]
    error_msg: String,
    #[serde(default)]
    http_status: String,
}

impl DirectoryClient {
    /// Creates a directory client sharing the given HTTP client.
    #[must_use]
    pub fn new(config: DirectoryConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    /// Resolves the profile keyed by the identity subject.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::ProfileResolutionFailed`] on any transport
    /// or non-2xx failure.
    pub async fn profile_by_identity(
        &self,
        subject_id: &str,
        access_token: &str,
    ) -> Result<CustomerProfile, SigninError> {
        let url = format!(
            "{}/{subject_id}",
            self.config.profile_endpoint.trim_end_matches('/')
        );
        self.fetch_profile(&url, access_token)
            .await
            .map_err(SigninError::ProfileResolutionFailed)
    }

    /// Resolves the profile keyed by a BPGUID.
    ///
    /// # Errors
    ///
    /// Returns the failure reason as a plain string; the director fan-out
    /// converts it into a per-item failure entry.
    pub async fn profile_by_guid(
        &self,
        bp_guid: &str,
        access_token: &str,
    ) -> Result<CustomerProfile, String> {
        let url = format!(
            "{}/guid/{bp_guid}",
            self.config.profile_endpoint.trim_end_matches('/')
        );
        self.fetch_profile(&url, access_token).await
    }

    /// Resolves a BPID to its stable GUID.
    ///
    /// # Errors
    ///
    /// Returns the failure reason as a plain string when the lookup
    /// fails, the entry is missing, or its `httpStatus` is not `"OK"`.
    pub async fn guid_for_bp_id(&self, bp_id: &str, access_token: &str) -> Result<String, String> {
        let response = self
            .http
            .post(&self.config.guid_lookup_endpoint)
            .bearer_auth(access_token)
            .json(&GuidLookupRequest { bp_id })
            .send()
            .await
            .map_err(|e| format!("guid lookup failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("guid lookup failed: HTTP {status}"));
        }

        let body: GuidLookupResponse = response
            .json()
            .await
            .map_err(|e| format!("guid lookup returned malformed body: {e}"))?;

        let entry = body
            .customers
            .into_iter()
            .find(|c| c.bp_id == bp_id)
            .ok_or_else(|| format!("no directory entry for bpId {bp_id}"))?;

        if entry.http_status != "OK" {
            return Err(format!(
                "directory entry unusable ({}): {}",
                entry.http_status, entry.error_msg
            ));
        }
        if entry.bp_guid.is_empty() {
            return Err(format!("directory entry for bpId {bp_id} has no GUID"));
        }

        Ok(entry.bp_guid)
    }

    async fn fetch_profile(&self, url: &str, access_token: &str) -> Result<CustomerProfile, String> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| format!("profile lookup failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("profile lookup failed: HTTP {status}"));
        }

        response
            .json::<CustomerProfile>()
            .await
            .map_err(|e| format!("profile lookup returned malformed body: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_lookup_response_deserializes() {
        let json = r#"{
            "customers": [
                {"bpId": "480013", "bpGuid": "9f1c7a2e", "errorMsg": "", "httpStatus": "OK"},
                {"bpId": "480014", "bpGuid": "", "errorMsg": "not found", "httpStatus": "NOT_FOUND"}
            ]
        }"#;

        let body: GuidLookupResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.customers.len(), 2);
        assert_eq!(body.customers[0].bp_guid, "9f1c7a2e");
        assert_eq!(body.customers[1].http_status, "NOT_FOUND");
    }

    #[test]
    fn test_guid_lookup_request_uses_wire_field_name() {
        let body = serde_json::to_value(GuidLookupRequest { bp_id: "480013" }).unwrap();
        assert_eq!(body, serde_json::json!({"bpId": "480013"}));
    }
}
