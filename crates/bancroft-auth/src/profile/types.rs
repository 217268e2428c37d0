//! Customer profile data model.
//!
//! Back-office records as returned by the customer directory. Field
//! naming follows the directory's camelCase wire format.

use serde::{Deserialize, Serialize};

/// Relationship type marking a related party as a director.
pub const DIRECTOR_RELATIONSHIP: &str = "DIRECTOR";

/// A resolved back-office customer/business record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    /// Party identifier of the business entity.
    pub party_id: String,

    /// Business-partner identifier. A non-empty value (together with a
    /// registered cellphone) makes the party eligible for OTP step-up.
    #[serde(default)]
    pub bp_id: String,

    /// Display name of the customer or business.
    pub customer_name: String,

    /// Relationship of the signed-in identity to this record.
    #[serde(default)]
    pub relationship_type: String,

    /// Accounts held by this business entity.
    #[serde(default)]
    pub account_details: Vec<AccountDetail>,

    /// Registered contact mechanisms.
    #[serde(default)]
    pub contact_mechanisms: Vec<ContactMechanism>,

    /// Related parties; entries flagged as directors can each be resolved
    /// to their own profile.
    #[serde(default)]
    pub related_parties: Vec<RelatedParty>,
}

impl CustomerProfile {
    /// Returns the registered cellphone number, if any.
    #[must_use]
    pub fn cellphone(&self) -> Option<&str> {
        self.contact_mechanisms
            .iter()
            .find(|m| m.kind == ContactMechanismType::Cellphone)
            .map(|m| m.value.as_str())
    }

    /// Returns the related parties flagged as directors.
    #[must_use]
    pub fn directors(&self) -> Vec<&RelatedParty> {
        self.related_parties
            .iter()
            .filter(|p| p.relationship_type.eq_ignore_ascii_case(DIRECTOR_RELATIONSHIP))
            .collect()
    }

    /// Returns `true` if this party must pass the OTP step-up before
    /// entering the application: it carries a business-partner id and a
    /// cellphone to deliver the passcode to.
    #[must_use]
    pub fn is_step_up_eligible(&self) -> bool {
        !self.bp_id.is_empty() && self.cellphone().is_some()
    }
}

/// One account held by a business entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    /// Account number.
    pub account_number: String,

    /// Product/account type.
    #[serde(default)]
    pub account_type: String,
}

/// How a contact mechanism reaches the party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContactMechanismType {
    /// Email address.
    Email,
    /// Mobile number, the OTP delivery channel.
    Cellphone,
    /// Landline.
    Phone,
}

/// A registered contact mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMechanism {
    /// Mechanism type.
    #[serde(rename = "type")]
    pub kind: ContactMechanismType,

    /// Address or number.
    pub value: String,
}

/// A party related to a business entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedParty {
    /// Business-partner identifier of the related party.
    pub bp_id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Relationship to the business entity, e.g. `DIRECTOR`.
    #[serde(default)]
    pub relationship_type: String,
}

/// Outcome of the director fan-out.
///
/// Successes and failures are always separated so the caller can render
/// what resolved and flag what did not; one failed director never hides
/// the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorResolution {
    /// Fully resolved director profiles.
    pub success: Vec<CustomerProfile>,

    /// Directors that could not be resolved, with the reason.
    pub failed: Vec<DirectorFailure>,
}

/// A director that failed to resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorFailure {
    /// Business-partner identifier of the failing director.
    pub bp_id: String,

    /// Why resolution failed.
    pub reason: String,
}
