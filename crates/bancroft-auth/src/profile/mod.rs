//! Customer profile resolution.
//!
//! - [`types`] - back-office profile data model
//! - [`client`] - directory HTTP lookups (profile, BPID-to-GUID)
//! - [`resolver`] - identity-to-profile resolution and the
//!   partial-failure-tolerant director fan-out

pub mod client;
pub mod resolver;
pub mod types;

pub use client::DirectoryClient;
pub use resolver::CustomerProfileResolver;
pub use types::{
    AccountDetail, ContactMechanism, ContactMechanismType, CustomerProfile, DIRECTOR_RELATIONSHIP,
    DirectorFailure, DirectorResolution, RelatedParty,
};
