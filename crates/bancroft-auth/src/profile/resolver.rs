//! Customer profile resolution and director fan-out.
//!
//! [`CustomerProfileResolver`] maps an identity claim to its back-office
//! record, and fans out over the record's director-flagged related
//! parties. Each director resolves independently — a BPID-to-GUID lookup
//! followed by a profile fetch — under a bounded concurrency cap, and one
//! failure never aborts the batch: the aggregate always separates
//! `success` from `failed`.

use futures_util::{StreamExt, stream};

use crate::error::SigninError;
use crate::profile::client::DirectoryClient;
use crate::profile::types::{CustomerProfile, DirectorFailure, DirectorResolution};

/// Resolves customer profiles and their directors.
pub struct CustomerProfileResolver {
    directory: DirectoryClient,
    max_concurrency: usize,
}

impl CustomerProfileResolver {
    /// Creates a resolver over the given directory client.
    #[must_use]
    pub fn new(directory: DirectoryClient, max_concurrency: usize) -> Self {
        Self {
            directory,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Resolves the back-office profile keyed by the identity subject.
    ///
    /// # Errors
    ///
    /// Returns [`SigninError::ProfileResolutionFailed`]; fatal for the
    /// affected business entity.
    pub async fn resolve_by_identity(
        &self,
        subject_id: &str,
        access_token: &str,
    ) -> Result<CustomerProfile, SigninError> {
        let profile = self
            .directory
            .profile_by_identity(subject_id, access_token)
            .await?;

        tracing::info!(
            party_id = %profile.party_id,
            related_parties = profile.related_parties.len(),
            "Resolved customer profile"
        );

        Ok(profile)
    }

    /// Resolves every director-flagged related party of a profile.
    ///
    /// Per director: BPID -> GUID via the directory, then GUID -> full
    /// profile. Pairs run concurrently up to the configured cap. Partial
    /// failure is expected: failed directors land in
    /// [`DirectorResolution::failed`] with their `bp_id` and reason, and
    /// the rest still resolve. Zero directors returns an empty result
    /// without touching the network.
    pub async fn resolve_directors(
        &self,
        profile: &CustomerProfile,
        access_token: &str,
    ) -> DirectorResolution {
        let directors = profile.directors();
        if directors.is_empty() {
            return DirectorResolution::default();
        }

        let bp_ids: Vec<String> = directors.iter().map(|party| party.bp_id.clone()).collect();
        let outcomes: Vec<Result<CustomerProfile, DirectorFailure>> = stream::iter(bp_ids)
            .map(|bp_id| async move {
                self.resolve_one_director(&bp_id, access_token)
                    .await
                    .map_err(|reason| {
                        tracing::warn!(bp_id = %bp_id, %reason, "Director resolution failed");
                        DirectorFailure { bp_id, reason }
                    })
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut resolution = DirectorResolution::default();
        for outcome in outcomes {
            match outcome {
                Ok(director) => resolution.success.push(director),
                Err(failure) => resolution.failed.push(failure),
            }
        }

        tracing::info!(
            party_id = %profile.party_id,
            resolved = resolution.success.len(),
            failed = resolution.failed.len(),
            "Director fan-out complete"
        );

        resolution
    }

    async fn resolve_one_director(
        &self,
        bp_id: &str,
        access_token: &str,
    ) -> Result<CustomerProfile, String> {
        let guid = self.directory.guid_for_bp_id(bp_id, access_token).await?;
        self.directory.profile_by_guid(&guid, access_token).await
    }
}

impl std::fmt::Debug for CustomerProfileResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerProfileResolver")
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}
