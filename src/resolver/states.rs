//! State Resolver / Validator
//!
//! Discovers the valid state set of a work item type and validates proposed
//! transitions against it before any write is attempted. Validity means
//! membership only: which transitions are legal *between* states is the
//! backend workflow engine's concern.

use std::sync::Arc;

use tracing::warn;

use crate::error::{DevOpsError, Result};
use crate::resolver::{cache_keys, MetadataCache, MetadataFetcher};

// == Fallback States ==
/// Generic state list used when state discovery fails.
///
/// These are the base states every stock process template shares; a custom
/// template may differ, which is why the fallback is a policy choice.
pub const GENERIC_FALLBACK_STATES: [&str; 5] = ["New", "Active", "Resolved", "Closed", "Removed"];

// == Fallback Policy ==
/// What `states_for_type` does when the underlying fetch fails.
///
/// Discovery is advisory (it pre-validates writes the backend will check
/// anyway), so the default degrades to the generic list. Deployments with
/// heavily customized templates can demand a hard failure instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Return [`GENERIC_FALLBACK_STATES`] on fetch failure (never cached)
    #[default]
    GenericStates,
    /// Surface the fetch error to the caller
    Propagate,
}

// == State Resolver ==
/// Resolves and validates work item states per concrete type.
pub struct StateResolver {
    fetcher: Arc<dyn MetadataFetcher>,
    cache: Arc<MetadataCache>,
    organization: String,
    project: String,
    fallback: FallbackPolicy,
}

impl StateResolver {
    // == Constructor ==
    /// Creates a resolver for one (organization, project) scope with the
    /// default fallback policy.
    pub fn new(
        fetcher: Arc<dyn MetadataFetcher>,
        cache: Arc<MetadataCache>,
        organization: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            organization: organization.into(),
            project: project.into(),
            fallback: FallbackPolicy::default(),
        }
    }

    /// Overrides the fetch-failure policy.
    pub fn with_fallback_policy(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    // == States For Type ==
    /// Returns the valid state names for a work item type, in backend order.
    ///
    /// Successful discoveries are cached per (project, type). A failed fetch
    /// is handled per the fallback policy; the fallback list itself is never
    /// cached, so the next call retries the real fetch.
    pub async fn states_for_type(&self, work_item_type: &str) -> Result<Vec<String>> {
        let key = cache_keys::work_item_states(&self.organization, &self.project, work_item_type);
        let result = self
            .cache
            .get_or_compute(&key, None, || {
                self.fetcher.fetch_states_for_type(work_item_type)
            })
            .await;

        match result {
            Ok(states) => Ok(states),
            Err(err) => match self.fallback {
                FallbackPolicy::GenericStates => {
                    warn!(
                        work_item_type,
                        error = %err,
                        "state discovery failed, using generic fallback states"
                    );
                    Ok(GENERIC_FALLBACK_STATES
                        .iter()
                        .map(|s| s.to_string())
                        .collect())
                }
                FallbackPolicy::Propagate => Err(err),
            },
        }
    }

    // == States For Item ==
    /// Returns the valid state names for an existing work item.
    ///
    /// Performs one lookup of the item's type, then delegates to
    /// [`states_for_type`](Self::states_for_type). The type lookup itself is
    /// not covered by the fallback policy: without a type there is nothing
    /// to resolve states against.
    pub async fn states_for_item(&self, work_item_id: u32) -> Result<Vec<String>> {
        let work_item_type = self.fetcher.fetch_item_type(work_item_id).await?;
        self.states_for_type(&work_item_type).await
    }

    // == Validate For Type ==
    /// Validates a proposed state against a type's state set.
    ///
    /// Membership is case-sensitive. On mismatch the error names the
    /// offending value and enumerates the legal set, which is the primary
    /// discoverability mechanism for callers that did not pre-query.
    pub async fn validate_state_for_type(
        &self,
        work_item_type: &str,
        requested_state: &str,
    ) -> Result<String> {
        let available = self.states_for_type(work_item_type).await?;

        if available.iter().any(|state| state == requested_state) {
            Ok(requested_state.to_string())
        } else {
            Err(DevOpsError::Validation {
                state: requested_state.to_string(),
                work_item_type: work_item_type.to_string(),
                available,
            })
        }
    }

    // == Validate For Item ==
    /// Validates a proposed state for an existing work item.
    pub async fn validate_state_for_item(
        &self,
        work_item_id: u32,
        requested_state: &str,
    ) -> Result<String> {
        let work_item_type = self.fetcher.fetch_item_type(work_item_id).await?;
        self.validate_state_for_type(&work_item_type, requested_state)
            .await
    }
}
