//! Resolver Module
//!
//! Maps abstract work item categories to the concrete type names a project
//! actually uses, and discovers/validates the state sets of those types.
//! Both resolvers share one [`ExpiringCache`] of name listings and consume
//! the backend strictly through the [`MetadataFetcher`] boundary.

mod category;
mod states;
mod types;

use async_trait::async_trait;

use crate::cache::ExpiringCache;
use crate::error::Result;

// Re-export public types
pub use category::Category;
pub use states::{FallbackPolicy, StateResolver, GENERIC_FALLBACK_STATES};
pub use types::{ProcessTemplateInfo, TypeResolver};

// == Metadata Cache Alias ==
/// The shared metadata cache: every cached fact is an ordered list of names
/// (work item types for a project, states for a type).
pub type MetadataCache = ExpiringCache<Vec<String>>;

// == Metadata Fetcher Boundary ==
/// Raw metadata listings supplied by the backend.
///
/// Implementations perform the network calls and nothing else: no caching,
/// no retries, no fallbacks. Those policies belong to the resolvers above
/// this boundary.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// All work item type names available in the configured project.
    async fn fetch_available_types(&self) -> Result<Vec<String>>;

    /// The valid state names for one work item type, in backend order.
    async fn fetch_states_for_type(&self, work_item_type: &str) -> Result<Vec<String>>;

    /// The concrete type name of one existing work item.
    async fn fetch_item_type(&self, work_item_id: u32) -> Result<String>;
}

// == Cache Keys ==
/// Cache key construction.
///
/// Keys lead with the `{organization}:{project}` scope so that every cached
/// fact about one project shares a common prefix and can be dropped in one
/// `invalidate_prefix` call.
pub mod cache_keys {
    /// Prefix shared by all cached facts about one project.
    pub fn project_prefix(organization: &str, project: &str) -> String {
        format!("{}:{}:", organization, project)
    }

    /// Key for the project's work item type listing.
    pub fn work_item_types(organization: &str, project: &str) -> String {
        format!("{}work_item_types", project_prefix(organization, project))
    }

    /// Key for one work item type's state listing.
    pub fn work_item_states(organization: &str, project: &str, work_item_type: &str) -> String {
        format!(
            "{}work_item_states:{}",
            project_prefix(organization, project),
            work_item_type
        )
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_keys_share_project_prefix() {
            let prefix = project_prefix("contoso", "Website");
            assert!(work_item_types("contoso", "Website").starts_with(&prefix));
            assert!(work_item_states("contoso", "Website", "Bug").starts_with(&prefix));
        }

        #[test]
        fn test_distinct_types_get_distinct_state_keys() {
            assert_ne!(
                work_item_states("contoso", "Website", "Bug"),
                work_item_states("contoso", "Website", "Task")
            );
        }
    }
}
