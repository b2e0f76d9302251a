//! Work Item Type Resolver
//!
//! Resolves abstract categories to the concrete work item type names the
//! configured project offers, based on its process template. The project's
//! type listing goes through the shared metadata cache; resolved bindings
//! are additionally memoized per resolver instance, since a binding is a
//! pure function of the available types and dies with the resolver.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::debug;

use crate::error::{DevOpsError, Result};
use crate::resolver::{cache_keys, Category, MetadataCache, MetadataFetcher};

// == Type Resolver ==
/// Resolves work item type names based on what's available in the project.
pub struct TypeResolver {
    fetcher: Arc<dyn MetadataFetcher>,
    cache: Arc<MetadataCache>,
    organization: String,
    project: String,
    /// Memoized (category, preferred override) -> resolved type name
    bindings: Mutex<HashMap<(Category, Option<String>), String>>,
}

impl TypeResolver {
    // == Constructor ==
    /// Creates a resolver for one (organization, project) scope.
    ///
    /// # Arguments
    /// * `fetcher` - Backend metadata source
    /// * `cache` - Shared metadata cache instance
    /// * `organization` - Organization name, used in cache keys
    /// * `project` - Project name, used in cache keys
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
            bindings: Mutex::new(HashMap::new()),
        }
    }

    // == Available Types ==
    /// Returns all work item type names present in the project.
    ///
    /// Cached under the project scope with the cache's default TTL; fetch
    /// failures propagate uncached.
    pub async fn available_types(&self) -> Result<Vec<String>> {
        let key = cache_keys::work_item_types(&self.organization, &self.project);
        self.cache
            .get_or_compute(&key, None, || self.fetcher.fetch_available_types())
            .await
    }

    // == Resolve ==
    /// Resolves a category to a concrete type name.
    ///
    /// An available `prefer` override always wins over convention. Otherwise
    /// the category's candidates are tried in preference order. Resolution
    /// failure is always reported, never silently defaulted: creating the
    /// wrong work item type is a high-cost mistake.
    pub async fn resolve(&self, category: Category, prefer: Option<&str>) -> Result<String> {
        let binding_key = (category, prefer.map(str::to_string));
        if let Some(resolved) = self.lock_bindings().get(&binding_key) {
            return Ok(resolved.clone());
        }

        let available = self.available_types().await?;

        if let Some(preferred) = prefer {
            if available.iter().any(|name| name == preferred) {
                debug!(category = %category, preferred, "resolved via explicit override");
                self.lock_bindings()
                    .insert(binding_key, preferred.to_string());
                return Ok(preferred.to_string());
            }
        }

        for &candidate in category.candidates() {
            if available.iter().any(|name| name == candidate) {
                debug!(category = %category, candidate, "resolved via preference table");
                self.lock_bindings()
                    .insert(binding_key, candidate.to_string());
                return Ok(candidate.to_string());
            }
        }

        let mut sorted = available;
        sorted.sort();
        Err(DevOpsError::Resolution {
            category: category.as_str().to_string(),
            available: sorted,
        })
    }

    // == Process Template Info ==
    /// Infers the project's process template from which conventional
    /// backlog type name is present.
    ///
    /// Diagnostic only: nothing depends on the inferred name for
    /// correctness, only on which type names are actually available.
    pub async fn process_template_info(&self) -> Result<ProcessTemplateInfo> {
        let available = self.available_types().await?;
        let has = |name: &str| available.iter().any(|t| t == name);

        let template = if has("Product Backlog Item") {
            "Scrum"
        } else if has("User Story") {
            "Agile"
        } else if has("Issue") {
            "Basic"
        } else if has("Requirement") {
            "CMMI"
        } else {
            "Unknown/Custom"
        };

        let backlog_item_type = Category::BacklogItem
            .candidates()
            .iter()
            .find(|candidate| has(candidate))
            .map_or_else(|| "Unknown".to_string(), |c| (*c).to_string());

        let mut available_types = available;
        available_types.sort();

        Ok(ProcessTemplateInfo {
            template: template.to_string(),
            backlog_item_type,
            available_types,
        })
    }

    // == Refresh ==
    /// Drops the binding memo and every cached listing for this project,
    /// forcing the next resolution to rediscover the schema.
    pub fn refresh(&self) {
        self.lock_bindings().clear();
        let prefix = cache_keys::project_prefix(&self.organization, &self.project);
        let removed = self.cache.invalidate_prefix(&prefix);
        debug!(removed, "refreshed project metadata");
    }

    fn lock_bindings(&self) -> std::sync::MutexGuard<'_, HashMap<(Category, Option<String>), String>> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Process Template Info ==
/// Human-readable summary of the project's process template shape.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessTemplateInfo {
    /// Inferred template name (Scrum, Agile, Basic, CMMI, Unknown/Custom)
    pub template: String,
    /// The backlog item type this project uses, or "Unknown"
    pub backlog_item_type: String,
    /// Every available type name, sorted
    pub available_types: Vec<String>,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::cache::ExpiringCache;

    struct StubFetcher {
        types: Vec<&'static str>,
        type_calls: AtomicUsize,
    }

    impl StubFetcher {
        fn new(types: Vec<&'static str>) -> Self {
            Self {
                types,
                type_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MetadataFetcher for StubFetcher {
        async fn fetch_available_types(&self) -> Result<Vec<String>> {
            self.type_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.types.iter().map(|t| t.to_string()).collect())
        }

        async fn fetch_states_for_type(&self, _work_item_type: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn fetch_item_type(&self, _work_item_id: u32) -> Result<String> {
            Err(DevOpsError::fetch("get work item", "not implemented"))
        }
    }

    fn resolver_with(types: Vec<&'static str>) -> (Arc<StubFetcher>, TypeResolver) {
        let fetcher = Arc::new(StubFetcher::new(types));
        let cache = Arc::new(ExpiringCache::new(300));
        let resolver = TypeResolver::new(fetcher.clone(), cache, "contoso", "Website");
        (fetcher, resolver)
    }

    #[tokio::test]
    async fn test_resolve_walks_preference_order() {
        let (_, resolver) = resolver_with(vec!["User Story", "Task", "Bug"]);

        // "Product Backlog Item" is absent, so the next candidate wins
        let resolved = resolver.resolve(Category::BacklogItem, None).await.unwrap();
        assert_eq!(resolved, "User Story");
    }

    #[tokio::test]
    async fn test_resolve_override_wins_over_convention() {
        let (_, resolver) = resolver_with(vec!["Product Backlog Item", "User Story"]);

        let resolved = resolver
            .resolve(Category::BacklogItem, Some("User Story"))
            .await
            .unwrap();
        assert_eq!(resolved, "User Story");
    }

    #[tokio::test]
    async fn test_resolve_unavailable_override_falls_back_to_table() {
        let (_, resolver) = resolver_with(vec!["Product Backlog Item"]);

        let resolved = resolver
            .resolve(Category::BacklogItem, Some("User Story"))
            .await
            .unwrap();
        assert_eq!(resolved, "Product Backlog Item");
    }

    #[tokio::test]
    async fn test_resolve_failure_lists_available_types() {
        let (_, resolver) = resolver_with(vec!["Task"]);

        let err = resolver.resolve(Category::Epic, None).await.unwrap_err();
        match err {
            DevOpsError::Resolution {
                category,
                available,
            } => {
                assert_eq!(category, "epic");
                assert_eq!(available, vec!["Task".to_string()]);
            }
            other => panic!("expected Resolution, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_memoizes_bindings() {
        let (fetcher, resolver) = resolver_with(vec!["User Story", "Task"]);

        resolver.resolve(Category::BacklogItem, None).await.unwrap();
        resolver.resolve(Category::BacklogItem, None).await.unwrap();
        resolver.resolve(Category::Task, None).await.unwrap();

        // The second backlog_item call never re-read the listing; the task
        // call hit the shared cache rather than the fetcher.
        assert_eq!(fetcher.type_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_forces_rediscovery() {
        let (fetcher, resolver) = resolver_with(vec!["User Story"]);

        resolver.resolve(Category::BacklogItem, None).await.unwrap();
        resolver.refresh();
        resolver.resolve(Category::BacklogItem, None).await.unwrap();

        assert_eq!(fetcher.type_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_template_inference() {
        let cases = [
            (vec!["Product Backlog Item", "Task"], "Scrum"),
            (vec!["User Story", "Task"], "Agile"),
            (vec!["Issue", "Task"], "Basic"),
            (vec!["Requirement", "Task"], "CMMI"),
            (vec!["Widget"], "Unknown/Custom"),
        ];

        for (types, expected) in cases {
            let (_, resolver) = resolver_with(types);
            let info = resolver.process_template_info().await.unwrap();
            assert_eq!(info.template, expected);
        }
    }

    #[tokio::test]
    async fn test_template_info_backlog_type() {
        let (_, resolver) = resolver_with(vec!["Issue", "Task"]);

        let info = resolver.process_template_info().await.unwrap();
        assert_eq!(info.backlog_item_type, "Issue");
        assert_eq!(info.available_types, vec!["Issue", "Task"]);
    }
}
