//! Azure DevOps REST API client
//!
//! Thin authenticated wrapper over the work item tracking endpoints. The
//! client performs no caching and no retries: resolution-layer callers own
//! those policies, and write paths must never be replayed implicitly.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{DevOpsError, Result};
use crate::models::{
    fields_to_patch, FieldDefinition, ListEnvelope, PatchOperation, StateDefinition, WorkItem,
    WorkItemTypeDefinition, WorkItemTypeInfo,
};
use crate::resolver::MetadataFetcher;

// == Constants ==
/// Relation type of a parent link, from the child's perspective.
pub const PARENT_LINK_TYPE: &str = "System.LinkTypes.Hierarchy-Reverse";

// == Client ==
/// Client for the Azure DevOps work item tracking REST API.
pub struct AzureDevOpsClient {
    config: Config,
    http: reqwest::Client,
}

impl AzureDevOpsClient {
    // == Constructor ==
    /// Creates a client from a validated configuration.
    ///
    /// Work item writes use JSON Patch documents, so the patch content type
    /// is installed as a default header; reads are unaffected because the
    /// API ignores content type on bodyless requests.
    pub fn new(config: Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json-patch+json"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| DevOpsError::fetch("build HTTP client", err))?;

        Ok(Self { config, http })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // == URL Construction ==
    /// Project-scoped API URL.
    fn project_url(&self, path: &str) -> String {
        format!(
            "{}/{}/_apis/{}?api-version={}",
            self.config.base_url(),
            self.config.project,
            path,
            self.config.api_version
        )
    }

    /// Organization-scoped API URL (work item reads and writes address items
    /// by ID without a project segment).
    fn org_url(&self, path: &str) -> String {
        format!(
            "{}/_apis/{}?api-version={}",
            self.config.base_url(),
            path,
            self.config.api_version
        )
    }

    // == Request Plumbing ==
    /// Sends a request with PAT auth and turns non-success responses into
    /// `Fetch` errors carrying the status and response body.
    async fn send(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        debug!(operation, "sending request");
        let response = request
            .basic_auth("", Some(&self.config.pat))
            .send()
            .await
            .map_err(|err| DevOpsError::fetch(operation, err))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = if body.is_empty() {
            "no error details".to_string()
        } else {
            body
        };
        Err(DevOpsError::Fetch {
            operation: operation.to_string(),
            message: format!("HTTP {}: {}", status, detail),
        })
    }

    /// Deserializes a response body, attributing parse failures to the
    /// operation that produced them.
    async fn into_json<T: DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        response
            .json()
            .await
            .map_err(|err| DevOpsError::fetch(operation, err))
    }

    // == Create Work Item ==
    /// Creates a new work item of the given concrete type.
    ///
    /// # Arguments
    /// * `work_item_type` - Concrete type name (e.g. "Product Backlog Item")
    /// * `fields` - Field values keyed by reference name
    pub async fn create_work_item(
        &self,
        work_item_type: &str,
        fields: &Map<String, Value>,
    ) -> Result<WorkItem> {
        let operation = "create work item";
        let url = self.project_url(&format!("wit/workitems/${}", work_item_type));
        let patch = fields_to_patch(fields);

        let response = self.send(operation, self.http.post(&url).json(&patch)).await?;
        Self::into_json(operation, response).await
    }

    // == Get Work Item ==
    /// Fetches a work item by ID.
    ///
    /// # Arguments
    /// * `fields` - Optional restriction to specific field reference names
    /// * `expand` - Optional expansion ("relations", "all", ...)
    pub async fn get_work_item(
        &self,
        work_item_id: u32,
        fields: Option<&[&str]>,
        expand: Option<&str>,
    ) -> Result<WorkItem> {
        let operation = "get work item";
        let mut url = self.org_url(&format!("wit/workitems/{}", work_item_id));
        if let Some(fields) = fields {
            url.push_str(&format!("&fields={}", fields.join(",")));
        }
        if let Some(expand) = expand {
            url.push_str(&format!("&$expand={}", expand));
        }

        let response = self.send(operation, self.http.get(&url)).await?;
        Self::into_json(operation, response).await
    }

    // == Update Work Item ==
    /// Updates fields of an existing work item.
    pub async fn update_work_item(
        &self,
        work_item_id: u32,
        updates: &Map<String, Value>,
    ) -> Result<WorkItem> {
        let operation = "update work item";
        let url = self.org_url(&format!("wit/workitems/{}", work_item_id));
        let patch = fields_to_patch(updates);

        let response = self.send(operation, self.http.patch(&url).json(&patch)).await?;
        Self::into_json(operation, response).await
    }

    // == Delete Work Item ==
    /// Deletes a work item.
    ///
    /// # Arguments
    /// * `destroy` - Permanently delete instead of moving to the recycle bin
    pub async fn delete_work_item(&self, work_item_id: u32, destroy: bool) -> Result<()> {
        let operation = "delete work item";
        let mut url = self.org_url(&format!("wit/workitems/{}", work_item_id));
        if destroy {
            url.push_str("&destroy=true");
        }

        self.send(operation, self.http.delete(&url)).await?;
        Ok(())
    }

    // == Add Comment ==
    /// Adds a comment to a work item.
    ///
    /// Writes through the `System.History` field rather than the comments
    /// API for compatibility across API versions.
    pub async fn add_comment(&self, work_item_id: u32, comment: &str) -> Result<WorkItem> {
        let mut updates = Map::new();
        updates.insert("System.History".to_string(), json!(comment));
        self.update_work_item(work_item_id, &updates).await
    }

    // == Add Parent Link ==
    /// Links a work item to a parent.
    pub async fn add_parent_link(
        &self,
        child_id: u32,
        parent_id: u32,
        link_type: Option<&str>,
    ) -> Result<WorkItem> {
        let operation = "add parent link";
        let url = self.org_url(&format!("wit/workitems/{}", child_id));
        let patch = vec![PatchOperation::add_relation(
            link_type.unwrap_or(PARENT_LINK_TYPE),
            format!("{}/_apis/wit/workitems/{}", self.config.base_url(), parent_id),
        )];

        let response = self.send(operation, self.http.patch(&url).json(&patch)).await?;
        Self::into_json(operation, response).await
    }

    // == Get Work Item Types ==
    /// Lists the work item types defined in the project.
    pub async fn get_work_item_types(&self) -> Result<Vec<WorkItemTypeInfo>> {
        let operation = "get work item types";
        let url = self.project_url("wit/workitemtypes");

        let response = self.send(operation, self.http.get(&url)).await?;
        let envelope: ListEnvelope<WorkItemTypeInfo> = Self::into_json(operation, response).await?;
        Ok(envelope.value)
    }

    // == Get Type Definition ==
    /// Fetches the full definition of one work item type, states included.
    pub async fn get_work_item_type_definition(
        &self,
        work_item_type: &str,
    ) -> Result<WorkItemTypeDefinition> {
        let operation = "get work item type definition";
        let url = self.project_url(&format!("wit/workitemtypes/{}", work_item_type));

        let response = self.send(operation, self.http.get(&url)).await?;
        Self::into_json(operation, response).await
    }

    // == Get Type States ==
    /// Returns the state definitions of one work item type, in the order the
    /// backend declares them.
    pub async fn get_work_item_type_states(
        &self,
        work_item_type: &str,
    ) -> Result<Vec<StateDefinition>> {
        let definition = self.get_work_item_type_definition(work_item_type).await?;
        Ok(definition.states)
    }

    // == Get Fields ==
    /// Lists every field defined in the organization.
    pub async fn get_work_item_fields(&self) -> Result<Vec<FieldDefinition>> {
        let operation = "get work item fields";
        let url = self.org_url("wit/fields");

        let response = self.send(operation, self.http.get(&url)).await?;
        let envelope: ListEnvelope<FieldDefinition> = Self::into_json(operation, response).await?;
        Ok(envelope.value)
    }
}

// == Metadata Fetcher Implementation ==
#[async_trait]
impl MetadataFetcher for AzureDevOpsClient {
    async fn fetch_available_types(&self) -> Result<Vec<String>> {
        let types = self.get_work_item_types().await?;
        Ok(types.into_iter().map(|t| t.name).collect())
    }

    async fn fetch_states_for_type(&self, work_item_type: &str) -> Result<Vec<String>> {
        let states = self.get_work_item_type_states(work_item_type).await?;
        Ok(states.into_iter().map(|s| s.name).collect())
    }

    async fn fetch_item_type(&self, work_item_id: u32) -> Result<String> {
        let item = self
            .get_work_item(work_item_id, Some(&["System.WorkItemType"]), None)
            .await?;
        item.work_item_type()
            .map(str::to_string)
            .ok_or_else(|| {
                DevOpsError::fetch(
                    "get work item",
                    format!("work item {} has no System.WorkItemType field", work_item_id),
                )
            })
    }
}
