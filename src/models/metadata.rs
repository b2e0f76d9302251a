//! Schema metadata DTOs
//!
//! Work item type, state, and field definitions as reported by the project's
//! process template.

use serde::{Deserialize, Serialize};

/// Standard list envelope wrapping collection responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    /// Number of items, when the API reports it
    #[serde(default)]
    pub count: Option<u64>,
    /// The items themselves
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// A work item type as listed by `wit/workitemtypes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemTypeInfo {
    /// Display name (e.g. "Product Backlog Item")
    pub name: String,
    /// Reference name, when reported
    #[serde(default)]
    pub reference_name: Option<String>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

/// One state of a work item type, in the backend's declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDefinition {
    /// State name (e.g. "Active")
    pub name: String,
    /// Display color
    #[serde(default)]
    pub color: Option<String>,
    /// State category (Proposed, InProgress, Resolved, Completed, Removed)
    #[serde(default)]
    pub category: Option<String>,
}

/// Full definition of one work item type, including its states.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemTypeDefinition {
    /// Display name
    pub name: String,
    /// Reference name, when reported
    #[serde(default)]
    pub reference_name: Option<String>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Valid states in backend order
    #[serde(default = "Vec::new")]
    pub states: Vec<StateDefinition>,
}

/// A field definition as listed by `wit/fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Display name (e.g. "Story Points")
    pub name: String,
    /// Reference name (e.g. "Microsoft.VSTS.Scheduling.StoryPoints")
    pub reference_name: String,
    /// Field data type
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
}
