//! Work item DTO
//!
//! A work item's fields are project-defined, so they stay an open map keyed
//! by field reference name; typed accessors cover the handful of well-known
//! system fields the library itself reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A work item as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Work item ID
    pub id: u32,
    /// Revision number
    #[serde(default)]
    pub rev: Option<u32>,
    /// Field values keyed by reference name (e.g. `System.Title`)
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// API URL of this work item
    #[serde(default)]
    pub url: Option<String>,
}

impl WorkItem {
    // == Field Access ==
    /// Returns a field's string value by reference name.
    pub fn field_str(&self, reference_name: &str) -> Option<&str> {
        self.fields.get(reference_name).and_then(Value::as_str)
    }

    /// The `System.Title` field.
    pub fn title(&self) -> Option<&str> {
        self.field_str("System.Title")
    }

    /// The `System.State` field.
    pub fn state(&self) -> Option<&str> {
        self.field_str("System.State")
    }

    /// The `System.WorkItemType` field.
    pub fn work_item_type(&self) -> Option<&str> {
        self.field_str("System.WorkItemType")
    }

    /// The assignee's display name.
    ///
    /// The API returns `System.AssignedTo` either as an identity object or,
    /// in older payload shapes, as a plain string.
    pub fn assigned_to(&self) -> Option<&str> {
        match self.fields.get("System.AssignedTo") {
            Some(Value::String(name)) => Some(name),
            Some(Value::Object(identity)) => {
                identity.get("displayName").and_then(Value::as_str)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_item() -> WorkItem {
        serde_json::from_value(json!({
            "id": 42,
            "rev": 3,
            "fields": {
                "System.Title": "Fix login",
                "System.State": "Active",
                "System.WorkItemType": "Bug",
                "System.AssignedTo": {
                    "displayName": "Jane Doe",
                    "uniqueName": "jane@contoso.com"
                }
            },
            "url": "https://dev.azure.com/contoso/_apis/wit/workItems/42"
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_and_accessors() {
        let item = sample_item();

        assert_eq!(item.id, 42);
        assert_eq!(item.rev, Some(3));
        assert_eq!(item.title(), Some("Fix login"));
        assert_eq!(item.state(), Some("Active"));
        assert_eq!(item.work_item_type(), Some("Bug"));
        assert_eq!(item.assigned_to(), Some("Jane Doe"));
    }

    #[test]
    fn test_assigned_to_plain_string() {
        let item: WorkItem = serde_json::from_value(json!({
            "id": 7,
            "fields": { "System.AssignedTo": "jane@contoso.com" }
        }))
        .unwrap();

        assert_eq!(item.assigned_to(), Some("jane@contoso.com"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let item: WorkItem = serde_json::from_value(json!({ "id": 7 })).unwrap();

        assert!(item.title().is_none());
        assert!(item.assigned_to().is_none());
        assert!(item.rev.is_none());
    }
}
