//! JSON Patch document construction
//!
//! Work item writes use `application/json-patch+json` documents made of
//! `add` operations, one per field, plus relation operations for links.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One operation of a JSON Patch document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Patch verb; work item writes only ever use "add"
    pub op: String,
    /// Target path (e.g. `/fields/System.Title`)
    pub path: String,
    /// Value to write
    pub value: Value,
}

impl PatchOperation {
    // == Field Operation ==
    /// Builds an `add` operation for a field reference name.
    pub fn add_field(reference_name: &str, value: Value) -> Self {
        Self {
            op: "add".to_string(),
            path: format!("/fields/{}", reference_name),
            value,
        }
    }

    // == Relation Operation ==
    /// Builds an `add` operation appending a relation (e.g. a parent link).
    pub fn add_relation(rel: &str, url: String) -> Self {
        Self {
            op: "add".to_string(),
            path: "/relations/-".to_string(),
            value: json!({
                "rel": rel,
                "url": url,
            }),
        }
    }
}

// == Patch Builder ==
/// Converts a field map into a patch document, one `add` per field.
pub fn fields_to_patch(fields: &Map<String, Value>) -> Vec<PatchOperation> {
    fields
        .iter()
        .map(|(reference_name, value)| PatchOperation::add_field(reference_name, value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_field_operation() {
        let op = PatchOperation::add_field("System.Title", json!("Fix login"));

        assert_eq!(op.op, "add");
        assert_eq!(op.path, "/fields/System.Title");
        assert_eq!(op.value, json!("Fix login"));
    }

    #[test]
    fn test_add_relation_operation() {
        let op = PatchOperation::add_relation(
            "System.LinkTypes.Hierarchy-Reverse",
            "https://dev.azure.com/contoso/_apis/wit/workitems/10".to_string(),
        );

        assert_eq!(op.path, "/relations/-");
        assert_eq!(op.value["rel"], "System.LinkTypes.Hierarchy-Reverse");
        assert!(op.value["url"].as_str().unwrap().ends_with("/10"));
    }

    #[test]
    fn test_fields_to_patch() {
        let mut fields = Map::new();
        fields.insert("System.Title".to_string(), json!("A title"));
        fields.insert("Microsoft.VSTS.Common.Priority".to_string(), json!(2));

        let patch = fields_to_patch(&fields);

        assert_eq!(patch.len(), 2);
        assert!(patch.iter().all(|op| op.op == "add"));
        assert!(patch.iter().any(|op| op.path == "/fields/System.Title"));
        assert!(patch
            .iter()
            .any(|op| op.path == "/fields/Microsoft.VSTS.Common.Priority" && op.value == json!(2)));
    }

    #[test]
    fn test_patch_serializes_as_array() {
        let patch = vec![PatchOperation::add_field("System.Title", json!("t"))];
        let body = serde_json::to_value(&patch).unwrap();

        assert!(body.is_array());
        assert_eq!(body[0]["op"], "add");
    }
}
