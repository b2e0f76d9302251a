//! Work item updates and state transitions
//!
//! Single-field update helpers plus the validate-and-transition operation
//! that composes the state resolver with the client write path.

use serde_json::{json, Map, Value};
use tracing::info;

use crate::client::AzureDevOpsClient;
use crate::error::Result;
use crate::models::WorkItem;
use crate::resolver::StateResolver;
use crate::work_items::format_html_text;

// == Generic Update ==
/// Updates multiple fields of a work item, keyed by reference name.
pub async fn update_work_item(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    fields: &Map<String, Value>,
) -> Result<WorkItem> {
    client.update_work_item(work_item_id, fields).await
}

async fn update_single_field(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    reference_name: &str,
    value: Value,
) -> Result<WorkItem> {
    let mut fields = Map::new();
    fields.insert(reference_name.to_string(), value);
    client.update_work_item(work_item_id, &fields).await
}

// == Field Helpers ==
/// Updates the title of a work item.
pub async fn update_title(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    title: &str,
) -> Result<WorkItem> {
    update_single_field(client, work_item_id, "System.Title", json!(title)).await
}

/// Updates the description (plain text is HTML-formatted).
pub async fn update_description(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    description: &str,
) -> Result<WorkItem> {
    update_single_field(
        client,
        work_item_id,
        "System.Description",
        json!(format_html_text(description)),
    )
    .await
}

/// Assigns a work item to a user (email or display name).
pub async fn assign_work_item(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    assigned_to: &str,
) -> Result<WorkItem> {
    update_single_field(client, work_item_id, "System.AssignedTo", json!(assigned_to)).await
}

/// Updates the priority (1-4, where 1 is highest).
pub async fn update_priority(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    priority: u8,
) -> Result<WorkItem> {
    update_single_field(
        client,
        work_item_id,
        "Microsoft.VSTS.Common.Priority",
        json!(priority),
    )
    .await
}

/// Updates the effort estimate.
pub async fn update_effort(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    effort: f64,
) -> Result<WorkItem> {
    update_single_field(
        client,
        work_item_id,
        "Microsoft.VSTS.Scheduling.Effort",
        json!(effort),
    )
    .await
}

/// Updates the comma-separated tags.
pub async fn update_tags(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    tags: &str,
) -> Result<WorkItem> {
    update_single_field(client, work_item_id, "System.Tags", json!(tags)).await
}

/// Updates the area path.
pub async fn update_area_path(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    area_path: &str,
) -> Result<WorkItem> {
    update_single_field(client, work_item_id, "System.AreaPath", json!(area_path)).await
}

/// Updates the iteration path.
pub async fn update_iteration_path(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    iteration_path: &str,
) -> Result<WorkItem> {
    update_single_field(
        client,
        work_item_id,
        "System.IterationPath",
        json!(iteration_path),
    )
    .await
}

/// Adds a comment to a work item.
pub async fn add_comment(
    client: &AzureDevOpsClient,
    work_item_id: u32,
    comment: &str,
) -> Result<WorkItem> {
    client.add_comment(work_item_id, comment).await
}

/// Links a work item to a parent.
pub async fn add_parent_link(
    client: &AzureDevOpsClient,
    child_id: u32,
    parent_id: u32,
) -> Result<WorkItem> {
    client.add_parent_link(child_id, parent_id, None).await
}

// == State Transition ==
/// Transitions a work item to a target state.
///
/// With `validate` (the default for callers that have not pre-queried), the
/// state resolver checks membership first and the call fails closed on
/// mismatch: nothing is written. With `validate = false` the write is
/// submitted as-is and the backend's own workflow rules decide, saving a
/// round trip for callers that already hold a known-valid state.
pub async fn transition_state(
    client: &AzureDevOpsClient,
    states: &StateResolver,
    work_item_id: u32,
    target_state: &str,
    validate: bool,
) -> Result<WorkItem> {
    let state = if validate {
        states.validate_state_for_item(work_item_id, target_state).await?
    } else {
        target_state.to_string()
    };

    info!(work_item_id, state, "transitioning work item");
    update_single_field(client, work_item_id, "System.State", json!(state)).await
}
