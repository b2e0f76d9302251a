//! Work item creation
//!
//! Builds field maps from structured options and creates work items of any
//! concrete type, with category-based constructors that route through the
//! type resolver so callers never need to know which type names the project
//! uses.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use crate::client::AzureDevOpsClient;
use crate::error::{DevOpsError, Result};
use crate::models::WorkItem;
use crate::resolver::{Category, TypeResolver};

// == Work Item Options ==
/// Optional field values for creating a work item.
///
/// Fields that do not apply to the target type are simply passed through;
/// the backend rejects genuinely invalid combinations.
#[derive(Debug, Clone, Default)]
pub struct WorkItemOptions {
    /// Detailed description (plain text is HTML-formatted)
    pub description: Option<String>,
    /// Email or display name of the assignee
    pub assigned_to: Option<String>,
    /// Area path (e.g. "Project\\Area")
    pub area_path: Option<String>,
    /// Iteration path (e.g. "Project\\Sprint 1")
    pub iteration_path: Option<String>,
    /// Priority (1-4, where 1 is highest)
    pub priority: Option<u8>,
    /// Comma-separated tags
    pub tags: Option<String>,
    /// Initial state
    pub state: Option<String>,
    /// Parent work item to link after creation
    pub parent_id: Option<u32>,
    /// Effort estimate (backlog items)
    pub effort: Option<f64>,
    /// Story points (backlog items)
    pub story_points: Option<f64>,
    /// Business or Architectural
    pub value_area: Option<String>,
    /// Steps to reproduce (bugs; plain text is HTML-formatted)
    pub repro_steps: Option<String>,
    /// System information (bugs; plain text is HTML-formatted)
    pub system_info: Option<String>,
    /// Severity: "1".."4" or a full label like "2 - High"
    pub severity: Option<String>,
    /// Activity type (tasks, e.g. "Development")
    pub activity: Option<String>,
    /// Remaining work in hours (tasks)
    pub remaining_work: Option<f64>,
    /// Original estimate in hours (tasks)
    pub original_estimate: Option<f64>,
    /// Target date, YYYY-MM-DD (features/epics)
    pub target_date: Option<String>,
    /// Start date, YYYY-MM-DD (features/epics)
    pub start_date: Option<String>,
    /// Additional fields keyed by reference name
    pub custom_fields: Map<String, Value>,
}

// == Create Work Item ==
/// Creates a work item of an explicitly named concrete type.
///
/// The parent link, when requested, is attached with a second call after
/// creation succeeds.
pub async fn create_work_item(
    client: &AzureDevOpsClient,
    work_item_type: &str,
    title: &str,
    options: &WorkItemOptions,
) -> Result<WorkItem> {
    let fields = build_fields(title, options)?;
    let item = client.create_work_item(work_item_type, &fields).await?;

    if let Some(parent_id) = options.parent_id {
        client.add_parent_link(item.id, parent_id, None).await?;
    }

    Ok(item)
}

// == Create In Category ==
/// Creates a work item for an abstract category, resolving the concrete
/// type name first. A `prefer` override wins when the project offers it.
pub async fn create_in_category(
    client: &AzureDevOpsClient,
    resolver: &TypeResolver,
    category: Category,
    title: &str,
    options: &WorkItemOptions,
    prefer: Option<&str>,
) -> Result<WorkItem> {
    let work_item_type = resolver.resolve(category, prefer).await?;
    create_work_item(client, &work_item_type, title, options).await
}

/// Creates a backlog item (PBI / User Story / Issue / Requirement).
pub async fn create_backlog_item(
    client: &AzureDevOpsClient,
    resolver: &TypeResolver,
    title: &str,
    options: &WorkItemOptions,
    prefer: Option<&str>,
) -> Result<WorkItem> {
    create_in_category(client, resolver, Category::BacklogItem, title, options, prefer).await
}

/// Creates a bug/defect.
pub async fn create_bug(
    client: &AzureDevOpsClient,
    resolver: &TypeResolver,
    title: &str,
    options: &WorkItemOptions,
    prefer: Option<&str>,
) -> Result<WorkItem> {
    create_in_category(client, resolver, Category::Bug, title, options, prefer).await
}

/// Creates a task.
pub async fn create_task(
    client: &AzureDevOpsClient,
    resolver: &TypeResolver,
    title: &str,
    options: &WorkItemOptions,
    prefer: Option<&str>,
) -> Result<WorkItem> {
    create_in_category(client, resolver, Category::Task, title, options, prefer).await
}

/// Creates a feature.
pub async fn create_feature(
    client: &AzureDevOpsClient,
    resolver: &TypeResolver,
    title: &str,
    options: &WorkItemOptions,
    prefer: Option<&str>,
) -> Result<WorkItem> {
    create_in_category(client, resolver, Category::Feature, title, options, prefer).await
}

/// Creates an epic.
pub async fn create_epic(
    client: &AzureDevOpsClient,
    resolver: &TypeResolver,
    title: &str,
    options: &WorkItemOptions,
    prefer: Option<&str>,
) -> Result<WorkItem> {
    create_in_category(client, resolver, Category::Epic, title, options, prefer).await
}

// == Field Map Construction ==
/// Builds the field reference-name map for a create call.
pub fn build_fields(title: &str, options: &WorkItemOptions) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    fields.insert("System.Title".to_string(), json!(title));

    // Core fields
    if let Some(description) = &options.description {
        fields.insert(
            "System.Description".to_string(),
            json!(format_html_text(description)),
        );
    }
    if let Some(assigned_to) = &options.assigned_to {
        fields.insert("System.AssignedTo".to_string(), json!(assigned_to));
    }
    if let Some(priority) = options.priority {
        fields.insert("Microsoft.VSTS.Common.Priority".to_string(), json!(priority));
    }
    if let Some(tags) = &options.tags {
        fields.insert("System.Tags".to_string(), json!(tags));
    }
    if let Some(state) = &options.state {
        fields.insert("System.State".to_string(), json!(state));
    }
    if let Some(area_path) = &options.area_path {
        fields.insert("System.AreaPath".to_string(), json!(area_path));
    }
    if let Some(iteration_path) = &options.iteration_path {
        fields.insert("System.IterationPath".to_string(), json!(iteration_path));
    }

    // Backlog item fields
    if let Some(effort) = options.effort {
        fields.insert("Microsoft.VSTS.Scheduling.Effort".to_string(), json!(effort));
    }
    if let Some(story_points) = options.story_points {
        fields.insert(
            "Microsoft.VSTS.Scheduling.StoryPoints".to_string(),
            json!(story_points),
        );
    }
    if let Some(value_area) = &options.value_area {
        fields.insert("Microsoft.VSTS.Common.ValueArea".to_string(), json!(value_area));
    }

    // Bug fields
    if let Some(repro_steps) = &options.repro_steps {
        fields.insert(
            "Microsoft.VSTS.TCM.ReproSteps".to_string(),
            json!(format_html_text(repro_steps)),
        );
    }
    if let Some(system_info) = &options.system_info {
        fields.insert(
            "Microsoft.VSTS.TCM.SystemInfo".to_string(),
            json!(format_html_text(system_info)),
        );
    }
    if let Some(severity) = &options.severity {
        fields.insert(
            "Microsoft.VSTS.Common.Severity".to_string(),
            json!(map_severity(severity)),
        );
    }

    // Task fields
    if let Some(activity) = &options.activity {
        fields.insert("Microsoft.VSTS.Common.Activity".to_string(), json!(activity));
    }
    if let Some(remaining_work) = options.remaining_work {
        fields.insert(
            "Microsoft.VSTS.Scheduling.RemainingWork".to_string(),
            json!(remaining_work),
        );
    }
    if let Some(original_estimate) = options.original_estimate {
        fields.insert(
            "Microsoft.VSTS.Scheduling.OriginalEstimate".to_string(),
            json!(original_estimate),
        );
    }

    // Feature/Epic fields
    if let Some(target_date) = &options.target_date {
        validate_date("target date", target_date)?;
        fields.insert(
            "Microsoft.VSTS.Scheduling.TargetDate".to_string(),
            json!(target_date),
        );
    }
    if let Some(start_date) = &options.start_date {
        validate_date("start date", start_date)?;
        fields.insert(
            "Microsoft.VSTS.Scheduling.StartDate".to_string(),
            json!(start_date),
        );
    }

    // Custom fields
    for (reference_name, value) in &options.custom_fields {
        fields.insert(reference_name.clone(), value.clone());
    }

    Ok(fields)
}

// == Severity Mapping ==
/// Maps a bare severity number to the backend's "N - Label" form; any other
/// value passes through unchanged.
pub fn map_severity(severity: &str) -> String {
    match severity.trim() {
        "1" => "1 - Critical".to_string(),
        "2" => "2 - High".to_string(),
        "3" => "3 - Medium".to_string(),
        "4" => "4 - Low".to_string(),
        other => other.to_string(),
    }
}

// == HTML Formatting ==
/// Converts plain text with newlines to HTML for rich-text fields.
///
/// Text already containing block-level HTML is returned as-is. Otherwise a
/// single newline becomes a visible break and a blank line a paragraph
/// break, matching how the rendered field collapses `<br>` runs.
pub fn format_html_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    const BLOCK_TAGS: [&str; 11] = [
        "<div", "<p>", "<ul", "<ol", "<table", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6",
    ];
    let lowered = text.to_lowercase();
    if BLOCK_TAGS.iter().any(|tag| lowered.contains(tag)) {
        return text.to_string();
    }

    text.replace("\n\n", "<br><br><br><br>").replace('\n', "<br><br>")
}

fn validate_date(label: &str, value: &str) -> Result<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        DevOpsError::InvalidArgument(format!(
            "{} '{}' is not a valid YYYY-MM-DD date",
            label, value
        ))
    })?;
    Ok(())
}
