//! Command-line interface
//!
//! Clap command tree mirroring the library surface: category-based creation,
//! field updates, validated state transitions, and schema discovery.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::cache::DEFAULT_METADATA_TTL_SECS;
use crate::client::AzureDevOpsClient;
use crate::config::Config;
use crate::models::WorkItem;
use crate::resolver::{Category, MetadataCache, StateResolver, TypeResolver};
use crate::{updates, work_items};
use crate::work_items::WorkItemOptions;

// == CLI Definition ==
/// Azure DevOps work item automation.
#[derive(Parser)]
#[command(
    name = "azdo",
    about = "Manage Azure DevOps work items without knowing your project's process template",
    version
)]
pub struct Cli {
    /// Print raw JSON responses instead of summaries
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Arguments shared by every create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Work item title
    pub title: String,

    /// Concrete type name override (skips category resolution)
    #[arg(long = "type")]
    pub work_item_type: Option<String>,

    /// Detailed description (newlines become HTML breaks)
    #[arg(long)]
    pub description: Option<String>,

    /// Email or display name of the assignee
    #[arg(long)]
    pub assigned_to: Option<String>,

    /// Area path
    #[arg(long)]
    pub area: Option<String>,

    /// Iteration path
    #[arg(long)]
    pub iteration: Option<String>,

    /// Priority (1-4, where 1 is highest)
    #[arg(long)]
    pub priority: Option<u8>,

    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,

    /// Initial state
    #[arg(long)]
    pub state: Option<String>,

    /// Parent work item ID to link
    #[arg(long)]
    pub parent: Option<u32>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a backlog item (PBI / User Story / Issue / Requirement)
    CreatePbi {
        #[command(flatten)]
        common: CreateArgs,
        /// Effort estimate
        #[arg(long)]
        effort: Option<f64>,
        /// Story points
        #[arg(long)]
        story_points: Option<f64>,
        /// Business or Architectural
        #[arg(long)]
        value_area: Option<String>,
    },

    /// Create a bug
    CreateBug {
        #[command(flatten)]
        common: CreateArgs,
        /// Steps to reproduce
        #[arg(long)]
        repro_steps: Option<String>,
        /// System information
        #[arg(long)]
        system_info: Option<String>,
        /// Severity (1-4, where 1 is critical)
        #[arg(long)]
        severity: Option<String>,
    },

    /// Create a task
    CreateTask {
        #[command(flatten)]
        common: CreateArgs,
        /// Activity type (e.g. Development, Testing)
        #[arg(long)]
        activity: Option<String>,
        /// Remaining work in hours
        #[arg(long)]
        remaining_work: Option<f64>,
        /// Original estimate in hours
        #[arg(long)]
        original_estimate: Option<f64>,
    },

    /// Create a feature
    CreateFeature {
        #[command(flatten)]
        common: CreateArgs,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        target_date: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
    },

    /// Create an epic
    CreateEpic {
        #[command(flatten)]
        common: CreateArgs,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        target_date: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
    },

    /// Show a work item
    Get {
        /// Work item ID
        id: u32,
        /// Expansion parameter (relations, all, ...)
        #[arg(long)]
        expand: Option<String>,
    },

    /// Update a work item's title
    UpdateTitle {
        /// Work item ID
        id: u32,
        /// New title
        title: String,
    },

    /// Update a work item's description
    UpdateDescription {
        /// Work item ID
        id: u32,
        /// New description
        description: String,
    },

    /// Assign a work item to a user
    Assign {
        /// Work item ID
        id: u32,
        /// Email or display name
        assigned_to: String,
    },

    /// Add a comment to a work item
    Comment {
        /// Work item ID
        id: u32,
        /// Comment text
        comment: String,
    },

    /// Link a work item to a parent
    AddParent {
        /// Child work item ID
        id: u32,
        /// Parent work item ID
        parent_id: u32,
    },

    /// Transition a work item to a new state, or list its valid states
    State {
        /// Work item ID
        id: u32,
        /// Target state (case-insensitive for well-known states)
        state: Option<String>,
        /// List the valid states for this work item instead of transitioning
        #[arg(long)]
        list: bool,
        /// Skip membership validation and let the backend decide
        #[arg(long)]
        no_validate: bool,
    },

    /// Delete a work item
    Delete {
        /// Work item ID
        id: u32,
        /// Permanently delete instead of moving to the recycle bin
        #[arg(long)]
        destroy: bool,
    },

    /// List available work item types and the detected process template
    Types,

    /// List the valid states of a work item type
    States {
        /// Work item type name (e.g. "User Story")
        work_item_type: String,
    },

    /// List field definitions
    Fields {
        /// Only show fields whose name contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Show reference names and data types
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

// == Context ==
/// Everything a command needs: one shared cache, one client, the resolvers.
struct Context {
    client: Arc<AzureDevOpsClient>,
    types: TypeResolver,
    states: StateResolver,
}

impl Context {
    fn build() -> anyhow::Result<Self> {
        let config = Config::validated()?;
        let client = Arc::new(AzureDevOpsClient::new(config.clone())?);
        let cache = Arc::new(MetadataCache::new(DEFAULT_METADATA_TTL_SECS));

        let types = TypeResolver::new(
            client.clone(),
            cache.clone(),
            config.organization.clone(),
            config.project.clone(),
        );
        let states = StateResolver::new(
            client.clone(),
            cache,
            config.organization.clone(),
            config.project.clone(),
        );

        Ok(Self {
            client,
            types,
            states,
        })
    }
}

// == Dispatch ==
/// Runs one parsed command to completion.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::build()?;
    let json = cli.json;

    match cli.command {
        Command::CreatePbi {
            common,
            effort,
            story_points,
            value_area,
        } => {
            let mut options = options_from(&common);
            options.effort = effort;
            options.story_points = story_points;
            options.value_area = value_area;
            let item = create(&ctx, Category::BacklogItem, &common, &options).await?;
            print_item(&item, json)
        }

        Command::CreateBug {
            common,
            repro_steps,
            system_info,
            severity,
        } => {
            let mut options = options_from(&common);
            options.repro_steps = repro_steps;
            options.system_info = system_info;
            options.severity = severity;
            let item = create(&ctx, Category::Bug, &common, &options).await?;
            print_item(&item, json)
        }

        Command::CreateTask {
            common,
            activity,
            remaining_work,
            original_estimate,
        } => {
            let mut options = options_from(&common);
            options.activity = activity;
            options.remaining_work = remaining_work;
            options.original_estimate = original_estimate;
            let item = create(&ctx, Category::Task, &common, &options).await?;
            print_item(&item, json)
        }

        Command::CreateFeature {
            common,
            target_date,
            start_date,
        } => {
            let mut options = options_from(&common);
            options.target_date = target_date;
            options.start_date = start_date;
            let item = create(&ctx, Category::Feature, &common, &options).await?;
            print_item(&item, json)
        }

        Command::CreateEpic {
            common,
            target_date,
            start_date,
        } => {
            let mut options = options_from(&common);
            options.target_date = target_date;
            options.start_date = start_date;
            let item = create(&ctx, Category::Epic, &common, &options).await?;
            print_item(&item, json)
        }

        Command::Get { id, expand } => {
            let item = ctx.client.get_work_item(id, None, expand.as_deref()).await?;
            print_item(&item, json)
        }

        Command::UpdateTitle { id, title } => {
            let item = updates::update_title(&ctx.client, id, &title).await?;
            print_item(&item, json)
        }

        Command::UpdateDescription { id, description } => {
            let item = updates::update_description(&ctx.client, id, &description).await?;
            print_item(&item, json)
        }

        Command::Assign { id, assigned_to } => {
            let item = updates::assign_work_item(&ctx.client, id, &assigned_to).await?;
            print_item(&item, json)
        }

        Command::Comment { id, comment } => {
            let item = updates::add_comment(&ctx.client, id, &comment).await?;
            print_item(&item, json)
        }

        Command::AddParent { id, parent_id } => {
            let item = updates::add_parent_link(&ctx.client, id, parent_id).await?;
            print_item(&item, json)
        }

        Command::State {
            id,
            state,
            list,
            no_validate,
        } => {
            if list {
                let states = ctx.states.states_for_item(id).await?;
                print_name_list(&format!("Valid states for work item {}", id), &states, json)
            } else {
                let target = normalize_state(state.as_deref().unwrap_or("new"));
                let item =
                    updates::transition_state(&ctx.client, &ctx.states, id, &target, !no_validate)
                        .await?;
                print_item(&item, json)
            }
        }

        Command::Delete { id, destroy } => {
            ctx.client.delete_work_item(id, destroy).await?;
            println!(
                "Work item {} deleted {}",
                id,
                if destroy {
                    "permanently"
                } else {
                    "(moved to recycle bin)"
                }
            );
            Ok(())
        }

        Command::Types => {
            let info = ctx.types.process_template_info().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }
            print_banner("Azure DevOps Work Item Types");
            println!("Process Template: {}", info.template);
            println!("Backlog Item Type: {}", info.backlog_item_type);
            println!("\nAvailable Work Item Types:");
            for name in &info.available_types {
                println!("  - {}", name);
            }
            Ok(())
        }

        Command::States { work_item_type } => {
            let states = ctx.states.states_for_type(&work_item_type).await?;
            print_name_list(
                &format!("Available states for '{}'", work_item_type),
                &states,
                json,
            )
        }

        Command::Fields { filter, verbose } => {
            let mut fields = ctx.client.get_work_item_fields().await?;
            if let Some(filter) = &filter {
                let needle = filter.to_lowercase();
                fields.retain(|f| f.name.to_lowercase().contains(&needle));
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&fields)?);
                return Ok(());
            }
            print_banner(&format!("Available Fields ({} total)", fields.len()));
            for field in &fields {
                println!("  - {}", field.name);
                if verbose {
                    println!("    Reference: {}", field.reference_name);
                    if let Some(field_type) = &field.field_type {
                        println!("    Type: {}", field_type);
                    }
                }
            }
            Ok(())
        }
    }
}

// == Command Helpers ==
fn options_from(common: &CreateArgs) -> WorkItemOptions {
    WorkItemOptions {
        description: common.description.clone(),
        assigned_to: common.assigned_to.clone(),
        area_path: common.area.clone(),
        iteration_path: common.iteration.clone(),
        priority: common.priority,
        tags: common.tags.clone(),
        state: common.state.clone(),
        parent_id: common.parent,
        ..Default::default()
    }
}

async fn create(
    ctx: &Context,
    category: Category,
    common: &CreateArgs,
    options: &WorkItemOptions,
) -> anyhow::Result<WorkItem> {
    let item = work_items::create_in_category(
        &ctx.client,
        &ctx.types,
        category,
        &common.title,
        options,
        common.work_item_type.as_deref(),
    )
    .await?;
    Ok(item)
}

/// Maps lowercase input to the proper casing of well-known state names;
/// anything else passes through for the validator to judge.
fn normalize_state(input: &str) -> String {
    let known = match input.to_lowercase().as_str() {
        // Base states
        "new" => "New",
        "active" => "Active",
        "resolved" => "Resolved",
        "closed" => "Closed",
        "removed" => "Removed",
        // Process template specific states
        "development" => "Development",
        "released" => "Released",
        "done" => "Done",
        "not-a-bug" => "Not a Bug",
        "ideation" => "Ideation",
        _ => return input.to_string(),
    };
    known.to_string()
}

// == Output ==
fn print_item(item: &WorkItem, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
        return Ok(());
    }

    println!("Work item {}", item.id);
    if let Some(title) = item.title() {
        println!("  Title: {}", title);
    }
    if let Some(work_item_type) = item.work_item_type() {
        println!("  Type: {}", work_item_type);
    }
    if let Some(state) = item.state() {
        println!("  State: {}", state);
    }
    if let Some(assigned_to) = item.assigned_to() {
        println!("  Assigned to: {}", assigned_to);
    }
    if let Some(url) = &item.url {
        println!("  URL: {}", url);
    }
    Ok(())
}

fn print_name_list(heading: &str, names: &[String], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(names)?);
        return Ok(());
    }

    print_banner(heading);
    for name in names {
        println!("  - {}", name);
    }
    Ok(())
}

fn print_banner(heading: &str) {
    println!("{}", "=".repeat(60));
    println!("{}", heading);
    println!("{}", "=".repeat(60));
}
