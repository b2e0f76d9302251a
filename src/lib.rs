//! Azure DevOps work item automation
//!
//! Creates, updates, and transitions work items without hard-coding the
//! concrete type and state names of any one process template: the project's
//! schema is discovered at runtime, cached with TTL expiry, and abstract
//! categories ("backlog item", "bug") are resolved to whatever the project
//! actually offers.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod tasks;
pub mod updates;
pub mod work_items;

pub use cache::ExpiringCache;
pub use client::AzureDevOpsClient;
pub use config::Config;
pub use error::{DevOpsError, Result};
pub use resolver::{
    Category, FallbackPolicy, MetadataCache, MetadataFetcher, StateResolver, TypeResolver,
};
pub use tasks::spawn_cleanup_task;
