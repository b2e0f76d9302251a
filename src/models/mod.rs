//! Wire models for the Azure DevOps REST API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing API request and response bodies.

pub mod metadata;
pub mod patch;
pub mod work_item;

// Re-export commonly used types
pub use metadata::{
    FieldDefinition, ListEnvelope, StateDefinition, WorkItemTypeDefinition, WorkItemTypeInfo,
};
pub use patch::{fields_to_patch, PatchOperation};
pub use work_item::WorkItem;
