// src/lib.rs
//! notion-relay library: a typed proxy over the Notion REST API.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`, `ErrorReport`
//! - **Configuration**: `CommandLineInput`, `RelayConfig`, `Operation`
//! - **Domain model**: `PropertySchema`, `PropertyValue`, `Catalog`, `BlockItem`
//! - **Property mapping**: `map_properties`
//! - **API client**: `NotionHttpClient`, `NotionRepository`, `WorkspaceScanner`
//! - **Writing**: `NotionWriter`

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod properties;
pub mod types;
pub mod writer;

// --- Error Handling ---
pub use crate::error::{AppError, DatabaseFetchFailure, ErrorReport, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, Operation, RelayConfig};
pub use crate::error_recovery::RetryPolicy;

// --- Domain Model ---
pub use crate::model::{
    BlockItem, BlockNode, Catalog, DateInput, NodeKind, Parent, PropertyDefinition,
    PropertySchema, PropertyType, PropertyValue, SchemaSummary, WorkspaceNode,
};
pub use crate::types::{ApiKey, NotionId};

// --- Property Mapping ---
pub use crate::properties::{map_properties, MappingReason, PropertyError, PropertyMapping};

// --- API Client ---
pub use crate::api::{ClientSettings, NotionHttpClient, NotionRepository, WorkspaceScanner};

// --- Writing ---
pub use crate::pipeline::run_operation;
pub use crate::writer::{NewDatabasePage, NotionWriter};
