// src/api/mod.rs
//! Notion API interaction: the gateway, the wire records and the workspace scanner.
//!
//! Business logic depends on [`NotionRepository`], never on HTTP details, so
//! the scanner and writer run unchanged against an in-memory repository.

pub mod client;
pub mod records;
pub mod scanner;
mod simple_pagination;

use crate::error::AppError;
use crate::types::NotionId;
use serde_json::Value;

pub use client::{ClientSettings, NotionHttpClient};
pub use records::{BlockRecord, DatabaseRecord, PageRecord, PageRequest, PaginatedResponse};
pub use scanner::{row_title, WorkspaceScanner};
pub use simple_pagination::{all_children, all_databases, all_rows, fetch_all_pages};

/// The Notion endpoints the relay uses.
///
/// Listing methods return one page of results; use the pagination helpers
/// to collect them all. Mutations return the response body untouched.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    async fn retrieve_database(&self, id: &NotionId) -> Result<DatabaseRecord, AppError>;
    async fn retrieve_page(&self, id: &NotionId) -> Result<PageRecord, AppError>;
    async fn retrieve_block(&self, id: &NotionId) -> Result<BlockRecord, AppError>;

    async fn list_children(
        &self,
        id: &NotionId,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<BlockRecord>, AppError>;
    async fn query_database(
        &self,
        id: &NotionId,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<PageRecord>, AppError>;
    async fn search_databases(
        &self,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<DatabaseRecord>, AppError>;

    async fn create_page(&self, body: &Value) -> Result<Value, AppError>;
    async fn update_page(&self, id: &NotionId, body: &Value) -> Result<Value, AppError>;
    async fn append_children(&self, id: &NotionId, body: &Value) -> Result<Value, AppError>;
    async fn update_block(&self, id: &NotionId, body: &Value) -> Result<Value, AppError>;
    async fn delete_block(&self, id: &NotionId) -> Result<(), AppError>;
}
