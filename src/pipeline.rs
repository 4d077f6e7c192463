// src/pipeline.rs
//! Runs one validated operation against a repository and yields its JSON result.

use crate::api::{NotionRepository, WorkspaceScanner};
use crate::config::Operation;
use crate::error::AppError;
use crate::writer::NotionWriter;
use serde::Serialize;
use serde_json::Value;

/// Executes the operation. Validation has already happened in [`Operation::from_command`].
pub async fn run_operation(
    operation: &Operation,
    repository: &dyn NotionRepository,
) -> Result<Value, AppError> {
    let writer = NotionWriter::new(repository);
    if operation.is_mutation() {
        log::info!("Applying a write to the workspace");
    }

    match operation {
        Operation::Schema { database_id } => to_json(writer.read_database_schema(database_id).await?),
        Operation::ReadPage { page_id } => to_json(writer.read_page(page_id).await?),
        Operation::CreatePage { database_id, page } => {
            writer.create_page_in_database(database_id, page).await
        }
        Operation::CreateChildPage {
            parent_page_id,
            title,
            content,
            blocks,
        } => {
            writer
                .create_child_page(parent_page_id, title, content.as_deref(), blocks.as_deref())
                .await
        }
        Operation::UpdatePage {
            page_id,
            properties,
        } => writer.update_page_properties(page_id, properties).await,
        Operation::Archive { page_id } => writer.archive_page(page_id).await,
        Operation::AppendBlocks { block_id, blocks } => writer.append_blocks(block_id, blocks).await,
        Operation::ReplaceBlocks { block_id, blocks } => {
            writer.replace_blocks(block_id, blocks).await
        }
        Operation::DeleteBlocks { block_ids } => to_json(writer.delete_blocks(block_ids).await?),
        Operation::UpdateBlockText { block_id, text } => {
            writer.update_block_text(block_id, text).await
        }
        Operation::ReplaceContent { page_id, content } => {
            writer.replace_page_content(page_id, content).await
        }
        Operation::Databases { limit } => to_json(writer.list_databases(*limit).await?),
        Operation::Rows { database_id, limit } => {
            to_json(writer.query_rows(database_id, Some(*limit)).await?)
        }
        Operation::Scan { root } => to_json(WorkspaceScanner::new(repository).scan(root).await?),
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::InternalError {
        message: "Failed to serialize result".to_string(),
        source: Some(Box::new(e)),
    })
}
