// src/writer.rs
//! Page and block operations built on the repository and the property mapper.
//!
//! Every operation validates its whole input before the first mutating
//! call, so a rejected request leaves the workspace untouched.

use crate::api::records::plain_text;
use crate::api::{all_children, all_databases, all_rows, row_title, BlockRecord, NotionRepository};
use crate::error::AppError;
use crate::model::blocks::{build_blocks, children_from, is_writable_text_block, paragraphs_from_content};
use crate::model::{text_content, BlockItem, BlockNode, PropertySchema, PropertyValue, SchemaSummary};
use crate::properties::map_properties;
use crate::types::NotionId;
use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// A page read back with its block tree.
#[derive(Debug, Clone, Serialize)]
pub struct PageContent {
    pub page: crate::api::PageRecord,
    pub blocks: Vec<BlockNode>,
}

/// Input for a new database row.
#[derive(Debug, Clone, Default)]
pub struct NewDatabasePage {
    pub title: String,
    pub properties: Option<IndexMap<String, Value>>,
    pub content: Option<String>,
    pub blocks: Option<Vec<BlockItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedBlocks {
    pub deleted: Vec<NotionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseListing {
    pub id: NotionId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowListing {
    pub database_id: NotionId,
    pub count: usize,
    pub items: Vec<RowSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSummary {
    pub page_id: NotionId,
    pub title: String,
    pub url: String,
}

pub struct NotionWriter<'a> {
    repository: &'a dyn NotionRepository,
}

impl<'a> NotionWriter<'a> {
    pub fn new(repository: &'a dyn NotionRepository) -> Self {
        Self { repository }
    }

    pub async fn read_database_schema(&self, database_id: &NotionId) -> Result<SchemaSummary, AppError> {
        let database = self.repository.retrieve_database(database_id).await?;
        let schema = PropertySchema::from_properties(&database.properties);
        Ok(SchemaSummary::new(
            database.id.clone(),
            &database.title_text(),
            &schema,
        ))
    }

    /// The page object plus its full block tree, database rows included.
    pub async fn read_page(&self, page_id: &NotionId) -> Result<PageContent, AppError> {
        let page = self.repository.retrieve_page(page_id).await?;
        let blocks = self.block_forest(page_id).await?;
        Ok(PageContent { page, blocks })
    }

    pub async fn create_page_in_database(
        &self,
        database_id: &NotionId,
        request: &NewDatabasePage,
    ) -> Result<Value, AppError> {
        let database = self.repository.retrieve_database(database_id).await?;
        let schema = PropertySchema::from_properties(&database.properties);
        let title_property = schema.title_property().ok_or_else(|| {
            AppError::Validation(format!("Database {} has no title property", database_id))
        })?;

        let mut properties = Map::new();
        properties.insert(
            title_property.to_string(),
            PropertyValue::Title(request.title.clone()).to_api_value(),
        );
        if let Some(input) = request.properties.as_ref().filter(|input| !input.is_empty()) {
            properties.extend(strict_mapping(&schema, input)?);
        }

        let mut payload = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        if let Some(children) = children_from(request.content.as_deref(), request.blocks.as_deref())? {
            payload["children"] = Value::Array(children);
        }

        log::info!("Creating page in database {}", database_id);
        self.repository.create_page(&payload).await
    }

    pub async fn create_child_page(
        &self,
        parent_page_id: &NotionId,
        title: &str,
        content: Option<&str>,
        blocks: Option<&[BlockItem]>,
    ) -> Result<Value, AppError> {
        let mut payload = json!({
            "parent": { "page_id": parent_page_id },
            "properties": { "title": { "title": text_content(title) } },
        });
        if let Some(children) = children_from(content, blocks)? {
            payload["children"] = Value::Array(children);
        }

        log::info!("Creating child page under {}", parent_page_id);
        self.repository.create_page(&payload).await
    }

    /// Rewrites properties of a page, checked against its database schema.
    ///
    /// Pages outside a database are checked against their own properties,
    /// which carry no option lists.
    pub async fn update_page_properties(
        &self,
        page_id: &NotionId,
        input: &IndexMap<String, Value>,
    ) -> Result<Value, AppError> {
        let page = self.repository.retrieve_page(page_id).await?;
        let schema = match page.parent() {
            crate::model::Parent::Database { database_id } => {
                let database = self.repository.retrieve_database(&database_id).await?;
                PropertySchema::from_properties(&database.properties)
            }
            _ => PropertySchema::from_properties(&page.properties),
        };

        let properties = strict_mapping(&schema, input)?;
        let payload = json!({ "properties": properties });
        log::info!("Updating {} properties on page {}", input.len(), page_id);
        self.repository.update_page(page_id, &payload).await
    }

    pub async fn archive_page(&self, page_id: &NotionId) -> Result<Value, AppError> {
        log::info!("Archiving page {}", page_id);
        self.repository
            .update_page(page_id, &json!({ "archived": true }))
            .await
    }

    pub async fn append_blocks(&self, block_id: &NotionId, items: &[BlockItem]) -> Result<Value, AppError> {
        let children = build_blocks(items)?;
        self.repository
            .append_children(block_id, &json!({ "children": children }))
            .await
    }

    /// Deletes every child of the block, then appends the new items.
    pub async fn replace_blocks(&self, block_id: &NotionId, items: &[BlockItem]) -> Result<Value, AppError> {
        let children = build_blocks(items)?;
        self.delete_all_children(block_id).await?;
        self.repository
            .append_children(block_id, &json!({ "children": children }))
            .await
    }

    /// Deletes blocks in order, stopping at the first failure.
    pub async fn delete_blocks(&self, block_ids: &[NotionId]) -> Result<DeletedBlocks, AppError> {
        let mut deleted = Vec::with_capacity(block_ids.len());
        for block_id in block_ids {
            self.repository.delete_block(block_id).await?;
            deleted.push(block_id.clone());
        }
        Ok(DeletedBlocks { deleted })
    }

    pub async fn update_block_text(&self, block_id: &NotionId, text: &str) -> Result<Value, AppError> {
        let block = self.repository.retrieve_block(block_id).await?;
        if !is_writable_text_block(&block.block_type) {
            return Err(AppError::Validation(format!(
                "Unsupported block type for text update: {}",
                block.block_type
            )));
        }

        let mut payload = Value::Object(Map::new());
        payload[block.block_type.as_str()] = json!({ "rich_text": text_content(text) });
        self.repository.update_block(block_id, &payload).await
    }

    /// Replaces all blocks of a page with one paragraph per non-blank line.
    pub async fn replace_page_content(&self, page_id: &NotionId, content: &str) -> Result<Value, AppError> {
        let paragraphs = paragraphs_from_content(content);
        let children = if paragraphs.is_empty() {
            Vec::new()
        } else {
            build_blocks(&paragraphs)?
        };

        self.delete_all_children(page_id).await?;
        if children.is_empty() {
            log::info!("Cleared page {}", page_id);
            return Ok(json!({ "object": "list", "results": [] }));
        }
        self.repository
            .append_children(page_id, &json!({ "children": children }))
            .await
    }

    pub async fn list_databases(&self, limit: Option<usize>) -> Result<Vec<DatabaseListing>, AppError> {
        let databases = all_databases(self.repository, limit).await?;
        Ok(databases
            .into_iter()
            .map(|database| {
                let title = database.title_text();
                DatabaseListing {
                    id: database.id,
                    title: if title.is_empty() {
                        crate::constants::UNTITLED.to_string()
                    } else {
                        title
                    },
                    url: database.url,
                }
            })
            .collect())
    }

    /// Rows of a database as `{page_id, title, url}`, at most `limit` of them.
    pub async fn query_rows(
        &self,
        database_id: &NotionId,
        limit: Option<usize>,
    ) -> Result<RowListing, AppError> {
        let repository = self.repository;
        let rows = crate::api::fetch_all_pages(
            move |page| async move { repository.query_database(database_id, &page).await },
            limit,
        )
        .await?;

        let items: Vec<RowSummary> = rows
            .iter()
            .map(|row| RowSummary {
                page_id: row.id.clone(),
                title: row_title(&row.properties),
                url: row.url_or_default(),
            })
            .collect();
        Ok(RowListing {
            database_id: database_id.clone(),
            count: items.len(),
            items,
        })
    }

    async fn delete_all_children(&self, block_id: &NotionId) -> Result<(), AppError> {
        let children = all_children(self.repository, block_id).await?;
        log::debug!("Deleting {} children of {}", children.len(), block_id);
        for child in &children {
            self.repository.delete_block(&child.id).await?;
        }
        Ok(())
    }

    async fn block_forest(&self, parent_id: &NotionId) -> Result<Vec<BlockNode>, AppError> {
        let mut nodes = Vec::new();
        for child in all_children(self.repository, parent_id).await? {
            nodes.push(self.block_tree(child).await?);
        }
        Ok(nodes)
    }

    fn block_tree(&self, block: BlockRecord) -> BoxFuture<'_, Result<BlockNode, AppError>> {
        async move {
            let mut node = block_node(&block);
            if block.has_children {
                node.children = self.block_forest(&block.id).await?;
            }
            if block.block_type == "child_database" {
                for row in all_rows(self.repository, &block.id).await? {
                    node.children.push(BlockNode {
                        id: row.id.to_string(),
                        node_type: "page".to_string(),
                        title: Some(row.title()),
                        text: None,
                        children: self.block_forest(&row.id).await?,
                    });
                }
            }
            Ok(node)
        }
        .boxed()
    }
}

/// Maps input against the schema, refusing the write on any error.
fn strict_mapping(
    schema: &PropertySchema,
    input: &IndexMap<String, Value>,
) -> Result<Map<String, Value>, AppError> {
    let mapping = map_properties(schema, input);
    if !mapping.is_clean() {
        log::warn!("Rejecting write: {} invalid properties", mapping.errors.len());
        return Err(AppError::PropertyMapping {
            errors: mapping.errors,
        });
    }
    for (name, value) in &mapping.mapped {
        log::debug!("Property {:?} mapped as {}", name, value.type_name());
    }
    Ok(mapping.to_api_properties())
}

fn block_node(block: &BlockRecord) -> BlockNode {
    let mut node = BlockNode {
        id: block.id.to_string(),
        node_type: block.block_type.clone(),
        title: None,
        text: None,
        children: Vec::new(),
    };

    if matches!(block.block_type.as_str(), "child_page" | "child_database") {
        node.title = Some(block.child_title());
        return node;
    }

    let text = block.text();
    if !text.is_empty() {
        node.text = Some(text);
    }
    if let Some(title) = block
        .body()
        .and_then(|body| body.get("title"))
        .filter(|title| title.is_array())
        .map(plain_text)
        .filter(|title| !title.is_empty())
    {
        node.title = Some(title);
    }
    node
}
