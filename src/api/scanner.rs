// src/api/scanner.rs
//! Breadth-first discovery of the pages and databases reachable from a root.
//!
//! Two FIFO queues drive the walk. The page queue holds anything whose
//! children should be listed: pages, database rows and container blocks.
//! The database queue holds databases waiting for their rows to be queried,
//! and is drained only when the page queue runs dry.
//!
//! A page id enters the visited set before its children are fetched and is
//! never fetched again, so back-references terminate. A database whose rows
//! cannot be read for access reasons is recorded and skipped.

use super::records::{property_text, property_type, BlockRecord, PageRecord};
use super::simple_pagination::{all_children, all_rows};
use super::NotionRepository;
use crate::constants::UNTITLED;
use crate::error::{classify_database_fetch_failure, AppError};
use crate::model::{Catalog, Parent, WorkspaceNode};
use crate::types::NotionId;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

/// Walks a workspace through a [`NotionRepository`].
pub struct WorkspaceScanner<'a> {
    repository: &'a dyn NotionRepository,
}

/// Something whose children get listed, with the parent reference those
/// children fall back to when their own block omits it.
struct Container {
    id: NotionId,
    as_parent: Parent,
}

impl Container {
    fn page(id: NotionId) -> Self {
        let as_parent = Parent::Page {
            page_id: id.clone(),
        };
        Self { id, as_parent }
    }

    fn block(id: NotionId) -> Self {
        let as_parent = Parent::Block {
            block_id: id.clone(),
        };
        Self { id, as_parent }
    }
}

/// Mutable traversal state, local to one scan.
#[derive(Default)]
struct ScanState {
    catalog: Catalog,
    page_queue: VecDeque<Container>,
    database_queue: VecDeque<NotionId>,
    visited_pages: HashSet<NotionId>,
    queued_databases: HashSet<NotionId>,
    processed_databases: HashSet<NotionId>,
}

impl<'a> WorkspaceScanner<'a> {
    pub fn new(repository: &'a dyn NotionRepository) -> Self {
        Self { repository }
    }

    /// Catalogs everything reachable from `root`.
    ///
    /// The root itself is listed but not catalogued. Page-listing failures
    /// abort the scan; row-query failures are contained when they are
    /// about access (see [`crate::error::DatabaseFetchFailure`]).
    pub async fn scan(&self, root: &NotionId) -> Result<Catalog, AppError> {
        log::info!("Scanning workspace from {}", root);
        let mut state = ScanState::default();
        state.page_queue.push_back(Container::page(root.clone()));

        loop {
            if let Some(container) = state.page_queue.pop_front() {
                self.visit_page(&mut state, container).await?;
                continue;
            }
            match state.database_queue.pop_front() {
                Some(database_id) => self.visit_database(&mut state, database_id).await?,
                None => break,
            }
        }

        log::info!(
            "Scan complete: {} databases, {} pages, {} skipped",
            state.catalog.databases.len(),
            state.catalog.pages.len(),
            state.catalog.skipped_databases.len()
        );
        Ok(state.catalog)
    }

    async fn visit_page(&self, state: &mut ScanState, container: Container) -> Result<(), AppError> {
        if !state.visited_pages.insert(container.id.clone()) {
            return Ok(());
        }

        let children = all_children(self.repository, &container.id).await?;
        log::debug!("{} has {} children", container.id, children.len());

        for block in children {
            match block.block_type.as_str() {
                "child_database" => {
                    let parent = parent_of(&block, &container.as_parent);
                    let title = block.child_title();
                    state
                        .catalog
                        .upsert_database(WorkspaceNode::database(block.id.clone(), title, parent));
                    if state.queued_databases.insert(block.id.clone()) {
                        state.database_queue.push_back(block.id);
                    }
                }
                "child_page" => {
                    let parent = parent_of(&block, &container.as_parent);
                    let title = block.child_title();
                    state
                        .catalog
                        .insert_page(WorkspaceNode::page(block.id.clone(), title, parent));
                    state.page_queue.push_back(Container::page(block.id));
                }
                _ if block.has_children => {
                    state.page_queue.push_back(Container::block(block.id));
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn visit_database(
        &self,
        state: &mut ScanState,
        database_id: NotionId,
    ) -> Result<(), AppError> {
        if !state.processed_databases.insert(database_id.clone()) {
            return Ok(());
        }

        let rows = match all_rows(self.repository, &database_id).await {
            Ok(rows) => rows,
            Err(e) => {
                let failure = classify_database_fetch_failure(&e);
                if !failure.is_contained() {
                    return Err(e);
                }
                log::warn!("Skipping rows of database {}: {}", database_id, failure);
                state.catalog.record_skipped(database_id, failure);
                return Ok(());
            }
        };

        log::debug!("Database {} has {} rows", database_id, rows.len());
        for row in rows {
            let node = row_node(&row, &database_id);
            state.catalog.insert_page(node);
            state.page_queue.push_back(Container::page(row.id));
        }
        Ok(())
    }
}

/// The block's own parent reference, else the container being listed.
fn parent_of(block: &BlockRecord, container: &Parent) -> Parent {
    match block.parent() {
        Parent::None => container.clone(),
        parent => parent,
    }
}

fn row_node(row: &PageRecord, database_id: &NotionId) -> WorkspaceNode {
    WorkspaceNode::page(
        row.id.clone(),
        row_title(&row.properties),
        Parent::Database {
            database_id: database_id.clone(),
        },
    )
}

/// Title of a database row.
///
/// A title-typed `Name` wins, then the first title-typed property, then the
/// first non-empty rich text. Blank text counts as missing.
pub fn row_title(properties: &IndexMap<String, Value>) -> String {
    let non_empty = |text: String| (!text.trim().is_empty()).then_some(text);

    let named = properties
        .get("Name")
        .filter(|prop| property_type(prop) == Some("title"))
        .and_then(|prop| non_empty(property_text(prop, "title")));

    let first_title = || {
        properties
            .values()
            .find(|prop| property_type(prop) == Some("title"))
            .and_then(|prop| non_empty(property_text(prop, "title")))
    };

    let first_rich_text = || {
        properties
            .values()
            .filter(|prop| property_type(prop) == Some("rich_text"))
            .find_map(|prop| non_empty(property_text(prop, "rich_text")))
    };

    named
        .or_else(first_title)
        .or_else(first_rich_text)
        .unwrap_or_else(|| UNTITLED.to_string())
}
