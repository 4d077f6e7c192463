//! What a workspace scan discovers: pages, databases and where they hang.

use crate::error::DatabaseFetchFailure;
use crate::types::NotionId;
use indexmap::IndexMap;
use serde::Serialize;

/// Where a page or database lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    Page { page_id: NotionId },
    Database { database_id: NotionId },
    Block { block_id: NotionId },
    Workspace,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Page,
    Database,
}

/// A page or database found while walking the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceNode {
    pub id: NotionId,
    pub kind: NodeKind,
    pub title: String,
    pub parent: Parent,
}

impl WorkspaceNode {
    pub fn page(id: NotionId, title: impl Into<String>, parent: Parent) -> Self {
        Self {
            id,
            kind: NodeKind::Page,
            title: title.into(),
            parent,
        }
    }

    pub fn database(id: NotionId, title: impl Into<String>, parent: Parent) -> Self {
        Self {
            id,
            kind: NodeKind::Database,
            title: title.into(),
            parent,
        }
    }
}

/// The scanner's output, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub databases: IndexMap<NotionId, WorkspaceNode>,
    pub pages: IndexMap<NotionId, WorkspaceNode>,
    /// Databases that were discovered but whose rows could not be read.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub skipped_databases: IndexMap<NotionId, DatabaseFetchFailure>,
}

impl Catalog {
    /// Registers a database, refreshing title and parent if it was already known.
    pub fn upsert_database(&mut self, node: WorkspaceNode) {
        self.databases.insert(node.id.clone(), node);
    }

    /// Registers a page unless it is already catalogued. First write wins.
    ///
    /// Returns whether the page was new.
    pub fn insert_page(&mut self, node: WorkspaceNode) -> bool {
        if self.pages.contains_key(&node.id) {
            return false;
        }
        self.pages.insert(node.id.clone(), node);
        true
    }

    pub fn record_skipped(&mut self, database_id: NotionId, failure: DatabaseFetchFailure) {
        self.skipped_databases.insert(database_id, failure);
    }
}
