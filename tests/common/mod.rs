// tests/common/mod.rs
//! In-memory Notion workspace for driving the scanner and writer without HTTP.

#![allow(dead_code)]

use notion_relay::api::{
    BlockRecord, DatabaseRecord, NotionRepository, PageRecord, PageRequest, PaginatedResponse,
};
use notion_relay::{AppError, NotionErrorCode, NotionId};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Deterministic ids: `id(1)` is `00000000-0000-0000-0000-000000000001`.
pub fn id(n: u32) -> NotionId {
    NotionId::parse(&format!("{:032x}", n)).expect("test id")
}

pub fn child_page(n: u32, title: &str) -> Value {
    json!({
        "object": "block",
        "id": id(n).as_str(),
        "type": "child_page",
        "has_children": true,
        "child_page": { "title": title }
    })
}

pub fn child_database(n: u32, title: &str) -> Value {
    json!({
        "object": "block",
        "id": id(n).as_str(),
        "type": "child_database",
        "has_children": false,
        "child_database": { "title": title }
    })
}

pub fn text_block(n: u32, block_type: &str, text: &str, has_children: bool) -> Value {
    let mut block = json!({
        "object": "block",
        "id": id(n).as_str(),
        "type": block_type,
        "has_children": has_children,
    });
    block[block_type] = json!({ "rich_text": [{ "type": "text", "plain_text": text }] });
    block
}

/// A page whose properties are given as raw JSON text, so their order is kept.
pub fn page(n: u32, parent: Value, properties: &str) -> Value {
    let properties: Value = serde_json::from_str(properties).expect("test properties");
    json!({
        "object": "page",
        "id": id(n).as_str(),
        "parent": parent,
        "archived": false,
        "properties": properties
    })
}

pub fn titled_row(n: u32, database: u32, title: &str) -> Value {
    page(
        n,
        json!({ "type": "database_id", "database_id": id(database).as_str() }),
        &json!({ "Name": { "type": "title", "title": [{ "plain_text": title }] } }).to_string(),
    )
}

pub fn database(n: u32, title: &str, properties: &str) -> Value {
    let properties: Value = serde_json::from_str(properties).expect("test properties");
    json!({
        "object": "database",
        "id": id(n).as_str(),
        "title": [{ "type": "text", "plain_text": title }],
        "properties": properties,
        "url": format!("https://www.notion.so/{}", id(n).to_compact())
    })
}

pub fn service_error(status: u16, code: &str, message: &str) -> AppError {
    AppError::NotionService {
        status,
        code: NotionErrorCode::from_api_response(code),
        message: message.to_string(),
        body: json!({ "object": "error", "status": status, "code": code, "message": message })
            .to_string(),
        retry_after: None,
    }
}

/// Every repository call the fake has served, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RetrieveDatabase(NotionId),
    RetrievePage(NotionId),
    RetrieveBlock(NotionId),
    ListChildren(NotionId),
    QueryDatabase(NotionId),
    SearchDatabases,
    CreatePage(Value),
    UpdatePage(NotionId, Value),
    AppendChildren(NotionId, Value),
    UpdateBlock(NotionId, Value),
    DeleteBlock(NotionId),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreatePage(_)
                | Call::UpdatePage(..)
                | Call::AppendChildren(..)
                | Call::UpdateBlock(..)
                | Call::DeleteBlock(_)
        )
    }
}

pub struct FakeNotion {
    page_size: usize,
    children: HashMap<NotionId, Vec<Value>>,
    rows: HashMap<NotionId, Vec<Value>>,
    databases: Vec<Value>,
    pages: HashMap<NotionId, Value>,
    blocks: HashMap<NotionId, Value>,
    query_failures: HashMap<NotionId, (u16, String, String)>,
    undeletable: HashSet<NotionId>,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeNotion {
    fn default() -> Self {
        Self {
            page_size: 100,
            children: HashMap::new(),
            rows: HashMap::new(),
            databases: Vec::new(),
            pages: HashMap::new(),
            blocks: HashMap::new(),
            query_failures: HashMap::new(),
            undeletable: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeNotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves listings in pages of `size` items, whatever the caller asks for.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub fn with_children(mut self, parent: u32, blocks: Vec<Value>) -> Self {
        self.children.insert(id(parent), blocks);
        self
    }

    pub fn with_rows(mut self, database: u32, rows: Vec<Value>) -> Self {
        self.rows.insert(id(database), rows);
        self
    }

    pub fn with_database(mut self, database: Value) -> Self {
        self.databases.push(database);
        self
    }

    pub fn with_page(mut self, page: Value) -> Self {
        let key = NotionId::parse(page["id"].as_str().expect("page id")).expect("page id");
        self.pages.insert(key, page);
        self
    }

    pub fn with_block(mut self, block: Value) -> Self {
        let key = NotionId::parse(block["id"].as_str().expect("block id")).expect("block id");
        self.blocks.insert(key, block);
        self
    }

    /// Makes row queries of `database` fail with the given Notion error.
    pub fn failing_query(mut self, database: u32, status: u16, code: &str, message: &str) -> Self {
        self.query_failures
            .insert(id(database), (status, code.to_string(), message.to_string()));
        self
    }

    pub fn undeletable(mut self, block: u32) -> Self {
        self.undeletable.insert(id(block));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn paginate<T: DeserializeOwned>(
        &self,
        items: &[Value],
        page: &PageRequest,
    ) -> Result<PaginatedResponse<T>, AppError> {
        let start: usize = page
            .start_cursor
            .as_deref()
            .map(|cursor| cursor.parse().expect("cursor issued by the fake"))
            .unwrap_or(0);
        let size = self.page_size.min(page.page_size as usize);
        let end = (start + size).min(items.len());
        let results = items[start..end]
            .iter()
            .map(|item| serde_json::from_value(item.clone()))
            .collect::<Result<Vec<T>, _>>()?;
        let has_more = end < items.len();
        Ok(PaginatedResponse {
            results,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }

    fn find_database(&self, database: &NotionId) -> Option<&Value> {
        self.databases
            .iter()
            .find(|db| db["id"].as_str() == Some(database.as_str()))
    }
}

fn not_found(kind: &str, missing: &NotionId) -> AppError {
    service_error(
        404,
        "object_not_found",
        &format!("Could not find {} with ID: {}.", kind, missing),
    )
}

#[async_trait::async_trait]
impl NotionRepository for FakeNotion {
    async fn retrieve_database(&self, id: &NotionId) -> Result<DatabaseRecord, AppError> {
        self.record(Call::RetrieveDatabase(id.clone()));
        let database = self.find_database(id).ok_or_else(|| not_found("database", id))?;
        Ok(serde_json::from_value(database.clone())?)
    }

    async fn retrieve_page(&self, id: &NotionId) -> Result<PageRecord, AppError> {
        self.record(Call::RetrievePage(id.clone()));
        let page = self.pages.get(id).ok_or_else(|| not_found("page", id))?;
        Ok(serde_json::from_value(page.clone())?)
    }

    async fn retrieve_block(&self, id: &NotionId) -> Result<BlockRecord, AppError> {
        self.record(Call::RetrieveBlock(id.clone()));
        let block = self.blocks.get(id).ok_or_else(|| not_found("block", id))?;
        Ok(serde_json::from_value(block.clone())?)
    }

    async fn list_children(
        &self,
        id: &NotionId,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<BlockRecord>, AppError> {
        self.record(Call::ListChildren(id.clone()));
        let children = self.children.get(id).map(Vec::as_slice).unwrap_or_default();
        self.paginate(children, page)
    }

    async fn query_database(
        &self,
        id: &NotionId,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<PageRecord>, AppError> {
        self.record(Call::QueryDatabase(id.clone()));
        if let Some((status, code, message)) = self.query_failures.get(id) {
            return Err(service_error(*status, code, message));
        }
        let rows = self.rows.get(id).map(Vec::as_slice).unwrap_or_default();
        self.paginate(rows, page)
    }

    async fn search_databases(
        &self,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<DatabaseRecord>, AppError> {
        self.record(Call::SearchDatabases);
        self.paginate(&self.databases, page)
    }

    async fn create_page(&self, body: &Value) -> Result<Value, AppError> {
        self.record(Call::CreatePage(body.clone()));
        Ok(json!({ "object": "page", "id": id(9999).as_str() }))
    }

    async fn update_page(&self, id: &NotionId, body: &Value) -> Result<Value, AppError> {
        self.record(Call::UpdatePage(id.clone(), body.clone()));
        Ok(json!({ "object": "page", "id": id.as_str() }))
    }

    async fn append_children(&self, id: &NotionId, body: &Value) -> Result<Value, AppError> {
        self.record(Call::AppendChildren(id.clone(), body.clone()));
        Ok(json!({ "object": "list", "results": body["children"].clone() }))
    }

    async fn update_block(&self, id: &NotionId, body: &Value) -> Result<Value, AppError> {
        self.record(Call::UpdateBlock(id.clone(), body.clone()));
        Ok(json!({ "object": "block", "id": id.as_str() }))
    }

    async fn delete_block(&self, id: &NotionId) -> Result<(), AppError> {
        self.record(Call::DeleteBlock(id.clone()));
        if self.undeletable.contains(id) {
            return Err(service_error(400, "validation_error", "Block is not deletable"));
        }
        Ok(())
    }
}
