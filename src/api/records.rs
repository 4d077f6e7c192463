// src/api/records.rs
//! Wire shapes of the Notion objects the relay reads.
//!
//! Only the fields the relay reasons about are typed. Everything else is
//! kept in a flattened map so a record can be handed back to callers
//! without losing data.

use crate::model::Parent;
use crate::types::NotionId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Cursor and size for one paginated call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    pub page_size: u32,
}

impl PageRequest {
    pub fn first(page_size: u32) -> Self {
        Self {
            start_cursor: None,
            page_size,
        }
    }

    /// Query-string form, for `GET` listings.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("page_size", self.page_size.to_string())];
        if let Some(cursor) = &self.start_cursor {
            query.push(("start_cursor", cursor.clone()));
        }
        query
    }

    /// JSON body form, for `POST` queries. `extra` fields are merged in.
    pub fn to_body(&self, extra: Map<String, Value>) -> Value {
        let mut body = extra;
        body.insert("page_size".to_string(), Value::from(self.page_size));
        if let Some(cursor) = &self.start_cursor {
            body.insert("start_cursor".to_string(), Value::from(cursor.clone()));
        }
        Value::Object(body)
    }
}

/// A block as returned by `blocks/{id}` and `blocks/{id}/children`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: NotionId,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub parent: Value,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl BlockRecord {
    /// The type-specific body, e.g. the `paragraph` object of a paragraph block.
    pub fn body(&self) -> Option<&Value> {
        self.rest.get(&self.block_type)
    }

    /// `child_page` and `child_database` blocks carry their title as a plain string.
    pub fn child_title(&self) -> String {
        self.body()
            .and_then(|body| body.get("title"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Plain text of the block's `rich_text`, empty when there is none.
    pub fn text(&self) -> String {
        self.body()
            .and_then(|body| body.get("rich_text"))
            .map(plain_text)
            .unwrap_or_default()
    }

    pub fn parent(&self) -> Parent {
        parent_from(&self.parent)
    }
}

/// A page, either standalone or a database row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: NotionId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub parent: Value,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl PageRecord {
    pub fn parent(&self) -> Parent {
        parent_from(&self.parent)
    }

    /// Text of the first title-typed property, empty if there is none.
    pub fn title(&self) -> String {
        self.properties
            .values()
            .find(|prop| property_type(prop) == Some("title"))
            .map(|prop| property_text(prop, "title"))
            .unwrap_or_default()
    }

    /// The page URL, derived from the id when the API omitted it.
    pub fn url_or_default(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("https://www.notion.so/{}", self.id.to_compact()))
    }
}

/// A database as returned by `databases/{id}` and by search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseRecord {
    pub id: NotionId,
    #[serde(default)]
    pub title: Vec<Value>,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(default)]
    pub parent: Value,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl DatabaseRecord {
    pub fn title_text(&self) -> String {
        self.title.iter().map(rich_text_part).collect()
    }
}

/// Reads Notion's `{type: "page_id", page_id: ...}` parent objects.
pub fn parent_from(raw: &Value) -> Parent {
    let id_at = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .and_then(|id| NotionId::parse(id).ok())
    };
    match raw.get("type").and_then(Value::as_str) {
        Some("page_id") => id_at("page_id").map_or(Parent::None, |page_id| Parent::Page { page_id }),
        Some("database_id") => id_at("database_id")
            .map_or(Parent::None, |database_id| Parent::Database { database_id }),
        Some("block_id") => {
            id_at("block_id").map_or(Parent::None, |block_id| Parent::Block { block_id })
        }
        Some("workspace") => Parent::Workspace,
        _ => Parent::None,
    }
}

/// Concatenates the text runs of a rich-text array.
pub fn plain_text(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(|parts| parts.iter().map(rich_text_part).collect())
        .unwrap_or_default()
}

fn rich_text_part(part: &Value) -> String {
    part.get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| {
            part.get("text")
                .and_then(|text| text.get("content"))
                .and_then(Value::as_str)
        })
        .unwrap_or_default()
        .to_string()
}

/// Declared type of a page property value.
pub fn property_type(prop: &Value) -> Option<&str> {
    prop.get("type").and_then(Value::as_str)
}

/// Plain text held by a `title` or `rich_text` property value.
pub fn property_text(prop: &Value, type_name: &str) -> String {
    prop.get(type_name).map(plain_text).unwrap_or_default()
}
