//! Blocks going in (write payloads) and coming out (page trees).

use super::property_value::text_content;
use crate::constants::WRITABLE_TEXT_BLOCK_TYPES;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A simplified block a caller wants written: a text block type plus its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockItem {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl BlockItem {
    pub fn new(block_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            text: text.into(),
            checked: None,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new("paragraph", text)
    }
}

/// Whether a block of this type can have its text written by the relay.
pub fn is_writable_text_block(block_type: &str) -> bool {
    WRITABLE_TEXT_BLOCK_TYPES.contains(&block_type)
}

/// Validates items and renders them as Notion block objects.
///
/// Every item needs non-blank text and a writable type, and the list must
/// not be empty. Nothing is rendered unless the whole list is valid.
pub fn build_blocks(items: &[BlockItem]) -> Result<Vec<Value>, AppError> {
    if items.is_empty() {
        return Err(AppError::Validation(
            "blocks must include at least one item".to_string(),
        ));
    }

    items
        .iter()
        .map(|item| {
            if item.text.trim().is_empty() {
                return Err(AppError::Validation(
                    "Block text must be a non-empty string".to_string(),
                ));
            }
            if !is_writable_text_block(&item.block_type) {
                return Err(AppError::Validation(format!(
                    "Unsupported block type: {}",
                    item.block_type
                )));
            }
            let mut body = json!({ "rich_text": text_content(&item.text) });
            if item.block_type == "to_do" {
                body["checked"] = json!(item.checked.unwrap_or(false));
            }
            let mut block = json!({ "object": "block", "type": item.block_type });
            block[item.block_type.as_str()] = body;
            Ok(block)
        })
        .collect()
}

/// One paragraph item per non-blank line of free text.
pub fn paragraphs_from_content(content: &str) -> Vec<BlockItem> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(BlockItem::paragraph)
        .collect()
}

/// Children for a new page: explicit items win over free text; neither means none.
pub fn children_from(
    content: Option<&str>,
    items: Option<&[BlockItem]>,
) -> Result<Option<Vec<Value>>, AppError> {
    if let Some(items) = items.filter(|items| !items.is_empty()) {
        return build_blocks(items).map(Some);
    }
    let paragraphs = paragraphs_from_content(content.unwrap_or_default());
    if paragraphs.is_empty() {
        return Ok(None);
    }
    build_blocks(&paragraphs).map(Some)
}

/// A node of a page's block tree as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockNode>,
}
