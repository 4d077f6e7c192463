// src/config.rs
use crate::api::ClientSettings;
use crate::constants::{REQUEST_TIMEOUT_SECS, RETRY_MAX_ATTEMPTS, TOKEN_ENV_CANDIDATES};
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::model::BlockItem;
use crate::types::{ApiKey, NotionId, ValidationError};
use crate::writer::NewDatabasePage;
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Parsed command-line input, before any validation.
#[derive(Parser, Debug)]
#[command(name = "notion-relay", author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Write the JSON result to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = REQUEST_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Attempts per request when Notion answers 429 or a transient 5xx (1 = no retry)
    #[arg(long, global = true, default_value_t = RETRY_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show a database's properties and their allowed options
    Schema { database_id: String },

    /// Read a page with its full block tree
    ReadPage { page_id: String },

    /// Create a row in a database
    CreatePage {
        database_id: String,
        #[arg(long)]
        title: String,
        /// JSON object of property name to plain value, e.g. '{"Status": "Done"}'
        #[arg(long)]
        properties: Option<String>,
        /// Free text, one paragraph per line
        #[arg(long)]
        content: Option<String>,
        /// JSON array of {"type", "text", "checked"?} items; wins over --content
        #[arg(long)]
        blocks: Option<String>,
    },

    /// Create a page under another page
    CreateChildPage {
        parent_page_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        blocks: Option<String>,
    },

    /// Update properties of an existing page
    UpdatePage {
        page_id: String,
        #[arg(long)]
        properties: String,
    },

    /// Archive a page
    Archive { page_id: String },

    /// Append text blocks to a page or block
    AppendBlocks {
        block_id: String,
        #[arg(long)]
        blocks: String,
    },

    /// Replace all children of a page or block
    ReplaceBlocks {
        block_id: String,
        #[arg(long)]
        blocks: String,
    },

    /// Delete blocks by id
    DeleteBlocks {
        #[arg(required = true)]
        block_ids: Vec<String>,
    },

    /// Rewrite the text of a single text block
    UpdateBlockText {
        block_id: String,
        #[arg(long)]
        text: String,
    },

    /// Replace a page's content with paragraphs of free text
    ReplaceContent {
        page_id: String,
        #[arg(long)]
        content: String,
    },

    /// List databases shared with the integration
    Databases {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List rows of a database
    Rows {
        database_id: String,
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..=50))]
        limit: u16,
    },

    /// Catalog every page and database reachable from a root page (id or URL)
    Scan { root: String },
}

/// A validated operation, ready to run against a repository.
#[derive(Debug, Clone)]
pub enum Operation {
    Schema { database_id: NotionId },
    ReadPage { page_id: NotionId },
    CreatePage { database_id: NotionId, page: NewDatabasePage },
    CreateChildPage {
        parent_page_id: NotionId,
        title: String,
        content: Option<String>,
        blocks: Option<Vec<BlockItem>>,
    },
    UpdatePage { page_id: NotionId, properties: IndexMap<String, Value> },
    Archive { page_id: NotionId },
    AppendBlocks { block_id: NotionId, blocks: Vec<BlockItem> },
    ReplaceBlocks { block_id: NotionId, blocks: Vec<BlockItem> },
    DeleteBlocks { block_ids: Vec<NotionId> },
    UpdateBlockText { block_id: NotionId, text: String },
    ReplaceContent { page_id: NotionId, content: String },
    Databases { limit: Option<usize> },
    Rows { database_id: NotionId, limit: usize },
    Scan { root: NotionId },
}

impl Operation {
    /// Validates raw arguments. Nothing here touches the network.
    pub fn from_command(command: Command) -> Result<Self, ValidationError> {
        let operation = match command {
            Command::Schema { database_id } => Operation::Schema {
                database_id: NotionId::validate("database_id", &database_id)?,
            },
            Command::ReadPage { page_id } => Operation::ReadPage {
                page_id: NotionId::validate("page_id", &page_id)?,
            },
            Command::CreatePage {
                database_id,
                title,
                properties,
                content,
                blocks,
            } => Operation::CreatePage {
                database_id: NotionId::validate("database_id", &database_id)?,
                page: NewDatabasePage {
                    title: required_text("title", title)?,
                    properties: properties
                        .map(|raw| parse_json_arg("properties", &raw))
                        .transpose()?,
                    content,
                    blocks: blocks.map(|raw| parse_json_arg("blocks", &raw)).transpose()?,
                },
            },
            Command::CreateChildPage {
                parent_page_id,
                title,
                content,
                blocks,
            } => Operation::CreateChildPage {
                parent_page_id: NotionId::validate("page_id", &parent_page_id)?,
                title: required_text("title", title)?,
                content,
                blocks: blocks.map(|raw| parse_json_arg("blocks", &raw)).transpose()?,
            },
            Command::UpdatePage {
                page_id,
                properties,
            } => Operation::UpdatePage {
                page_id: NotionId::validate("page_id", &page_id)?,
                properties: parse_json_arg("properties", &properties)?,
            },
            Command::Archive { page_id } => Operation::Archive {
                page_id: NotionId::validate("page_id", &page_id)?,
            },
            Command::AppendBlocks { block_id, blocks } => Operation::AppendBlocks {
                block_id: NotionId::validate("block_id", &block_id)?,
                blocks: parse_json_arg("blocks", &blocks)?,
            },
            Command::ReplaceBlocks { block_id, blocks } => Operation::ReplaceBlocks {
                block_id: NotionId::validate("block_id", &block_id)?,
                blocks: parse_json_arg("blocks", &blocks)?,
            },
            Command::DeleteBlocks { block_ids } => Operation::DeleteBlocks {
                block_ids: block_ids
                    .iter()
                    .map(|id| NotionId::validate("block_id", id))
                    .collect::<Result<_, _>>()?,
            },
            Command::UpdateBlockText { block_id, text } => Operation::UpdateBlockText {
                block_id: NotionId::validate("block_id", &block_id)?,
                text,
            },
            Command::ReplaceContent { page_id, content } => Operation::ReplaceContent {
                page_id: NotionId::validate("page_id", &page_id)?,
                content,
            },
            Command::Databases { limit } => Operation::Databases { limit },
            Command::Rows { database_id, limit } => Operation::Rows {
                database_id: NotionId::validate("database_id", &database_id)?,
                limit: usize::from(limit),
            },
            Command::Scan { root } => Operation::Scan {
                root: NotionId::parse(&root)?,
            },
        };
        Ok(operation)
    }

    /// Whether the operation changes the workspace.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Operation::Schema { .. }
                | Operation::ReadPage { .. }
                | Operation::Databases { .. }
                | Operation::Rows { .. }
                | Operation::Scan { .. }
        )
    }
}

fn required_text(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(value)
}

fn parse_json_arg<T: DeserializeOwned>(field: &str, raw: &str) -> Result<T, ValidationError> {
    serde_json::from_str(raw).map_err(|e| ValidationError::InvalidJson {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Resolved relay configuration: credentials, transport settings and the operation.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_key: ApiKey,
    pub client: ClientSettings,
    pub output_file: Option<PathBuf>,
    pub verbose: bool,
    pub operation: Operation,
}

impl RelayConfig {
    /// Resolves the configuration from CLI input and the process environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with(cli, |name| std::env::var(name).ok())
    }

    /// Same as [`RelayConfig::resolve`] with an injectable environment lookup.
    pub fn resolve_with<F>(cli: CommandLineInput, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let operation = Operation::from_command(cli.command)?;
        let api_key = resolve_api_key_from(lookup)?;

        let retry = RetryPolicy {
            max_attempts: cli.max_attempts.max(1),
            ..RetryPolicy::default()
        };
        let client = ClientSettings {
            timeout: Duration::from_secs(cli.timeout.max(1)),
            retry,
            ..ClientSettings::default()
        };

        Ok(RelayConfig {
            api_key,
            client,
            output_file: cli.output.map(PathBuf::from),
            verbose: cli.verbose,
            operation,
        })
    }
}

/// First non-blank token among the candidate environment variables.
pub fn resolve_api_key_from<F>(lookup: F) -> Result<ApiKey, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    for name in TOKEN_ENV_CANDIDATES {
        let Some(value) = lookup(name) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        log::debug!("Using Notion token from {}", name);
        return Ok(ApiKey::new(value)?);
    }

    Err(AppError::MissingCredential {
        checked: TOKEN_ENV_CANDIDATES.join(", "),
    })
}
