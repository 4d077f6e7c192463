// src/constants.rs
//! Domain constants that define the operational boundaries of the relay.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you how the relay
//! talks to Notion: which version it speaks, how much it fetches per call,
//! how long it waits and how it backs off.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Root of every Notion REST endpoint.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

/// The API version pinned on every request via the `Notion-Version` header.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips while walking a workspace.
pub const NOTION_API_PAGE_SIZE: u32 = 100;

/// Environment variables probed, in order, for the integration token.
pub const TOKEN_ENV_CANDIDATES: [&str; 4] = [
    "NOTION_TOKEN",
    "NOTION_API_KEY",
    "NOTION_SECRET",
    "NOTION_ACCESS_TOKEN",
];

// ---------------------------------------------------------------------------
// Transport behaviour
// ---------------------------------------------------------------------------

/// Fixed per-request timeout, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Total attempts (first try included) for a retryable upstream failure.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// First backoff delay after a 429 or transient 5xx.
pub const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on a single backoff delay.
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Writing content
// ---------------------------------------------------------------------------

/// Block types whose text can be written or rewritten through the relay.
pub const WRITABLE_TEXT_BLOCK_TYPES: [&str; 7] = [
    "paragraph",
    "heading_1",
    "heading_2",
    "heading_3",
    "bulleted_list_item",
    "numbered_list_item",
    "to_do",
];

/// Title used when a page or database carries no readable text.
pub const UNTITLED: &str = "Untitled";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies in logs.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
