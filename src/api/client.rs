// src/api/client.rs
//! HTTP gateway to the Notion API.
//!
//! A thin wrapper around reqwest that attaches the bearer token, the pinned
//! `Notion-Version` and the JSON content type to every call. [`request`]
//! turns non-2xx answers into [`AppError::NotionService`] and retries the
//! transient ones; [`request_raw`] hands back the response untouched.
//!
//! Reads and idempotent methods are retried on 429 and transient 5xx. POST
//! and PATCH writes are only resent after a 429, since a 5xx may arrive after
//! Notion has already applied them.
//!
//! [`request`]: NotionHttpClient::request
//! [`request_raw`]: NotionHttpClient::request_raw

use super::records::{BlockRecord, DatabaseRecord, PageRecord, PageRequest, PaginatedResponse};
use crate::constants::{
    ERROR_BODY_PREVIEW_LENGTH, NOTION_API_BASE_URL, NOTION_API_VERSION, REQUEST_TIMEOUT_SECS,
};
use crate::error::{AppError, NotionErrorCode};
use crate::error_recovery::{retry_with_backoff, RetryPolicy};
use crate::types::{ApiKey, NotionId};
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Transport knobs, all with production defaults.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: NOTION_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

/// The error body Notion sends with non-2xx answers.
#[derive(Debug, Deserialize)]
struct NotionErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_settings(api_key, &ClientSettings::default())
    }

    pub fn with_settings(api_key: &ApiKey, settings: &ClientSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry: settings.retry,
        })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        let mut auth_value = header::HeaderValue::from_str(&auth_header)
            .map_err(|e| AppError::Validation(format!("Invalid API token format: {}", e)))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_API_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Absolute URLs pass through; anything else is relative to the API root.
    fn endpoint_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Sends a request and returns the parsed JSON body.
    ///
    /// Non-2xx answers become [`AppError::NotionService`] with the status and
    /// body kept verbatim. Failures are retried under the client's
    /// [`RetryPolicy`] as far as [`retry_condition`] allows for the method.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<Value, AppError> {
        let should_retry = retry_condition(&method);
        self.send(method, path, payload, params, should_retry).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(&str, String)],
        should_retry: fn(&AppError) -> bool,
    ) -> Result<Value, AppError> {
        retry_with_backoff(
            || self.request_once(method.clone(), path, payload, params),
            &self.retry,
            should_retry,
        )
        .await
    }

    /// Sends a request and returns the response as is, whatever its status.
    pub async fn request_raw(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<Response, AppError> {
        let url = self.endpoint_url(path);
        log::debug!("{} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if !params.is_empty() {
            builder = builder.query(params);
        }
        if let Some(body) = payload {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        log::debug!("{} -> {}", url, response.status());
        Ok(response)
    }

    async fn request_once(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<Value, AppError> {
        let response = self.request_raw(method, path, payload, params).await?;
        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Reads and decodes a record. Query and search are POSTs that change
    /// nothing, so every read gets the full retry treatment.
    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<T, AppError> {
        let value = self
            .send(method, path, payload, params, AppError::is_retryable)
            .await?;
        serde_json::from_value(value).map_err(|e| {
            log::error!("Failed to parse response from {}: {}", path, e);
            AppError::MalformedResponse(format!("{}: {}", path, e))
        })
    }
}

/// Which failures may be resent for `method`.
///
/// Idempotent methods retry 429 and transient 5xx. Anything else only
/// retries 429, the one answer that guarantees nothing was applied.
pub fn retry_condition(method: &Method) -> fn(&AppError) -> bool {
    if method.is_idempotent() {
        AppError::is_retryable
    } else {
        AppError::is_rate_limited
    }
}

/// Builds the typed failure for a non-2xx response, consuming its body.
pub async fn service_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let url = response.url().to_string();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return AppError::NetworkFailure(e),
    };

    let (code, message) = match serde_json::from_str::<NotionErrorBody>(&body) {
        Ok(parsed) => (NotionErrorCode::from_api_response(&parsed.code), parsed.message),
        Err(_) => (
            NotionErrorCode::from_http_status(status),
            format!("HTTP {} from {}", status, url),
        ),
    };

    let preview: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
    log::warn!("Notion answered {} ({}) for {}: {}", status, code, url, preview);

    AppError::NotionService {
        status,
        code,
        message,
        body,
        retry_after,
    }
}

#[async_trait::async_trait]
impl super::NotionRepository for NotionHttpClient {
    async fn retrieve_database(&self, id: &NotionId) -> Result<DatabaseRecord, AppError> {
        self.fetch(Method::GET, &format!("databases/{}", id), None, &[])
            .await
    }

    async fn retrieve_page(&self, id: &NotionId) -> Result<PageRecord, AppError> {
        self.fetch(Method::GET, &format!("pages/{}", id), None, &[])
            .await
    }

    async fn retrieve_block(&self, id: &NotionId) -> Result<BlockRecord, AppError> {
        self.fetch(Method::GET, &format!("blocks/{}", id), None, &[])
            .await
    }

    async fn list_children(
        &self,
        id: &NotionId,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<BlockRecord>, AppError> {
        let endpoint = format!("blocks/{}/children", id);
        self.fetch(Method::GET, &endpoint, None, &page.to_query())
            .await
    }

    async fn query_database(
        &self,
        id: &NotionId,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<PageRecord>, AppError> {
        let endpoint = format!("databases/{}/query", id);
        let body = page.to_body(Map::new());
        log::debug!("Querying database {} (cursor {:?})", id, page.start_cursor);
        self.fetch(Method::POST, &endpoint, Some(&body), &[])
            .await
    }

    async fn search_databases(
        &self,
        page: &PageRequest,
    ) -> Result<PaginatedResponse<DatabaseRecord>, AppError> {
        let mut filter = Map::new();
        filter.insert(
            "filter".to_string(),
            json!({ "property": "object", "value": "database" }),
        );
        let body = page.to_body(filter);
        self.fetch(Method::POST, "search", Some(&body), &[]).await
    }

    async fn create_page(&self, body: &Value) -> Result<Value, AppError> {
        self.request(Method::POST, "pages", Some(body), &[]).await
    }

    async fn update_page(&self, id: &NotionId, body: &Value) -> Result<Value, AppError> {
        self.request(Method::PATCH, &format!("pages/{}", id), Some(body), &[])
            .await
    }

    async fn append_children(&self, id: &NotionId, body: &Value) -> Result<Value, AppError> {
        let endpoint = format!("blocks/{}/children", id);
        self.request(Method::PATCH, &endpoint, Some(body), &[]).await
    }

    async fn update_block(&self, id: &NotionId, body: &Value) -> Result<Value, AppError> {
        self.request(Method::PATCH, &format!("blocks/{}", id), Some(body), &[])
            .await
    }

    async fn delete_block(&self, id: &NotionId) -> Result<(), AppError> {
        self.request(Method::DELETE, &format!("blocks/{}", id), None, &[])
            .await?;
        log::debug!("Deleted block {}", id);
        Ok(())
    }
}
