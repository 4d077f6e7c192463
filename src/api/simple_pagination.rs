// src/api/simple_pagination.rs
//! Cursor pagination over any listing endpoint.

use super::records::{BlockRecord, DatabaseRecord, PageRecord, PageRequest, PaginatedResponse};
use super::NotionRepository;
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;
use crate::types::NotionId;

/// Follows `next_cursor` until `has_more` is false or `max_items` is reached.
///
/// Pages never ask for more than `max_items`, so small limits cost one small
/// request.
pub async fn fetch_all_pages<T, F, Fut>(
    mut fetch_fn: F,
    max_items: Option<usize>,
) -> Result<Vec<T>, AppError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let page_size = max_items.map_or(NOTION_API_PAGE_SIZE, |max| {
        u32::try_from(max)
            .unwrap_or(NOTION_API_PAGE_SIZE)
            .clamp(1, NOTION_API_PAGE_SIZE)
    });
    let mut request = PageRequest::first(page_size);
    let mut pages_fetched = 0u32;

    loop {
        let response = fetch_fn(request.clone()).await?;
        pages_fetched += 1;
        all_items.extend(response.results);

        if let Some(max) = max_items {
            if all_items.len() >= max {
                log::debug!("Reached item limit {} after {} pages", max, pages_fetched);
                all_items.truncate(max);
                break;
            }
        }

        match response.next_cursor {
            Some(cursor) if response.has_more => request.start_cursor = Some(cursor),
            _ => break,
        }
    }

    Ok(all_items)
}

/// Every child block of a page or block.
pub async fn all_children(
    repository: &dyn NotionRepository,
    id: &NotionId,
) -> Result<Vec<BlockRecord>, AppError> {
    fetch_all_pages(
        move |page| async move { repository.list_children(id, &page).await },
        None,
    )
    .await
}

/// Every row of a database.
pub async fn all_rows(
    repository: &dyn NotionRepository,
    id: &NotionId,
) -> Result<Vec<PageRecord>, AppError> {
    fetch_all_pages(
        move |page| async move { repository.query_database(id, &page).await },
        None,
    )
    .await
}

/// Databases visible to the integration, at most `limit` of them.
pub async fn all_databases(
    repository: &dyn NotionRepository,
    limit: Option<usize>,
) -> Result<Vec<DatabaseRecord>, AppError> {
    fetch_all_pages(
        move |page| async move { repository.search_databases(&page).await },
        limit,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn response(results: Vec<u32>, next_cursor: Option<&str>, has_more: bool) -> PaginatedResponse<u32> {
        PaginatedResponse {
            results,
            next_cursor: next_cursor.map(str::to_string),
            has_more,
        }
    }

    #[tokio::test]
    async fn test_follows_cursor_until_exhausted() {
        let calls = AtomicU32::new(0);
        let items = fetch_all_pages(
            |request| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert_eq!(request.page_size, NOTION_API_PAGE_SIZE);
                    Ok(match (call, request.start_cursor.as_deref()) {
                        (0, None) => response(vec![1, 2], Some("c1"), true),
                        (1, Some("c1")) => response(vec![3], Some("c2"), true),
                        (2, Some("c2")) => response(vec![4], None, false),
                        other => panic!("unexpected call {:?}", other),
                    })
                }
            },
            None,
        )
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_when_cursor_missing() {
        let items = fetch_all_pages(|_| async { Ok(response(vec![7], None, true)) }, None)
            .await
            .unwrap();
        assert_eq!(items, vec![7]);
    }

    #[tokio::test]
    async fn test_item_limit_truncates() {
        let items = fetch_all_pages(
            |_| async { Ok(response(vec![1, 2, 3], Some("next"), true)) },
            Some(2),
        )
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_page_size_follows_small_limit() {
        let sizes = std::sync::Mutex::new(Vec::new());
        let items = fetch_all_pages(
            |request| {
                sizes.lock().unwrap().push(request.page_size);
                async { Ok(response(vec![1, 2, 3], Some("next"), true)) }
            },
            Some(5),
        )
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 1, 2]);
        assert_eq!(*sizes.lock().unwrap(), vec![5, 5]);
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let result: Result<Vec<u32>, _> = fetch_all_pages(
            |_| async { Err(AppError::MalformedResponse("bad".to_string())) },
            None,
        )
        .await;
        assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    }
}
