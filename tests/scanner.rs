// tests/scanner.rs
//! Workspace scanning against an in-memory workspace.

mod common;

use common::{
    child_database, child_page, id, page, text_block, titled_row, Call, FakeNotion,
};
use notion_relay::{AppError, DatabaseFetchFailure, NodeKind, Parent, WorkspaceScanner};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_scan_terminates_on_back_reference() {
    // root -> X -> root
    let notion = FakeNotion::new()
        .with_children(1, vec![child_page(2, "X")])
        .with_children(2, vec![child_page(1, "Root again"), child_page(3, "Y")])
        .with_children(3, vec![child_page(2, "X again")]);

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();

    assert_eq!(catalog.pages.len(), 3);
    assert_eq!(catalog.pages[&id(2)].title, "X");
    assert_eq!(notion.count(&Call::ListChildren(id(1))), 1);
    assert_eq!(notion.count(&Call::ListChildren(id(2))), 1);
    assert_eq!(notion.count(&Call::ListChildren(id(3))), 1);
}

#[tokio::test]
async fn test_first_page_write_wins() {
    let notion = FakeNotion::new()
        .with_children(1, vec![child_page(2, "Original"), child_page(3, "Other")])
        .with_children(3, vec![child_page(2, "Renamed elsewhere")]);

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();

    let node = &catalog.pages[&id(2)];
    assert_eq!(node.title, "Original");
    assert_eq!(node.parent, Parent::Page { page_id: id(1) });
}

#[tokio::test]
async fn test_inaccessible_database_is_contained() {
    let notion = FakeNotion::new()
        .with_children(
            1,
            vec![child_database(10, "Secret"), child_database(20, "Open"), child_page(2, "After")],
        )
        .failing_query(10, 403, "restricted_resource", "Insufficient permissions")
        .with_rows(20, vec![titled_row(21, 20, "Row one")])
        .with_children(21, vec![child_page(22, "Inside row")]);

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();

    assert_eq!(catalog.databases.len(), 2);
    assert_eq!(catalog.databases[&id(10)].kind, NodeKind::Database);
    assert_eq!(catalog.databases[&id(10)].title, "Secret");
    assert_eq!(
        catalog.skipped_databases[&id(10)],
        DatabaseFetchFailure::PermissionDenied {
            detail: "Insufficient permissions".to_string()
        }
    );
    assert!(catalog
        .pages
        .values()
        .all(|page| page.parent != Parent::Database { database_id: id(10) }));

    let row = &catalog.pages[&id(21)];
    assert_eq!(row.title, "Row one");
    assert_eq!(row.parent, Parent::Database { database_id: id(20) });
    assert_eq!(catalog.pages[&id(22)].parent, Parent::Page { page_id: id(21) });
    assert!(catalog.pages.contains_key(&id(2)));
}

#[tokio::test]
async fn test_missing_and_linked_databases_are_skipped() {
    let notion = FakeNotion::new()
        .with_children(1, vec![child_database(10, "Gone"), child_database(11, "Linked")])
        .failing_query(10, 404, "object_not_found", "Could not find database")
        .failing_query(
            11,
            400,
            "validation_error",
            "Database is a linked database and cannot be queried",
        );

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();

    assert_eq!(catalog.skipped_databases[&id(10)], DatabaseFetchFailure::NotFound);
    assert_eq!(catalog.skipped_databases[&id(11)], DatabaseFetchFailure::LinkedDatabase);
}

#[tokio::test]
async fn test_other_database_failures_abort_the_scan() {
    let notion = FakeNotion::new()
        .with_children(1, vec![child_database(10, "Flaky")])
        .failing_query(10, 500, "internal_server_error", "Unexpected error");

    let err = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap_err();

    assert!(matches!(err, AppError::NotionService { status: 500, .. }));
}

#[tokio::test]
async fn test_databases_are_queried_once_after_pages_drain() {
    let notion = FakeNotion::new()
        .with_children(1, vec![child_database(10, "Tasks"), child_page(2, "Sub")])
        .with_children(2, vec![child_database(10, "Tasks renamed")])
        .with_rows(10, vec![titled_row(11, 10, "Task")]);

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();

    assert_eq!(notion.count(&Call::QueryDatabase(id(10))), 1);
    assert_eq!(catalog.databases[&id(10)].title, "Tasks renamed");

    let calls = notion.calls();
    let query_at = calls
        .iter()
        .position(|c| *c == Call::QueryDatabase(id(10)))
        .unwrap();
    let sub_listed_at = calls
        .iter()
        .position(|c| *c == Call::ListChildren(id(2)))
        .unwrap();
    assert!(sub_listed_at < query_at);
}

#[tokio::test]
async fn test_children_and_rows_are_paginated() {
    let pages: Vec<_> = (2..=6).map(|n| child_page(n, &format!("Page {}", n))).collect();
    let rows: Vec<_> = (21..=25).map(|n| titled_row(n, 20, &format!("Row {}", n))).collect();
    let mut children = pages;
    children.push(child_database(20, "Big"));
    let notion = FakeNotion::new()
        .with_page_size(2)
        .with_children(1, children)
        .with_rows(20, rows);

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();

    assert_eq!(catalog.pages.len(), 10);
    assert_eq!(notion.count(&Call::ListChildren(id(1))), 3);
    assert_eq!(notion.count(&Call::QueryDatabase(id(20))), 3);
    let order: Vec<_> = catalog.pages.keys().take(5).cloned().collect();
    assert_eq!(order, (2..=6).map(id).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_container_blocks_are_descended() {
    let notion = FakeNotion::new()
        .with_children(
            1,
            vec![
                text_block(2, "toggle", "More", true),
                text_block(3, "paragraph", "leaf", false),
            ],
        )
        .with_children(2, vec![child_page(4, "Hidden in toggle")]);

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();

    assert_eq!(catalog.pages[&id(4)].parent, Parent::Block { block_id: id(2) });
    assert_eq!(notion.count(&Call::ListChildren(id(2))), 1);
    assert_eq!(notion.count(&Call::ListChildren(id(3))), 0);
}

#[tokio::test]
async fn test_row_titles_fall_back() {
    let database_parent = json!({ "type": "database_id", "database_id": id(10).as_str() });
    let notion = FakeNotion::new()
        .with_children(1, vec![child_database(10, "Notes")])
        .with_rows(
            10,
            vec![
                page(
                    11,
                    database_parent.clone(),
                    r#"{"Summary": {"type": "rich_text", "rich_text": [{"plain_text": "From rich text"}]}}"#,
                ),
                page(
                    12,
                    database_parent,
                    r#"{"Count": {"type": "number", "number": 3}}"#,
                ),
            ],
        );

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();

    assert_eq!(catalog.pages[&id(11)].title, "From rich text");
    assert_eq!(catalog.pages[&id(12)].title, "Untitled");
}

#[tokio::test]
async fn test_catalog_serializes_for_callers() {
    let notion = FakeNotion::new()
        .with_children(1, vec![child_database(10, "Denied")])
        .failing_query(10, 401, "unauthorized", "API token is invalid.");

    let catalog = WorkspaceScanner::new(&notion).scan(&id(1)).await.unwrap();
    let json = serde_json::to_value(&catalog).unwrap();

    let skipped = &json["skipped_databases"][id(10).as_str()];
    assert_eq!(skipped["reason"], "permission_denied");
    assert_eq!(json["databases"][id(10).as_str()]["parent"]["page_id"], id(1).as_str());
}
