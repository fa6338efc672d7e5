//! End-to-end list queries against a mock API and snapshot host.

use std::time::Duration;

use newsdesk::filter::category_options;
use newsdesk::model::QueryParams;
use newsdesk::query::{ArticlesQuery, CategoriesQuery, QueryStatus};
use newsdesk::remote::{ArticleSource, CategorySource, FetchError, RemoteClient, SnapshotSource};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article(id: usize, title: &str, category: &str) -> Value {
    json!({
        "id": id.to_string(),
        "title": title,
        "content": format!("<p>Body of {title}</p>"),
        "userId": "u1",
        "categoryId": category,
        "createdAt": "2025-03-01T10:00:00Z",
        "category": {"id": category, "name": category},
        "user": {"id": "u1", "username": "editor", "role": "Admin"}
    })
}

/// 12 articles: 7 "tech", 5 "design"; two titles mention AI.
fn twelve_articles() -> Vec<Value> {
    (1..=12)
        .map(|i| {
            let category = if i <= 7 { "tech" } else { "design" };
            let title = match i {
                3 => "AI in the newsroom".to_string(),
                9 => "Designing for AI".to_string(),
                _ => format!("Story number {i}"),
            };
            article(i, &title, category)
        })
        .collect()
}

fn client_for(server: &MockServer) -> RemoteClient {
    let snapshot = SnapshotSource::parse(&format!("{}/data", server.uri())).unwrap();
    RemoteClient::new(&format!("{}/api", server.uri()), snapshot).unwrap()
}

async fn mount_articles(server: &MockServer, articles: Vec<Value>) {
    let total = articles.len();
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": articles,
            "total": total,
            "page": 1,
            "limit": total
        })))
        .mount(server)
        .await;
}

fn ids(query: &ArticlesQuery) -> Vec<String> {
    query.result().items.iter().map(|a| a.id.clone()).collect()
}

#[tokio::test]
async fn test_category_filter_pages_locally() {
    let server = MockServer::start().await;
    mount_articles(&server, twelve_articles()).await;
    let mut query = ArticlesQuery::new(ArticleSource::new(client_for(&server)));

    query.set_params(QueryParams::new(1, 5).with_category("tech"));
    let result = query.settle().await;
    assert_eq!(result.status, QueryStatus::Success);
    assert_eq!(result.items.len(), 5);
    assert_eq!(result.total, 7);
    assert_eq!(ids(&query), vec!["1", "2", "3", "4", "5"]);

    query.set_params(QueryParams::new(2, 5).with_category("tech"));
    let result = query.settle().await;
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.total, 7);
    assert_eq!(ids(&query), vec!["6", "7"]);
}

#[tokio::test]
async fn test_search_ignores_all_category() {
    let server = MockServer::start().await;
    mount_articles(&server, twelve_articles()).await;
    let mut query = ArticlesQuery::new(ArticleSource::new(client_for(&server)));

    query.set_params(QueryParams::new(1, 10).with_category("all").with_search("AI"));
    let result = query.settle().await;
    assert_eq!(result.total, 2);
    assert_eq!(ids(&query), vec!["3", "9"]);
}

#[tokio::test]
async fn test_unfiltered_query_uses_server_pagination() {
    let server = MockServer::start().await;
    let articles = twelve_articles();
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": articles[5..10].to_vec(),
            "total": 12,
            "page": 2,
            "limit": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = ArticlesQuery::new(ArticleSource::new(client_for(&server)));
    query.set_params(QueryParams::new(2, 5));
    let result = query.settle().await;

    assert_eq!(result.total, 12);
    assert_eq!(result.total_pages(), 3);
    assert_eq!(ids(&query), vec!["6", "7", "8", "9", "10"]);
}

#[tokio::test]
async fn test_live_failure_falls_back_to_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let snapshot: Vec<Value> = (1..=6).map(|i| article(i, &format!("Cached {i}"), "tech")).collect();
    Mock::given(method("GET"))
        .and(path("/data/articles.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = ArticlesQuery::new(ArticleSource::new(client_for(&server)));
    query.set_params(QueryParams::new(1, 10));
    let result = query.settle().await;

    assert_eq!(result.status, QueryStatus::Success);
    assert!(result.error.is_none());
    assert_eq!(result.items.len(), 6);
    assert_eq!(result.total, 6);
}

#[tokio::test]
async fn test_snapshot_failure_surfaces_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/categories.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut query = CategoriesQuery::new(CategorySource::new(client_for(&server)));
    query.set_params(QueryParams::new(1, 10));
    let result = query.settle().await;

    assert_eq!(result.status, QueryStatus::Failed);
    assert!(matches!(result.error.as_deref(), Some(FetchError::HttpStatus(404))));
    assert!(result.items.is_empty());
}

#[tokio::test]
async fn test_slow_response_for_old_params_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [article(1, "Old page", "tech")], "total": 12}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [article(2, "New page", "tech")], "total": 12})),
        )
        .mount(&server)
        .await;

    let mut query = ArticlesQuery::new(ArticleSource::new(client_for(&server)));
    query.set_params(QueryParams::new(1, 1));
    query.set_params(QueryParams::new(2, 1));
    query.settle().await;

    tokio::time::sleep(Duration::from_millis(400)).await;
    query.poll();
    assert_eq!(ids(&query), vec!["2"]);
    assert_eq!(query.result().page, 2);
}

#[tokio::test]
async fn test_category_pages_report_page_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 11, "name": "science"}],
            "totalData": 11,
            "currentPage": 2,
            "totalPages": 2
        })))
        .mount(&server)
        .await;

    let mut query = CategoriesQuery::new(CategorySource::new(client_for(&server)));
    query.set_params(QueryParams::new(2, 10));
    let result = query.settle().await;

    assert_eq!(result.page, 2);
    assert_eq!(result.total_pages(), 2);
    assert_eq!(result.items[0].id, "11");
}

#[tokio::test]
async fn test_category_options_degrade_to_all() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let options = category_options(&CategorySource::new(client_for(&server))).await;
    assert_eq!(options, vec!["all".to_string()]);
}

#[tokio::test]
async fn test_category_options_from_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/categories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "name": "tech"},
                {"id": 2, "name": "design"},
                {"id": 3, "name": "tech"}
            ]
        })))
        .mount(&server)
        .await;

    let options = category_options(&CategorySource::new(client_for(&server))).await;
    assert_eq!(options, vec!["all", "design", "tech"]);
}
