//! HTTP client behaviour against a mock analysis service.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use std::sync::Arc;

use explorer::api::{CatalogApi, MentionsApi, RuleExecutor, RulesApi};
use explorer::entities::{AuthorStat, FilterSelection, RuleDraft, RuleResult};
use explorer::errors::ExplorerError;
use explorer::pagination::{AuthorPages, PageSource, PaginatedCollection};
use explorer::HttpApi;

fn filter(keywords: &[&str]) -> FilterSelection {
    FilterSelection::new(keywords, ["reddit"], &["reddit".to_string()])
}

#[tokio::test]
async fn test_query_mentions_sends_filter_and_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mentions"))
        .and(query_param("offset", "50"))
        .and(query_param("limit", "50"))
        .and(query_param("keyword", "Ozempic"))
        .and(query_param("source", "reddit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mentions": [
                {"id": 51, "author": "a", "content": "Ozempic works", "source": "Reddit"},
                {"id": 52, "content": "nausea", "extractedData": {"side_effect": "nausea"}}
            ],
            "total": 120
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    let page = api
        .query_mentions(&filter(&["Ozempic"]), 50, 50)
        .await
        .unwrap();

    assert_eq!(page.total, 120);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].extracted_data.as_ref().unwrap()["side_effect"], "nausea");
}

#[tokio::test]
async fn test_unconstrained_filter_omits_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mentions"))
        .and(query_param_is_missing("keyword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mentions": []})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    let page = api.query_mentions(&filter(&["All"]), 0, 50).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_authors_accepts_bare_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stats/authors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"author": "alice", "count": 4},
            {"author": "bob", "count": 2}
        ])))
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    let page = api.query_authors(&filter(&["All"]), 0, 50).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].author, "alice");
}

#[tokio::test]
async fn test_bare_author_list_loads_once() {
    let server = MockServer::start().await;
    // the service ignores offset and always returns its top authors
    Mock::given(method("GET"))
        .and(path("/api/stats/authors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"author": "a1", "count": 9},
            {"author": "a2", "count": 8},
            {"author": "a3", "count": 7},
            {"author": "a4", "count": 6},
            {"author": "a5", "count": 5}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api: Arc<dyn MentionsApi> = Arc::new(HttpApi::new(server.uri()));
    let source: Arc<dyn PageSource<AuthorStat>> = Arc::new(AuthorPages::new(api));
    let authors = PaginatedCollection::<AuthorStat>::new(source, 5);

    authors.reset(filter(&["All"])).await;
    for _ in 0..4 {
        assert!(authors.load_next().await.is_none());
    }

    assert_eq!(authors.len(), 5);
    assert_eq!(authors.total(), 5);
    assert!(!authors.has_more());
}

#[tokio::test]
async fn test_unique_authors_and_keywords() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stats/unique-authors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 17})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/keywords"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"keyword": "Ozempic", "count": 9}])),
        )
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    assert_eq!(api.count_unique_authors(&filter(&["All"])).await.unwrap(), 17);
    let keywords = api.list_keywords().await.unwrap();
    assert_eq!(keywords[0].keyword, "Ozempic");
}

#[tokio::test]
async fn test_non_success_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rules"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    match api.list_rules().await.unwrap_err() {
        ExplorerError::Http { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_update_rule_posts_with_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rules"))
        .and(query_param("id", "7"))
        .and(body_partial_json(json!({"title": "Side effects"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "title": "Side effects",
            "instruction": "List side effects",
            "created_at": "2024-03-01T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    let rule = api
        .create_or_update_rule(&RuleDraft::new("Side effects", "List side effects"), Some(7))
        .await
        .unwrap();
    assert_eq!(rule.id, 7);
    assert!(!rule.is_chaining);
}

#[tokio::test]
async fn test_delete_rule() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/rules/3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "deleted", "id": 3})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    api.delete_rule(3).await.unwrap();
}

#[tokio::test]
async fn test_delete_rule_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/rules/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    api.delete_rule(3).await.unwrap();
}

#[tokio::test]
async fn test_execute_rule_forwards_context() {
    let server = MockServer::start().await;
    let context = RuleResult::error("previous failed");
    Mock::given(method("POST"))
        .and(path("/api/rules/4/execute"))
        .and(body_partial_json(json!({
            "keywords": ["Ozempic"],
            "sources": ["reddit"],
            "context": {"status": "error", "message": "previous failed"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": [{"side_effect": "nausea", "count": 12}],
            "sql": "SELECT 1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    let result = api
        .execute_rule(4, &filter(&["Ozempic"]), Some(&context))
        .await
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(result.rows()[0]["count"], 12);
}

#[tokio::test]
async fn test_execute_rule_reports_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rules/4/execute"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "error", "message": "invalid SQL"})),
        )
        .mount(&server)
        .await;

    let api = HttpApi::new(server.uri());
    let result = api
        .execute_rule(4, &filter(&["All"]), None)
        .await
        .unwrap();
    assert_eq!(result.error_message(), Some("invalid SQL"));
}
