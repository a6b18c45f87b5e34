use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskboard::api::ApiError;
use taskboard::fetch::Fetch;
use taskboard::task::model::Task;

async fn serve(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn loads_and_decodes() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/tasks",
        ResponseTemplate::new(200)
            .set_body_json(json!([{"id": 1, "title": "A", "description": "d", "completed": true}])),
    )
    .await;

    let fetch: Fetch<Vec<Task>> = Fetch::new(reqwest::Client::new(), format!("{}/tasks", server.uri()));
    assert!(fetch.state().loading);

    let state = fetch.settled().await;
    assert!(!state.loading);
    assert!(state.error.is_none());
    let data = state.data.as_ref().expect("data");
    assert_eq!(data.len(), 1);
    assert!(data[0].completed);
}

#[tokio::test]
async fn url_change_discards_stale_response() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/slow",
        ResponseTemplate::new(200)
            .set_body_json(json!([{"id": 1, "title": "stale", "description": "d"}]))
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    serve(
        &server,
        "/fast",
        ResponseTemplate::new(200)
            .set_body_json(json!([{"id": 2, "title": "fresh", "description": "d"}])),
    )
    .await;

    let mut fetch: Fetch<Vec<Task>> =
        Fetch::new(reqwest::Client::new(), format!("{}/slow", server.uri()));
    fetch.set_url(format!("{}/fast", server.uri()));

    {
        let state = fetch.settled().await;
        assert_eq!(state.data.as_ref().expect("data")[0].title, "fresh");
    }

    tokio::time::sleep(Duration::from_millis(450)).await;
    let state = fetch.state();
    assert_eq!(state.data.as_ref().expect("data")[0].title, "fresh");
    assert!(!state.loading);
}

#[tokio::test]
async fn same_url_does_not_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/tasks", server.uri());
    let mut fetch: Fetch<Vec<Task>> = Fetch::new(reqwest::Client::new(), url.clone());
    let _ = fetch.settled().await;
    fetch.set_url(url);
    assert!(!fetch.state().loading);
}

#[tokio::test]
async fn server_error_is_reported() {
    let server = MockServer::start().await;
    serve(&server, "/tasks", ResponseTemplate::new(500)).await;

    let fetch: Fetch<Vec<Task>> = Fetch::new(reqwest::Client::new(), format!("{}/tasks", server.uri()));
    let state = fetch.settled().await;
    assert!(state.data.is_none());
    assert!(matches!(state.error, Some(ApiError::Status { status: 500, .. })));
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/tasks",
        ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})),
    )
    .await;

    let fetch: Fetch<Vec<Task>> = Fetch::new(reqwest::Client::new(), format!("{}/tasks", server.uri()));
    let state = fetch.settled().await;
    assert!(matches!(state.error, Some(ApiError::Parse { .. })));
}

#[tokio::test]
async fn dropping_the_fetch_discards_the_response() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/tasks",
        ResponseTemplate::new(200)
            .set_body_json(json!([{"id": 1, "title": "A", "description": "d"}]))
            .set_delay(Duration::from_millis(200)),
    )
    .await;

    let fetch: Fetch<Vec<Task>> = Fetch::new(reqwest::Client::new(), format!("{}/tasks", server.uri()));
    let rx = fetch.subscribe();
    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(fetch);
    tokio::time::sleep(Duration::from_millis(350)).await;

    let state = rx.borrow();
    assert!(state.loading);
    assert!(state.data.is_none());
    assert!(state.error.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rapid_url_changes_settle_on_the_last_url() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/a",
        ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "title": "a", "description": "d"}])),
    )
    .await;
    serve(
        &server,
        "/b",
        ResponseTemplate::new(200).set_body_json(json!([{"id": 2, "title": "b", "description": "d"}])),
    )
    .await;

    let a = format!("{}/a", server.uri());
    let b = format!("{}/b", server.uri());
    let mut fetch: Fetch<Vec<Task>> = Fetch::new(reqwest::Client::new(), b.clone());
    for round in 0..40 {
        fetch.set_url(if round % 2 == 0 { a.clone() } else { b.clone() });
        tokio::time::sleep(Duration::from_millis(round % 3)).await;
    }
    assert_eq!(fetch.url(), b);

    {
        let state = fetch.settled().await;
        assert_eq!(state.data.as_ref().expect("data")[0].title, "b");
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fetch.state().data.as_ref().expect("data")[0].title, "b");
}
