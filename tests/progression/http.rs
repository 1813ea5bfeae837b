//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::Arc;

use formation_progress::http;
use serde_json::{json, Value};

use crate::support::{engine, quiz_answers, scenario_catalog};

/// Bind to port 0 and return the actual address.
async fn start_server() -> String {
    let app = http::router(Arc::new(engine(scenario_catalog())));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn watch(client: &reqwest::Client, base: &str, content: &str, seconds: Value) -> reqwest::Response {
    client
        .post(format!("{base}/users/u1/contents/{content}/watch-time"))
        .json(&json!({ "seconds": seconds }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let base = start_server().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn watch_time_and_unlock_flow() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let resp = watch(&client, &base, "a2", json!(10.0)).await;
    assert_eq!(resp.status(), 403);

    let resp = watch(&client, &base, "a1", json!(600)).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["progress"]["watch_time"], 60.0);
    assert_eq!(body["progress"]["is_completed"], true);
    assert_eq!(body["progress_percent"], 100);

    let resp = client
        .get(format!("{base}/users/u1/contents/a2/unlocked"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "unlocked": true }));

    let resp = client
        .get(format!("{base}/users/u1/modules/m/unlocked"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.json::<Value>().await.unwrap()["unlocked"], true);
}

#[tokio::test]
async fn error_statuses() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    assert_eq!(watch(&client, &base, "ghost", json!(1)).await.status(), 404);
    assert_eq!(watch(&client, &base, "a1", json!(-3)).await.status(), 400);
    assert_eq!(watch(&client, &base, "a1", json!("ten")).await.status(), 400);

    let resp = client
        .post(format!("{base}/users/u1/quizzes/q2/submissions"))
        .json(&json!({ "answers": { "t1": "true" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("{base}/users/u1/chapters/nope/quiz-unlocked"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn second_pass_returns_the_stored_result() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let url = format!("{base}/users/u1/quizzes/q2/submissions");

    let resp = client
        .post(&url)
        .json(&json!({ "answers": quiz_answers(5) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["score"], 100);
    assert_eq!(body["per_question"].as_array().unwrap().len(), 5);

    let resp = client
        .post(&url)
        .json(&json!({ "answers": quiz_answers(0) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["result"]["score"], 100);
    assert_eq!(body["result"]["passed"], true);
}

#[tokio::test]
async fn overview_lists_the_catalog() {
    let base = start_server().await;
    let body: Value = reqwest::get(format!("{base}/users/u1/overview"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let modules = body.as_array().unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0]["module_id"], "m");
    assert_eq!(modules[0]["chapters"][1]["quiz"]["status"]["status"], "not_attempted");
}
