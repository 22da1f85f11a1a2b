use axum::http::{HeaderMap, HeaderValue};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use suggest_distributed::test_utils::{
    init_test_logging, spawn_fake_shard, spawn_router, unreachable_url, FakeShard,
};
use suggest_distributed::{
    merger_router, FanoutPolicy, Merger, MergerConfig, PaginatedSuggestResponse,
    SuggestAnswerItem,
};

fn merger_for(urls: Vec<String>, policy: FanoutPolicy) -> Merger {
    let cfg = MergerConfig {
        shard_urls: urls,
        shard_timeout: Duration::from_secs(2),
        fanout_policy: policy,
    };
    Merger::new(&cfg).expect("merger")
}

fn texts(items: &[SuggestAnswerItem]) -> Vec<String> {
    items.iter().map(|i| i.text.clone()).collect()
}

#[tokio::test]
async fn empty_newer_shard_loses_to_non_empty_older() {
    init_test_logging();
    let a = spawn_fake_shard(FakeShard::answer(5, &["hello"])).await;
    let b = spawn_fake_shard(FakeShard::answer(6, &[])).await;
    let merger = merger_for(vec![a, b], FanoutPolicy::AllOrNothing);

    let got = merger.suggest("he", &HeaderMap::new()).await;
    assert_eq!(texts(&got), vec!["hello"]);
}

#[tokio::test]
async fn older_non_empty_beats_newer_empty_on_both_sides() {
    init_test_logging();
    let first = spawn_fake_shard(FakeShard::answer(6, &[])).await;
    let middle = spawn_fake_shard(FakeShard::answer(5, &["hello"])).await;
    let last = spawn_fake_shard(FakeShard::answer(6, &[])).await;
    let merger = merger_for(vec![first, middle, last], FanoutPolicy::AllOrNothing);

    let got = merger.suggest("he", &HeaderMap::new()).await;
    assert_eq!(texts(&got), vec!["hello"]);
}

#[tokio::test]
async fn highest_version_wins() {
    init_test_logging();
    let a = spawn_fake_shard(FakeShard::answer(3, &["old one"])).await;
    let b = spawn_fake_shard(FakeShard::answer(7, &["new one", "new two"])).await;
    let merger = merger_for(vec![a, b], FanoutPolicy::AllOrNothing);

    let got = merger.suggest("new", &HeaderMap::new()).await;
    assert_eq!(texts(&got), vec!["new one", "new two"]);
}

#[tokio::test]
async fn unreachable_shard_empties_answer() {
    init_test_logging();
    let a = spawn_fake_shard(FakeShard::answer(9, &["hello"])).await;
    let dead = unreachable_url().await;
    let merger = merger_for(vec![a, dead], FanoutPolicy::AllOrNothing);

    let got = merger.suggest("he", &HeaderMap::new()).await;
    assert!(got.is_empty());
    let stats = merger.stats();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.failed_requests, 1);
    assert!(stats.shard_failures >= 1);
}

#[tokio::test]
async fn first_failure_does_not_wait_for_slow_shards() {
    init_test_logging();
    let slow = spawn_fake_shard(FakeShard::Slow {
        delay: Duration::from_secs(8),
        version: 9,
        texts: vec!["late".into()],
    })
    .await;
    let dead = unreachable_url().await;
    let merger = Merger::new(&MergerConfig {
        shard_urls: vec![slow, dead],
        shard_timeout: Duration::from_secs(10),
        fanout_policy: FanoutPolicy::AllOrNothing,
    })
    .expect("merger");

    let started = Instant::now();
    let got = merger.suggest("la", &HeaderMap::new()).await;
    let elapsed = started.elapsed();
    assert!(got.is_empty());
    assert!(
        elapsed < Duration::from_secs(2),
        "answer took {:?}, slow shard was not cancelled",
        elapsed
    );
}

#[tokio::test]
async fn bad_status_and_garbage_fail_the_request() {
    init_test_logging();
    let ok = spawn_fake_shard(FakeShard::answer(1, &["hello"])).await;
    let err = spawn_fake_shard(FakeShard::Status(500)).await;
    let garbage = spawn_fake_shard(FakeShard::Garbage).await;

    let merger = merger_for(vec![ok.clone(), err], FanoutPolicy::AllOrNothing);
    assert!(merger.suggest("he", &HeaderMap::new()).await.is_empty());

    let merger = merger_for(vec![ok, garbage], FanoutPolicy::AllOrNothing);
    assert!(merger.suggest("he", &HeaderMap::new()).await.is_empty());
}

#[tokio::test]
async fn best_effort_merges_surviving_shards() {
    init_test_logging();
    let dead = unreachable_url().await;
    let err = spawn_fake_shard(FakeShard::Status(503)).await;
    let ok = spawn_fake_shard(FakeShard::answer(2, &["survivor"])).await;
    let merger = merger_for(vec![dead, err, ok], FanoutPolicy::BestEffort);

    let got = merger.suggest("su", &HeaderMap::new()).await;
    assert_eq!(texts(&got), vec!["survivor"]);
    let stats = merger.stats();
    assert_eq!(stats.failed_requests, 0);
    assert_eq!(stats.shard_failures, 2);
}

#[tokio::test]
async fn request_headers_reach_shards() {
    init_test_logging();
    let echo = Router::new().route(
        "/suggest",
        get(|headers: HeaderMap| async move {
            let id = headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("missing")
                .to_string();
            Json(PaginatedSuggestResponse {
                suggestions: vec![SuggestAnswerItem {
                    text: id,
                    weight: 1.0,
                }],
                version: 1,
            })
        }),
    );
    let url = format!("{}/suggest", spawn_router(echo).await);
    let merger = merger_for(vec![url], FanoutPolicy::AllOrNothing);

    let mut headers = HeaderMap::new();
    headers.insert("x-request-id", HeaderValue::from_static("req-17"));
    headers.insert("host", HeaderValue::from_static("merger.local"));
    let got = merger.suggest("x", &headers).await;
    assert_eq!(texts(&got), vec!["req-17"]);
}

#[tokio::test]
async fn http_surface_wraps_answer_and_serves_health() {
    init_test_logging();
    let a = spawn_fake_shard(FakeShard::answer(5, &["hello"])).await;
    let b = spawn_fake_shard(FakeShard::answer(6, &[])).await;
    let base = spawn_router(merger_router(merger_for(vec![a, b], FanoutPolicy::AllOrNothing))).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/suggest?part=he", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body,
        json!({"status": "ok", "data": [{"text": "hello", "weight": 100.0}]})
    );

    for path in ["/health", "/", "/no/such/route"] {
        let body: Value = client
            .get(format!("{}{}", base, path))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok", "message": "OK"}), "path {}", path);
    }

    // repeated or malformed parameters still get the envelope
    let resp = client
        .get(format!("{}/suggest?part=he&part=x", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["text"], json!("hello"));

    let resp = client
        .get(format!("{}/suggest?page=abc&%zz", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], json!("ok"));
    assert!(body["data"].is_array());

    let stats: Value = client
        .get(format!("{}/stats", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["requests"], json!(3));
    assert_eq!(stats["failed_requests"], json!(0));
}
