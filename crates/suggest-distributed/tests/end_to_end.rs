use anyhow::Result;
use axum::http::HeaderMap;
use serde_json::{json, Value};
use std::time::Duration;
use suggest_distributed::test_utils::{init_test_logging, spawn_router};
use suggest_distributed::{
    merger_router, shard_router, FanoutPolicy, Merger, MergerConfig, ShardState,
};
use suggest_rs::{build_sharded, load_suggest, shard_output_path, BuildOptions};

const CORPUS: &str = "apple\t3\napricot\t2\nBanana split\t5\ncherry\t1\n";

async fn serve_shards(dir: &std::path::Path, shards: usize) -> Result<Vec<String>> {
    let input = dir.join("corpus.txt");
    std::fs::write(&input, CORPUS)?;
    let template = dir.join("suggest.bin");
    let opts = BuildOptions {
        version: Some(42),
        ..Default::default()
    };
    build_sharded(&input, &template, shards, &opts)?;

    let mut urls = Vec::new();
    for i in 0..shards {
        let idx = load_suggest(shard_output_path(&template, i))?;
        let base = spawn_router(shard_router(ShardState::new(idx))).await;
        urls.push(format!("{}/suggest", base));
    }
    Ok(urls)
}

#[tokio::test]
async fn built_shards_serve_through_merger() -> Result<()> {
    init_test_logging();
    let dir = tempfile::tempdir()?;
    let urls = serve_shards(dir.path(), 2).await?;

    let merger = Merger::new(&MergerConfig {
        shard_urls: urls,
        shard_timeout: Duration::from_secs(2),
        fanout_policy: FanoutPolicy::AllOrNothing,
    })?;

    let ap: Vec<String> = merger
        .suggest("ap", &HeaderMap::new())
        .await
        .into_iter()
        .map(|s| s.text)
        .collect();
    assert_eq!(ap, vec!["apple", "apricot"]);

    let ch = merger.suggest("CH", &HeaderMap::new()).await;
    assert_eq!(ch.len(), 1);
    assert_eq!(ch[0].text, "cherry");

    // suffix entry for "split"
    let sp = merger.suggest("spl", &HeaderMap::new()).await;
    assert_eq!(sp.len(), 1);
    assert_eq!(sp[0].text, "Banana split");

    assert!(merger.suggest("zz", &HeaderMap::new()).await.is_empty());
    assert!(merger.suggest("", &HeaderMap::new()).await.is_empty());

    let base = spawn_router(merger_router(merger)).await;
    let body: Value = reqwest::get(format!("{}/suggest?part=ban", base))
        .await?
        .json()
        .await?;
    assert_eq!(
        body,
        json!({"status": "ok", "data": [{"text": "Banana split", "weight": 5.0}]})
    );
    Ok(())
}

#[tokio::test]
async fn shard_server_answers_both_shapes() -> Result<()> {
    init_test_logging();
    let dir = tempfile::tempdir()?;
    let urls = serve_shards(dir.path(), 1).await?;
    let url = &urls[0];

    let plain: Value = reqwest::get(format!("{}?part=ap", url)).await?.json().await?;
    assert_eq!(plain["status"], json!("ok"));
    assert_eq!(plain["data"].as_array().map(|a| a.len()), Some(2));

    let versioned: Value = reqwest::get(format!("{}?part=ap&with-version=true", url))
        .await?
        .json()
        .await?;
    assert_eq!(versioned["version"], json!(42));
    assert_eq!(versioned["suggestions"][0]["text"], json!("apple"));

    let paged: Value = reqwest::get(format!("{}?part=ap&page=1&count=1&with-version=true", url))
        .await?
        .json()
        .await?;
    assert_eq!(paged["suggestions"], json!([{"text": "apricot", "weight": 2.0}]));

    let base = url.trim_end_matches("/suggest");
    let health: Value = reqwest::get(format!("{}/health", base)).await?.json().await?;
    assert_eq!(health, json!({"status": "ok", "message": "OK"}));
    Ok(())
}
