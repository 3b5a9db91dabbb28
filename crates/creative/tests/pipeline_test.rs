//! End-to-end pipeline runs against in-process test backends.

mod common;

use campaign_core::config::AppConfig;
use campaign_core::error::CampaignError;
use campaign_core::types::RenderedImage;
use campaign_creative::{CreativePipeline, PromptSynthesizer};
use common::{
    brief, open_cache, BrokenImageGenerator, CannedText, CountingImageGenerator, PipelineBuilder,
};
use std::sync::Arc;

#[tokio::test]
async fn test_single_headline_yields_one_asset() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let pipeline = PipelineBuilder::new(images.clone()).build(dir.path(), open_cache(dir.path()).await);

    let result = pipeline.run(&brief(1, 0)).await.unwrap();

    assert_eq!(result.top_assets.len(), 1);
    let asset = &result.top_assets[0];
    assert_eq!(asset.copy, "Aqua - Unleash Energy #1");
    assert!((0.0..=1.0).contains(&asset.score));
    assert!(asset.image_url.starts_with("file://"));
    assert_eq!(images.calls(), 1);
    assert_eq!(result.stats.scored_pairs, 1);
    assert_eq!(result.stats.renders, 1);
}

#[tokio::test]
async fn test_offline_config_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.force_offline();
    config.cache.dir = dir.path().join("cache").to_string_lossy().into_owned();
    config.image.output_dir = dir.path().join("outputs").to_string_lossy().into_owned();
    config.image.placeholder_size = 16;

    let pipeline = CreativePipeline::from_config(&config).await.unwrap();
    let first = pipeline.run(&brief(1, 0)).await.unwrap();

    assert_eq!(first.stats.copies, 1);
    assert_eq!(first.top_assets.len(), 1);
    let asset = &first.top_assets[0];
    assert_eq!(asset.copy, "Aqua - Unleash Energy #1");
    assert!((0.0..=1.0).contains(&asset.score));
    let png = std::fs::read(&asset.image_location).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let second = CreativePipeline::from_config(&config)
        .await
        .unwrap()
        .run(&brief(1, 0))
        .await
        .unwrap();
    assert_eq!(second.stats.cache_hits, 1);
    assert_eq!(second.top_assets[0].score, asset.score);
    assert_eq!(second.top_assets[0].image_location, asset.image_location);

    let entries: Vec<_> = std::fs::read_dir(dir.path().join("cache"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(std::fs::read_dir(dir.path().join("outputs")).unwrap().count(), 1);
}

#[tokio::test]
async fn test_unusable_cache_dir_does_not_abort_run() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let cache = open_cache(dir.path()).await;
    let pipeline = PipelineBuilder::new(images.clone()).build(dir.path(), cache);

    let cache_dir = dir.path().join("cache");
    std::fs::remove_dir(&cache_dir).unwrap();
    std::fs::write(&cache_dir, b"not a directory").unwrap();

    let result = pipeline.run(&brief(1, 0)).await.unwrap();
    assert_eq!(result.top_assets.len(), 1);
    assert_eq!(result.stats.renders, 1);
    assert_eq!(images.calls(), 1);
}

#[tokio::test]
async fn test_repeat_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let pipeline = PipelineBuilder::new(images.clone()).build(dir.path(), open_cache(dir.path()).await);

    let first = pipeline.run(&brief(1, 0)).await.unwrap();
    let second = pipeline.run(&brief(1, 0)).await.unwrap();

    assert_eq!(images.calls(), 1);
    assert_eq!(second.stats.cache_hits, 1);
    assert_eq!(second.stats.renders, 0);
    assert_eq!(first.top_assets, second.top_assets);
}

#[tokio::test]
async fn test_cache_survives_a_fresh_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());

    let first = PipelineBuilder::new(images.clone())
        .build(dir.path(), open_cache(dir.path()).await)
        .run(&brief(2, 0))
        .await
        .unwrap();
    let second = PipelineBuilder::new(images.clone())
        .build(dir.path(), open_cache(dir.path()).await)
        .run(&brief(2, 0))
        .await
        .unwrap();

    assert_eq!(images.calls(), 2);
    assert_eq!(second.stats.cache_hits, 2);
    assert_eq!(first.top_assets, second.top_assets);
}

#[tokio::test]
async fn test_cross_product_is_ranked_and_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let pipeline = PipelineBuilder::new(images.clone()).build(dir.path(), open_cache(dir.path()).await);

    let result = pipeline.run(&brief(3, 2)).await.unwrap();

    assert_eq!(result.stats.copies, 5);
    assert_eq!(result.stats.distinct_prompts, 5);
    assert_eq!(result.stats.scored_pairs, 25);
    assert_eq!(result.top_assets.len(), 6);
    assert_eq!(images.calls(), 5);
    for pair in result.top_assets.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_top_k_larger_than_pairs_returns_all() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = PipelineBuilder::new(Arc::new(CountingImageGenerator::default()))
        .top_k(50)
        .build(dir.path(), open_cache(dir.path()).await);

    let result = pipeline.run(&brief(2, 1)).await.unwrap();
    assert_eq!(result.top_assets.len(), 9);
}

#[tokio::test]
async fn test_equal_scores_keep_enumeration_order() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = PipelineBuilder::new(Arc::new(CountingImageGenerator::default()))
        .top_k(50)
        .build(dir.path(), open_cache(dir.path()).await);

    let result = pipeline.run(&brief(3, 0)).await.unwrap();

    // Without a vision backend every image embeds the same caption, so the
    // score depends only on the copy and each copy's three pairs tie.
    let per_copy: Vec<Vec<String>> = (1..=3)
        .map(|n| {
            let copy = format!("Aqua - Unleash Energy #{n}");
            result
                .top_assets
                .iter()
                .filter(|a| a.copy == copy)
                .map(|a| a.image_location.clone())
                .collect()
        })
        .collect();
    assert_eq!(per_copy[0].len(), 3);
    assert_eq!(per_copy[0], per_copy[1]);
    assert_eq!(per_copy[1], per_copy[2]);
}

#[tokio::test]
async fn test_duplicate_copy_renders_once() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let text = Arc::new(CannedText(
        r#"{"headlines": ["Same line", "Same line", "Same line"], "long": []}"#.to_string(),
    ));
    let pipeline = PipelineBuilder::new(images.clone())
        .text(text)
        .build(dir.path(), open_cache(dir.path()).await);

    let result = pipeline.run(&brief(3, 0)).await.unwrap();

    assert_eq!(images.calls(), 1);
    assert_eq!(result.stats.copies, 3);
    assert_eq!(result.stats.distinct_prompts, 1);
    assert_eq!(result.stats.scored_pairs, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_share_renders() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let cache = open_cache(dir.path()).await;
    let a = PipelineBuilder::new(images.clone()).build(dir.path(), cache.clone());
    let b = PipelineBuilder::new(images.clone()).build(dir.path(), cache);

    let brief = brief(2, 1);
    let (ra, rb) = tokio::join!(a.run(&brief), b.run(&brief));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    assert_eq!(images.calls(), 3);
    assert_eq!(ra.stats.renders + rb.stats.renders, 3);
    assert_eq!(ra.top_assets, rb.top_assets);
}

#[tokio::test]
async fn test_render_concurrency_limit() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let pipeline = PipelineBuilder::new(images.clone())
        .max_concurrent_renders(1)
        .build(dir.path(), open_cache(dir.path()).await);

    pipeline.run(&brief(4, 0)).await.unwrap();
    assert_eq!(images.calls(), 4);
    assert_eq!(images.peak(), 1);
}

#[tokio::test]
async fn test_unbounded_renders_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let pipeline = PipelineBuilder::new(images.clone()).build(dir.path(), open_cache(dir.path()).await);

    pipeline.run(&brief(4, 0)).await.unwrap();
    assert!(images.peak() > 1);
}

#[tokio::test]
async fn test_zero_copies_yields_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let images = Arc::new(CountingImageGenerator::default());
    let pipeline = PipelineBuilder::new(images.clone()).build(dir.path(), open_cache(dir.path()).await);

    let result = pipeline.run(&brief(0, 0)).await.unwrap();
    assert!(result.top_assets.is_empty());
    assert_eq!(result.stats.scored_pairs, 0);
    assert_eq!(images.calls(), 0);
}

#[tokio::test]
async fn test_image_backend_outage_still_produces_assets() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = PipelineBuilder::new(Arc::new(BrokenImageGenerator))
        .build(dir.path(), open_cache(dir.path()).await);

    let result = pipeline.run(&brief(2, 0)).await.unwrap();
    assert_eq!(result.top_assets.len(), 4);
    for asset in &result.top_assets {
        let bytes = std::fs::read(&asset.image_location).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_an_invariant_violation() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(dir.path()).await;
    let pipeline = PipelineBuilder::new(Arc::new(CountingImageGenerator::default()))
        .build(dir.path(), cache.clone());

    let brief = brief(1, 0);
    let prompt = PromptSynthesizer::new().synthesize(&brief, "Aqua - Unleash Energy #1");
    std::fs::write(cache.entry_path(&prompt), b"{ not json").unwrap();

    let err = pipeline.run(&brief).await.unwrap_err();
    assert!(matches!(err, CampaignError::InvariantViolation(_)));
}

#[tokio::test]
async fn test_cached_value_of_wrong_shape_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(dir.path()).await;
    let pipeline = PipelineBuilder::new(Arc::new(CountingImageGenerator::default()))
        .build(dir.path(), cache.clone());

    let brief = brief(1, 0);
    let prompt = PromptSynthesizer::new().synthesize(&brief, "Aqua - Unleash Energy #1");
    cache.set(&prompt, &serde_json::json!({"unexpected": true})).await.unwrap();

    let err = pipeline.run(&brief).await.unwrap_err();
    assert!(matches!(err, CampaignError::InvariantViolation(_)));
}

#[tokio::test]
async fn test_cached_render_for_another_prompt_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let cache = open_cache(dir.path()).await;
    let pipeline = PipelineBuilder::new(Arc::new(CountingImageGenerator::default()))
        .build(dir.path(), cache.clone());

    let brief = brief(1, 0);
    let prompt = PromptSynthesizer::new().synthesize(&brief, "Aqua - Unleash Energy #1");
    let foreign = RenderedImage {
        artifact_location: "x.png".to_string(),
        external_url: "file:///x.png".to_string(),
        source_prompt: "something else".to_string(),
    };
    cache.set(&prompt, &serde_json::to_value(&foreign).unwrap()).await.unwrap();

    let err = pipeline.run(&brief).await.unwrap_err();
    assert!(matches!(err, CampaignError::InvariantViolation(_)));
}
