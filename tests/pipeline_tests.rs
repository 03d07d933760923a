//! フェイクコラボレータで全ステージを通すエンドツーエンドテスト。

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use sentiment_worker::analyzers::lexicon::LexiconAnalyzer;
use sentiment_worker::analyzers::{
    EntityRecognizer, PolarityAnalyzer, PosTagger, PosToken, SarcasmClassifier,
};
use sentiment_worker::config::Config;
use sentiment_worker::model::{EntitySpan, PipelineOutput, TrendDirection};
use sentiment_worker::observability::Telemetry;
use sentiment_worker::pipeline::PipelineBuilder;

/// 単語ベースの決定的な極性フェイク。空テキストを渡されたらパニックする
/// （空テキストはモデルに到達しない契約の検査を兼ねる）。
struct WordPolarity;

#[async_trait]
impl PolarityAnalyzer for WordPolarity {
    async fn score_batch(&self, texts: &[String]) -> Result<Vec<f64>> {
        Ok(texts
            .iter()
            .map(|text| {
                assert!(!text.is_empty(), "empty text must never reach the model");
                if text.contains("good") {
                    0.8
                } else if text.contains("bad") {
                    -0.8
                } else {
                    0.0
                }
            })
            .collect())
    }
}

struct FixedSarcasm(f64);

#[async_trait]
impl SarcasmClassifier for FixedSarcasm {
    async fn probabilities(&self, texts: &[String]) -> Result<Vec<f64>> {
        Ok(vec![self.0; texts.len()])
    }
}

struct NounTagger;

#[async_trait]
impl PosTagger for NounTagger {
    async fn tag_batch(&self, texts: &[String]) -> Result<Vec<Vec<PosToken>>> {
        Ok(texts
            .iter()
            .map(|text| {
                text.split_whitespace()
                    .map(|word| PosToken {
                        word: word.to_string(),
                        label: "NN".to_string(),
                    })
                    .collect()
            })
            .collect())
    }
}

struct TeslaRecognizer;

#[async_trait]
impl EntityRecognizer for TeslaRecognizer {
    async fn recognize_batch(&self, texts: &[String]) -> Result<Vec<Vec<EntitySpan>>> {
        Ok(texts
            .iter()
            .map(|text| {
                if text.contains("tesla") {
                    vec![EntitySpan {
                        text: "tesla".to_string(),
                        label: "ORG".to_string(),
                        confidence: 0.99,
                    }]
                } else {
                    Vec::new()
                }
            })
            .collect())
    }
}

fn write_batch(path: &Path, posts: &serde_json::Value) {
    std::fs::write(path, serde_json::to_string(&json!({ "posts": posts })).unwrap()).unwrap();
}

fn config_for(input: &Path, groups: &str) -> Config {
    temp_env::with_vars(
        [
            ("SENTIMENT_INPUT_PATH", Some(input.to_str().unwrap())),
            ("SENTIMENT_GROUPS", Some(groups)),
            ("SENTIMENT_TIMEFRAME", Some("all")),
        ],
        || Config::from_env().expect("config loads"),
    )
}

fn builder_for(config: Config, telemetry: &Telemetry) -> PipelineBuilder {
    PipelineBuilder::new(Arc::new(config), telemetry.metrics_arc())
}

async fn run_full(input: &Path, groups: &str, with_sarcasm: bool) -> PipelineOutput {
    let telemetry = Telemetry::new().expect("telemetry builds");
    let mut builder = builder_for(config_for(input, groups), &telemetry)
        .with_polarity(Arc::new(WordPolarity))
        .with_tagger(Arc::new(NounTagger))
        .with_recognizer(Arc::new(TeslaRecognizer));
    if with_sarcasm {
        builder = builder.with_sarcasm(Arc::new(FixedSarcasm(0.5)));
    }
    builder.build().run().await.expect("pipeline run succeeds")
}

fn batch_fixture() -> serde_json::Value {
    let now = Utc::now().timestamp();
    json!([
        {
            "id": "a1",
            "group_id": "stocks",
            "title": "",
            "body": "good earnings from tesla",
            "score": 10,
            "comment_count": 5,
            "created_at": now
        },
        {
            "id": "a2",
            "group_id": "stocks",
            "title": "bad outlook",
            "body": "tesla guidance looks bad",
            "score": 2,
            "comment_count": 1,
            "created_at": now - 3600
        },
        {
            "id": "b1",
            "group_id": "wallstreetbets",
            "title": "",
            "body": "",
            "score": 100,
            "comment_count": 50,
            "created_at": now - 7200
        }
    ])
}

#[tokio::test]
async fn end_to_end_run_scores_and_aggregates() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("posts.json");
    write_batch(&input, &batch_fixture());

    let output = run_full(&input, "stocks,wallstreetbets", true).await;

    assert_eq!(output.summary.total_posts_analyzed, 3);
    assert_eq!(
        output.summary.groups_analyzed,
        vec!["stocks".to_string(), "wallstreetbets".to_string()]
    );
    assert_eq!(output.scored_posts.len(), 3);
    assert_eq!(output.group_metrics.len(), 2);
    assert_eq!(
        output.entity_frequencies,
        vec![("tesla (ORG)".to_string(), 2)]
    );

    // 入力順が保たれる。
    assert_eq!(output.scored_posts[0].post.id, "a1");
    assert_eq!(output.scored_posts[2].post.id, "b1");

    // 投稿a1: title空、bodyに"good"。皮肉確率は全フィールド0.5固定なので
    // weighted = 0.7 * 0.5、combined = raw * (1 - 0.35)。
    let lexicon = LexiconAnalyzer::new();
    let a1 = &output.scored_posts[0];
    assert!((a1.features.body_polarity - 0.8).abs() < 1e-12);
    assert!(a1.features.title_polarity.abs() < f64::EPSILON);
    let raw = 0.5 * (0.7 * 0.8) + 0.5 * (0.7 * lexicon.compound("good earnings tesla"));
    assert!((a1.combined_sentiment - raw * 0.65).abs() < 1e-9);

    // 全投稿NN ⇒ フォーマリティは1.0（本文つきの投稿のみ）。
    assert!((a1.features.formality - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn empty_post_scores_zero_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("posts.json");
    write_batch(&input, &batch_fixture());

    let output = run_full(&input, "stocks,wallstreetbets", true).await;
    let empty = output
        .scored_posts
        .iter()
        .find(|post| post.post.id == "b1")
        .expect("empty post present");

    assert!(empty.combined_sentiment.abs() < f64::EPSILON);
    assert!(empty.features.body_polarity.abs() < f64::EPSILON);
    assert!(empty.features.body_compound.abs() < f64::EPSILON);
    assert!(empty.features.body_sarcasm.abs() < f64::EPSILON);
    assert!((empty.features.formality - 0.5).abs() < f64::EPSILON);
    assert!(empty.features.avg_sentence_length.abs() < f64::EPSILON);
}

#[tokio::test]
async fn missing_sarcasm_classifier_passes_through_and_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("posts.json");
    write_batch(&input, &batch_fixture());

    let output = run_full(&input, "stocks,wallstreetbets", false).await;

    assert!(
        output
            .summary
            .degraded_stages
            .iter()
            .any(|degradation| degradation.stage == "sarcasm")
    );
    // 補正前後が一致する（皮肉確率0の素通し）。
    let lexicon = LexiconAnalyzer::new();
    let a1 = &output.scored_posts[0];
    let raw = 0.5 * (0.7 * 0.8) + 0.5 * (0.7 * lexicon.compound("good earnings tesla"));
    assert!((a1.combined_sentiment - raw).abs() < 1e-9);
    assert!(a1.features.body_sarcasm.abs() < f64::EPSILON);
}

#[tokio::test]
async fn trend_predictions_are_finite_and_direction_is_relative() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("posts.json");
    write_batch(&input, &batch_fixture());

    let output = run_full(&input, "stocks,wallstreetbets", true).await;
    for post in &output.scored_posts {
        assert!(post.predicted_sentiment.is_finite());
        assert!(post.predicted_engagement.is_finite());
        assert!(matches!(
            post.trend_direction,
            TrendDirection::Positive | TrendDirection::Negative
        ));
    }
}

#[tokio::test]
async fn single_post_group_serializes_null_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("posts.json");
    let now = Utc::now().timestamp();
    write_batch(
        &input,
        &json!([{
            "group_id": "solo",
            "title": "good",
            "body": "good",
            "score": 1,
            "comment_count": 1,
            "created_at": now
        }]),
    );

    let output = run_full(&input, "solo", true).await;
    let rendered = serde_json::to_value(&output).expect("output serializes");
    let metrics = &rendered["group_metrics"]["solo"];

    assert_eq!(metrics["sentiment_std"], serde_json::Value::Null);
    assert_eq!(metrics["sentiment_skew"], serde_json::Value::Null);
    assert_eq!(metrics["sentiment_kurtosis"], serde_json::Value::Null);
    assert_eq!(metrics["volatility"], serde_json::Value::Null);
    assert!(metrics["sentiment_mean"].is_number());
    // 1投稿バッチはトレンド学習もスキップされ、予測はnull。
    assert_eq!(rendered["scored_posts"][0]["predicted_sentiment"], serde_json::Value::Null);
}

#[tokio::test]
async fn empty_surviving_batch_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("posts.json");
    write_batch(&input, &batch_fixture());

    // 許可リストに該当グループが無い ⇒ 全滅しても実行は完了する。
    let output = run_full(&input, "cats", true).await;
    assert_eq!(output.summary.total_posts_analyzed, 0);
    assert!(output.scored_posts.is_empty());
    assert!(output.group_metrics.is_empty());
    assert!(output.entity_frequencies.is_empty());
}

#[tokio::test]
async fn malformed_batch_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("posts.json");
    std::fs::write(&input, r#"{"posts": [{"title": 42}]}"#).unwrap();

    let telemetry = Telemetry::new().expect("telemetry builds");
    let orchestrator = builder_for(config_for(&input, ""), &telemetry)
        .with_polarity(Arc::new(WordPolarity))
        .build();

    let error = orchestrator.run().await.expect_err("schema violation is fatal");
    assert!(format!("{error:#}").contains("ingest stage failed"));
}
