/// Prometheusメトリクス定義。
use prometheus::{
    Counter, Gauge, Histogram, Registry, register_counter_with_registry,
    register_gauge_with_registry, register_histogram_with_registry,
};
use std::sync::Arc;

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub posts_ingested: Counter,
    pub posts_scored: Counter,
    pub posts_dropped: Counter,
    pub signals_substituted: Counter,
    pub stages_degraded: Counter,
    pub runs_completed: Counter,
    pub runs_failed: Counter,

    // ヒストグラム
    pub ingest_duration: Histogram,
    pub preprocess_duration: Histogram,
    pub sentiment_duration: Histogram,
    pub sarcasm_duration: Histogram,
    pub language_duration: Histogram,
    pub entity_duration: Histogram,
    pub topic_duration: Histogram,
    pub trend_duration: Histogram,
    pub aggregate_duration: Histogram,
    pub run_duration: Histogram,

    // ゲージ
    pub groups_analyzed: Gauge,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成する。
    #[allow(clippy::too_many_lines)]
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            posts_ingested: register_counter_with_registry!(
                "sentiment_posts_ingested_total",
                "Total number of posts accepted from the input batch",
                registry
            )?,
            posts_scored: register_counter_with_registry!(
                "sentiment_posts_scored_total",
                "Total number of posts that completed all scoring stages",
                registry
            )?,
            posts_dropped: register_counter_with_registry!(
                "sentiment_posts_dropped_total",
                "Total number of posts removed by ingestion filters",
                registry
            )?,
            signals_substituted: register_counter_with_registry!(
                "sentiment_signals_substituted_total",
                "Total number of per-item signals replaced with neutral defaults",
                registry
            )?,
            stages_degraded: register_counter_with_registry!(
                "sentiment_stages_degraded_total",
                "Total number of stage-wide degradations to neutral defaults",
                registry
            )?,
            runs_completed: register_counter_with_registry!(
                "sentiment_runs_completed_total",
                "Total number of pipeline runs completed",
                registry
            )?,
            runs_failed: register_counter_with_registry!(
                "sentiment_runs_failed_total",
                "Total number of pipeline runs failed",
                registry
            )?,
            ingest_duration: register_histogram_with_registry!(
                "sentiment_ingest_duration_seconds",
                "Duration of the ingest stage",
                registry
            )?,
            preprocess_duration: register_histogram_with_registry!(
                "sentiment_preprocess_duration_seconds",
                "Duration of the preprocess stage",
                registry
            )?,
            sentiment_duration: register_histogram_with_registry!(
                "sentiment_score_duration_seconds",
                "Duration of the two-model sentiment stage",
                registry
            )?,
            sarcasm_duration: register_histogram_with_registry!(
                "sentiment_sarcasm_duration_seconds",
                "Duration of the sarcasm adjustment stage",
                registry
            )?,
            language_duration: register_histogram_with_registry!(
                "sentiment_language_duration_seconds",
                "Duration of the language signal stage",
                registry
            )?,
            entity_duration: register_histogram_with_registry!(
                "sentiment_entity_duration_seconds",
                "Duration of the named entity stage",
                registry
            )?,
            topic_duration: register_histogram_with_registry!(
                "sentiment_topic_duration_seconds",
                "Duration of the topic modeling stage",
                registry
            )?,
            trend_duration: register_histogram_with_registry!(
                "sentiment_trend_duration_seconds",
                "Duration of the trend prediction stage",
                registry
            )?,
            aggregate_duration: register_histogram_with_registry!(
                "sentiment_aggregate_duration_seconds",
                "Duration of the group metrics stage",
                registry
            )?,
            run_duration: register_histogram_with_registry!(
                "sentiment_run_duration_seconds",
                "Duration of a whole pipeline run",
                registry
            )?,
            groups_analyzed: register_gauge_with_registry!(
                "sentiment_groups_analyzed",
                "Number of distinct groups in the last run",
                registry
            )?,
        })
    }
}
