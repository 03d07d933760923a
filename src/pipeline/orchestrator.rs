//! パイプラインのオーケストレータとビルダー。
//!
//! ステージ列を唯一知っている層。投稿表を専有し、各ステージの列出力を
//! 行（`ScoredPost`）へ組み立て直し、退化記録と置換カウントを実行サマリへ
//! 集約する。

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analyzers::lexicon::LexiconAnalyzer;
use crate::analyzers::{EntityRecognizer, PolarityAnalyzer, PosTagger, SarcasmClassifier};
use crate::config::Config;
use crate::model::{
    Degradation, DocumentFeatureSet, PipelineOutput, RunSummary, ScoredPost,
};
use crate::observability::metrics::Metrics;
use crate::pipeline::aggregate;
use crate::pipeline::entities::{EntityStage, entity_frequencies};
use crate::pipeline::ingest::{IngestStage, JsonFilePostSource, PostSource};
use crate::pipeline::language::LanguageStage;
use crate::pipeline::preprocess::PreprocessStage;
use crate::pipeline::sarcasm::SarcasmStage;
use crate::pipeline::sentiment::SentimentStage;
use crate::pipeline::topics::TopicStage;
use crate::pipeline::trend::TrendStage;

/// 全ステージを直列に流すオーケストレータ。
pub struct PipelineOrchestrator {
    metrics: Arc<Metrics>,
    ingest: IngestStage,
    sentiment: SentimentStage,
    sarcasm: SarcasmStage,
    language: LanguageStage,
    entities: EntityStage,
    topics: TopicStage,
    trend: TrendStage,
    timeframe_label: &'static str,
}

/// オーケストレータのビルダー。コラボレータは明示的に注入する
/// （共有グローバル経由では到達しない）。未注入のアナライザは
/// 該当ステージの退化として扱われる。
pub struct PipelineBuilder {
    config: Arc<Config>,
    metrics: Arc<Metrics>,
    source: Option<Arc<dyn PostSource>>,
    polarity: Option<Arc<dyn PolarityAnalyzer>>,
    sarcasm: Option<Arc<dyn SarcasmClassifier>>,
    tagger: Option<Arc<dyn PosTagger>>,
    recognizer: Option<Arc<dyn EntityRecognizer>>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new(config: Arc<Config>, metrics: Arc<Metrics>) -> Self {
        Self {
            config,
            metrics,
            source: None,
            polarity: None,
            sarcasm: None,
            tagger: None,
            recognizer: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn PostSource>) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_polarity(mut self, polarity: Arc<dyn PolarityAnalyzer>) -> Self {
        self.polarity = Some(polarity);
        self
    }

    #[must_use]
    pub fn with_sarcasm(mut self, sarcasm: Arc<dyn SarcasmClassifier>) -> Self {
        self.sarcasm = Some(sarcasm);
        self
    }

    #[must_use]
    pub fn with_tagger(mut self, tagger: Arc<dyn PosTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    #[must_use]
    pub fn build(self) -> PipelineOrchestrator {
        let source = self.source.unwrap_or_else(|| {
            Arc::new(JsonFilePostSource::new(
                self.config.input_path().to_path_buf(),
            ))
        });
        PipelineOrchestrator {
            metrics: self.metrics,
            ingest: IngestStage::new(
                source,
                self.config.groups().to_vec(),
                self.config.timeframe(),
                self.config.post_limit(),
            ),
            sentiment: SentimentStage::new(self.polarity, LexiconAnalyzer::new()),
            sarcasm: SarcasmStage::new(self.sarcasm),
            language: LanguageStage::new(self.tagger),
            entities: EntityStage::new(self.recognizer),
            topics: TopicStage::new(
                self.config.topic_count().get(),
                self.config.trend_seed(),
                self.config.topic_min_probability(),
            ),
            trend: TrendStage::new(self.config.trend_trees().get(), self.config.trend_seed()),
            timeframe_label: self.config.timeframe().as_str(),
        }
    }
}

impl PipelineOrchestrator {
    /// バッチ1回分を最後まで流す。
    ///
    /// ステージ内の問題は中立置換と退化記録として出力データに残り、
    /// ここまでエラーとしては上がってこない。致命的なのは入力の構造違反
    /// （取り込み段）だけ。
    ///
    /// # Errors
    /// 入力バッチの読み込み・スキーマ検証に失敗した場合はエラーを返す。
    pub async fn run(&self) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let run_start = Instant::now();
        info!(%run_id, "starting sentiment pipeline run");

        let stage_start = Instant::now();
        let batch = self.ingest.ingest().await.context("ingest stage failed")?;
        self.metrics
            .ingest_duration
            .observe(stage_start.elapsed().as_secs_f64());
        self.metrics.posts_ingested.inc_by(batch.posts.len() as f64);
        self.metrics.posts_dropped.inc_by(batch.dropped as f64);

        if batch.posts.is_empty() {
            warn!(%run_id, "no posts survived ingestion filters, emitting empty report");
            self.metrics.groups_analyzed.set(0.0);
            self.metrics
                .run_duration
                .observe(run_start.elapsed().as_secs_f64());
            self.metrics.runs_completed.inc();
            return Ok(PipelineOutput {
                summary: RunSummary {
                    run_id,
                    total_posts_analyzed: 0,
                    timeframe: self.timeframe_label.to_string(),
                    groups_analyzed: Vec::new(),
                    degraded_stages: Vec::new(),
                    substituted_signals: 0,
                },
                group_metrics: std::collections::BTreeMap::new(),
                entity_frequencies: Vec::new(),
                scored_posts: Vec::new(),
            });
        }

        let stage_start = Instant::now();
        let clean_posts = PreprocessStage::run(batch.posts);
        self.metrics
            .preprocess_duration
            .observe(stage_start.elapsed().as_secs_f64());
        info!(%run_id, posts = clean_posts.len(), "preprocessing complete");

        let mut degradations: Vec<Degradation> = Vec::new();
        let mut substituted: u64 = 0;

        let stage_start = Instant::now();
        let sentiment = self.sentiment.score(&clean_posts).await;
        self.metrics
            .sentiment_duration
            .observe(stage_start.elapsed().as_secs_f64());
        substituted += sentiment.substituted;
        if let Some(degradation) = sentiment.degradation.clone() {
            record_degradation(&self.metrics, &mut degradations, degradation);
        }

        let stage_start = Instant::now();
        let sarcasm = self.sarcasm.adjust(&clean_posts, &sentiment.combined).await;
        self.metrics
            .sarcasm_duration
            .observe(stage_start.elapsed().as_secs_f64());
        substituted += sarcasm.substituted;
        if let Some(degradation) = sarcasm.degradation.clone() {
            record_degradation(&self.metrics, &mut degradations, degradation);
        }

        let stage_start = Instant::now();
        let language = self.language.extract(&clean_posts).await;
        self.metrics
            .language_duration
            .observe(stage_start.elapsed().as_secs_f64());
        substituted += language.substituted;
        if let Some(degradation) = language.degradation.clone() {
            record_degradation(&self.metrics, &mut degradations, degradation);
        }

        let stage_start = Instant::now();
        let entities = self.entities.recognize(&clean_posts).await;
        self.metrics
            .entity_duration
            .observe(stage_start.elapsed().as_secs_f64());
        substituted += entities.substituted;
        if let Some(degradation) = entities.degradation.clone() {
            record_degradation(&self.metrics, &mut degradations, degradation);
        }

        let stage_start = Instant::now();
        let topic_distributions = self.topics.assign(&clean_posts);
        self.metrics
            .topic_duration
            .observe(stage_start.elapsed().as_secs_f64());

        let stage_start = Instant::now();
        let trend = self
            .trend
            .predict(&clean_posts, &sarcasm.adjusted, &language, &sarcasm.body);
        self.metrics
            .trend_duration
            .observe(stage_start.elapsed().as_secs_f64());

        let mut entity_spans = entities.spans;
        let mut distributions = topic_distributions;
        let scored_posts: Vec<ScoredPost> = clean_posts
            .iter()
            .enumerate()
            .map(|(i, clean)| ScoredPost {
                post: clean.post.clone(),
                features: DocumentFeatureSet {
                    title_polarity: sentiment.title_polarity[i],
                    body_polarity: sentiment.body_polarity[i],
                    title_compound: sentiment.title_compound[i],
                    body_compound: sentiment.body_compound[i],
                    title_sarcasm: sarcasm.title[i],
                    body_sarcasm: sarcasm.body[i],
                    topic_distribution: std::mem::take(&mut distributions[i]),
                    subjectivity: language.subjectivity[i],
                    readability: language.readability[i],
                    avg_sentence_length: language.avg_sentence_length[i],
                    formality: language.formality[i],
                    emotion_scores: language.emotions[i].clone(),
                    stance: language.stance[i],
                    entities: std::mem::take(&mut entity_spans[i]),
                },
                combined_sentiment: sarcasm.adjusted[i],
                predicted_sentiment: trend.predicted_sentiment[i],
                predicted_engagement: trend.predicted_engagement[i],
                trend_direction: trend.direction[i],
            })
            .collect();
        self.metrics.posts_scored.inc_by(scored_posts.len() as f64);

        let stage_start = Instant::now();
        let group_metrics = aggregate::aggregate(&scored_posts);
        self.metrics
            .aggregate_duration
            .observe(stage_start.elapsed().as_secs_f64());
        self.metrics.groups_analyzed.set(group_metrics.len() as f64);

        let frequencies = entity_frequencies(
            &scored_posts
                .iter()
                .map(|post| post.features.entities.clone())
                .collect::<Vec<_>>(),
        );

        let groups_analyzed: Vec<String> = scored_posts
            .iter()
            .map(|post| post.post.group_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        self.metrics.signals_substituted.inc_by(substituted as f64);
        self.metrics
            .run_duration
            .observe(run_start.elapsed().as_secs_f64());
        self.metrics.runs_completed.inc();
        info!(
            %run_id,
            posts = scored_posts.len(),
            groups = groups_analyzed.len(),
            substituted,
            degraded = degradations.len(),
            "pipeline run complete"
        );

        Ok(PipelineOutput {
            summary: RunSummary {
                run_id,
                total_posts_analyzed: scored_posts.len(),
                timeframe: self.timeframe_label.to_string(),
                groups_analyzed,
                degraded_stages: degradations,
                substituted_signals: substituted,
            },
            group_metrics,
            entity_frequencies: frequencies,
            scored_posts,
        })
    }
}

fn record_degradation(
    metrics: &Metrics,
    degradations: &mut Vec<Degradation>,
    degradation: Degradation,
) {
    warn!(stage = %degradation.stage, detail = %degradation.detail, "stage degraded");
    metrics.stages_degraded.inc();
    degradations.push(degradation);
}
