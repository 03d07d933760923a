//! Core data model shared across the scoring pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::json::float_or_null;

/// 取り込み済みの1投稿。取り込み後は不変。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// 取得元プラットフォームの投稿ID（任意）。
    #[serde(default)]
    pub id: String,
    /// 投稿元コミュニティ。
    pub group_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// 投票ベースのエンゲージメント信号。負値もあり得る。
    pub score: i64,
    pub comment_count: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// 認識された固有表現スパン。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
    pub confidence: f64,
}

/// 本文のスタンス推定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Agreement,
    Disagreement,
    Neutral,
}

/// バッチ相対のトレンド方向。タイはNegative。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Positive,
    Negative,
}

/// 投稿ごとに一度だけ導出される特徴量一式。導出後は不変。
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFeatureSet {
    /// モデルA（汎用極性分類器）のスコア。[-1,1]。
    pub title_polarity: f64,
    pub body_polarity: f64,
    /// モデルB（語彙ベース複合スコア）のスコア。[-1,1]。
    pub title_compound: f64,
    pub body_compound: f64,
    /// 皮肉確率。[0,1]。
    pub title_sarcasm: f64,
    pub body_sarcasm: f64,
    /// 閾値適用後の疎なトピック分布（topic id, 確率）。
    pub topic_distribution: Vec<(usize, f64)>,
    pub subjectivity: f64,
    pub readability: f64,
    pub avg_sentence_length: f64,
    pub formality: f64,
    /// 感情名→出現数。
    pub emotion_scores: BTreeMap<String, u32>,
    pub stance: Stance,
    pub entities: Vec<EntitySpan>,
}

/// 全スコアリング段が完了した投稿。集計段の入力単位。
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPost {
    #[serde(flatten)]
    pub post: Post,
    pub features: DocumentFeatureSet,
    /// 皮肉補正後の最終ブレンド値。おおよそ[-1,1]。
    pub combined_sentiment: f64,
    /// バッチが小さすぎて学習できなかった場合はNaN（JSONではnull）。
    #[serde(serialize_with = "float_or_null")]
    pub predicted_sentiment: f64,
    #[serde(serialize_with = "float_or_null")]
    pub predicted_engagement: f64,
    pub trend_direction: TrendDirection,
}

/// group_idごとの分布統計。実行の最終出力単位。
#[derive(Debug, Clone, Serialize)]
pub struct GroupMetrics {
    pub sentiment_mean: f64,
    #[serde(serialize_with = "float_or_null")]
    pub sentiment_std: f64,
    #[serde(serialize_with = "float_or_null")]
    pub sentiment_skew: f64,
    #[serde(serialize_with = "float_or_null")]
    pub sentiment_kurtosis: f64,
    /// [0,1]の複合エンゲージメント。
    pub engagement_score: f64,
    #[serde(serialize_with = "float_or_null")]
    pub volatility: f64,
}

/// ステージ全体が中立デフォルトへ退化した記録。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub stage: String,
    pub detail: String,
}

impl Degradation {
    #[must_use]
    pub fn new(stage: &str, detail: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            detail: detail.into(),
        }
    }
}

/// 1回の実行のサマリ。警告レベルの退化記録を含む。
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub total_posts_analyzed: usize,
    pub timeframe: String,
    pub groups_analyzed: Vec<String>,
    pub degraded_stages: Vec<Degradation>,
    /// 項目単位で中立値に置換した信号の数。
    pub substituted_signals: u64,
}

/// パイプライン1回分の成果物。エクスポータへ渡す単位。
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    #[serde(rename = "analysis_summary")]
    pub summary: RunSummary,
    pub group_metrics: BTreeMap<String, GroupMetrics>,
    /// `"text (LABEL)"` → 出現数。出現数降順、同数はキー昇順。
    pub entity_frequencies: Vec<(String, usize)>,
    pub scored_posts: Vec<ScoredPost>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn post_deserializes_with_defaults_for_optional_text() {
        let raw = r#"{
            "group_id": "stocks",
            "score": 12,
            "comment_count": 3,
            "created_at": 1700000000
        }"#;
        let post: Post = serde_json::from_str(raw).expect("post deserializes");
        assert_eq!(post.group_id, "stocks");
        assert_eq!(post.title, "");
        assert_eq!(post.body, "");
        assert_eq!(
            post.created_at,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap()
        );
    }

    #[test]
    fn post_rejects_missing_required_fields() {
        let raw = r#"{"title": "no group"}"#;
        assert!(serde_json::from_str::<Post>(raw).is_err());
    }

    #[test]
    fn group_metrics_nan_fields_serialize_as_null() {
        let metrics = GroupMetrics {
            sentiment_mean: 0.4,
            sentiment_std: f64::NAN,
            sentiment_skew: f64::NAN,
            sentiment_kurtosis: f64::NAN,
            engagement_score: 0.25,
            volatility: f64::NAN,
        };
        let value = serde_json::to_value(&metrics).expect("serializes");
        assert_eq!(value["sentiment_std"], serde_json::Value::Null);
        assert_eq!(value["volatility"], serde_json::Value::Null);
        assert!((value["sentiment_mean"].as_f64().unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn stance_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Stance::Agreement).unwrap(),
            r#""agreement""#
        );
    }

    #[test]
    fn trend_direction_serializes_capitalized() {
        assert_eq!(
            serde_json::to_string(&TrendDirection::Positive).unwrap(),
            r#""Positive""#
        );
    }
}
