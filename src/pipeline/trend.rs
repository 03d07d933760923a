//! トレンド予測段。
//!
//! 抽出済み言語特徴からセンチメント系とエンゲージメント系の2つの
//! 回帰器をバッチ内で学習し、同じバッチを予測する（インサンプル）。
//! 汎化ではなく記述的なトレンド装飾であることは設計上の既知の制約。

use chrono::{Datelike, Timelike};
use tracing::info;

use crate::learn::Dataset;
use crate::learn::forest::{ForestParams, RandomForestRegressor};
use crate::learn::scaler::StandardScaler;
use crate::model::TrendDirection;
use crate::pipeline::language::{EMOTIONS, LanguageColumns};
use crate::pipeline::preprocess::CleanPost;
use crate::util::stats::mean;

/// 予測列。入力と同じ長さ・順序。学習できなかったバッチはNaN。
pub struct TrendColumns {
    pub predicted_sentiment: Vec<f64>,
    pub predicted_engagement: Vec<f64>,
    pub direction: Vec<TrendDirection>,
}

pub struct TrendStage {
    params: ForestParams,
}

impl TrendStage {
    #[must_use]
    pub fn new(trees: usize, seed: u64) -> Self {
        Self {
            params: ForestParams {
                n_trees: trees,
                seed,
            },
        }
    }

    /// 2投稿未満のバッチは学習をスキップし、NaN予測と保守的な
    /// `Negative`を返す。
    #[must_use]
    pub fn predict(
        &self,
        posts: &[CleanPost],
        adjusted: &[f64],
        language: &LanguageColumns,
        body_sarcasm: &[f64],
    ) -> TrendColumns {
        if posts.len() < 2 {
            info!(posts = posts.len(), "batch too small for trend modeling");
            return TrendColumns {
                predicted_sentiment: vec![f64::NAN; posts.len()],
                predicted_engagement: vec![f64::NAN; posts.len()],
                direction: vec![TrendDirection::Negative; posts.len()],
            };
        }

        let rows: Vec<Vec<f64>> = posts
            .iter()
            .enumerate()
            .map(|(i, post)| feature_row(post, i, language, body_sarcasm))
            .collect();
        let rows = StandardScaler::fit_transform(&rows);

        // エンゲージメントラベルは積。高評価か多コメントのどちらかが
        // 突出した投稿を乗算的に支配させる（正規化はしない）。
        let engagement_labels: Vec<f64> = posts
            .iter()
            .map(|clean| clean.post.score as f64 * clean.post.comment_count as f64)
            .collect();

        let sentiment_forest =
            RandomForestRegressor::fit(&Dataset::new(rows.clone(), adjusted.to_vec()), self.params);
        let engagement_forest =
            RandomForestRegressor::fit(&Dataset::new(rows.clone(), engagement_labels), self.params);

        let predicted_sentiment = sentiment_forest.predict_batch(&rows);
        let predicted_engagement = engagement_forest.predict_batch(&rows);

        // 方向は実測平均に対する相対判定。タイはNegative（厳密な>）。
        let batch_mean = mean(adjusted);
        let direction: Vec<TrendDirection> = predicted_sentiment
            .iter()
            .map(|&predicted| {
                if predicted > batch_mean {
                    TrendDirection::Positive
                } else {
                    TrendDirection::Negative
                }
            })
            .collect();

        TrendColumns {
            predicted_sentiment,
            predicted_engagement,
            direction,
        }
    }
}

/// 特徴量ベクトル: 時刻、曜日（月曜=0）、主観性、リーダビリティ、
/// フォーマリティ、本文皮肉確率、4感情カウント。
fn feature_row(
    clean: &CleanPost,
    index: usize,
    language: &LanguageColumns,
    body_sarcasm: &[f64],
) -> Vec<f64> {
    let created = clean.post.created_at;
    let mut row = vec![
        f64::from(created.hour()),
        f64::from(created.weekday().num_days_from_monday()),
        language.subjectivity[index],
        language.readability[index],
        language.formality[index],
        body_sarcasm[index],
    ];
    for emotion in EMOTIONS {
        row.push(f64::from(
            language.emotions[index].get(emotion).copied().unwrap_or(0),
        ));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::{Duration, Utc};

    use crate::model::{Post, Stance};

    fn clean(score: i64, comments: u64, offset_hours: i64) -> CleanPost {
        CleanPost {
            post: Post {
                id: String::new(),
                group_id: "g".to_string(),
                title: String::new(),
                body: "body".to_string(),
                score,
                comment_count: comments,
                created_at: Utc::now() - Duration::hours(offset_hours),
            },
            clean_title: String::new(),
            clean_body: "body".to_string(),
        }
    }

    fn language_for(n: usize) -> LanguageColumns {
        let emotions: BTreeMap<String, u32> =
            EMOTIONS.iter().map(|name| ((*name).to_string(), 0)).collect();
        LanguageColumns {
            subjectivity: vec![0.5; n],
            readability: vec![60.0; n],
            avg_sentence_length: vec![8.0; n],
            formality: vec![0.5; n],
            emotions: vec![emotions; n],
            stance: vec![Stance::Neutral; n],
            substituted: 0,
            degradation: None,
        }
    }

    #[test]
    fn tiny_batch_skips_modeling() {
        let stage = TrendStage::new(10, 42);
        let posts = vec![clean(1, 1, 0)];
        let columns = stage.predict(&posts, &[0.3], &language_for(1), &[0.0]);

        assert!(columns.predicted_sentiment[0].is_nan());
        assert!(columns.predicted_engagement[0].is_nan());
        assert_eq!(columns.direction[0], TrendDirection::Negative);
    }

    #[test]
    fn predictions_are_deterministic_for_a_seed() {
        let posts: Vec<CleanPost> = (0..6).map(|i| clean(i, 2, i)).collect();
        let adjusted: Vec<f64> = (0..6).map(|i| f64::from(i) / 10.0).collect();
        let language = language_for(6);
        let sarcasm = vec![0.1; 6];

        let stage = TrendStage::new(20, 42);
        let first = stage.predict(&posts, &adjusted, &language, &sarcasm);
        let second = stage.predict(&posts, &adjusted, &language, &sarcasm);
        assert_eq!(first.predicted_sentiment, second.predicted_sentiment);
        assert_eq!(first.predicted_engagement, second.predicted_engagement);
    }

    #[test]
    fn direction_requires_strictly_above_mean() {
        // ラベルが全て0.0なら全予測が平均と厳密に一致し、タイ規則で
        // 全てNegativeになる。
        let posts: Vec<CleanPost> = (0..5).map(|i| clean(1, 1, i)).collect();
        let adjusted = vec![0.0; 5];
        let columns = TrendStage::new(10, 42).predict(&posts, &adjusted, &language_for(5), &[0.0; 5]);

        for direction in columns.direction {
            assert_eq!(direction, TrendDirection::Negative);
        }
    }
}
