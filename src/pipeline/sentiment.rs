//! 二系統ブレンドのセンチメント採点段。
//!
//! モデルA（汎用極性分類器）とモデルB（語彙ベース複合スコア）で
//! `title`/`body`を独立に採点し、フィールド間 0.3/0.7、モデル間 0.5/0.5 の
//! 固定重みでブレンドする。重みは再現対象の設計定数で、調整項ではない。

use std::sync::Arc;

use rayon::prelude::*;
use tracing::warn;

use crate::analyzers::PolarityAnalyzer;
use crate::analyzers::lexicon::LexiconAnalyzer;
use crate::model::Degradation;
use crate::pipeline::preprocess::CleanPost;

pub const TITLE_WEIGHT: f64 = 0.3;
pub const BODY_WEIGHT: f64 = 0.7;
pub const MODEL_WEIGHT: f64 = 0.5;

/// 採点結果の列。全ベクトルは入力と同じ長さ・同じ順序。
pub struct SentimentColumns {
    pub title_polarity: Vec<f64>,
    pub body_polarity: Vec<f64>,
    pub title_compound: Vec<f64>,
    pub body_compound: Vec<f64>,
    pub combined: Vec<f64>,
    pub substituted: u64,
    pub degradation: Option<Degradation>,
}

pub struct SentimentStage {
    polarity: Option<Arc<dyn PolarityAnalyzer>>,
    lexicon: LexiconAnalyzer,
}

impl SentimentStage {
    #[must_use]
    pub fn new(polarity: Option<Arc<dyn PolarityAnalyzer>>, lexicon: LexiconAnalyzer) -> Self {
        Self { polarity, lexicon }
    }

    /// バッチ全体を採点する。1投稿の失敗がバッチを落とすことはない。
    pub async fn score(&self, posts: &[CleanPost]) -> SentimentColumns {
        let title_compound: Vec<f64> = posts
            .par_iter()
            .map(|post| self.lexicon.compound(&post.clean_title))
            .collect();
        let body_compound: Vec<f64> = posts
            .par_iter()
            .map(|post| self.lexicon.compound(&post.clean_body))
            .collect();

        let mut substituted = 0;
        let mut degradation = None;
        let (title_polarity, body_polarity) = match &self.polarity {
            Some(analyzer) => {
                let titles: Vec<&str> = posts.iter().map(|p| p.clean_title.as_str()).collect();
                let bodies: Vec<&str> = posts.iter().map(|p| p.clean_body.as_str()).collect();
                let (titles, title_subs) = score_field(analyzer.as_ref(), &titles).await;
                let (bodies, body_subs) = score_field(analyzer.as_ref(), &bodies).await;
                substituted = title_subs + body_subs;
                (titles, bodies)
            }
            None => {
                degradation = Some(Degradation::new(
                    "sentiment",
                    "polarity model unavailable, all polarity scores neutral",
                ));
                (vec![0.0; posts.len()], vec![0.0; posts.len()])
            }
        };

        let combined: Vec<f64> = (0..posts.len())
            .map(|i| {
                let blend_a = TITLE_WEIGHT * title_polarity[i] + BODY_WEIGHT * body_polarity[i];
                let blend_b = TITLE_WEIGHT * title_compound[i] + BODY_WEIGHT * body_compound[i];
                MODEL_WEIGHT * blend_a + MODEL_WEIGHT * blend_b
            })
            .collect();

        SentimentColumns {
            title_polarity,
            body_polarity,
            title_compound,
            body_compound,
            combined,
            substituted,
            degradation,
        }
    }
}

/// 1フィールド分を極性モデルで採点する。空テキストはモデルを呼ばずに0.0。
/// 推論はチャンク単位で、失敗したチャンクだけを中立値に置換して続行する。
async fn score_field(analyzer: &dyn PolarityAnalyzer, fields: &[&str]) -> (Vec<f64>, u64) {
    let mut scores = vec![0.0; fields.len()];
    let non_empty: Vec<(usize, String)> = fields
        .iter()
        .enumerate()
        .filter(|(_, text)| !text.is_empty())
        .map(|(i, text)| (i, (*text).to_string()))
        .collect();
    if non_empty.is_empty() {
        return (scores, 0);
    }

    let chunk_size = non_empty.len().div_ceil(num_cpus::get()).max(1);
    let mut substituted = 0;
    for chunk in non_empty.chunks(chunk_size) {
        let texts: Vec<String> = chunk.iter().map(|(_, text)| text.clone()).collect();
        match analyzer.score_batch(&texts).await {
            Ok(values) if values.len() == chunk.len() => {
                for ((index, _), value) in chunk.iter().zip(values) {
                    scores[*index] = value;
                }
            }
            Ok(values) => {
                warn!(
                    expected = chunk.len(),
                    got = values.len(),
                    "polarity batch returned wrong arity, substituting neutral scores"
                );
                substituted += chunk.len() as u64;
            }
            Err(error) => {
                warn!(error = %error, "polarity batch failed, substituting neutral scores");
                substituted += chunk.len() as u64;
            }
        }
    }
    (scores, substituted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::model::Post;

    struct FixedPolarity(f64);

    #[async_trait]
    impl PolarityAnalyzer for FixedPolarity {
        async fn score_batch(&self, texts: &[String]) -> Result<Vec<f64>> {
            Ok(vec![self.0; texts.len()])
        }
    }

    struct FailingPolarity;

    #[async_trait]
    impl PolarityAnalyzer for FailingPolarity {
        async fn score_batch(&self, _texts: &[String]) -> Result<Vec<f64>> {
            Err(anyhow!("model exploded"))
        }
    }

    fn clean(title: &str, body: &str) -> CleanPost {
        CleanPost {
            post: Post {
                id: String::new(),
                group_id: "g".to_string(),
                title: title.to_string(),
                body: body.to_string(),
                score: 0,
                comment_count: 0,
                created_at: Utc::now(),
            },
            clean_title: title.to_string(),
            clean_body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_post_scores_exactly_zero() {
        let stage = SentimentStage::new(Some(Arc::new(FixedPolarity(0.9))), LexiconAnalyzer::new());
        let columns = stage.score(&[clean("", "")]).await;
        assert!(columns.combined[0].abs() < f64::EPSILON);
        assert!(columns.title_polarity[0].abs() < f64::EPSILON);
        assert_eq!(columns.substituted, 0);
    }

    #[tokio::test]
    async fn blend_weights_are_fixed() {
        // 極性1.0固定、語彙スコア0のトークンのみ: combined = 0.5 * (0.3 + 0.7)。
        let stage = SentimentStage::new(Some(Arc::new(FixedPolarity(1.0))), LexiconAnalyzer::new());
        let columns = stage.score(&[clean("zzz", "zzz")]).await;
        assert!((columns.combined[0] - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn missing_polarity_model_degrades_to_lexicon_only() {
        let stage = SentimentStage::new(None, LexiconAnalyzer::new());
        let columns = stage.score(&[clean("", "great")]).await;

        let degradation = columns.degradation.expect("degradation recorded");
        assert_eq!(degradation.stage, "sentiment");
        assert!(columns.body_polarity[0].abs() < f64::EPSILON);
        // 語彙側の信号だけが残る。
        assert!(columns.combined[0] > 0.0);
        let expected = MODEL_WEIGHT * BODY_WEIGHT * columns.body_compound[0];
        assert!((columns.combined[0] - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn failing_batches_substitute_and_count() {
        let stage = SentimentStage::new(Some(Arc::new(FailingPolarity)), LexiconAnalyzer::new());
        let columns = stage.score(&[clean("one", "two"), clean("", "three")]).await;

        // title側1件、body側2件が置換される。
        assert_eq!(columns.substituted, 3);
        assert!(columns.degradation.is_none());
        for value in &columns.title_polarity {
            assert!(value.abs() < f64::EPSILON);
        }
    }
}
