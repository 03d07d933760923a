//! 皮肉確率によるセンチメント減衰段。
//!
//! 皮肉は符号を決定的に反転させる信号ではないため、確信度に比例して
//! 中立へ減衰させる（反転はさせない）。

use std::sync::Arc;

use tracing::warn;

use crate::analyzers::SarcasmClassifier;
use crate::model::Degradation;
use crate::pipeline::preprocess::CleanPost;
use crate::pipeline::sentiment::{BODY_WEIGHT, TITLE_WEIGHT};

/// 皮肉列と補正済みセンチメント列。入力と同じ長さ・順序。
pub struct SarcasmColumns {
    pub title: Vec<f64>,
    pub body: Vec<f64>,
    pub adjusted: Vec<f64>,
    pub substituted: u64,
    pub degradation: Option<Degradation>,
}

/// 減衰式。`|adjust(s, t, b)| <= |s|` が常に成り立つ。
#[must_use]
pub fn adjust_sentiment(combined: f64, title_sarcasm: f64, body_sarcasm: f64) -> f64 {
    let weighted = TITLE_WEIGHT * title_sarcasm + BODY_WEIGHT * body_sarcasm;
    combined * (1.0 - weighted)
}

pub struct SarcasmStage {
    classifier: Option<Arc<dyn SarcasmClassifier>>,
}

impl SarcasmStage {
    #[must_use]
    pub fn new(classifier: Option<Arc<dyn SarcasmClassifier>>) -> Self {
        Self { classifier }
    }

    /// 皮肉確率を推定してブレンド済みセンチメントを補正する。
    /// 分類器が無い実行では確率0（素通し）とし、退化として記録する。
    pub async fn adjust(&self, posts: &[CleanPost], combined: &[f64]) -> SarcasmColumns {
        let mut substituted = 0;
        let mut degradation = None;

        let (title, body) = match &self.classifier {
            Some(classifier) => {
                let titles: Vec<&str> = posts.iter().map(|p| p.clean_title.as_str()).collect();
                let bodies: Vec<&str> = posts.iter().map(|p| p.clean_body.as_str()).collect();
                let (title, title_subs) = probabilities_for(classifier.as_ref(), &titles).await;
                let (body, body_subs) = probabilities_for(classifier.as_ref(), &bodies).await;
                substituted = title_subs + body_subs;
                (title, body)
            }
            None => {
                degradation = Some(Degradation::new(
                    "sarcasm",
                    "sarcasm classifier unavailable, sentiment passes through unadjusted",
                ));
                (vec![0.0; posts.len()], vec![0.0; posts.len()])
            }
        };

        let adjusted: Vec<f64> = combined
            .iter()
            .enumerate()
            .map(|(i, &value)| adjust_sentiment(value, title[i], body[i]))
            .collect();

        SarcasmColumns {
            title,
            body,
            adjusted,
            substituted,
            degradation,
        }
    }
}

/// 1フィールド分の皮肉確率。空テキストは分類器を呼ばずに0.0。
async fn probabilities_for(classifier: &dyn SarcasmClassifier, fields: &[&str]) -> (Vec<f64>, u64) {
    let mut probabilities = vec![0.0; fields.len()];
    let non_empty: Vec<(usize, String)> = fields
        .iter()
        .enumerate()
        .filter(|(_, text)| !text.is_empty())
        .map(|(i, text)| (i, (*text).to_string()))
        .collect();
    if non_empty.is_empty() {
        return (probabilities, 0);
    }

    let chunk_size = non_empty.len().div_ceil(num_cpus::get()).max(1);
    let mut substituted = 0;
    for chunk in non_empty.chunks(chunk_size) {
        let texts: Vec<String> = chunk.iter().map(|(_, text)| text.clone()).collect();
        match classifier.probabilities(&texts).await {
            Ok(values) if values.len() == chunk.len() => {
                for ((index, _), value) in chunk.iter().zip(values) {
                    probabilities[*index] = value;
                }
            }
            Ok(values) => {
                warn!(
                    expected = chunk.len(),
                    got = values.len(),
                    "sarcasm batch returned wrong arity, substituting zero probabilities"
                );
                substituted += chunk.len() as u64;
            }
            Err(error) => {
                warn!(error = %error, "sarcasm batch failed, substituting zero probabilities");
                substituted += chunk.len() as u64;
            }
        }
    }
    (probabilities, substituted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use rstest::rstest;

    use crate::model::Post;

    struct FixedSarcasm(f64);

    #[async_trait]
    impl SarcasmClassifier for FixedSarcasm {
        async fn probabilities(&self, texts: &[String]) -> Result<Vec<f64>> {
            Ok(vec![self.0; texts.len()])
        }
    }

    fn clean(body: &str) -> CleanPost {
        CleanPost {
            post: Post {
                id: String::new(),
                group_id: "g".to_string(),
                title: String::new(),
                body: body.to_string(),
                score: 0,
                comment_count: 0,
                created_at: Utc::now(),
            },
            clean_title: String::new(),
            clean_body: body.to_string(),
        }
    }

    #[rstest]
    #[case(0.8, 0.0, 0.0, 0.8)]
    #[case(0.8, 1.0, 1.0, 0.0)]
    #[case(-0.6, 0.0, 1.0, -0.18)]
    #[case(0.5, 1.0, 0.0, 0.35)]
    fn adjustment_follows_weighted_damping(
        #[case] combined: f64,
        #[case] title: f64,
        #[case] body: f64,
        #[case] expected: f64,
    ) {
        assert!((adjust_sentiment(combined, title, body) - expected).abs() < 1e-12);
    }

    #[test]
    fn damping_never_amplifies() {
        for s in [-1.0, -0.3, 0.0, 0.7, 1.0] {
            for w in [0.0, 0.25, 0.5, 1.0] {
                assert!(adjust_sentiment(s, w, w).abs() <= s.abs() + 1e-12);
            }
        }
    }

    #[tokio::test]
    async fn missing_classifier_passes_sentiment_through() {
        let stage = SarcasmStage::new(None);
        let posts = vec![clean("totally great"), clean("fine")];
        let columns = stage.adjust(&posts, &[0.4, -0.2]).await;

        assert_eq!(columns.adjusted, vec![0.4, -0.2]);
        let degradation = columns.degradation.expect("degradation recorded");
        assert_eq!(degradation.stage, "sarcasm");
    }

    #[tokio::test]
    async fn classifier_probabilities_damp_sentiment() {
        let stage = SarcasmStage::new(Some(Arc::new(FixedSarcasm(1.0))));
        let posts = vec![clean("sure this is fine")];
        let columns = stage.adjust(&posts, &[0.8]).await;

        // title空 ⇒ weighted = 0.7、adjusted = 0.8 * 0.3。
        assert!((columns.adjusted[0] - 0.24).abs() < 1e-12);
        assert!(columns.title[0].abs() < f64::EPSILON);
    }
}
