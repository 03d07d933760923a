//! 固有表現段。投稿ごとのスパンと全体の出現頻度表を作る。

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::analyzers::EntityRecognizer;
use crate::model::{Degradation, EntitySpan};
use crate::pipeline::preprocess::CleanPost;

pub struct EntityColumns {
    pub spans: Vec<Vec<EntitySpan>>,
    pub substituted: u64,
    pub degradation: Option<Degradation>,
}

pub struct EntityStage {
    recognizer: Option<Arc<dyn EntityRecognizer>>,
}

impl EntityStage {
    #[must_use]
    pub fn new(recognizer: Option<Arc<dyn EntityRecognizer>>) -> Self {
        Self { recognizer }
    }

    /// 前処理済み本文に対して固有表現認識を走らせる。
    /// 認識器が無い実行は全投稿で空スパンとし、退化として記録する。
    pub async fn recognize(&self, posts: &[CleanPost]) -> EntityColumns {
        let Some(recognizer) = &self.recognizer else {
            return EntityColumns {
                spans: vec![Vec::new(); posts.len()],
                substituted: 0,
                degradation: Some(Degradation::new(
                    "entities",
                    "entity recognizer unavailable, no spans extracted",
                )),
            };
        };

        let mut spans = vec![Vec::new(); posts.len()];
        let non_empty: Vec<(usize, String)> = posts
            .iter()
            .enumerate()
            .filter(|(_, post)| !post.clean_body.is_empty())
            .map(|(i, post)| (i, post.clean_body.clone()))
            .collect();
        if non_empty.is_empty() {
            return EntityColumns {
                spans,
                substituted: 0,
                degradation: None,
            };
        }

        let chunk_size = non_empty.len().div_ceil(num_cpus::get()).max(1);
        let mut substituted = 0;
        for chunk in non_empty.chunks(chunk_size) {
            let texts: Vec<String> = chunk.iter().map(|(_, text)| text.clone()).collect();
            match recognizer.recognize_batch(&texts).await {
                Ok(batches) if batches.len() == chunk.len() => {
                    for ((index, _), found) in chunk.iter().zip(batches) {
                        spans[*index] = found;
                    }
                }
                Ok(batches) => {
                    warn!(
                        expected = chunk.len(),
                        got = batches.len(),
                        "NER batch returned wrong arity, substituting empty spans"
                    );
                    substituted += chunk.len() as u64;
                }
                Err(error) => {
                    warn!(error = %error, "NER batch failed, substituting empty spans");
                    substituted += chunk.len() as u64;
                }
            }
        }

        EntityColumns {
            spans,
            substituted,
            degradation: None,
        }
    }
}

/// 全投稿のスパンを`"text (LABEL)"`キーで集計する。
/// 出現数降順、同数はキー昇順の決定的な順序で返す。
#[must_use]
pub fn entity_frequencies(spans: &[Vec<EntitySpan>]) -> Vec<(String, usize)> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for post_spans in spans {
        for span in post_spans {
            let key = format!("{} ({})", span.text, span.label);
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    let mut frequencies: Vec<(String, usize)> = counts.into_iter().collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    frequencies
}
