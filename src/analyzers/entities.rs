use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_bert::pipelines::ner::NERModel;
use tokio::sync::Mutex;

use super::EntityRecognizer;
use crate::model::EntitySpan;

/// rust-bert NERパイプラインのラッパー。
#[derive(Clone)]
pub struct TransformerEntityRecognizer {
    model: Arc<Mutex<NERModel>>,
}

impl std::fmt::Debug for TransformerEntityRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerEntityRecognizer")
            .field("model", &"<NERModel>")
            .finish()
    }
}

impl TransformerEntityRecognizer {
    /// NERモデルを初期化する。初回はモデルのダウンロードに時間がかかる。
    ///
    /// # Errors
    /// モデルのロードに失敗した場合はエラーを返す。
    pub fn new() -> Result<Self> {
        let model = std::thread::spawn(|| NERModel::new(Default::default()))
            .join()
            .map_err(|_| anyhow::anyhow!("failed to join NER model creation thread"))??;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl EntityRecognizer for TransformerEntityRecognizer {
    async fn recognize_batch(&self, texts: &[String]) -> Result<Vec<Vec<EntitySpan>>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
            // トークン断片ではなく結合済みエンティティを受け取る
            let predictions = model.predict_full_entities(&inputs);
            predictions
                .into_iter()
                .map(|entities| {
                    entities
                        .into_iter()
                        .map(|entity| EntitySpan {
                            text: entity.word,
                            label: entity.label,
                            confidence: entity.score,
                        })
                        .collect()
                })
                .collect::<Vec<Vec<EntitySpan>>>()
        })
        .await
        .context("failed to join NER task")
    }
}
