use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_bert::pipelines::pos_tagging::{POSConfig, POSModel};
use tokio::sync::Mutex;

use super::{PosTagger, PosToken};

/// rust-bert品詞タガーのラッパー。フォーマリティ推定に使う。
#[derive(Clone)]
pub struct TransformerPosTagger {
    model: Arc<Mutex<POSModel>>,
}

impl std::fmt::Debug for TransformerPosTagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerPosTagger")
            .field("model", &"<POSModel>")
            .finish()
    }
}

impl TransformerPosTagger {
    /// 品詞モデルを初期化する。初回はモデルのダウンロードに時間がかかる。
    ///
    /// # Errors
    /// モデルのロードに失敗した場合はエラーを返す。
    pub fn new() -> Result<Self> {
        let model = std::thread::spawn(|| POSModel::new(POSConfig::default()))
            .join()
            .map_err(|_| anyhow::anyhow!("failed to join POS model creation thread"))??;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl PosTagger for TransformerPosTagger {
    async fn tag_batch(&self, texts: &[String]) -> Result<Vec<Vec<PosToken>>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let tagged = model.predict(&inputs);
            tagged
                .into_iter()
                .map(|tokens| {
                    tokens
                        .into_iter()
                        .map(|tag| PosToken {
                            word: tag.word,
                            label: tag.label,
                        })
                        .collect()
                })
                .collect::<Vec<Vec<PosToken>>>()
        })
        .await
        .context("failed to join POS tagging task")
    }
}
