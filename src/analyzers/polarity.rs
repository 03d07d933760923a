use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_bert::pipelines::sentiment::{SentimentModel, SentimentPolarity};
use tokio::sync::Mutex;

use super::PolarityAnalyzer;

/// rust-bert感情パイプラインをモデルAとしてラップする。CPUで動く。
#[derive(Clone)]
pub struct TransformerPolarityAnalyzer {
    model: Arc<Mutex<SentimentModel>>,
}

impl std::fmt::Debug for TransformerPolarityAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerPolarityAnalyzer")
            .field("model", &"<SentimentModel>")
            .finish()
    }
}

impl TransformerPolarityAnalyzer {
    /// 極性モデルを初期化する。初回はモデルのダウンロードに時間がかかる。
    ///
    /// # Errors
    /// モデルのロードに失敗した場合はエラーを返す。呼び出し側は失敗を
    /// 段階退化（全スコア0.0）として扱う。
    pub fn new() -> Result<Self> {
        // ロードはブロッキングかつ重いので専用スレッドで行う
        let model = std::thread::spawn(|| SentimentModel::new(Default::default()))
            .join()
            .map_err(|_| anyhow::anyhow!("failed to join polarity model creation thread"))??;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl PolarityAnalyzer for TransformerPolarityAnalyzer {
    async fn score_batch(&self, texts: &[String]) -> Result<Vec<f64>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        // 推論はブロッキングスレッドへ退避する
        tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let sentiments = model.predict(&inputs);
            sentiments
                .iter()
                .map(|s| match s.polarity {
                    SentimentPolarity::Positive => s.score,
                    SentimentPolarity::Negative => -s.score,
                })
                .collect::<Vec<f64>>()
        })
        .await
        .context("failed to join polarity scoring task")
    }
}
