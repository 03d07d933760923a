use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_bert::pipelines::common::{ModelResource, ModelType};
use rust_bert::pipelines::sequence_classification::{
    SequenceClassificationConfig, SequenceClassificationModel,
};
use rust_bert::resources::LocalResource;
use tokio::sync::Mutex;

use super::SarcasmClassifier;

/// ローカルディレクトリの二値系列分類モデルをラップした皮肉分類器。
///
/// クラス1をP(皮肉)として読む。ロード失敗は呼び出し側で段階退化
/// （全確率0.0、実行サマリへ警告記録）として扱う。
#[derive(Clone)]
pub struct TransformerSarcasmClassifier {
    model: Arc<Mutex<SequenceClassificationModel>>,
}

impl std::fmt::Debug for TransformerSarcasmClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerSarcasmClassifier")
            .field("model", &"<SequenceClassificationModel>")
            .finish()
    }
}

impl TransformerSarcasmClassifier {
    /// ローカルモデルディレクトリから分類器をロードする。
    ///
    /// ディレクトリには `rust_model.ot` / `config.json` / `vocab.txt`
    /// が必要。
    ///
    /// # Errors
    /// モデルファイルの欠落やロード失敗時はエラーを返す。
    pub fn load(model_dir: &Path) -> Result<Self> {
        let config = SequenceClassificationConfig::new(
            ModelType::Bert,
            ModelResource::Torch(Box::new(LocalResource::from(
                model_dir.join("rust_model.ot"),
            ))),
            LocalResource::from(model_dir.join("config.json")),
            LocalResource::from(model_dir.join("vocab.txt")),
            None,
            true,
            None,
            None,
        );

        // ロードはブロッキングかつ重いので専用スレッドで行う
        let model = std::thread::spawn(move || SequenceClassificationModel::new(config))
            .join()
            .map_err(|_| anyhow::anyhow!("failed to join sarcasm model creation thread"))??;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl SarcasmClassifier for TransformerSarcasmClassifier {
    async fn probabilities(&self, texts: &[String]) -> Result<Vec<f64>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
            // 閾値0で全クラスのスコアを受け取り、クラス1を拾う
            let labels = model
                .predict_multilabel(&inputs, 0.0)
                .context("sarcasm inference failed")?;
            Ok(labels
                .iter()
                .map(|candidates| {
                    candidates
                        .iter()
                        .find(|label| label.id == 1)
                        .map_or(0.0, |label| label.score.clamp(0.0, 1.0))
                })
                .collect())
        })
        .await
        .context("failed to join sarcasm scoring task")?
    }
}
