//! レポートのエクスポート。JSONのみ（CSV系の出力面は持たない）。

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::model::PipelineOutput;

/// 実行成果物を整形済みJSONとして1ファイルに書き出す。
/// NaNはシリアライザ側でnullになる。
pub struct JsonExporter {
    path: PathBuf,
}

impl JsonExporter {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// # Errors
    /// シリアライズまたは書き込みに失敗した場合はエラーを返す。
    pub async fn export(&self, output: &PipelineOutput) -> Result<()> {
        let rendered =
            serde_json::to_vec_pretty(output).context("failed to serialize pipeline output")?;
        tokio::fs::write(&self.path, rendered)
            .await
            .with_context(|| format!("failed to write report to {}", self.path.display()))?;
        info!(path = %self.path.display(), "report written");
        Ok(())
    }
}
