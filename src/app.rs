use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::{
    analyzers::entities::TransformerEntityRecognizer,
    analyzers::polarity::TransformerPolarityAnalyzer,
    analyzers::sarcasm::TransformerSarcasmClassifier,
    analyzers::tagger::TransformerPosTagger,
    config::Config,
    export::JsonExporter,
    observability::Telemetry,
    pipeline::{PipelineBuilder, PipelineOrchestrator},
};

/// 構成済みコンポーネントの共有レジストリ。
pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    pipeline: PipelineOrchestrator,
    exporter: JsonExporter,
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// トランスフォーマ系モデルのロード失敗は致命的ではなく、該当ステージの
    /// 段階退化（中立デフォルト）として警告ログと実行サマリに残る。
    ///
    /// # Errors
    /// Telemetryの初期化に失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new()?;

        let polarity = TransformerPolarityAnalyzer::new()
            .map_err(|error| warn!(error = %error, "polarity model unavailable"))
            .ok();
        let sarcasm = config.sarcasm_model_dir().and_then(|dir| {
            TransformerSarcasmClassifier::load(dir)
                .map_err(|error| warn!(error = %error, "sarcasm model unavailable"))
                .ok()
        });
        let tagger = TransformerPosTagger::new()
            .map_err(|error| warn!(error = %error, "POS model unavailable"))
            .ok();
        let recognizer = TransformerEntityRecognizer::new()
            .map_err(|error| warn!(error = %error, "NER model unavailable"))
            .ok();

        let mut builder = PipelineBuilder::new(Arc::clone(&config), telemetry.metrics_arc());
        if let Some(polarity) = polarity {
            builder = builder.with_polarity(Arc::new(polarity));
        }
        if let Some(sarcasm) = sarcasm {
            builder = builder.with_sarcasm(Arc::new(sarcasm));
        }
        if let Some(tagger) = tagger {
            builder = builder.with_tagger(Arc::new(tagger));
        }
        if let Some(recognizer) = recognizer {
            builder = builder.with_recognizer(Arc::new(recognizer));
        }
        let pipeline = builder.build();
        let exporter = JsonExporter::new(config.output_path().to_path_buf());

        Ok(Self {
            config,
            telemetry,
            pipeline,
            exporter,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    #[must_use]
    pub fn pipeline(&self) -> &PipelineOrchestrator {
        &self.pipeline
    }

    #[must_use]
    pub fn exporter(&self) -> &JsonExporter {
        &self.exporter
    }
}
