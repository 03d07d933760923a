//! 外部モデルコラボレータの座。
//!
//! 各アナライザは入出力契約（テキスト入力、スコア/ベクトル出力）だけを
//! 公開し、内部は不透明に扱う。トランスフォーマ系はトレイト境界の背後で
//! 構築・注入され、ロード失敗は段階退化として呼び出し側へ伝わる。

pub mod entities;
pub mod lexicon;
pub mod polarity;
pub mod sarcasm;
pub mod tagger;
pub mod topics;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::EntitySpan;

/// モデルA: 汎用極性分類器。符号付きスコア[-1,1]を返す。
#[async_trait]
pub trait PolarityAnalyzer: Send + Sync {
    /// テキスト列を一括採点する。要素数は入力と一致する。
    async fn score_batch(&self, texts: &[String]) -> Result<Vec<f64>>;
}

/// 皮肉確率分類器。P(皮肉)を[0,1]で返す。
#[async_trait]
pub trait SarcasmClassifier: Send + Sync {
    async fn probabilities(&self, texts: &[String]) -> Result<Vec<f64>>;
}

/// 品詞タグ。フォーマリティ推定に使う。
#[derive(Debug, Clone, PartialEq)]
pub struct PosToken {
    pub word: String,
    pub label: String,
}

/// 品詞タガー。
#[async_trait]
pub trait PosTagger: Send + Sync {
    async fn tag_batch(&self, texts: &[String]) -> Result<Vec<Vec<PosToken>>>;
}

/// 固有表現認識器。
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn recognize_batch(&self, texts: &[String]) -> Result<Vec<Vec<EntitySpan>>>;
}
