//! スコアリングパイプライン本体。
//!
//! ステージは厳密に直列で、オーケストレータが専有するインメモリ表の上を
//! 一度だけ流れる。各ステージは列構造体（入力順に整列したベクトル群）を
//! 返し、行の組み立てはオーケストレータだけが行う。

pub mod aggregate;
pub mod entities;
pub mod ingest;
pub mod language;
pub mod orchestrator;
pub mod preprocess;
pub mod sarcasm;
pub mod sentiment;
pub mod topics;
pub mod trend;

pub use orchestrator::{PipelineBuilder, PipelineOrchestrator};
