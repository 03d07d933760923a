//! 入力バッチの読み込みと取り込みフィルタ。

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Timeframe;
use crate::model::Post;
use crate::schema::posts::validate_posts_batch;

/// 取り込み段の失敗。スキーマ違反は致命的で、部分出力は作らない。
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read input batch: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse input batch: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("input batch violates schema: {}", .0.join("; "))]
    Malformed(Vec<String>),
}

/// 投稿バッチの供給元。取得系の認証・再試行は供給元側で解決済み。
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Post>, IngestError>;
}

#[derive(Debug, Deserialize)]
struct PostsDocument {
    posts: Vec<Post>,
}

/// `{"posts": [...]}`形式のJSONファイルを読む供給元。
/// デシリアライズ前にスキーマ検証を通す。
pub struct JsonFilePostSource {
    path: PathBuf,
}

impl JsonFilePostSource {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PostSource for JsonFilePostSource {
    async fn load(&self) -> Result<Vec<Post>, IngestError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let document: serde_json::Value = serde_json::from_str(&raw)?;

        let validation = validate_posts_batch(&document);
        if !validation.valid {
            return Err(IngestError::Malformed(validation.errors));
        }

        let parsed: PostsDocument = serde_json::from_value(document)?;
        Ok(parsed.posts)
    }
}

/// フィルタ適用後のバッチ。
pub struct IngestedBatch {
    pub posts: Vec<Post>,
    /// フィルタで落とした投稿数。
    pub dropped: usize,
}

/// 群の許可リスト→時間窓→群ごとの上限、の順でフィルタする取り込み段。
pub struct IngestStage {
    source: Arc<dyn PostSource>,
    groups: Vec<String>,
    timeframe: Timeframe,
    post_limit: NonZeroUsize,
}

impl IngestStage {
    #[must_use]
    pub fn new(
        source: Arc<dyn PostSource>,
        groups: Vec<String>,
        timeframe: Timeframe,
        post_limit: NonZeroUsize,
    ) -> Self {
        Self {
            source,
            groups,
            timeframe,
            post_limit,
        }
    }

    /// バッチを読み込み、設定フィルタを適用する。
    ///
    /// 時間窓はバッチ内で最新の`created_at`から遡って測る。上限は入力順の
    /// 先頭N件（供給元がランク順で渡してくる前提）。
    ///
    /// # Errors
    /// 読み込み・パース・スキーマ検証の失敗は[`IngestError`]。
    pub async fn ingest(&self) -> Result<IngestedBatch, IngestError> {
        let posts = self.source.load().await?;
        let total = posts.len();

        let posts: Vec<Post> = if self.groups.is_empty() {
            posts
        } else {
            posts
                .into_iter()
                .filter(|post| self.groups.iter().any(|group| group == &post.group_id))
                .collect()
        };

        let posts: Vec<Post> = match (self.timeframe.window(), posts.iter().map(|p| p.created_at).max())
        {
            (Some(window), Some(newest)) => {
                let cutoff = newest - window;
                posts
                    .into_iter()
                    .filter(|post| post.created_at >= cutoff)
                    .collect()
            }
            _ => posts,
        };

        let limit = self.post_limit.get();
        let mut per_group: FxHashMap<String, usize> = FxHashMap::default();
        let posts: Vec<Post> = posts
            .into_iter()
            .filter(|post| {
                let seen = per_group.entry(post.group_id.clone()).or_insert(0);
                *seen += 1;
                *seen <= limit
            })
            .collect();

        let dropped = total - posts.len();
        info!(
            accepted = posts.len(),
            dropped,
            timeframe = self.timeframe.as_str(),
            "ingested post batch"
        );
        debug!(groups = ?self.groups, "active group allow-list");

        Ok(IngestedBatch { posts, dropped })
    }
}
