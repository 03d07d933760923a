//! 群別集計段。`group_id`ごとに分布統計・エンゲージメント複合・
//! ボラティリティを計算する。
//!
//! 標準偏差は不偏（ddof=1）、歪度/尖度は母集団モーメントという混在規約は
//! 意図的なもので、揃えてはいけない。標本不足の統計量はNaNのまま報告する。

use std::collections::BTreeMap;

use crate::model::{GroupMetrics, ScoredPost};
use crate::util::stats::{
    excess_kurtosis, mean, min_max_normalize, rolling_std_mean, sample_std, skewness,
};

/// ボラティリティのローリング窓幅。
const VOLATILITY_WINDOW: usize = 5;

/// スコア済み投稿を群に分割して群別メトリクスを返す。入力を変更しない
/// 純関数なので、同じバッチに二度かけても同じ結果になる。
#[must_use]
pub fn aggregate(posts: &[ScoredPost]) -> BTreeMap<String, GroupMetrics> {
    let mut by_group: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, post) in posts.iter().enumerate() {
        by_group.entry(&post.post.group_id).or_default().push(index);
    }

    by_group
        .into_iter()
        .map(|(group, indices)| {
            let sentiments: Vec<f64> = indices
                .iter()
                .map(|&i| posts[i].combined_sentiment)
                .collect();

            // エンゲージメントは群内でフィールドごとにmin-max正規化し、
            // 投稿単位で0.5/0.5平均してから群平均を取る。
            let comments: Vec<f64> = indices
                .iter()
                .map(|&i| posts[i].post.comment_count as f64)
                .collect();
            let scores: Vec<f64> = indices.iter().map(|&i| posts[i].post.score as f64).collect();
            let normalized_comments = min_max_normalize(&comments);
            let normalized_scores = min_max_normalize(&scores);
            let per_post: Vec<f64> = normalized_comments
                .iter()
                .zip(&normalized_scores)
                .map(|(comment, score)| 0.5 * comment + 0.5 * score)
                .collect();

            // ボラティリティは`created_at`昇順で並べ直した系列に対する
            // ローリング標準偏差の平均。
            let mut chronological = indices.clone();
            chronological.sort_by_key(|&i| posts[i].post.created_at);
            let ordered_sentiments: Vec<f64> = chronological
                .iter()
                .map(|&i| posts[i].combined_sentiment)
                .collect();

            let metrics = GroupMetrics {
                sentiment_mean: mean(&sentiments),
                sentiment_std: sample_std(&sentiments),
                sentiment_skew: skewness(&sentiments),
                sentiment_kurtosis: excess_kurtosis(&sentiments),
                engagement_score: mean(&per_post),
                volatility: rolling_std_mean(&ordered_sentiments, VOLATILITY_WINDOW),
            };
            (group.to_string(), metrics)
        })
        .collect()
}
