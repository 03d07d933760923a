//! 合成データ生成。ベンチマークとローカル検証用の投稿バッチを作る。

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::Post;

const TITLE_POOL: [&str; 8] = [
    "Market looks great today",
    "Why I am worried about earnings",
    "Totally unexpected rally, wow",
    "This stock is bad news",
    "Yes, I agree with the bull case",
    "No, this valuation is wrong",
    "Happy with my portfolio gains",
    "Shocking guidance from management",
];

const BODY_POOL: [&str; 6] = [
    "The quarterly numbers were excellent and the guidance looks good. \
     I think the market is underpricing this.",
    "I am scared of the macro picture. Rates are up and growth is bad. \
     Honestly this feels like 2008 again.",
    "Sure, great idea, buy at the all time high. What could possibly go wrong.",
    "Earnings beat expectations. Revenue grew and margins expanded. \
     Management raised guidance for the year.",
    "wow did not see that coming. absolutely furious about the dilution announcement",
    "",
];

const GROUP_POOL: [&str; 3] = ["wallstreetbets", "stocks", "investing"];

/// シード固定の合成投稿バッチ。同じ引数なら同じバッチを返す。
#[must_use]
pub fn synthetic_posts(count: usize, seed: u64) -> Vec<Post> {
    let mut rng = StdRng::seed_from_u64(seed);
    let now = Utc::now();

    (0..count)
        .map(|i| {
            let title = TITLE_POOL[rng.random_range(0..TITLE_POOL.len())];
            let body = BODY_POOL[rng.random_range(0..BODY_POOL.len())];
            let group = GROUP_POOL[rng.random_range(0..GROUP_POOL.len())];
            Post {
                id: format!("synthetic-{i}"),
                group_id: group.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                score: rng.random_range(-50..5000),
                comment_count: rng.random_range(0..800),
                created_at: now - Duration::minutes(rng.random_range(0..60 * 24 * 7)),
            }
        })
        .collect()
}
