//! トピック分布段。バッチ内LDAを学習し、閾値適用済みの疎分布を割り当てる。

use crate::analyzers::topics::TopicModel;
use crate::pipeline::preprocess::CleanPost;

pub struct TopicStage {
    model: TopicModel,
    min_probability: f64,
}

impl TopicStage {
    #[must_use]
    pub fn new(topic_count: usize, seed: u64, min_probability: f64) -> Self {
        Self {
            model: TopicModel::new(topic_count, seed),
            min_probability,
        }
    }

    /// 前処理済み本文のトークン列で学習し、投稿ごとの分布を返す。
    /// 閾値未満のトピックは落とすので、分布の総和は1に満たないことがある。
    #[must_use]
    pub fn assign(&self, posts: &[CleanPost]) -> Vec<Vec<(usize, f64)>> {
        let documents: Vec<Vec<String>> = posts
            .iter()
            .map(|post| {
                post.clean_body
                    .split_whitespace()
                    .map(ToString::to_string)
                    .collect()
            })
            .collect();

        self.model
            .fit_transform(&documents)
            .into_iter()
            .map(|distribution| {
                distribution
                    .into_iter()
                    .filter(|(_, probability)| *probability >= self.min_probability)
                    .collect()
            })
            .collect()
    }
}
