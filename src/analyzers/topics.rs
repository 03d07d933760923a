//! バッチ内トピックモデル（LDA、崩壊型ギブスサンプリング）。
//!
//! 前処理済み本文のトークン列からバッチごとに学習し、学習に使った
//! 文書自身のトピック分布を読み出す（トレンド予測器と同じく
//! インサンプル）。疎な分布の閾値適用は呼び出し側の責務。

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rustc_hash::FxHashMap;

/// 対称事前分布つきのLDA。`alpha = 50 / K`、`beta = 0.01`。
#[derive(Debug, Clone)]
pub struct TopicModel {
    topic_count: usize,
    alpha: f64,
    beta: f64,
    sweeps: usize,
    seed: u64,
}

impl TopicModel {
    #[must_use]
    pub fn new(topic_count: usize, seed: u64) -> Self {
        Self {
            topic_count,
            alpha: 50.0 / topic_count as f64,
            beta: 0.01,
            sweeps: 200,
            seed,
        }
    }

    /// トークン化済み文書群で学習し、各文書のトピック分布を返す。
    ///
    /// 分布は `(n_dk + α) / (n_d + K·α)`。語彙内トークンを持たない文書は
    /// 空の分布になる。
    #[must_use]
    pub fn fit_transform(&self, documents: &[Vec<String>]) -> Vec<Vec<(usize, f64)>> {
        let mut vocabulary: FxHashMap<&str, usize> = FxHashMap::default();
        for doc in documents {
            for token in doc {
                let next_id = vocabulary.len();
                vocabulary.entry(token.as_str()).or_insert(next_id);
            }
        }
        if vocabulary.is_empty() {
            return vec![Vec::new(); documents.len()];
        }

        let word_ids: Vec<Vec<usize>> = documents
            .iter()
            .map(|doc| doc.iter().map(|token| vocabulary[token.as_str()]).collect())
            .collect();

        let doc_topic_counts = self.gibbs_sample(&word_ids, vocabulary.len());

        word_ids
            .iter()
            .enumerate()
            .map(|(doc_idx, words)| {
                if words.is_empty() {
                    return Vec::new();
                }
                let denominator =
                    words.len() as f64 + self.topic_count as f64 * self.alpha;
                (0..self.topic_count)
                    .map(|topic| {
                        let probability =
                            (doc_topic_counts[[doc_idx, topic]] + self.alpha) / denominator;
                        (topic, probability)
                    })
                    .collect()
            })
            .collect()
    }

    /// 崩壊型ギブスサンプリング本体。文書×トピックの計数行列を返す。
    fn gibbs_sample(&self, word_ids: &[Vec<usize>], vocab_size: usize) -> Array2<f64> {
        let n_docs = word_ids.len();
        let k = self.topic_count;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut topic_word_counts = Array2::<f64>::zeros((k, vocab_size));
        let mut doc_topic_counts = Array2::<f64>::zeros((n_docs, k));
        let mut topic_counts = Array1::<f64>::zeros(k);

        // ランダムな初期割り当て
        let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(n_docs);
        for (doc_idx, words) in word_ids.iter().enumerate() {
            let mut doc_assignments = Vec::with_capacity(words.len());
            for &word in words {
                let topic = rng.random_range(0..k);
                doc_assignments.push(topic);
                topic_word_counts[[topic, word]] += 1.0;
                doc_topic_counts[[doc_idx, topic]] += 1.0;
                topic_counts[topic] += 1.0;
            }
            assignments.push(doc_assignments);
        }

        let beta_sum = self.beta * vocab_size as f64;
        let mut probabilities = vec![0.0; k];

        for _ in 0..self.sweeps {
            for (doc_idx, words) in word_ids.iter().enumerate() {
                for (position, &word) in words.iter().enumerate() {
                    let old_topic = assignments[doc_idx][position];
                    topic_word_counts[[old_topic, word]] -= 1.0;
                    doc_topic_counts[[doc_idx, old_topic]] -= 1.0;
                    topic_counts[old_topic] -= 1.0;

                    let mut total = 0.0;
                    for (topic, slot) in probabilities.iter_mut().enumerate() {
                        let doc_part = doc_topic_counts[[doc_idx, topic]] + self.alpha;
                        let word_part = (topic_word_counts[[topic, word]] + self.beta)
                            / (topic_counts[topic] + beta_sum);
                        *slot = doc_part * word_part;
                        total += *slot;
                    }

                    let threshold = rng.random::<f64>() * total;
                    let mut cumulative = 0.0;
                    let mut new_topic = k - 1;
                    for (topic, &probability) in probabilities.iter().enumerate() {
                        cumulative += probability;
                        if cumulative >= threshold {
                            new_topic = topic;
                            break;
                        }
                    }

                    topic_word_counts[[new_topic, word]] += 1.0;
                    doc_topic_counts[[doc_idx, new_topic]] += 1.0;
                    topic_counts[new_topic] += 1.0;
                    assignments[doc_idx][position] = new_topic;
                }
            }
        }

        doc_topic_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_corpus_yields_empty_distributions() {
        let model = TopicModel::new(3, 42);
        let result = model.fit_transform(&[Vec::new(), Vec::new()]);
        assert_eq!(result, vec![Vec::new(), Vec::new()]);
    }

    #[test]
    fn document_without_tokens_gets_empty_distribution() {
        let model = TopicModel::new(2, 42);
        let result = model.fit_transform(&[tokens(&["market", "rally"]), Vec::new()]);
        assert!(!result[0].is_empty());
        assert!(result[1].is_empty());
    }

    #[test]
    fn distributions_are_normalized_over_topics() {
        let model = TopicModel::new(4, 42);
        let docs = vec![
            tokens(&["stock", "market", "rally", "gain"]),
            tokens(&["game", "team", "score", "coach"]),
        ];
        let result = model.fit_transform(&docs);
        for distribution in &result {
            assert_eq!(distribution.len(), 4);
            let total: f64 = distribution.iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-9, "sum was {total}");
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let docs = vec![
            tokens(&["stock", "market", "rally"]),
            tokens(&["team", "score", "coach"]),
            tokens(&["market", "crash", "fear"]),
        ];
        let first = TopicModel::new(3, 42).fit_transform(&docs);
        let second = TopicModel::new(3, 42).fit_transform(&docs);
        assert_eq!(first, second);
    }

    #[test]
    fn alpha_follows_topic_count() {
        let model = TopicModel::new(5, 42);
        assert!((model.alpha - 10.0).abs() < f64::EPSILON);
    }
}
