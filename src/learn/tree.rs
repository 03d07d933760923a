//! 回帰木。平均二乗誤差を不純度として分割を貪欲に選ぶ。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::Dataset;

const MIN_SAMPLES_SPLIT: usize = 2;
const MIN_SAMPLES_LEAF: usize = 1;
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// 単一の回帰木。特徴量を毎分割でランダムに部分抽出する。
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// 指定シードで木を学習する。`max_features`は各分割で検討する
    /// 特徴量数の上限。
    #[must_use]
    pub fn fit(dataset: &Dataset, max_features: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        let max_features = max_features.clamp(1, dataset.n_features().max(1));
        let root = build_node(dataset, &indices, max_features, 0, &mut rng);
        Self { root }
    }

    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

fn mean_label(dataset: &Dataset, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| dataset.labels[i]).sum::<f64>() / indices.len() as f64
}

fn sum_squared_error(dataset: &Dataset, indices: &[usize]) -> f64 {
    let mean = mean_label(dataset, indices);
    indices.iter().map(|&i| (dataset.labels[i] - mean).powi(2)).sum()
}

fn build_node(
    dataset: &Dataset,
    indices: &[usize],
    max_features: usize,
    depth: usize,
    rng: &mut StdRng,
) -> Node {
    if indices.len() < MIN_SAMPLES_SPLIT || depth >= MAX_DEPTH {
        return Node::Leaf { value: mean_label(dataset, indices) };
    }

    let mut candidates: Vec<usize> = (0..dataset.n_features()).collect();
    candidates.shuffle(rng);
    candidates.truncate(max_features);

    let parent_error = sum_squared_error(dataset, indices);
    let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>)> = None;
    let mut best_error = parent_error;

    for &feature in &candidates {
        let mut values: Vec<f64> = indices.iter().map(|&i| dataset.features[i][feature]).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        if values.len() < 2 {
            continue;
        }
        // 隣接する値の中点を分割候補にする。
        for pair in values.windows(2) {
            let threshold = f64::midpoint(pair[0], pair[1]);
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| dataset.features[i][feature] <= threshold);
            if left.len() < MIN_SAMPLES_LEAF || right.len() < MIN_SAMPLES_LEAF {
                continue;
            }
            let error = sum_squared_error(dataset, &left) + sum_squared_error(dataset, &right);
            if error < best_error {
                best_error = error;
                best = Some((feature, threshold, left, right));
            }
        }
    }

    match best {
        Some((feature, threshold, left, right)) => Node::Split {
            feature,
            threshold,
            left: Box::new(build_node(dataset, &left, max_features, depth + 1, rng)),
            right: Box::new(build_node(dataset, &right, max_features, depth + 1, rng)),
        },
        None => Node::Leaf { value: mean_label(dataset, indices) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_dataset() -> Dataset {
        Dataset {
            features: vec![vec![0.0], vec![1.0], vec![2.0], vec![10.0], vec![11.0], vec![12.0]],
            labels: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn learns_a_step_function() {
        let tree = RegressionTree::fit(&step_dataset(), 1, 7);
        assert!(tree.predict(&[1.5]).abs() < 1e-9);
        assert!((tree.predict(&[11.5]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_labels_yield_constant_prediction() {
        let dataset = Dataset {
            features: vec![vec![0.0], vec![1.0], vec![2.0]],
            labels: vec![3.5, 3.5, 3.5],
        };
        let tree = RegressionTree::fit(&dataset, 1, 0);
        assert!((tree.predict(&[0.7]) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let dataset = step_dataset();
        let a = RegressionTree::fit(&dataset, 1, 42);
        let b = RegressionTree::fit(&dataset, 1, 42);
        for x in [0.5_f64, 5.0, 11.0] {
            assert!((a.predict(&[x]) - b.predict(&[x])).abs() < 1e-12);
        }
    }
}
