//! ランダムフォレスト回帰器。木ごとにシードを派生させて並列学習する。

use rayon::prelude::*;

use super::Dataset;
use super::tree::RegressionTree;

/// フォレストの学習パラメータ。
#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self { n_trees: 100, seed: 42 }
    }
}

/// 学習済みランダムフォレスト。予測は全木の平均。
#[derive(Debug)]
pub struct RandomForestRegressor {
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    /// ブートストラップ標本で各木を独立に学習する。木indexを
    /// 基底シードへ加算するので同一パラメータなら再現可能。
    #[must_use]
    pub fn fit(dataset: &Dataset, params: ForestParams) -> Self {
        let max_features = max_features_for(dataset.n_features());
        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|index| {
                let tree_seed = params.seed.wrapping_add(index as u64);
                let sample = dataset.bootstrap_sample(tree_seed);
                RegressionTree::fit(&sample, max_features, tree_seed)
            })
            .collect();
        Self { trees }
    }

    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        total / self.trees.len() as f64
    }

    #[must_use]
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }
}

// 回帰フォレストの慣例に合わせ特徴量数の1/3（最低1）を使う。
fn max_features_for(n_features: usize) -> usize {
    (n_features / 3).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_dataset() -> Dataset {
        let features: Vec<Vec<f64>> =
            (0..20).map(|i| vec![f64::from(i), f64::from(i % 3)]).collect();
        let labels: Vec<f64> = (0..20).map(|i| if i < 10 { 0.0 } else { 1.0 }).collect();
        Dataset::new(features, labels)
    }

    #[test]
    fn forest_fits_a_step_function_in_sample() {
        let dataset = step_dataset();
        let forest = RandomForestRegressor::fit(&dataset, ForestParams { n_trees: 25, seed: 42 });
        assert!(forest.predict(&[2.0, 2.0]) < 0.5);
        assert!(forest.predict(&[17.0, 2.0]) > 0.5);
    }

    #[test]
    fn same_seed_reproduces_predictions() {
        let dataset = step_dataset();
        let params = ForestParams { n_trees: 10, seed: 42 };
        let a = RandomForestRegressor::fit(&dataset, params);
        let b = RandomForestRegressor::fit(&dataset, params);
        for row in &dataset.features {
            assert!((a.predict(row) - b.predict(row)).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_forest_predicts_zero() {
        let dataset = step_dataset();
        let forest = RandomForestRegressor::fit(&dataset, ForestParams { n_trees: 0, seed: 1 });
        assert!(forest.predict(&[1.0, 1.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn batch_prediction_matches_single() {
        let dataset = step_dataset();
        let forest = RandomForestRegressor::fit(&dataset, ForestParams { n_trees: 5, seed: 9 });
        let batch = forest.predict_batch(&dataset.features);
        for (row, predicted) in dataset.features.iter().zip(batch) {
            assert!((forest.predict(row) - predicted).abs() < 1e-12);
        }
    }
}
