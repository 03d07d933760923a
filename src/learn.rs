//! トレンド予測用の学習コンポーネント。
//!
//! 標準化スケーラと、シード固定のランダムフォレスト回帰器を提供する。
//! いずれもバッチ内学習・バッチ内予測（インサンプル）前提の記述的
//! モデルであり、ホールドアウト汎化は意図しない。

pub mod forest;
pub mod scaler;
pub mod tree;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// 特徴量行列とラベル列の組。
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl Dataset {
    #[must_use]
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<f64>) -> Self {
        debug_assert_eq!(features.len(), labels.len());
        Self { features, labels }
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    /// 復元抽出によるブートストラップ標本。
    #[must_use]
    pub fn bootstrap_sample(&self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = self.n_samples();
        let mut features = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = rng.random_range(0..n);
            features.push(self.features[idx].clone());
            labels.push(self.labels[idx]);
        }
        Self { features, labels }
    }
}
