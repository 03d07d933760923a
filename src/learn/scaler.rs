//! 列ごとの標準化（平均0・分散1）。

/// 学習済みの列平均と列標準偏差を保持するスケーラ。
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// 列統計を学習する。分散ゼロの列は除数1として中心化のみ行う
    /// （全行0に揃う）。
    #[must_use]
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let n = rows.len() as f64;
        let mut means = vec![0.0; n_features];
        let mut stds = vec![1.0; n_features];
        if rows.is_empty() {
            return Self { means, stds };
        }

        for row in rows {
            for (column, value) in row.iter().enumerate() {
                means[column] += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        for (column, std) in stds.iter_mut().enumerate() {
            let variance: f64 = rows
                .iter()
                .map(|row| (row[column] - means[column]).powi(2))
                .sum::<f64>()
                / n;
            let deviation = variance.sqrt();
            if deviation > 0.0 {
                *std = deviation;
            }
        }

        Self { means, stds }
    }

    /// 学習済み統計で行列を変換する。
    #[must_use]
    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(column, value)| (value - self.means[column]) / self.stds[column])
                    .collect()
            })
            .collect()
    }

    /// fitとtransformを同一データへ適用する。
    #[must_use]
    pub fn fit_transform(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        Self::fit(rows).transform(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardized_columns_have_zero_mean_unit_variance() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let scaled = StandardScaler::fit_transform(&rows);

        for column in 0..2 {
            let mean: f64 = scaled.iter().map(|row| row[column]).sum::<f64>() / 3.0;
            let variance: f64 =
                scaled.iter().map(|row| (row[column] - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((variance - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_variance_column_stays_centered_at_zero() {
        let rows = vec![vec![5.0], vec![5.0], vec![5.0]];
        let scaled = StandardScaler::fit_transform(&rows);
        for row in scaled {
            assert!(row[0].abs() < f64::EPSILON);
        }
    }

    #[test]
    fn empty_input_transforms_to_empty() {
        let scaled = StandardScaler::fit_transform(&[]);
        assert!(scaled.is_empty());
    }
}
