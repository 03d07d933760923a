/// 記述統計ユーティリティ。
///
/// 群単位のモーメント統計、ローリング標準偏差、min-max正規化を提供します。
/// サンプル数が不足する統計量はNaNで報告し、例外にもゼロにもしません。

/// 算術平均。空列はNaN。
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 不偏標準偏差（ddof=1）。要素数が2未満の場合はNaN。
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// 母集団歪度 g1 = m3 / m2^1.5。
///
/// 要素数が3未満、または分散がゼロの場合はNaN。
#[must_use]
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    let m3 = central_moment(values, m, 3);
    if m2 <= 0.0 {
        return f64::NAN;
    }
    m3 / m2.powf(1.5)
}

/// 母集団超過尖度 g2 = m4 / m2^2 - 3。
///
/// 要素数が3未満、または分散がゼロの場合はNaN。
#[must_use]
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return f64::NAN;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    let m4 = central_moment(values, m, 4);
    if m2 <= 0.0 {
        return f64::NAN;
    }
    m4 / (m2 * m2) - 3.0
}

/// 連続する`window`個の窓ごとの不偏標準偏差の平均。
///
/// 完全な窓が作れない（要素数 < window）の場合はNaN。
#[must_use]
pub fn rolling_std_mean(values: &[f64], window: usize) -> f64 {
    if window == 0 || values.len() < window {
        return f64::NAN;
    }
    let stds: Vec<f64> = values.windows(window).map(sample_std).collect();
    mean(&stds)
}

/// 群内min-max正規化。
///
/// 最大値と最小値が一致する退化群では、識別可能な信号が無いため
/// 全行を0.0に正規化する。空列は空のまま返す。
#[must_use]
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / span).collect()
}

fn central_moment(values: &[f64], mean: f64, order: i32) -> f64 {
    values
        .iter()
        .map(|v| (v - mean).powi(order))
        .sum::<f64>()
        / values.len() as f64
}
