/// Arithmetic mean of `samples`.
///
/// Returns exactly `0.0` for an empty slice.
pub fn average(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation (divides by n - 1).
///
/// Fewer than two samples have no spread, so this returns `0.0` for them.
pub fn sample_std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mean = average(samples);
    let sum_sq: f64 = samples.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (samples.len() - 1) as f64).sqrt()
}

/// Sample covariance of two equal-length sequences (divides by n - 1).
///
/// Returns `0.0` when the lengths differ or there are fewer than two pairs.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return 0.0;
    }
    let mean_x = average(x);
    let mean_y = average(y);
    let sum: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    sum / (x.len() - 1) as f64
}

/// Pearson correlation coefficient of `x` and `y`, paired by index.
///
/// # Returns
///
/// A value in `[-1, 1]`, or `0.0` if either sequence is empty, the lengths
/// differ, or either sequence has zero standard deviation.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() || y.is_empty() || x.len() != y.len() {
        return 0.0;
    }

    let std_x = sample_std_dev(x);
    let std_y = sample_std_dev(y);
    if std_x == 0.0 || std_y == 0.0 {
        return 0.0;
    }

    // Rounding can push a perfectly linear pair a hair past 1.
    (sample_covariance(x, y) / (std_x * std_y)).clamp(-1.0, 1.0)
}
