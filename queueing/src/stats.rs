//! Summaries of measured samples.

/// Arithmetic mean of `samples`, `0.0` if there are none.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Median of `samples`, `0.0` if there are none.
///
/// Sorts `samples` in place.
pub fn median(samples: &mut [f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_by(f64::total_cmp);
    let mid = samples.len() / 2;
    if samples.len() % 2 == 0 {
        (samples[mid - 1] + samples[mid]) / 2.0
    } else {
        samples[mid]
    }
}

/// Population standard deviation of `samples`, `None` if there are none.
pub fn std_dev(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mean = mean(samples);
    let variance = samples
        .iter()
        .map(|sample| (sample - mean).powi(2))
        .sum::<f64>()
        / samples.len() as f64;
    Some(variance.sqrt())
}

/// Standard deviation of `samples` relative to their mean.
///
/// Returns `0.0` if there are no samples or the mean is not positive.
pub fn coefficient_of_variation(samples: &[f64]) -> f64 {
    let mean = mean(samples);
    if mean <= 0.0 {
        return 0.0;
    }
    std_dev(samples).unwrap_or(0.0) / mean
}
