/// Arithmetic mean of millisecond samples
pub fn mean_ms(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let total: u128 = samples.iter().map(|&ms| ms as u128).sum();
    Some(total as f64 / samples.len() as f64)
}

/// Population standard deviation of millisecond samples
pub fn std_dev_ms(samples: &[u64]) -> Option<f64> {
    let mean = mean_ms(samples)?;
    let variance = samples
        .iter()
        .map(|&ms| {
            let diff = ms as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;
    Some(variance.sqrt())
}
