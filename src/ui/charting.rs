use reflex::session::MAX_REACTION_TIME_MS;

/// X (clicks) and Y (ms) upper bounds for the reaction chart
pub fn compute_chart_params(coords: &[(f64, f64)]) -> (f64, f64) {
    let slowest = coords.iter().map(|&(_, ms)| ms).fold(0.0, f64::max);
    let clicks = coords.last().map_or(1.0, |&(click, _)| click).max(1.0);

    // leave headroom so the slowest sample isn't drawn on the frame
    let ceiling = (slowest * 1.1).clamp(100.0, MAX_REACTION_TIME_MS as f64);
    (clicks, ceiling.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
