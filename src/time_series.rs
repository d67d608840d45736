/// One reaction sample placed on the chart: x is the click number (1-based)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionPoint {
    pub click: f64,
    pub ms: f64,
}

impl ReactionPoint {
    pub fn new(click: f64, ms: f64) -> Self {
        Self { click, ms }
    }
}

impl From<(f64, f64)> for ReactionPoint {
    fn from(v: (f64, f64)) -> Self {
        ReactionPoint { click: v.0, ms: v.1 }
    }
}

impl From<ReactionPoint> for (f64, f64) {
    fn from(p: ReactionPoint) -> Self {
        (p.click, p.ms)
    }
}

/// Turn a session's reaction samples into chart points, in click order
pub fn reaction_series(samples: &[u64]) -> Vec<ReactionPoint> {
    samples
        .iter()
        .enumerate()
        .map(|(i, &ms)| ReactionPoint::new((i + 1) as f64, ms as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_numbers_clicks_from_one() {
        let points = reaction_series(&[320, 280, 410]);
        assert_eq!(
            points,
            vec![
                ReactionPoint::new(1.0, 320.0),
                ReactionPoint::new(2.0, 280.0),
                ReactionPoint::new(3.0, 410.0),
            ]
        );
        let tuple: (f64, f64) = points[1].into();
        assert_eq!(tuple, (2.0, 280.0));
    }

    #[test]
    fn empty_samples_give_empty_series() {
        assert!(reaction_series(&[]).is_empty());
    }
}
