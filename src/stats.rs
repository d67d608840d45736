use itertools::{Itertools, MinMaxResult};

use crate::util::{mean_ms, std_dev_ms};

/// Points awarded for a reaction: 1000 minus the reaction time, never negative
pub fn points_for(reaction_ms: u64) -> u64 {
    1000u64.saturating_sub(reaction_ms)
}

/// Per-session score and reaction statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub score: u64,
    pub click_count: u64,
    pub reaction_samples: Vec<u64>,
    pub fastest_ms: Option<u64>,
    pub slowest_ms: Option<u64>,
    /// Latest reaction time, or the overdue age of the target that ended the session
    pub last_reaction_ms: Option<u64>,
}

impl SessionStats {
    /// Record one successful click and return the points it earned
    pub fn record_hit(&mut self, reaction_ms: u64) -> u64 {
        let points = points_for(reaction_ms);
        self.reaction_samples.push(reaction_ms);
        self.click_count += 1;
        self.score += points;
        self.last_reaction_ms = Some(reaction_ms);
        self.fastest_ms = Some(self.fastest_ms.map_or(reaction_ms, |f| f.min(reaction_ms)));
        self.slowest_ms = Some(self.slowest_ms.map_or(reaction_ms, |s| s.max(reaction_ms)));
        points
    }

    /// Difficulty driver: every click is worth 75 on top of the score
    pub fn progress(&self) -> u64 {
        self.click_count * 75 + self.score
    }

    pub fn average_reaction_ms(&self) -> Option<f64> {
        mean_ms(&self.reaction_samples)
    }

    pub fn summary(&self) -> ReactionSummary {
        ReactionSummary::from_samples(&self.reaction_samples)
    }
}

/// Aggregate view over a list of reaction samples
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReactionSummary {
    pub count: usize,
    pub average_ms: Option<f64>,
    pub fastest_ms: Option<u64>,
    pub slowest_ms: Option<u64>,
    pub std_dev_ms: Option<f64>,
}

impl ReactionSummary {
    pub fn from_samples(samples: &[u64]) -> Self {
        let (fastest_ms, slowest_ms) = match samples.iter().copied().minmax() {
            MinMaxResult::NoElements => (None, None),
            MinMaxResult::OneElement(x) => (Some(x), Some(x)),
            MinMaxResult::MinMax(lo, hi) => (Some(lo), Some(hi)),
        };
        Self {
            count: samples.len(),
            average_ms: mean_ms(samples),
            fastest_ms,
            slowest_ms,
            std_dev_ms: std_dev_ms(samples),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_for() {
        assert_eq!(points_for(0), 1000);
        assert_eq!(points_for(250), 750);
        assert_eq!(points_for(1000), 0);
        assert_eq!(points_for(1500), 0);
        assert_eq!(points_for(u64::MAX), 0);
    }

    #[test]
    fn test_record_hit_updates_everything() {
        let mut stats = SessionStats::default();

        assert_eq!(stats.record_hit(300), 700);
        assert_eq!(stats.record_hit(200), 800);
        assert_eq!(stats.record_hit(450), 550);

        assert_eq!(stats.score, 2050);
        assert_eq!(stats.click_count, 3);
        assert_eq!(stats.reaction_samples, vec![300, 200, 450]);
        assert_eq!(stats.fastest_ms, Some(200));
        assert_eq!(stats.slowest_ms, Some(450));
        assert_eq!(stats.last_reaction_ms, Some(450));
        assert_eq!(stats.reaction_samples.len() as u64, stats.click_count);
    }

    #[test]
    fn test_progress() {
        let mut stats = SessionStats::default();
        assert_eq!(stats.progress(), 0);
        stats.record_hit(400);
        assert_eq!(stats.progress(), 75 + 600);
    }

    #[test]
    fn test_average_reaction() {
        let mut stats = SessionStats::default();
        assert_eq!(stats.average_reaction_ms(), None);
        stats.record_hit(100);
        stats.record_hit(200);
        assert_eq!(stats.average_reaction_ms(), Some(150.0));
    }

    #[test]
    fn test_summary_matches_running_extremes() {
        let mut stats = SessionStats::default();
        for ms in [510, 230, 880, 230, 640] {
            stats.record_hit(ms);
        }
        let summary = stats.summary();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.fastest_ms, stats.fastest_ms);
        assert_eq!(summary.slowest_ms, stats.slowest_ms);
        assert_eq!(summary.average_ms, Some(498.0));
        assert!(summary.std_dev_ms.is_some());
    }

    #[test]
    fn test_summary_empty_and_single() {
        assert_eq!(ReactionSummary::from_samples(&[]), ReactionSummary::default());

        let one = ReactionSummary::from_samples(&[321]);
        assert_eq!(one.fastest_ms, Some(321));
        assert_eq!(one.slowest_ms, Some(321));
        assert_eq!(one.std_dev_ms, Some(0.0));
    }
}
