//! Progress-driven difficulty curve.
//!
//! Progress is a single scalar (`clicks * 75 + score`). It is mapped through seven
//! overlapping phase ramps that shrink the spawn delays, widen their randomness and
//! lower the delay floor.

/// Base delay before any phase reduction, in ms
pub const SEED_BASE_DELAY_MS: f64 = 1200.0;
/// Upper bound of the random extra delay before any phase reduction, in ms
pub const SEED_VARIABLE_DELAY_MS: f64 = 1800.0;
pub const MAX_RANDOMNESS_FACTOR: f64 = 2.5;
/// Lowest value the delay floor can ever reach, in ms
pub const ABSOLUTE_MIN_DELAY_MS: f64 = 50.0;

const BRUTAL_START: f64 = 48_000.0;
const IMPOSSIBLE_START: f64 = 130_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Phase {
    #[strum(to_string = "Easy")]
    Easy,
    #[strum(to_string = "Medium")]
    Medium,
    #[strum(to_string = "Hard")]
    Hard,
    #[strum(to_string = "Extreme")]
    Extreme,
    #[strum(to_string = "INSANE")]
    Insane,
    #[strum(to_string = "BRUTAL")]
    Brutal,
    #[strum(to_string = "IMPOSSIBLE")]
    Impossible,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Easy,
        Phase::Medium,
        Phase::Hard,
        Phase::Extreme,
        Phase::Insane,
        Phase::Brutal,
        Phase::Impossible,
    ];

    /// Band containing `progress`, used for the level label
    pub fn containing(progress: f64) -> Phase {
        if progress >= IMPOSSIBLE_START {
            Phase::Impossible
        } else if progress >= BRUTAL_START {
            Phase::Brutal
        } else if progress >= 3500.0 {
            Phase::Insane
        } else if progress >= 2000.0 {
            Phase::Extreme
        } else if progress >= 1000.0 {
            Phase::Hard
        } else if progress >= 400.0 {
            Phase::Medium
        } else {
            Phase::Easy
        }
    }
}

/// Ramp values of every phase at a given progress.
///
/// All ramps are clamped to `[0, 1]` except `impossible`, which grows without bound
/// once progress passes 130000.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseRamps {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
    pub extreme: f64,
    pub insane: f64,
    pub brutal: f64,
    pub impossible: f64,
}

fn ramp(progress: f64, start: f64, width: f64) -> f64 {
    ((progress - start) / width).clamp(0.0, 1.0)
}

impl PhaseRamps {
    pub fn at(progress: f64) -> Self {
        Self {
            easy: ramp(progress, 0.0, 400.0),
            medium: ramp(progress, 400.0, 600.0),
            hard: ramp(progress, 1000.0, 1000.0),
            extreme: ramp(progress, 2000.0, 1500.0),
            insane: ramp(progress, 3500.0, 44_500.0),
            brutal: ramp(progress, BRUTAL_START, 82_000.0),
            impossible: ((progress - IMPOSSIBLE_START) / 100_000.0).max(0.0),
        }
    }

    pub fn get(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Easy => self.easy,
            Phase::Medium => self.medium,
            Phase::Hard => self.hard,
            Phase::Extreme => self.extreme,
            Phase::Insane => self.insane,
            Phase::Brutal => self.brutal,
            Phase::Impossible => self.impossible,
        }
    }
}

/// Per-phase reduction of the two delay magnitudes: (base pct, variable pct,
/// base ramp cap, variable ramp cap)
const REDUCTIONS: [(Phase, f64, f64, f64, f64); 7] = [
    (Phase::Easy, 0.35, 0.30, 1.0, 1.0),
    (Phase::Medium, 0.45, 0.40, 1.0, 1.0),
    (Phase::Hard, 0.35, 0.35, 1.0, 1.0),
    (Phase::Extreme, 0.25, 0.25, 1.0, 1.0),
    (Phase::Insane, 0.15, 0.20, 1.0, 1.0),
    (Phase::Brutal, 0.20, 0.25, 1.0, 1.0),
    (Phase::Impossible, 0.25, 0.30, 2.0, 1.5),
];

/// Delay parameters at a given progress, before any random draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayCurve {
    pub base_delay_ms: f64,
    pub variable_delay_ms: f64,
    pub randomness_factor: f64,
    pub min_delay_ms: f64,
}

impl DelayCurve {
    pub fn at(progress: f64) -> Self {
        let ramps = PhaseRamps::at(progress);

        let mut base_delay_ms = SEED_BASE_DELAY_MS;
        let mut variable_delay_ms = SEED_VARIABLE_DELAY_MS;
        for (phase, base_pct, var_pct, base_cap, var_cap) in REDUCTIONS {
            let r = ramps.get(phase);
            base_delay_ms *= 1.0 - r.min(base_cap) * base_pct;
            variable_delay_ms *= 1.0 - r.min(var_cap) * var_pct;
        }

        let randomness_factor = (1.0
            + ramps.insane * 0.3
            + ramps.brutal * 0.4
            + ramps.impossible * 0.6)
            .min(MAX_RANDOMNESS_FACTOR);

        Self {
            base_delay_ms,
            variable_delay_ms,
            randomness_factor,
            min_delay_ms: min_delay_ms(progress),
        }
    }

    /// Combine the curve with two uniform draws in `[0, 1)`: the first scales the
    /// whole delay, the second picks the variable part. The result never drops
    /// below the floor, and a degenerate candidate collapses onto it.
    pub fn delay_ms(&self, scale_draw: f64, variable_draw: f64) -> f64 {
        let random_factor = (0.4 + scale_draw * 0.6) * self.randomness_factor;
        let candidate = (self.base_delay_ms + variable_draw * self.variable_delay_ms) * random_factor;
        if candidate.is_finite() && candidate > 0.0 {
            candidate.max(self.min_delay_ms)
        } else {
            self.min_delay_ms
        }
    }
}

/// Floor for the spawn delay: 350ms shrinking to 120ms, then further through the
/// brutal and impossible bands down to 50ms.
pub fn min_delay_ms(progress: f64) -> f64 {
    let progress = progress.max(0.0);
    let mut floor = (350.0 - progress / 15.0).max(120.0);
    if progress >= BRUTAL_START {
        floor = (floor - (progress - BRUTAL_START) / 2000.0).max(80.0);
    }
    if progress >= IMPOSSIBLE_START {
        floor = (floor - (progress - IMPOSSIBLE_START) / 5000.0).max(ABSOLUTE_MIN_DELAY_MS);
    }
    floor
}

/// Display level and band name for a progress value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyLabel {
    pub level: u32,
    pub phase: Phase,
}

impl DifficultyLabel {
    pub fn for_progress(progress: u64) -> Self {
        let p = progress;
        let phase = Phase::containing(p as f64);
        let level = match phase {
            Phase::Impossible => (50 + (p - 130_000) / 10_000).min(999),
            Phase::Brutal => 30 + (p - 48_000) / 4000,
            Phase::Insane => (20 + (p - 3500) / 2500).min(29),
            Phase::Extreme => 15 + (p - 2000) / 150,
            Phase::Hard => 10 + (p - 1000) / 100,
            Phase::Medium => 5 + (p - 400) / 60,
            Phase::Easy => 1 + p / 50,
        };
        Self {
            level: level as u32,
            phase,
        }
    }

    pub fn name(&self) -> String {
        self.phase.to_string()
    }
}
