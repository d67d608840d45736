use std::collections::VecDeque;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::difficulty::DelayCurve;

/// Uniform randomness in `[0, 1)`
pub trait RandomSource {
    fn uniform(&mut self) -> f64;
}

/// Adapter turning any `rand` generator into a [`RandomSource`]
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng>(pub R);

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed list of draws, repeating the last one once exhausted (or 0.0
/// if the list was empty). Handy for pinning the scheduler in tests.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    draws: VecDeque<f64>,
    last: f64,
}

impl SequenceSource {
    pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            last: 0.0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            draws: VecDeque::new(),
            last: value,
        }
    }
}

impl RandomSource for SequenceSource {
    fn uniform(&mut self) -> f64 {
        if let Some(next) = self.draws.pop_front() {
            self.last = next;
        }
        self.last.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Decides how long to wait before the next target and where it lands
pub struct SpawnScheduler {
    rng: Box<dyn RandomSource>,
    cell_count: usize,
}

impl SpawnScheduler {
    pub fn new(rng: Box<dyn RandomSource>, cell_count: usize) -> Self {
        Self { rng, cell_count }
    }

    /// Delay in fractional milliseconds for the given progress
    pub fn next_delay_ms(&mut self, progress: u64) -> f64 {
        let curve = DelayCurve::at(progress as f64);
        let scale_draw = self.rng.uniform();
        let variable_draw = self.rng.uniform();
        curve.delay_ms(scale_draw, variable_draw)
    }

    pub fn next_delay(&mut self, progress: u64) -> Duration {
        Duration::from_millis(self.next_delay_ms(progress).round() as u64)
    }

    /// Uniformly pick a cell that is not in `occupied`, or `None` when the grid is full.
    pub fn pick_cell(&mut self, occupied: &[usize]) -> Option<usize> {
        let free: Vec<usize> = (0..self.cell_count)
            .filter(|cell| !occupied.contains(cell))
            .collect();
        if free.is_empty() {
            return None;
        }
        let idx = (self.rng.uniform() * free.len() as f64).floor() as usize;
        Some(free[idx.min(free.len() - 1)])
    }
}

impl std::fmt::Debug for SpawnScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnScheduler")
            .field("cell_count", &self.cell_count)
            .finish_non_exhaustive()
    }
}
