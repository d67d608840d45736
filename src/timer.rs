use std::time::Duration;

/// Opaque handle returned when a timer is armed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct TimerEntry<E> {
    id: u64,
    due_ms: u64,
    period_ms: Option<u64>,
    event: E,
}

/// Deterministic timer queue driven by an external clock.
///
/// Nothing fires on its own: the owner calls [`Timers::pop_due`] with the current
/// time and handles each returned event. Periodic timers are re-armed relative to
/// their previous due time, so a late poll still sees every period in order.
#[derive(Debug, Clone)]
pub struct Timers<E> {
    next_id: u64,
    entries: Vec<TimerEntry<E>>,
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timers<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Arm a one-shot timer firing `delay` after `now_ms`.
    pub fn after(&mut self, now_ms: u64, delay: Duration, event: E) -> TimerHandle {
        self.push(now_ms + delay.as_millis() as u64, None, event)
    }

    /// Arm a periodic timer. A zero period is bumped to 1ms.
    pub fn every(&mut self, now_ms: u64, period: Duration, event: E) -> TimerHandle {
        let period_ms = (period.as_millis() as u64).max(1);
        self.push(now_ms + period_ms, Some(period_ms), event)
    }

    fn push(&mut self, due_ms: u64, period_ms: Option<u64>, event: E) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(TimerEntry {
            id,
            due_ms,
            period_ms,
            event,
        });
        TimerHandle(id)
    }

    /// Returns true if the timer was still armed. Cancelling twice is a no-op.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != handle.0);
        before != self.entries.len()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.id == handle.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest due time across all armed timers
    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due_ms).min()
    }
}

impl<E: Clone> Timers<E> {
    /// Pop the earliest timer due at or before `now_ms`, returning its due time and
    /// payload. Ties resolve in arming order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, E)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.id))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[idx];
        let due = entry.due_ms;
        let event = entry.event.clone();
        match entry.period_ms {
            Some(period) => entry.due_ms += period,
            None => {
                self.entries.remove(idx);
            }
        }
        Some((due, event))
    }
}
