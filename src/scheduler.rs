//! Cooperative timer queue.
//!
//! Fixed-capacity replacement for a callback timer library: one-shot and
//! periodic entries are armed against the monotonic millisecond clock and
//! fired from [`TimerQueue::tick`], which the owner calls once per poll.
//!
//! ```text
//!   after()/every() ──▶ ┌──────────────────────┐
//!                       │  TimerQueue<T, N>     │ ──tick(now)──▶ FnMut(T)
//!   cancel()        ──▶ │  [deadline, task] × N │
//!                       └──────────────────────┘
//! ```
//!
//! Tasks are plain `Copy` values rather than boxed closures; the owner maps
//! each fired task onto its own `&mut self` method.  This keeps the queue free
//! of captured pointers and lets it live inside the struct it serves.

use heapless::Vec;
use log::{debug, warn};

/// Handle for a pending timer, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u16);

#[derive(Debug, Clone, Copy)]
struct TimerEntry<T> {
    id: TimerId,
    deadline_ms: u32,
    /// `Some(period)` re-arms after firing; `None` is one-shot.
    period_ms: Option<u32>,
    task: T,
}

/// The timer queue.
pub struct TimerQueue<T: Copy, const N: usize> {
    entries: Vec<TimerEntry<T>, N>,
    next_id: u16,
    /// Global enable flag; a disabled queue never fires.
    enabled: bool,
}

impl<T: Copy, const N: usize> Default for TimerQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> TimerQueue<T, N> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            enabled: true,
        }
    }

    /// Fire `task` once, `delay_ms` after `now_ms`.  Returns `None` if full.
    pub fn after(&mut self, now_ms: u32, delay_ms: u32, task: T) -> Option<TimerId> {
        self.arm(now_ms.wrapping_add(delay_ms), None, task)
    }

    /// Fire `task` every `period_ms`, first at `now_ms + period_ms`.
    pub fn every(&mut self, now_ms: u32, period_ms: u32, task: T) -> Option<TimerId> {
        self.arm(now_ms.wrapping_add(period_ms), Some(period_ms.max(1)), task)
    }

    /// Cancel a pending timer.  Returns `false` if it already fired or was
    /// never armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(idx) => {
                self.entries.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Enable or disable firing.  Armed timers stay armed while disabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!("TimerQueue: {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    /// Fire every due timer.  Call once per poll cycle.
    ///
    /// One-shot entries are removed before `on_fire` runs; periodic entries
    /// are re-armed.  A periodic timer that fell more than one period behind
    /// (e.g. after a stalled loop) fires once and re-arms from `now_ms`.
    pub fn tick(&mut self, now_ms: u32, mut on_fire: impl FnMut(T)) {
        if !self.enabled {
            return;
        }

        let mut idx = 0;
        while idx < self.entries.len() {
            let entry = &mut self.entries[idx];
            if !is_due(now_ms, entry.deadline_ms) {
                idx += 1;
                continue;
            }

            let task = entry.task;
            let period_ms = entry.period_ms;
            match period_ms {
                Some(period) => {
                    entry.deadline_ms = entry.deadline_ms.wrapping_add(period);
                    if is_due(now_ms, entry.deadline_ms) {
                        entry.deadline_ms = now_ms.wrapping_add(period);
                    }
                    idx += 1;
                }
                None => {
                    self.entries.swap_remove(idx);
                }
            }
            on_fire(task);
        }
    }

    fn arm(&mut self, deadline_ms: u32, period_ms: Option<u32>, task: T) -> Option<TimerId> {
        let id = TimerId(self.next_id);
        let entry = TimerEntry {
            id,
            deadline_ms,
            period_ms,
            task,
        };
        if self.entries.push(entry).is_err() {
            warn!("TimerQueue: all {} slots in use, timer not armed", N);
            return None;
        }
        self.next_id = self.next_id.wrapping_add(1);
        Some(id)
    }
}

/// Wrapping-safe "now has reached deadline" for spans under ~24 days.
fn is_due(now_ms: u32, deadline_ms: u32) -> bool {
    (now_ms.wrapping_sub(deadline_ms) as i32) >= 0
}
