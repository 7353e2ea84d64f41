//! Delta-based utilization between consecutive counter snapshots.
//!
//! One baseline is retained per subject (the system, or a pid). Each
//! observation computes against it and then replaces it.

use std::collections::{BTreeSet, HashMap};

use super::snapshot::{ProcessSnapshot, SystemSnapshot};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ProcessBaseline {
    snapshot: ProcessSnapshot,
    age_seconds: f64,
}

#[derive(Debug, Default)]
pub struct UtilizationTracker {
    system: Option<SystemSnapshot>,
    processes: HashMap<u32, ProcessBaseline>,
}

impl UtilizationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Busy fraction of all CPUs since the previous system snapshot.
    ///
    /// Returns 0 on the first observation, when no ticks elapsed, and when
    /// the counters went backwards (the new snapshot becomes the baseline).
    pub fn observe_system(&mut self, now: SystemSnapshot) -> f64 {
        let previous = self.system.replace(now);
        let Some(prev) = previous else {
            return 0.0;
        };

        let (Some(delta_total), Some(delta_idle)) = (
            now.total_ticks().checked_sub(prev.total_ticks()),
            now.idle_ticks.checked_sub(prev.idle_ticks),
        ) else {
            return 0.0;
        };
        if delta_total == 0 {
            return 0.0;
        }

        let busy = delta_total.saturating_sub(delta_idle);
        (busy as f64 / delta_total as f64).clamp(0.0, 1.0)
    }

    /// CPU time consumed per second of process lifetime.
    ///
    /// Without a baseline the process start is the baseline, which yields the
    /// lifetime average. With one, the result covers the interval since the
    /// last observation. A pid whose start time changed has been reused and
    /// loses its baseline. The result may exceed 1 for multithreaded
    /// processes.
    pub fn observe_process(
        &mut self,
        now: ProcessSnapshot,
        uptime_seconds: f64,
        tick_rate: f64,
    ) -> f64 {
        if tick_rate <= 0.0 {
            self.processes.remove(&now.pid);
            return 0.0;
        }

        let age_seconds = process_age_seconds(uptime_seconds, now.start_ticks, tick_rate);
        let previous = self.processes.insert(
            now.pid,
            ProcessBaseline {
                snapshot: now,
                age_seconds,
            },
        );

        let (busy_ticks, elapsed) = match previous {
            Some(prev)
                if prev.snapshot.start_ticks == now.start_ticks
                    && now.busy_ticks() >= prev.snapshot.busy_ticks() =>
            {
                (
                    now.busy_ticks() - prev.snapshot.busy_ticks(),
                    age_seconds - prev.age_seconds,
                )
            }
            _ => (now.busy_ticks(), age_seconds),
        };

        if elapsed.is_nan() || elapsed <= 0.0 {
            return 0.0;
        }
        let fraction = (busy_ticks as f64 / tick_rate) / elapsed;
        if fraction.is_finite() { fraction } else { 0.0 }
    }

    /// Forget every process that is not in `alive`.
    pub fn prune(&mut self, alive: &BTreeSet<u32>) {
        self.processes.retain(|pid, _| alive.contains(pid));
    }

    pub fn tracked_processes(&self) -> usize {
        self.processes.len()
    }

    pub fn has_system_baseline(&self) -> bool {
        self.system.is_some()
    }
}

/// Seconds since the process started, given boot-relative uptime.
pub fn process_age_seconds(uptime_seconds: f64, start_ticks: u64, tick_rate: f64) -> f64 {
    if tick_rate <= 0.0 {
        return 0.0;
    }
    uptime_seconds - start_ticks as f64 / tick_rate
}
