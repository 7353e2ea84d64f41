use tracing::{debug, debug_span};

use super::snapshot::{Sample, SystemSummary, memory_fraction};
use super::source::{CounterSource, ProcFs};
use super::table::ProcessTable;
use super::tracker::UtilizationTracker;

/// Drives one refresh cycle: counters in, summary and process table out.
pub struct Collector<S = ProcFs> {
    source: S,
    tracker: UtilizationTracker,
    os_name: String,
    kernel_version: String,
}

impl Default for Collector<ProcFs> {
    fn default() -> Self {
        Self::new(ProcFs::new())
    }
}

impl<S: CounterSource> Collector<S> {
    pub fn new(source: S) -> Self {
        let os_name = source.operating_system();
        let kernel_version = source.kernel_version();
        let mut tracker = UtilizationTracker::new();
        // Prime the system baseline so the first visible refresh has a delta.
        tracker.observe_system(source.read_system_ticks());

        Collector {
            source,
            tracker,
            os_name,
            kernel_version,
        }
    }

    pub fn tracker(&self) -> &UtilizationTracker {
        &self.tracker
    }

    pub fn refresh(&mut self) -> Sample {
        let _refresh_span = debug_span!("collector.refresh").entered();

        let stat = self.source.read_system_stat();
        let cpu_fraction = self.tracker.observe_system(stat.ticks);
        let (memory_total_kb, free_kb) = self.source.read_memory_totals();
        let uptime = self.source.read_uptime();

        let users = self.source.read_user_directory();
        let table = ProcessTable::build(&self.source, &mut self.tracker, &users, uptime);

        debug!(
            rows = table.len(),
            tracked = self.tracker.tracked_processes(),
            "refresh complete"
        );

        let summary = SystemSummary {
            os_name: self.os_name.clone(),
            kernel_version: self.kernel_version.clone(),
            cpu_fraction,
            memory_fraction: memory_fraction(memory_total_kb, free_kb),
            memory_total_kb,
            memory_used_kb: memory_total_kb.saturating_sub(free_kb),
            uptime_seconds: uptime as u64,
            total_processes: stat.total_processes,
            running_processes: stat.running_processes,
        };

        Sample { summary, table }
    }
}
