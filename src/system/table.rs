use tracing::debug;

use super::source::{CounterSource, SampleError, UserDirectory};
use super::tracker::{UtilizationTracker, process_age_seconds};
use crate::format::format_kb_as_mb;

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub user: String,
    pub command: String,
    pub resident_memory_kb: u64,
    pub resident_memory_display: String,
    pub uptime_seconds: u64,
    pub cpu_fraction: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    pub records: Vec<ProcessRecord>,
}

impl ProcessTable {
    /// Scan every live pid and rebuild the table from scratch.
    ///
    /// Processes that exit while being read are left out entirely.
    pub fn build<S: CounterSource + ?Sized>(
        source: &S,
        tracker: &mut UtilizationTracker,
        users: &UserDirectory,
        uptime_seconds: f64,
    ) -> Self {
        let live = source.enumerate_live_entity_ids();
        let mut records = Vec::with_capacity(live.len());

        for &pid in &live {
            match build_record(source, tracker, users, uptime_seconds, pid) {
                Ok(record) => records.push(record),
                Err(e) => debug!("dropping row: {e}"),
            }
        }

        tracker.prune(&live);

        let mut table = ProcessTable { records };
        table.sort_by_cpu();
        table
    }

    /// Stable sort, highest CPU first; ties keep their current order.
    pub fn sort_by_cpu(&mut self) {
        self.records
            .sort_by(|a, b| b.cpu_fraction.total_cmp(&a.cpu_fraction));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProcessRecord> {
        self.records.get(index)
    }

    /// Rows whose command or user contains `text`, ignoring case.
    pub fn filter(&self, text: &str) -> Vec<&ProcessRecord> {
        if text.is_empty() {
            return self.records.iter().collect();
        }
        let needle = text.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                r.command.to_lowercase().contains(&needle) || r.user.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

fn build_record<S: CounterSource + ?Sized>(
    source: &S,
    tracker: &mut UtilizationTracker,
    users: &UserDirectory,
    uptime_seconds: f64,
    pid: u32,
) -> Result<ProcessRecord, SampleError> {
    // Every per-pid file is read before the tracker is touched, so a process
    // that exits mid-scan leaves neither a row nor a baseline behind.
    let ticks = source.read_process_ticks(pid)?;
    let status = source.read_process_status(pid)?;
    let command = source.read_process_command_line(pid)?;

    let tick_rate = source.tick_rate();
    let cpu_fraction = tracker.observe_process(ticks, uptime_seconds, tick_rate);
    let age = process_age_seconds(uptime_seconds, ticks.start_ticks, tick_rate);

    Ok(ProcessRecord {
        pid,
        user: users.name(&status.owner_user_id).to_string(),
        command,
        resident_memory_kb: status.resident_memory_kb,
        resident_memory_display: format_kb_as_mb(status.resident_memory_kb),
        uptime_seconds: if age > 0.0 { age as u64 } else { 0 },
        cpu_fraction,
    })
}
