use super::table::ProcessTable;

/// Aggregate CPU tick counters captured at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemSnapshot {
    pub idle_ticks: u64,
    pub active_ticks: u64,
}

impl SystemSnapshot {
    pub fn new(idle_ticks: u64, active_ticks: u64) -> Self {
        Self {
            idle_ticks,
            active_ticks,
        }
    }

    pub fn total_ticks(&self) -> u64 {
        self.idle_ticks.saturating_add(self.active_ticks)
    }
}

/// Per-process tick counters from `/proc/<pid>/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub user_ticks: u64,
    pub kernel_ticks: u64,
    pub children_user_ticks: u64,
    pub children_kernel_ticks: u64,
    pub start_ticks: u64,
}

impl ProcessSnapshot {
    /// All CPU time charged to the process, including waited-for children.
    pub fn busy_ticks(&self) -> u64 {
        self.user_ticks
            .saturating_add(self.kernel_ticks)
            .saturating_add(self.children_user_ticks)
            .saturating_add(self.children_kernel_ticks)
    }
}

/// The parts of the system-wide `stat` file one refresh uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemStat {
    pub ticks: SystemSnapshot,
    pub total_processes: u64,
    pub running_processes: u64,
}

/// Fields taken from one read of `/proc/<pid>/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessStatus {
    pub resident_memory_kb: u64,
    pub owner_user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSummary {
    pub os_name: String,
    pub kernel_version: String,
    pub cpu_fraction: f64,
    pub memory_fraction: f64,
    pub memory_total_kb: u64,
    pub memory_used_kb: u64,
    pub uptime_seconds: u64,
    pub total_processes: u64,
    pub running_processes: u64,
}

/// Everything one refresh cycle hands to the renderer.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub summary: SystemSummary,
    pub table: ProcessTable,
}

/// Used fraction of physical memory; zero when the total is unknown.
pub fn memory_fraction(total_kb: u64, free_kb: u64) -> f64 {
    if total_kb == 0 {
        return 0.0;
    }
    let used = total_kb.saturating_sub(free_kb);
    used as f64 / total_kb as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_idle_plus_active() {
        let snap = SystemSnapshot::new(1000, 500);
        assert_eq!(snap.total_ticks(), 1500);
    }

    #[test]
    fn busy_ticks_include_children() {
        let snap = ProcessSnapshot {
            pid: 7,
            user_ticks: 10,
            kernel_ticks: 20,
            children_user_ticks: 3,
            children_kernel_ticks: 4,
            start_ticks: 99,
        };
        assert_eq!(snap.busy_ticks(), 37);
    }

    #[test]
    fn memory_fraction_three_quarters() {
        let fraction = memory_fraction(8_000_000, 2_000_000);
        assert!((fraction - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn memory_fraction_zero_total() {
        assert_eq!(memory_fraction(0, 0), 0.0);
        assert_eq!(memory_fraction(0, 100), 0.0);
    }

    #[test]
    fn memory_fraction_free_exceeds_total() {
        assert_eq!(memory_fraction(100, 200), 0.0);
    }
}
