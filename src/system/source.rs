//! Raw counter reads from the `/proc` pseudo-filesystem.
//!
//! Every read here is stateless and fails soft: system-wide reads fall back to
//! zero or empty values, and per-process reads report [`SampleError`] so the
//! caller can drop the row of a process that exited mid-scan.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::snapshot::{ProcessSnapshot, ProcessStatus, SystemSnapshot, SystemStat};

const DEFAULT_PROC_ROOT: &str = "/proc";
const DEFAULT_ETC_ROOT: &str = "/etc";
const FALLBACK_TICK_RATE: f64 = 100.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("process {pid} no longer exists")]
    NotFound { pid: u32 },
    #[error("malformed counters for process {pid}: {reason}")]
    Malformed { pid: u32, reason: String },
    #[error("cannot read counters for process {pid}: {message}")]
    Io { pid: u32, message: String },
}

impl SampleError {
    fn from_io(pid: u32, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SampleError::NotFound { pid },
            _ => SampleError::Io {
                pid,
                message: err.to_string(),
            },
        }
    }
}

/// Positions of the `/proc/<pid>/stat` fields we consume, 0-based from the
/// start of the line (field 0 is the pid, field 1 the parenthesised comm).
#[derive(Debug, Clone, Copy)]
pub struct StatSchema {
    pub user_ticks: usize,
    pub kernel_ticks: usize,
    pub children_user_ticks: usize,
    pub children_kernel_ticks: usize,
    pub start_ticks: usize,
}

pub const PROCESS_STAT_SCHEMA: StatSchema = StatSchema {
    user_ticks: 13,
    kernel_ticks: 14,
    children_user_ticks: 15,
    children_kernel_ticks: 16,
    start_ticks: 21,
};

/// Index of the first field after the comm's closing parenthesis (the state).
const FIRST_FIELD_AFTER_COMM: usize = 2;

/// uid -> account name, parsed once from `passwd`.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    names: HashMap<String, String>,
}

impl UserDirectory {
    pub fn parse(contents: &str) -> Self {
        let mut names = HashMap::new();
        for line in contents.lines() {
            let mut parts = line.split(':');
            let (Some(name), Some(_password), Some(uid)) =
                (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            if name.is_empty() || uid.is_empty() {
                continue;
            }
            // First entry wins, matching a top-down scan of the file.
            names
                .entry(uid.to_string())
                .or_insert_with(|| name.to_string());
        }
        Self { names }
    }

    pub fn name(&self, uid: &str) -> &str {
        self.names.get(uid).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Read access to the kernel counters one refresh cycle needs.
pub trait CounterSource {
    /// Kernel ticks per second, fixed for the lifetime of the source.
    fn tick_rate(&self) -> f64;

    /// Everything one refresh needs from the system-wide `stat` file, taken
    /// from a single read.
    fn read_system_stat(&self) -> SystemStat;

    fn read_system_ticks(&self) -> SystemSnapshot {
        self.read_system_stat().ticks
    }

    fn total_processes(&self) -> u64 {
        self.read_system_stat().total_processes
    }

    fn running_processes(&self) -> u64 {
        self.read_system_stat().running_processes
    }

    fn read_process_ticks(&self, pid: u32) -> Result<ProcessSnapshot, SampleError>;

    /// Resident memory and owner uid from one read of the status file.
    fn read_process_status(&self, pid: u32) -> Result<ProcessStatus, SampleError>;

    fn resident_memory_kb(&self, pid: u32) -> Result<u64, SampleError> {
        self.read_process_status(pid).map(|status| status.resident_memory_kb)
    }

    fn read_owner_user_id(&self, pid: u32) -> String {
        self.read_process_status(pid)
            .map(|status| status.owner_user_id)
            .unwrap_or_default()
    }

    /// Arguments joined by spaces. Kernel threads have an empty command line,
    /// which is not an error; a missing file is.
    fn read_process_command_line(&self, pid: u32) -> Result<String, SampleError>;

    fn read_command_line(&self, pid: u32) -> String {
        self.read_process_command_line(pid).unwrap_or_default()
    }

    /// `(total_kb, free_kb)`.
    fn read_memory_totals(&self) -> (u64, u64);

    /// Seconds since boot, with the fractional part kept.
    fn read_uptime(&self) -> f64;

    fn read_boot_relative_uptime_seconds(&self) -> u64 {
        self.read_uptime() as u64
    }

    fn read_user_directory(&self) -> UserDirectory;

    fn resolve_user_name(&self, uid: &str) -> String {
        self.read_user_directory().name(uid).to_string()
    }

    fn enumerate_live_entity_ids(&self) -> BTreeSet<u32>;

    fn operating_system(&self) -> String;

    fn kernel_version(&self) -> String;
}

/// [`CounterSource`] backed by a real (or fake, in tests) procfs tree.
#[derive(Debug, Clone)]
pub struct ProcFs {
    proc_root: PathBuf,
    etc_root: PathBuf,
    tick_rate: f64,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcFs {
    pub fn new() -> Self {
        Self::with_roots(DEFAULT_PROC_ROOT, DEFAULT_ETC_ROOT)
    }

    pub fn with_roots(proc_root: impl Into<PathBuf>, etc_root: impl Into<PathBuf>) -> Self {
        ProcFs {
            proc_root: proc_root.into(),
            etc_root: etc_root.into(),
            tick_rate: clock_ticks_per_second(),
        }
    }

    /// Override the tick rate, for fixtures written against a known `CLK_TCK`.
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        if tick_rate > 0.0 {
            self.tick_rate = tick_rate;
        }
        self
    }

    fn proc_file(&self, name: &str) -> Option<String> {
        read_optional(&self.proc_root.join(name))
    }

    fn pid_path(&self, pid: u32, name: &str) -> PathBuf {
        self.proc_root.join(pid.to_string()).join(name)
    }

    fn read_pid_file(&self, pid: u32, name: &str) -> Result<String, SampleError> {
        fs::read_to_string(self.pid_path(pid, name)).map_err(|e| SampleError::from_io(pid, &e))
    }

}

impl CounterSource for ProcFs {
    fn tick_rate(&self) -> f64 {
        self.tick_rate
    }

    fn read_system_stat(&self) -> SystemStat {
        let stat = self.proc_file("stat").unwrap_or_default();
        SystemStat {
            ticks: parse_system_ticks(&stat).unwrap_or_default(),
            total_processes: parse_stat_counter(&stat, "processes").unwrap_or(0),
            running_processes: parse_stat_counter(&stat, "procs_running").unwrap_or(0),
        }
    }

    fn read_process_ticks(&self, pid: u32) -> Result<ProcessSnapshot, SampleError> {
        let content = self.read_pid_file(pid, "stat")?;
        parse_process_stat(pid, &content)
    }

    fn read_memory_totals(&self) -> (u64, u64) {
        self.proc_file("meminfo")
            .map(|content| parse_memory_totals(&content))
            .unwrap_or((0, 0))
    }

    fn read_uptime(&self) -> f64 {
        self.proc_file("uptime")
            .and_then(|content| parse_uptime(&content))
            .unwrap_or(0.0)
    }

    fn read_process_status(&self, pid: u32) -> Result<ProcessStatus, SampleError> {
        let content = self.read_pid_file(pid, "status")?;
        Ok(parse_process_status(&content))
    }

    fn read_process_command_line(&self, pid: u32) -> Result<String, SampleError> {
        fs::read(self.pid_path(pid, "cmdline"))
            .map(|raw| parse_command_line(&raw))
            .map_err(|e| SampleError::from_io(pid, &e))
    }

    fn read_user_directory(&self) -> UserDirectory {
        read_optional(&self.etc_root.join("passwd"))
            .map(|content| UserDirectory::parse(&content))
            .unwrap_or_default()
    }

    fn enumerate_live_entity_ids(&self) -> BTreeSet<u32> {
        let mut pids = BTreeSet::new();
        let entries = match fs::read_dir(&self.proc_root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("cannot list {}: {}", self.proc_root.display(), e);
                return pids;
            }
        };
        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Ok(pid) = name.parse() {
                pids.insert(pid);
            }
        }
        pids
    }

    fn operating_system(&self) -> String {
        read_optional(&self.etc_root.join("os-release"))
            .and_then(|content| parse_pretty_name(&content))
            .unwrap_or_default()
    }

    fn kernel_version(&self) -> String {
        self.proc_file("version")
            .and_then(|content| content.split_whitespace().nth(2).map(str::to_string))
            .unwrap_or_default()
    }
}

fn clock_ticks_per_second() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions; -1 and 0 are rejected below.
        let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if tck > 0 {
            return tck as f64;
        }
    }
    FALLBACK_TICK_RATE
}

fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!("falling back for {}: {}", path.display(), e);
            None
        }
    }
}

/// Parses the aggregate `cpu` line. Guest time is already folded into
/// user/nice by the kernel, so guest and guest_nice are left out of both sums.
pub fn parse_system_ticks(stat: &str) -> Option<SystemSnapshot> {
    let line = stat
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if values.len() < 4 {
        return None;
    }
    let field = |i: usize| values.get(i).copied().unwrap_or(0);
    let (user, nice, system, idle) = (field(0), field(1), field(2), field(3));
    let (iowait, irq, softirq, steal) = (field(4), field(5), field(6), field(7));

    Some(SystemSnapshot {
        idle_ticks: idle + iowait,
        active_ticks: user + nice + system + irq + softirq + steal,
    })
}

pub fn parse_process_stat(pid: u32, content: &str) -> Result<ProcessSnapshot, SampleError> {
    let malformed = |reason: String| SampleError::Malformed { pid, reason };

    // comm may itself contain spaces and parentheses; the last ')' ends it.
    let close = content
        .rfind(')')
        .ok_or_else(|| malformed("missing comm terminator".to_string()))?;
    let fields: Vec<&str> = content[close + 1..].split_whitespace().collect();

    let field = |position: usize| -> Result<u64, SampleError> {
        let raw = fields
            .get(position - FIRST_FIELD_AFTER_COMM)
            .ok_or_else(|| malformed(format!("field {position} missing")))?;
        raw.parse::<i64>()
            .map(|v| v.max(0) as u64)
            .map_err(|_| malformed(format!("field {position} is not a number: {raw:?}")))
    };

    let schema = PROCESS_STAT_SCHEMA;
    Ok(ProcessSnapshot {
        pid,
        user_ticks: field(schema.user_ticks)?,
        kernel_ticks: field(schema.kernel_ticks)?,
        children_user_ticks: field(schema.children_user_ticks)?,
        children_kernel_ticks: field(schema.children_kernel_ticks)?,
        start_ticks: field(schema.start_ticks)?,
    })
}

pub fn parse_memory_totals(meminfo: &str) -> (u64, u64) {
    let mut total = None;
    let mut free = None;
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = first_number(rest);
        } else if let Some(rest) = line.strip_prefix("MemFree:") {
            free = first_number(rest);
        }
        if total.is_some() && free.is_some() {
            break;
        }
    }
    match (total, free) {
        (Some(total), Some(free)) => (total, free),
        _ => (0, 0),
    }
}

pub fn parse_uptime(content: &str) -> Option<f64> {
    let value: f64 = content.split_whitespace().next()?.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

pub fn parse_command_line(raw: &[u8]) -> String {
    raw.split(|&b| b == 0)
        .filter(|part| !part.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_pretty_name(os_release: &str) -> Option<String> {
    os_release.lines().find_map(|line| {
        let value = line.trim().strip_prefix("PRETTY_NAME=")?;
        Some(value.trim().trim_matches('"').trim_matches('\'').to_string())
    })
}

pub fn parse_stat_counter(stat: &str, key: &str) -> Option<u64> {
    stat.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        if parts.next()? != key {
            return None;
        }
        parts.next()?.parse().ok()
    })
}

pub fn parse_process_status(status: &str) -> ProcessStatus {
    ProcessStatus {
        // Kernel threads have no VmRSS line at all.
        resident_memory_kb: status_value(status, "VmRSS:")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        owner_user_id: status_value(status, "Uid:")
            .unwrap_or_default()
            .to_string(),
    }
}

fn status_value<'a>(status: &'a str, key: &str) -> Option<&'a str> {
    status
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
}

fn first_number(s: &str) -> Option<u64> {
    s.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0\n\
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0\n\
intr 1462898\n\
ctxt 23058764\n\
btime 1262451390\n\
processes 12345\n\
procs_running 3\n\
procs_blocked 0\n";

    #[test]
    fn system_ticks_exclude_guest() {
        let snap = parse_system_ticks(STAT).unwrap();
        assert_eq!(snap.idle_ticks, 46828483 + 16683);
        assert_eq!(snap.active_ticks, 10132153 + 290696 + 3084719 + 25195);
        assert_eq!(snap.total_ticks(), snap.idle_ticks + snap.active_ticks);
    }

    #[test]
    fn system_ticks_short_line_pads_missing_fields() {
        let snap = parse_system_ticks("cpu 1 2 3 4\n").unwrap();
        assert_eq!(snap.active_ticks, 6);
        assert_eq!(snap.idle_ticks, 4);
    }

    #[test]
    fn system_ticks_malformed_is_none() {
        assert!(parse_system_ticks("cpu 1 two 3 4\n").is_none());
        assert!(parse_system_ticks("cpu 1 2\n").is_none());
        assert!(parse_system_ticks("").is_none());
    }

    #[test]
    fn stat_counters() {
        assert_eq!(parse_stat_counter(STAT, "processes"), Some(12345));
        assert_eq!(parse_stat_counter(STAT, "procs_running"), Some(3));
        assert_eq!(parse_stat_counter(STAT, "missing"), None);
    }

    #[test]
    fn process_stat_positions() {
        let line = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 7 9 20 0 1 0 12345 12345678 1234";
        let snap = parse_process_stat(1234, line).unwrap();
        assert_eq!(snap.user_ticks, 1000);
        assert_eq!(snap.kernel_ticks, 500);
        assert_eq!(snap.children_user_ticks, 7);
        assert_eq!(snap.children_kernel_ticks, 9);
        assert_eq!(snap.start_ticks, 12345);
    }

    #[test]
    fn process_stat_comm_with_spaces_and_parens() {
        let line = "42 (Web (Content) 1) R 1 42 42 0 -1 0 0 0 0 0 11 22 33 44 20 0 1 0 555 0 0";
        let snap = parse_process_stat(42, line).unwrap();
        assert_eq!(snap.busy_ticks(), 110);
        assert_eq!(snap.start_ticks, 555);
    }

    #[test]
    fn process_stat_truncated_is_malformed() {
        let err = parse_process_stat(9, "9 (short) S 1 2 3").unwrap_err();
        assert!(matches!(err, SampleError::Malformed { pid: 9, .. }));
    }

    #[test]
    fn memory_totals_from_meminfo() {
        let meminfo = "MemTotal:        8000000 kB\nMemFree:         2000000 kB\nMemAvailable:    5000000 kB\n";
        assert_eq!(parse_memory_totals(meminfo), (8_000_000, 2_000_000));
        assert_eq!(parse_memory_totals("garbage"), (0, 0));
    }

    #[test]
    fn uptime_first_field() {
        assert_eq!(parse_uptime("350735.47 234388.90\n"), Some(350735.47));
        assert_eq!(parse_uptime(""), None);
        assert_eq!(parse_uptime("-4 1"), None);
    }

    #[test]
    fn command_line_joins_nul_separated_args() {
        assert_eq!(
            parse_command_line(b"/usr/bin/python3\0-m\0http.server\0"),
            "/usr/bin/python3 -m http.server"
        );
        assert_eq!(parse_command_line(b""), "");
    }

    #[test]
    fn pretty_name_strips_quotes() {
        let release = "NAME=\"Debian GNU/Linux\"\nPRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\nID=debian\n";
        assert_eq!(
            parse_pretty_name(release).as_deref(),
            Some("Debian GNU/Linux 12 (bookworm)")
        );
        assert_eq!(parse_pretty_name("ID=arch\n"), None);
    }

    #[test]
    fn user_directory_lookup() {
        let dir = UserDirectory::parse(
            "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000::/home/alice:/bin/sh\nbroken\n",
        );
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.name("0"), "root");
        assert_eq!(dir.name("1000"), "alice");
        assert_eq!(dir.name("4242"), "");
    }

    #[test]
    fn status_fields() {
        let status = "Name:\tbash\nUid:\t1000\t1000\t1000\t1000\nVmRSS:\t    5120 kB\n";
        assert_eq!(status_value(status, "Uid:"), Some("1000"));
        assert_eq!(status_value(status, "VmRSS:"), Some("5120"));
        assert_eq!(status_value(status, "VmSwap:"), None);

        let parsed = parse_process_status(status);
        assert_eq!(parsed.resident_memory_kb, 5120);
        assert_eq!(parsed.owner_user_id, "1000");
    }

    #[test]
    fn kernel_thread_status_has_no_rss() {
        let parsed = parse_process_status("Name:\tkthreadd\nUid:\t0\t0\t0\t0\n");
        assert_eq!(parsed.resident_memory_kb, 0);
        assert_eq!(parsed.owner_user_id, "0");
    }

    #[test]
    fn missing_root_falls_back() {
        let fs = ProcFs::with_roots("/nonexistent/proc", "/nonexistent/etc");
        assert_eq!(fs.read_system_ticks(), SystemSnapshot::default());
        assert_eq!(fs.read_memory_totals(), (0, 0));
        assert_eq!(fs.read_uptime(), 0.0);
        assert!(fs.enumerate_live_entity_ids().is_empty());
        assert_eq!(fs.operating_system(), "");
        assert_eq!(fs.kernel_version(), "");
        assert_eq!(fs.read_command_line(1), "");
        assert_eq!(
            fs.read_process_command_line(1),
            Err(SampleError::NotFound { pid: 1 })
        );
        assert_eq!(fs.total_processes(), 0);
        assert_eq!(fs.resolve_user_name("0"), "");
        assert_eq!(
            fs.read_process_ticks(1),
            Err(SampleError::NotFound { pid: 1 })
        );
        assert_eq!(
            fs.resident_memory_kb(1),
            Err(SampleError::NotFound { pid: 1 })
        );
    }

    #[test]
    fn io_errors_map_to_variants() {
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(
            SampleError::from_io(7, &missing),
            SampleError::NotFound { pid: 7 }
        );
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(
            SampleError::from_io(7, &denied),
            SampleError::Io { pid: 7, .. }
        ));
    }

    #[test]
    fn tick_rate_is_positive() {
        assert!(ProcFs::new().tick_rate() > 0.0);
        assert_eq!(ProcFs::new().with_tick_rate(250.0).tick_rate(), 250.0);
        assert!(ProcFs::new().with_tick_rate(0.0).tick_rate() > 0.0);
    }
}
