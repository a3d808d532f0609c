use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::cpu::{page_size_kb, ticks_per_second};
use crate::model::ProcessView;

/// Raw per-process fields from one pass over /proc/<pid>.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessRawSample {
    pub pid: i32,
    /// Short name from the stat comm field.
    pub name: String,
    /// Command line with NUL separators replaced by spaces; empty for
    /// kernel threads.
    pub command: String,
    pub owner_uid: u32,
    /// utime + stime, in ticks.
    pub cpu_ticks: u64,
    pub start_time_ticks: u64,
    pub resident_pages: u64,
}

/// Rate baseline recorded for a pid at its previous sample.
#[derive(Debug, Clone, Copy)]
struct CpuBaseline {
    cpu_ticks: u64,
    age_secs: f64,
    start_time_ticks: u64,
}

pub struct ProcessCollector {
    proc_root: PathBuf,
    baselines: HashMap<i32, CpuBaseline>,
    user_names: HashMap<u32, String>,
    core_count: usize,
}

impl ProcessCollector {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: root.into(),
            baselines: HashMap::new(),
            user_names: HashMap::new(),
            core_count: crate::backend::cpu::num_cores(),
        }
    }

    /// Enumerate all live processes and resolve each to a presentation row.
    /// Processes that exit mid-enumeration are skipped silently.
    pub fn collect(&mut self, uptime_secs: f64) -> Vec<ProcessView> {
        let tps = ticks_per_second();
        let mut views = Vec::new();

        for pid in enumerate_pids(&self.proc_root) {
            let Some(raw) = read_process_raw(&self.proc_root, pid) else {
                continue;
            };

            let age_secs = uptime_secs - raw.start_time_ticks as f64 / tps as f64;
            let prev = match self.baselines.get(&pid) {
                // pid was reused by the kernel; start a fresh baseline
                Some(b) if b.start_time_ticks != raw.start_time_ticks => None,
                other => other.copied(),
            };
            let cpu_percent = process_cpu_percent(
                prev.map(|b| (b.cpu_ticks, b.age_secs)),
                raw.cpu_ticks,
                age_secs,
                tps,
                self.core_count,
            );
            self.baselines.insert(
                pid,
                CpuBaseline {
                    cpu_ticks: raw.cpu_ticks,
                    age_secs,
                    start_time_ticks: raw.start_time_ticks,
                },
            );

            let user = self.user_name(raw.owner_uid);
            views.push(ProcessView {
                pid,
                name: raw.name,
                command: raw.command,
                uid: raw.owner_uid,
                user,
                cpu_percent,
                memory_kb: raw.resident_pages * page_size_kb(),
            });
        }

        // Drop baselines for pids that vanished this pass
        let live: HashSet<i32> = views.iter().map(|v| v.pid).collect();
        self.baselines.retain(|pid, _| live.contains(pid));

        views
    }

    fn user_name(&mut self, uid: u32) -> String {
        if let Some(name) = self.user_names.get(&uid) {
            return name.clone();
        }
        let name = nix::unistd::User::from_uid(nix::unistd::Uid::from_raw(uid))
            .ok()
            .flatten()
            .map(|u| u.name)
            .unwrap_or_else(|| "unknown".to_string());
        self.user_names.insert(uid, name.clone());
        name
    }
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time CPU usage for one process from two successive samples,
/// normalized by core count so the column sums to at most 100 machine-wide.
/// Yields 0 for the first sample of a pid and for zero or negative deltas.
pub fn process_cpu_percent(
    prev: Option<(u64, f64)>,
    cpu_ticks: u64,
    age_secs: f64,
    ticks_per_sec: u64,
    core_count: usize,
) -> f64 {
    let Some((prev_ticks, prev_age)) = prev else {
        return 0.0;
    };
    let age_delta = age_secs - prev_age;
    if age_delta <= 0.0 || ticks_per_sec == 0 || core_count == 0 {
        return 0.0;
    }
    let tick_delta = cpu_ticks.saturating_sub(prev_ticks);
    (tick_delta as f64 / ticks_per_sec as f64) / age_delta * 100.0 / core_count as f64
}

/// All numeric-named entries under the process root. Finite and restartable;
/// each call re-lists the directory.
pub fn enumerate_pids(root: &Path) -> impl Iterator<Item = i32> {
    fs::read_dir(root)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i32>().ok())
        })
}

/// Read the three per-process files for one pid. Any failure means the
/// process exited between enumeration and read; the caller skips it.
fn read_process_raw(root: &Path, pid: i32) -> Option<ProcessRawSample> {
    let dir = root.join(pid.to_string());
    let stat = fs::read_to_string(dir.join("stat")).ok()?;
    let status = fs::read_to_string(dir.join("status")).ok()?;
    let cmdline = fs::read_to_string(dir.join("cmdline")).ok()?;
    parse_process_raw(pid, &stat, &status, &cmdline)
}

/// Parse the stat line at its documented absolute offsets: utime 13,
/// stime 14, start time 21, resident pages 23 (0-based). The comm field may
/// itself contain spaces and parentheses, so it is sliced out between the
/// first '(' and the last ')' before splitting the remainder.
pub fn parse_process_raw(
    pid: i32,
    stat: &str,
    status: &str,
    cmdline: &str,
) -> Option<ProcessRawSample> {
    let comm_start = stat.find('(')?;
    let comm_end = stat.rfind(')')?;
    let name = stat.get(comm_start + 1..comm_end)?.to_string();

    // fields[0] is the state field, absolute offset 2
    let fields: Vec<&str> = stat.get(comm_end + 2..)?.split_whitespace().collect();
    if fields.len() < 22 {
        return None;
    }
    let utime: u64 = fields[11].parse().ok()?;
    let stime: u64 = fields[12].parse().ok()?;
    let start_time_ticks: u64 = fields[19].parse().ok()?;
    let resident_pages: u64 = fields[21].parse().ok()?;

    let owner_uid = parse_uid(status)?;
    let command = cmdline.replace('\0', " ").trim().to_string();

    Some(ProcessRawSample {
        pid,
        name,
        command,
        owner_uid,
        cpu_ticks: utime + stime,
        start_time_ticks,
        resident_pages,
    })
}

/// First numeric token of the status block's Uid: line (the real uid).
fn parse_uid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|token| token.parse().ok())
}
