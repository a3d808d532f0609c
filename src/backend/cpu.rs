use std::fs;

use once_cell::sync::Lazy;

use crate::error::{CollectError, Result};

static TICKS_PER_SEC: Lazy<u64> = Lazy::new(|| {
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as u64
    } else {
        100
    }
});

static PAGE_SIZE_KB: Lazy<u64> = Lazy::new(|| {
    let bytes = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if bytes > 0 {
        bytes as u64 / 1024
    } else {
        4
    }
});

pub fn ticks_per_second() -> u64 {
    *TICKS_PER_SEC
}

pub fn page_size_kb() -> u64 {
    *PAGE_SIZE_KB
}

/// Counter values for one line of /proc/stat. All fields are cumulative
/// ticks since boot and monotonically non-decreasing on a live machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CoreTicks {
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    pub fn busy(&self) -> u64 {
        self.total().saturating_sub(self.idle)
    }
}

/// One raw reading of the system-wide CPU counters: the aggregate line plus
/// one entry per core, in file order.
#[derive(Debug, Clone, Default)]
pub struct RawCpuSample {
    pub timestamp_ticks: i64,
    pub aggregate: CoreTicks,
    pub cores: Vec<CoreTicks>,
}

/// Normalized percentages derived from two successive raw samples.
#[derive(Debug, Clone, Default)]
pub struct CpuRates {
    pub total_percent: f64,
    pub per_core_percent: Vec<f64>,
}

pub struct CpuCollector {
    prev: Option<RawCpuSample>,
    pub core_count: usize,
    pub model_name: String,
}

impl CpuCollector {
    pub fn new() -> Self {
        Self {
            prev: None,
            core_count: num_cores(),
            model_name: cpu_model_name(),
        }
    }

    /// Read one raw sample and convert it to rates against the previous one.
    /// The first call has no baseline and reports 0% everywhere.
    pub fn collect(&mut self) -> Result<CpuRates> {
        let sample = read_raw()?;
        let result = rates(self.prev.as_ref(), &sample);
        self.prev = Some(sample);
        Ok(result)
    }
}

impl Default for CpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

pub fn read_raw() -> Result<RawCpuSample> {
    let stat = fs::read_to_string("/proc/stat")?;
    let timestamp_ticks = (uptime_secs().unwrap_or(0.0) * ticks_per_second() as f64) as i64;
    parse_stat(&stat, timestamp_ticks)
}

/// Parse the leading cpu block of /proc/stat. The aggregate line comes
/// first; per-core lines follow until the first non-"cpu" line.
pub fn parse_stat(content: &str, timestamp_ticks: i64) -> Result<RawCpuSample> {
    let mut aggregate = None;
    let mut cores = Vec::new();

    for line in content.lines() {
        if !line.starts_with("cpu") {
            break;
        }
        match parse_cpu_line(line) {
            Some((true, ticks)) => aggregate = Some(ticks),
            Some((false, ticks)) => cores.push(ticks),
            None => log::warn!("Skipping malformed stat line: {line}"),
        }
    }

    let aggregate =
        aggregate.ok_or_else(|| CollectError::parse("stat file has no aggregate cpu line"))?;
    Ok(RawCpuSample {
        timestamp_ticks,
        aggregate,
        cores,
    })
}

fn parse_cpu_line(line: &str) -> Option<(bool, CoreTicks)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 9 || !parts[0].starts_with("cpu") {
        return None;
    }
    let is_total = parts[0] == "cpu";
    let ticks = CoreTicks {
        user: parts[1].parse().ok()?,
        nice: parts[2].parse().ok()?,
        system: parts[3].parse().ok()?,
        idle: parts[4].parse().ok()?,
        iowait: parts[5].parse().ok()?,
        irq: parts[6].parse().ok()?,
        softirq: parts[7].parse().ok()?,
        steal: parts[8].parse().ok()?,
    };
    Some((is_total, ticks))
}

/// Convert two successive samples to percentages, each line independently.
/// Lines with no baseline (first sample, hotplugged core) report 0.
pub fn rates(prev: Option<&RawCpuSample>, current: &RawCpuSample) -> CpuRates {
    let total_percent = line_percent(prev.map(|p| &p.aggregate), &current.aggregate);
    let per_core_percent = current
        .cores
        .iter()
        .enumerate()
        .map(|(i, core)| line_percent(prev.and_then(|p| p.cores.get(i)), core))
        .collect();
    CpuRates {
        total_percent,
        per_core_percent,
    }
}

fn line_percent(prev: Option<&CoreTicks>, current: &CoreTicks) -> f64 {
    let Some(prev) = prev else {
        return 0.0;
    };
    let total_delta = current.total().saturating_sub(prev.total());
    if total_delta == 0 {
        return 0.0;
    }
    let busy_delta = current.busy().saturating_sub(prev.busy());
    busy_delta as f64 / total_delta as f64 * 100.0
}

pub fn uptime_secs() -> Result<f64> {
    let content = fs::read_to_string("/proc/uptime")?;
    content
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CollectError::parse("uptime file has no leading seconds field"))
}

pub fn num_cores() -> usize {
    fs::read_to_string("/proc/stat")
        .unwrap_or_default()
        .lines()
        .filter(|l| l.starts_with("cpu") && !l.starts_with("cpu "))
        .count()
        .max(1)
}

pub fn cpu_model_name() -> String {
    fs::read_to_string("/proc/cpuinfo")
        .unwrap_or_default()
        .lines()
        .find(|l| l.starts_with("model name"))
        .and_then(|l| l.split(':').nth(1))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "Unknown CPU".to_string())
}
