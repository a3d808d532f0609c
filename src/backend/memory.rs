use std::fs;

use crate::error::{CollectError, Result};
use crate::model::MemoryInfo;

pub struct MemoryCollector;

impl MemoryCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn collect(&self) -> Result<MemoryInfo> {
        let meminfo = fs::read_to_string("/proc/meminfo")?;
        parse_meminfo(&meminfo)
    }
}

impl Default for MemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-line contract: first line carries the total, second the available
/// amount; the value is the second whitespace-delimited token, in kilobytes.
pub fn parse_meminfo(content: &str) -> Result<MemoryInfo> {
    let mut lines = content.lines();
    let total_kb = parse_kb_value(lines.next(), "total")?;
    let available_kb = parse_kb_value(lines.next(), "available")?;
    Ok(MemoryInfo {
        total_kb,
        available_kb,
        used_kb: total_kb.saturating_sub(available_kb),
    })
}

fn parse_kb_value(line: Option<&str>, what: &str) -> Result<u64> {
    line.and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| CollectError::parse(format!("meminfo {what} line missing or malformed")))
}
