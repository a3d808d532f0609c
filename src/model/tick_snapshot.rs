use serde::{Deserialize, Serialize};

use super::{ApplicationView, ProcessView, ServiceView};
use crate::reconcile::ChangeSet;

#[derive(Debug, Clone, Default)]
pub struct CpuInfo {
    pub total_percent: f64,
    pub per_core_percent: Vec<f64>,
    pub core_count: usize,
    pub model_name: String,
    pub uptime_secs: f64,
}

/// Memory totals in kilobytes, as the kernel reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub available_kb: u64,
    pub used_kb: u64,
}

/// Everything one sampling pass produced, handed to the presentation layer
/// as an immutable value. The change-sets describe how to patch the previous
/// view; the engine keeps the authoritative entity tables.
#[derive(Debug, Clone)]
pub struct TickSnapshot {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub process_count: usize,
    pub processes: ChangeSet<ProcessView>,
    pub services: ChangeSet<ServiceView>,
    pub applications: ChangeSet<ApplicationView>,
    /// The rolling CPU timeline window, oldest first.
    pub cpu_history: Vec<(u64, f64)>,
}
