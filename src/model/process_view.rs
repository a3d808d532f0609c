use serde::{Deserialize, Serialize};

use crate::reconcile::Keyed;

/// Presentation-ready process row, updated in place across ticks while the
/// pid persists. Pids are unique at a point in time but reused by the kernel,
/// so this is not a durable identity across process restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessView {
    pub pid: i32,
    /// Short kernel name (the stat comm field).
    pub name: String,
    /// Full command line; empty for kernel threads.
    pub command: String,
    pub uid: u32,
    pub user: String,
    pub cpu_percent: f64,
    /// Resident set size in kilobytes.
    pub memory_kb: u64,
}

impl Default for ProcessView {
    fn default() -> Self {
        Self {
            pid: 0,
            name: String::new(),
            command: String::new(),
            uid: 0,
            user: String::new(),
            cpu_percent: 0.0,
            memory_kb: 0,
        }
    }
}

impl Keyed for ProcessView {
    type Key = i32;

    fn key(&self) -> i32 {
        self.pid
    }
}
