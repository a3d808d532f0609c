use std::thread;
use std::time::Duration;

use crate::backend::applications::ApplicationsCollector;
use crate::backend::cpu::{self, CpuCollector, CpuRates};
use crate::backend::history::CpuHistory;
use crate::backend::memory::MemoryCollector;
use crate::backend::process::ProcessCollector;
use crate::backend::services::ServicesCollector;
use crate::config::Config;
use crate::error::Result;
use crate::model::{
    ApplicationView, CpuInfo, MemoryInfo, ProcessView, ServiceView, TickSnapshot,
};
use crate::reconcile::{ChangeSet, ReconcilingMap};

/// All cross-tick sampling state, owned by one engine instance and mutated
/// only from `tick`. Multiple independent engines can coexist; nothing here
/// is process-global.
pub struct SamplingEngine {
    cpu: CpuCollector,
    memory: MemoryCollector,
    processes: ProcessCollector,
    services: ServicesCollector,
    applications: ApplicationsCollector,
    process_table: ReconcilingMap<ProcessView>,
    service_table: ReconcilingMap<ServiceView>,
    application_table: ReconcilingMap<ApplicationView>,
    history: CpuHistory,
    last_memory: MemoryInfo,
}

impl SamplingEngine {
    pub fn new(tool_timeout: Duration) -> Self {
        Self {
            cpu: CpuCollector::new(),
            memory: MemoryCollector::new(),
            processes: ProcessCollector::new(),
            services: ServicesCollector::new(tool_timeout),
            applications: ApplicationsCollector::new(tool_timeout),
            process_table: ReconcilingMap::new(),
            service_table: ReconcilingMap::new(),
            application_table: ReconcilingMap::new(),
            history: CpuHistory::new(),
            last_memory: MemoryInfo::default(),
        }
    }

    /// Run one sampling pass: raw counters, rates, enumeration, then
    /// reconciliation. Never fails; a degraded source keeps its last-known
    /// value and logs, so one bad tick cannot take down the loop.
    pub fn tick(&mut self) -> TickSnapshot {
        let uptime = match cpu::uptime_secs() {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Failed to read uptime: {e}");
                0.0
            }
        };

        let rates = match self.cpu.collect() {
            Ok(r) => r,
            Err(e) => {
                log::warn!("CPU sample failed: {e}");
                CpuRates::default()
            }
        };
        self.history.push(rates.total_percent);

        match self.memory.collect() {
            Ok(m) => self.last_memory = m,
            Err(e) => log::warn!("Memory sample failed: {e}"),
        }

        let fresh = self.processes.collect(uptime);
        let process_count = fresh.len();
        let processes = self.process_table.reconcile(fresh);

        let listed = self.services.collect();
        let services = self.ingest_services(listed);

        let listed = self.applications.collect();
        let applications = self.ingest_applications(listed);

        TickSnapshot {
            cpu: CpuInfo {
                total_percent: rates.total_percent,
                per_core_percent: rates.per_core_percent,
                core_count: self.cpu.core_count,
                model_name: self.cpu.model_name.clone(),
                uptime_secs: uptime,
            },
            memory: self.last_memory,
            process_count,
            processes,
            services,
            applications,
            cpu_history: self.history.snapshot(),
        }
    }

    /// A failed listing keeps the previous table so a transient tool outage
    /// shows stale-but-present data instead of a blank view.
    fn ingest_services(&mut self, listed: Result<Vec<ServiceView>>) -> ChangeSet<ServiceView> {
        match listed {
            Ok(list) => self.service_table.reconcile(list),
            Err(e) => {
                log::warn!("Service listing failed, keeping previous list: {e}");
                ChangeSet::default()
            }
        }
    }

    fn ingest_applications(
        &mut self,
        listed: Result<Vec<ApplicationView>>,
    ) -> ChangeSet<ApplicationView> {
        match listed {
            Ok(list) => self.application_table.reconcile(list),
            Err(e) => {
                log::warn!("Application listing failed, keeping previous list: {e}");
                ChangeSet::default()
            }
        }
    }

    pub fn process_table(&self) -> &ReconcilingMap<ProcessView> {
        &self.process_table
    }

    pub fn service_table(&self) -> &ReconcilingMap<ServiceView> {
        &self.service_table
    }

    pub fn application_table(&self) -> &ReconcilingMap<ApplicationView> {
        &self.application_table
    }
}

/// Commands the consumer can send to a running collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    SetInterval(Duration),
    Shutdown,
}

/// Background sampling thread. Snapshots flow out over a bounded channel;
/// control messages flow in. Pausing suppresses future ticks; a tick already
/// in flight completes and is delivered.
pub struct Collector {
    tx: flume::Sender<TickSnapshot>,
    control_rx: flume::Receiver<Control>,
    config: Config,
}

impl Collector {
    pub fn new(
        config: Config,
    ) -> (Self, flume::Receiver<TickSnapshot>, flume::Sender<Control>) {
        let (tx, rx) = flume::bounded(2);
        let (control_tx, control_rx) = flume::unbounded();
        (
            Self {
                tx,
                control_rx,
                config,
            },
            rx,
            control_tx,
        )
    }

    pub fn start(self) {
        thread::Builder::new()
            .name("collector".into())
            .spawn(move || {
                self.run();
            })
            .expect("Failed to spawn collector thread");
    }

    fn run(self) {
        let mut engine = SamplingEngine::new(self.config.tool_timeout());
        let mut interval = self.config.refresh_interval();
        let mut paused = self.config.start_paused;
        let mut control_open = true;

        // Initial collection to prime deltas
        let _ = engine.tick();

        loop {
            let mut msg = None;
            if paused {
                if !control_open {
                    log::info!("Paused with no controller, shutting down");
                    break;
                }
                match self.control_rx.recv() {
                    Ok(m) => msg = Some(m),
                    Err(_) => break,
                }
            } else if control_open {
                match self.control_rx.recv_timeout(interval) {
                    Ok(m) => msg = Some(m),
                    Err(flume::RecvTimeoutError::Timeout) => {}
                    Err(flume::RecvTimeoutError::Disconnected) => control_open = false,
                }
            } else {
                thread::sleep(interval);
            }

            if let Some(msg) = msg {
                match msg {
                    Control::Pause => {
                        paused = true;
                        continue;
                    }
                    Control::Resume => paused = false,
                    Control::SetInterval(d) => {
                        interval = d;
                        continue;
                    }
                    Control::Shutdown => break,
                }
            }

            if paused {
                continue;
            }

            let snapshot = engine.tick();
            if self.tx.send(snapshot).is_err() {
                log::info!("Collector channel closed, shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectError;

    fn service(name: &str, state: &str) -> ServiceView {
        ServiceView {
            name: name.to_string(),
            pid: None,
            description: String::new(),
            active_state: state.to_string(),
        }
    }

    #[test]
    fn failed_service_listing_keeps_previous_table() {
        let mut engine = SamplingEngine::new(Duration::from_secs(1));
        engine.ingest_services(Ok(vec![
            service("ssh.service", "active"),
            service("cups.service", "inactive"),
        ]));
        assert_eq!(engine.service_table().len(), 2);

        let changes =
            engine.ingest_services(Err(CollectError::external_tool("bus unavailable")));

        assert!(changes.is_empty());
        assert_eq!(engine.service_table().len(), 2);
        assert!(engine.service_table().contains(&"ssh.service".to_string()));
    }

    #[test]
    fn recovered_service_listing_reconciles_normally() {
        let mut engine = SamplingEngine::new(Duration::from_secs(1));
        engine.ingest_services(Ok(vec![service("a.service", "active")]));
        engine.ingest_services(Err(CollectError::external_tool("transient")));

        let changes = engine.ingest_services(Ok(vec![service("b.service", "active")]));

        assert_eq!(changes.inserted.len(), 1);
        assert_eq!(changes.removed, vec!["a.service".to_string()]);
        assert_eq!(engine.service_table().len(), 1);
    }

    #[test]
    fn failed_application_listing_keeps_previous_table() {
        let mut engine = SamplingEngine::new(Duration::from_secs(1));
        engine.ingest_applications(Ok(vec![ApplicationView {
            name: "firefox".to_string(),
            status: "Running".to_string(),
        }]));

        let changes =
            engine.ingest_applications(Err(CollectError::external_tool("no display")));

        assert!(changes.is_empty());
        assert_eq!(engine.application_table().len(), 1);
    }
}
