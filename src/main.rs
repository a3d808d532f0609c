use taskmon::backend::Collector;
use taskmon::config::Config;

fn main() {
    env_logger::init();

    let config = Config::load();
    let (collector, snapshots, _control) = Collector::new(config);
    collector.start();

    for snapshot in snapshots.iter() {
        println!(
            "Processes: {} | CPU Usage: {:.0}% | RAM Usage: {} kB",
            snapshot.process_count, snapshot.cpu.total_percent, snapshot.memory.used_kb
        );
        log::debug!(
            "processes +{}/~{}/-{} | services +{}/~{}/-{} | applications +{}/~{}/-{}",
            snapshot.processes.inserted.len(),
            snapshot.processes.updated.len(),
            snapshot.processes.removed.len(),
            snapshot.services.inserted.len(),
            snapshot.services.updated.len(),
            snapshot.services.removed.len(),
            snapshot.applications.inserted.len(),
            snapshot.applications.updated.len(),
            snapshot.applications.removed.len(),
        );
    }
}
