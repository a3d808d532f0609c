//! End-to-end run of the sampling engine against the real /proc tree.

#![cfg(target_os = "linux")]

use std::time::Duration;

use taskmon::backend::cpu;
use taskmon::backend::SamplingEngine;

#[test]
fn two_ticks_against_live_proc() {
    let mut engine = SamplingEngine::new(Duration::from_secs(5));

    let first = engine.tick();
    assert!(first.process_count > 0);
    // no baseline yet
    assert_eq!(first.cpu.total_percent, 0.0);
    assert!(first.memory.total_kb > 0);
    assert!(first.memory.used_kb <= first.memory.total_kb);
    assert_eq!(first.cpu_history.len(), 1);
    // everything is new on the first tick
    assert_eq!(first.processes.inserted.len(), first.process_count);
    assert!(first.processes.removed.is_empty());

    std::thread::sleep(Duration::from_millis(200));

    let second = engine.tick();
    assert!((0.0..=100.0).contains(&second.cpu.total_percent));
    for percent in &second.cpu.per_core_percent {
        assert!((0.0..=100.0).contains(percent));
    }
    assert_eq!(second.cpu.per_core_percent.len(), second.cpu.core_count);
    assert_eq!(second.cpu_history.len(), 2);
    // this test process survived between ticks, so updates are non-empty
    assert!(!second.processes.updated.is_empty());

    let own_pid = std::process::id() as i32;
    let own = engine
        .process_table()
        .get(&own_pid)
        .expect("own pid present in process table");
    assert!(own.memory_kb > 0);
    assert!(!own.user.is_empty());
}

#[test]
fn uptime_and_cores_are_sane() {
    assert!(cpu::uptime_secs().unwrap() > 0.0);
    assert!(cpu::num_cores() >= 1);
    assert!(cpu::ticks_per_second() > 0);
    assert!(cpu::page_size_kb() > 0);
}
