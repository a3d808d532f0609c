use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde::Deserialize;

use crate::error::{CollectError, Result};
use crate::model::ServiceView;

/// One unit record as emitted by `systemctl list-units --output=json`.
/// mainPID is absent for units without a running main process.
#[derive(Debug, Deserialize)]
struct UnitRecord {
    unit: String,
    #[serde(default, rename = "mainPID")]
    main_pid: Option<i32>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    active: String,
}

pub struct ServicesCollector {
    timeout: Duration,
}

impl ServicesCollector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// List all service units, including inactive ones. A failed or
    /// unparsable invocation is an error; the caller keeps its previous
    /// list so a transient outage never blanks the services view.
    pub fn collect(&self) -> Result<Vec<ServiceView>> {
        let mut cmd = Command::new("systemctl");
        cmd.args([
            "--user",
            "list-units",
            "--type=service",
            "--all",
            "--output=json",
        ]);
        let output = run_with_timeout(cmd, self.timeout)?;

        if !output.status.success() {
            return Err(CollectError::external_tool(format!(
                "systemctl list-units exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_unit_list(&output.stdout)
    }
}

/// Expects a top-level JSON array of unit objects; anything else is a
/// reportable failure.
pub fn parse_unit_list(raw: &[u8]) -> Result<Vec<ServiceView>> {
    let records: Vec<UnitRecord> = serde_json::from_slice(raw)
        .map_err(|e| CollectError::external_tool(format!("unexpected systemctl output: {e}")))?;

    Ok(records
        .into_iter()
        .map(|r| ServiceView {
            name: r.unit,
            pid: r.main_pid,
            description: r.description,
            active_state: r.active,
        })
        .collect())
}

/// Run an external command, killing it if it exceeds `timeout`. The child's
/// output is collected on a helper thread so a stalled tool cannot wedge the
/// sampling loop.
pub(crate) fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd
        .spawn()
        .map_err(|e| CollectError::external_tool(format!("failed to run {program}: {e}")))?;
    let child_pid = child.id() as i32;

    let (tx, rx) = flume::bounded(1);
    thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result
            .map_err(|e| CollectError::external_tool(format!("waiting on {program} failed: {e}"))),
        Err(_) => {
            let _ = signal::kill(Pid::from_raw(child_pid), Signal::SIGKILL);
            Err(CollectError::external_tool(format!(
                "{program} timed out after {timeout:?}"
            )))
        }
    }
}
