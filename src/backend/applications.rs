use std::process::Command;
use std::time::Duration;

use crate::backend::services::run_with_timeout;
use crate::error::Result;
use crate::model::ApplicationView;

/// Session-type probe listing display-server clients. On an unrecognized
/// session the script emits one explanatory placeholder line instead of
/// failing, so the applications view is never blank.
const LIST_SCRIPT: &str = r#"
if [ "$XDG_SESSION_TYPE" = "x11" ]; then
    xlsclients | awk '{print $2}' | sort -u
elif [ "$XDG_SESSION_TYPE" = "wayland" ]; then
    x_apps=$(xlsclients 2>/dev/null | awk '{print $2}' | sort -u)
    w_apps=$(ps -eo pid,comm,args | grep -E 'wayland|Xwayland' | awk '{print $2}' | sort -u)
    echo -e "$x_apps\n$w_apps" | sort -u
else
    echo "Unknown display server"
fi
"#;

pub struct ApplicationsCollector {
    timeout: Duration,
}

impl ApplicationsCollector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn collect(&self) -> Result<Vec<ApplicationView>> {
        let mut cmd = Command::new("bash");
        cmd.args(["-c", LIST_SCRIPT]);
        let output = run_with_timeout(cmd, self.timeout)?;
        Ok(parse_app_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

pub fn parse_app_list(output: &str) -> Vec<ApplicationView> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| ApplicationView {
            name: line.to_string(),
            status: "Running".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_view_per_nonempty_line() {
        let apps = parse_app_list("firefox\n\nalacritty\n  \nnautilus\n");
        let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["firefox", "alacritty", "nautilus"]);
        assert!(apps.iter().all(|a| a.status == "Running"));
    }

    #[test]
    fn placeholder_line_becomes_a_single_row() {
        let apps = parse_app_list("Unknown display server\n");
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Unknown display server");
    }

    #[test]
    fn empty_output_yields_no_rows() {
        assert!(parse_app_list("").is_empty());
    }
}
