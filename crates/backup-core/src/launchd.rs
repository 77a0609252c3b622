use crate::config::ScheduleSettings;
use crate::exec::{SharedRunner, run_checked, to_args};
use crate::paths::APP_NAME;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentStatus {
    pub installed: bool,
    pub loaded: bool,
    pub pid: Option<u32>,
    pub last_exit: Option<i32>,
}

impl AgentStatus {
    pub fn summary(&self) -> String {
        if !self.installed {
            return "not installed".to_string();
        }
        if !self.loaded {
            return "installed, not loaded".to_string();
        }
        match (self.pid, self.last_exit) {
            (Some(pid), _) => format!("running (pid {pid})"),
            (None, Some(0)) | (None, None) => "loaded, idle".to_string(),
            (None, Some(code)) => format!("loaded, last exit {code}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub pid: Option<u32>,
    pub status: Option<i32>,
    pub label: String,
}

#[derive(Clone)]
pub struct LaunchdManager {
    runner: SharedRunner,
    label: String,
    agents_dir: PathBuf,
}

pub fn current_user() -> String {
    std::env::var("USER")
        .ok()
        .map(|user| user.trim().to_string())
        .filter(|user| !user.is_empty())
        .unwrap_or_else(|| "user".to_string())
}

pub fn default_label() -> String {
    label_for(&current_user())
}

pub fn label_for(user: &str) -> String {
    format!("com.{user}.{APP_NAME}")
}

impl LaunchdManager {
    pub fn new(runner: SharedRunner, label: &str, agents_dir: &Path) -> Self {
        Self {
            runner,
            label: label.to_string(),
            agents_dir: agents_dir.to_path_buf(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn plist_path(&self) -> PathBuf {
        self.agents_dir.join(format!("{}.plist", self.label))
    }

    fn launchctl(&self) -> PathBuf {
        self.runner
            .look_path("launchctl")
            .unwrap_or_else(|| PathBuf::from("/bin/launchctl"))
    }

    fn launchctl_run(&self, action: &str, args: Vec<String>) -> anyhow::Result<String> {
        let output = run_checked(
            self.runner.as_ref(),
            "launchctl",
            action,
            &self.launchctl(),
            &args,
        )?;
        Ok(output.stdout)
    }

    pub fn install(
        &self,
        script: &Path,
        log_dir: &Path,
        schedule: &ScheduleSettings,
    ) -> anyhow::Result<PathBuf> {
        schedule.validate()?;
        let plist_path = self.plist_path();
        fs::create_dir_all(&self.agents_dir).context("create launch agents dir")?;
        fs::create_dir_all(log_dir).context("create launchd log dir")?;
        let plist = plist_contents(&self.label, script, log_dir, schedule);
        fs::write(&plist_path, plist).context("write launchd plist")?;
        let target = plist_path.to_string_lossy().into_owned();
        if let Err(err) = self.launchctl_run("unload agent", to_args(["unload", target.as_str()])) {
            warn!(error = %err, "Unloading previous agent failed");
        }
        self.launchctl_run("load agent", to_args(["load", "-w", target.as_str()]))?;
        info!(
            label = %self.label,
            time = %schedule.time_label(),
            run_at_load = schedule.run_at_load,
            "Installed launchd agent"
        );
        Ok(plist_path)
    }

    pub fn uninstall(&self) -> anyhow::Result<bool> {
        let plist_path = self.plist_path();
        if !plist_path.exists() {
            return Ok(false);
        }
        let target = plist_path.to_string_lossy().into_owned();
        if let Err(err) =
            self.launchctl_run("unload agent", to_args(["unload", "-w", target.as_str()]))
        {
            warn!(error = %err, "Unloading agent failed");
        }
        fs::remove_file(&plist_path).context("remove launchd plist")?;
        info!(label = %self.label, "Removed launchd agent");
        Ok(true)
    }

    pub fn start(&self) -> anyhow::Result<()> {
        self.launchctl_run("start agent", to_args(["start", self.label.as_str()]))?;
        info!(label = %self.label, "Started launchd agent");
        Ok(())
    }

    pub fn stop(&self) -> anyhow::Result<()> {
        self.launchctl_run("stop agent", to_args(["stop", self.label.as_str()]))?;
        info!(label = %self.label, "Stopped launchd agent");
        Ok(())
    }

    pub fn status(&self) -> anyhow::Result<AgentStatus> {
        let installed = self.plist_path().exists();
        let stdout = self.launchctl_run("list agents", to_args(["list"]))?;
        let entry = parse_list_output(&stdout)
            .into_iter()
            .find(|entry| entry.label == self.label);
        Ok(AgentStatus {
            installed,
            loaded: entry.is_some(),
            pid: entry.as_ref().and_then(|entry| entry.pid),
            last_exit: entry.and_then(|entry| entry.status),
        })
    }
}

pub fn parse_list_output(stdout: &str) -> Vec<ListEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid = fields.next()?;
            let status = fields.next()?;
            let label = fields.next()?;
            if pid == "PID" {
                return None;
            }
            Some(ListEntry {
                pid: pid.parse().ok(),
                status: status.parse().ok(),
                label: label.to_string(),
            })
        })
        .collect()
}

pub fn plist_contents(
    label: &str,
    script: &Path,
    log_dir: &Path,
    schedule: &ScheduleSettings,
) -> String {
    let stdout = log_dir.join("launchd.out.log");
    let stderr = log_dir.join("launchd.err.log");
    let run_at_load = if schedule.run_at_load { "<true/>" } else { "<false/>" };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{label}</string>
  <key>ProgramArguments</key>
  <array>
    <string>/bin/bash</string>
    <string>{script}</string>
  </array>
  <key>StartCalendarInterval</key>
  <dict>
    <key>Hour</key>
    <integer>{hour}</integer>
    <key>Minute</key>
    <integer>{minute}</integer>
  </dict>
  <key>RunAtLoad</key>
  {run_at_load}
  <key>StandardOutPath</key>
  <string>{stdout}</string>
  <key>StandardErrorPath</key>
  <string>{stderr}</string>
</dict>
</plist>
"#,
        label = xml_escape(label),
        script = xml_escape(&script.to_string_lossy()),
        hour = schedule.hour,
        minute = schedule.minute,
        stdout = xml_escape(&stdout.to_string_lossy()),
        stderr = xml_escape(&stderr.to_string_lossy()),
    )
}

pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
