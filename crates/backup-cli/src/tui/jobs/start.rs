use super::*;

impl TuiApp {
    pub(in crate::tui) fn start_tool_check(&mut self) {
        let installer = self.services.installer();
        self.tasks.spawn("tool check", move || {
            TaskOutcome::ToolCheck(installer.check().map_err(|err| err.to_string()))
        });
    }

    pub(in crate::tui) fn start_tool_install(&mut self, upgrade: bool) {
        let installer = self.services.installer();
        info!(upgrade, "Installing rclone through Homebrew");
        self.tasks.spawn("tool install", move || {
            let result = if upgrade {
                installer.upgrade_rclone()
            } else {
                installer.install_rclone()
            };
            TaskOutcome::ToolInstall(result.map_err(|err| err.to_string()))
        });
    }

    pub(in crate::tui) fn start_remote_test(&mut self, remote: String) -> Result<(), String> {
        let client = self
            .services
            .rclone()
            .ok_or_else(|| "rclone not found. Run Install tools first.".to_string())?;
        self.tasks.spawn("remote test", move || {
            let result = client.test_remote(&remote).map_err(|err| err.to_string());
            TaskOutcome::RemoteTest { remote, result }
        });
        Ok(())
    }

    pub(in crate::tui) fn start_log_load(&mut self) {
        if let Screen::LogViewer(viewer) = &mut self.screen {
            viewer.loading = true;
        }
        let parser = self.services.log_parser();
        self.tasks.spawn("log load", move || {
            TaskOutcome::LogLoaded(parser.load().map_err(|err| err.to_string()))
        });
    }

    pub(in crate::tui) fn start_agent_status(&mut self) {
        if let Screen::LaunchdManager(screen) = &mut self.screen {
            screen.busy = true;
        }
        let launchd = self.services.launchd();
        self.tasks.spawn("agent status", move || {
            TaskOutcome::AgentStatus(launchd.status().map_err(|err| err.to_string()))
        });
    }

    pub(in crate::tui) fn start_agent_action(&mut self, action: AgentAction) {
        if let Screen::LaunchdManager(screen) = &mut self.screen {
            screen.busy = true;
            screen.message = Some(format!("{}...", action.progress_label()));
        }
        let launchd = self.services.launchd();
        let script = self.services.paths().backup_script();
        let log_dir = self.services.paths().log_dir();
        let schedule = self.services.config().schedule.clone();
        let name = action.label();
        self.tasks.spawn("agent action", move || {
            let result = match action {
                AgentAction::Install => launchd
                    .install(&script, &log_dir, &schedule)
                    .map(|plist| format!("Agent loaded from {}", plist.display())),
                AgentAction::Uninstall => launchd.uninstall().map(|removed| {
                    if removed {
                        "Agent unloaded and plist removed".to_string()
                    } else {
                        "No agent installed".to_string()
                    }
                }),
                AgentAction::Start => launchd.start().map(|()| "Agent started".to_string()),
                AgentAction::Stop => launchd.stop().map(|()| "Agent stopped".to_string()),
            };
            TaskOutcome::AgentAction {
                action: name,
                result: result.map_err(|err| err.to_string()),
            }
        });
    }
}
