use super::*;

impl TuiApp {
    pub(in crate::tui) fn poll_tasks(&mut self) -> anyhow::Result<()> {
        for outcome in self.tasks.drain() {
            self.apply_outcome(outcome);
        }
        Ok(())
    }

    fn apply_outcome(&mut self, outcome: TaskOutcome) {
        let mut refresh_agent = false;
        match (outcome, &mut self.screen) {
            (TaskOutcome::ToolCheck(result), Screen::Installation(wizard)) => {
                if let Err(err) = &result {
                    warn!(error = %err, "Tool check failed");
                }
                wizard.checked(result);
            }
            (TaskOutcome::ToolInstall(result), Screen::Installation(wizard)) => {
                match &result {
                    Ok(version) => info!(version = %version, "rclone installed"),
                    Err(err) => error!(error = %err, "rclone install failed"),
                }
                wizard.installed(result);
            }
            (TaskOutcome::RemoteTest { remote, result }, Screen::Configuration(screen)) => {
                screen.testing = None;
                screen.message = Some(match result {
                    Ok(dirs) => {
                        info!(remote = %remote, dirs = dirs.len(), "Remote test succeeded");
                        let preview: Vec<&str> =
                            dirs.iter().take(5).map(String::as_str).collect();
                        if preview.is_empty() {
                            format!("Remote '{remote}' is reachable (no folders).")
                        } else {
                            format!(
                                "Remote '{remote}' is reachable: {} folder(s) [{}]",
                                dirs.len(),
                                preview.join(", ")
                            )
                        }
                    }
                    Err(err) => {
                        warn!(remote = %remote, error = %err, "Remote test failed");
                        format!("Remote '{remote}' test failed: {err}")
                    }
                });
            }
            (TaskOutcome::LogLoaded(result), Screen::LogViewer(viewer)) => {
                if let Err(err) = &result {
                    warn!(error = %err, "Loading backup log failed");
                }
                viewer.loaded(result);
            }
            (TaskOutcome::AgentStatus(result), Screen::LaunchdManager(screen)) => {
                screen.busy = false;
                match result {
                    Ok(status) => screen.status = Some(status),
                    Err(err) => {
                        warn!(error = %err, "launchctl status failed");
                        screen.message = Some(format!("Status check failed: {err}"));
                    }
                }
            }
            (TaskOutcome::AgentAction { action, result }, Screen::LaunchdManager(screen)) => {
                screen.busy = false;
                screen.message = Some(match result {
                    Ok(message) => {
                        info!(action, "launchd action finished");
                        message
                    }
                    Err(err) => {
                        error!(action, error = %err, "launchd action failed");
                        format!("Agent {action} failed: {err}")
                    }
                });
                refresh_agent = true;
            }
            (outcome, _) => {
                debug!(task = outcome.name(), "Task result does not match the active screen");
            }
        }
        if refresh_agent {
            self.start_agent_status();
        }
    }

    pub(in crate::tui) fn poll_backup_events(&mut self) -> anyhow::Result<()> {
        let Screen::BackupRunning(screen) = &mut self.screen else {
            return Ok(());
        };
        let Some(rx) = screen.events.take() else {
            return Ok(());
        };
        let mut done = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, BackupEvent::Finished(_)) {
                done = true;
            }
            screen.apply(event);
        }
        if done {
            info!(status = %screen.status, "Backup finished");
            if let Some(handle) = screen.handle.take() {
                handle.join();
            }
        } else {
            screen.events = Some(rx);
        }
        Ok(())
    }
}
