use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_launchd(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let Screen::LaunchdManager(screen) = &mut self.screen else {
            return Ok(false);
        };
        match &mut screen.mode {
            LaunchdMode::Schedule(wizard) => {
                if key.code == KeyCode::Esc {
                    screen.mode = LaunchdMode::Overview;
                    return Ok(false);
                }
                if let Advance::Finished(schedule) = wizard.handle_key(key) {
                    let time = schedule.time_label();
                    match self.services.prepare_schedule(schedule) {
                        Ok(script) => {
                            info!(time = %time, script = %script.display(), "Schedule saved");
                            screen.mode = LaunchdMode::Overview;
                            self.start_agent_action(AgentAction::Install);
                        }
                        Err(err) => {
                            error!(error = %err, "Saving schedule failed");
                            wizard.step = ScheduleStep::Confirm;
                            wizard.error = Some(err.to_string());
                        }
                    }
                }
            }
            LaunchdMode::Overview => {
                if screen.busy {
                    return Ok(false);
                }
                match key.code {
                    KeyCode::Char('s') => {
                        screen.message = None;
                        screen.mode = LaunchdMode::Schedule(ScheduleWizard::new(
                            &self.services.config().schedule,
                        ));
                    }
                    KeyCode::Char('u') => {
                        let schedule = ScheduleSettings {
                            enabled: false,
                            ..self.services.config().schedule.clone()
                        };
                        if let Err(err) = self.services.persist_schedule(schedule) {
                            warn!(error = %err, "Saving disabled schedule failed");
                        }
                        self.start_agent_action(AgentAction::Uninstall);
                    }
                    KeyCode::Char('r') => self.start_agent_action(AgentAction::Start),
                    KeyCode::Char('x') => self.start_agent_action(AgentAction::Stop),
                    KeyCode::Char('l') => self.start_agent_status(),
                    _ => {}
                }
            }
        }
        Ok(false)
    }

    pub(in crate::tui) fn handle_maintenance(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let Screen::Maintenance(screen) = &mut self.screen else {
            return Ok(false);
        };
        let lock = self.services.lock();
        match key.code {
            KeyCode::Char('c') => {
                if screen.lock.present && !screen.lock.stale {
                    warn!(path = %lock.path().display(), "Clearing a fresh lock file");
                }
                screen.message = Some(match lock.remove() {
                    Ok(true) => "Lock file removed.".to_string(),
                    Ok(false) => "No lock file present.".to_string(),
                    Err(err) => format!("Removing lock failed: {err}"),
                });
                screen.lock = lock.snapshot(DEFAULT_STALE_AFTER);
            }
            KeyCode::Char('g') => {
                screen.message = Some(match self.services.write_backup_script() {
                    Ok(path) => format!("Backup script written to {}", path.display()),
                    Err(err) => format!("Writing backup script failed: {err}"),
                });
            }
            KeyCode::Char('r') => {
                screen.message = Some(match self.services.regenerate_rclone_conf() {
                    Ok(path) => format!("Wrote {}", path.display()),
                    Err(err) => format!("Writing rclone.conf failed: {err}"),
                });
            }
            KeyCode::Char('o') => {
                screen.show_paths = !screen.show_paths;
                screen.scroll = 0;
            }
            KeyCode::Char('l') => {
                screen.lock = lock.snapshot(DEFAULT_STALE_AFTER);
            }
            code => {
                if let Some(scroll) = scroll_for_key(code, screen.scroll) {
                    screen.scroll = scroll;
                }
            }
        }
        Ok(false)
    }

    pub(in crate::tui) fn handle_help(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if let Some(scroll) = scroll_for_key(key.code, self.help_scroll) {
            self.help_scroll = scroll;
        }
        Ok(false)
    }
}
