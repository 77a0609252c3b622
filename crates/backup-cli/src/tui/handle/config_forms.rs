use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_config(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let Screen::Configuration(screen) = &mut self.screen else {
            return Ok(false);
        };
        match &mut screen.mode {
            ConfigMode::AddRemote(wizard) => {
                if key.code == KeyCode::Esc {
                    screen.mode = ConfigMode::Overview;
                    return Ok(false);
                }
                if let Advance::Finished(remote) = wizard.handle_key(key) {
                    let name = remote.name.clone();
                    match self.services.add_remote(remote) {
                        Ok(()) => {
                            screen.mode = ConfigMode::Overview;
                            screen.message =
                                Some(format!("Remote '{name}' added; rclone.conf regenerated."));
                        }
                        Err(err) => {
                            error!(remote = %name, error = %err, "Adding remote failed");
                            wizard.step = RemoteStep::Confirm;
                            wizard.error = Some(err.to_string());
                        }
                    }
                }
            }
            ConfigMode::AddPair(wizard) => {
                if key.code == KeyCode::Esc {
                    screen.mode = ConfigMode::Overview;
                    return Ok(false);
                }
                if let Advance::Finished(pair) = wizard.handle_key(key) {
                    let name = pair.name.clone();
                    match self.services.add_pair(pair) {
                        Ok(()) => {
                            screen.mode = ConfigMode::Overview;
                            screen.message = Some(format!("Sync pair '{name}' added."));
                        }
                        Err(err) => {
                            error!(pair = %name, error = %err, "Adding sync pair failed");
                            wizard.step = PairStep::Confirm;
                            wizard.error = Some(err.to_string());
                        }
                    }
                }
            }
            ConfigMode::Overview => {
                let items = ConfigScreen::items(&self.services);
                let selected = items.get(screen.selected).cloned();
                match key.code {
                    KeyCode::Up => {
                        screen.selected = screen.selected.saturating_sub(1);
                    }
                    KeyCode::Down => {
                        screen.selected = clamp_index(screen.selected + 1, items.len());
                    }
                    KeyCode::Char('a') => {
                        screen.message = None;
                        screen.mode = ConfigMode::AddRemote(RemoteWizard::new(
                            self.services.config().remote_names(),
                        ));
                    }
                    KeyCode::Char('p') => {
                        let remotes = self.services.config().remote_names();
                        if remotes.is_empty() {
                            screen.message =
                                Some("Add a remote first (press a).".to_string());
                        } else {
                            let existing = self
                                .services
                                .pairs()
                                .iter()
                                .map(|pair| pair.name.clone())
                                .collect();
                            screen.message = None;
                            screen.mode = ConfigMode::AddPair(PairWizard::new(
                                remotes,
                                existing,
                                self.services.paths().home_dir.clone(),
                            ));
                        }
                    }
                    KeyCode::Char('t') => {
                        screen.message = Some(match selected {
                            Some(ConfigItem::Pair(name)) => {
                                match self.services.toggle_pair(&name) {
                                    Ok(true) => format!("Sync pair '{name}' enabled."),
                                    Ok(false) => format!("Sync pair '{name}' disabled."),
                                    Err(err) => format!("Toggle failed: {err}"),
                                }
                            }
                            _ => "Select a sync pair to toggle.".to_string(),
                        });
                    }
                    KeyCode::Char('d') => {
                        let result = match &selected {
                            Some(ConfigItem::Remote(name)) => self
                                .services
                                .remove_remote(name)
                                .map(|()| format!("Remote '{name}' removed; rclone.conf regenerated.")),
                            Some(ConfigItem::Pair(name)) => self
                                .services
                                .remove_pair(name)
                                .map(|_| format!("Sync pair '{name}' removed.")),
                            None => Ok("Nothing selected.".to_string()),
                        };
                        screen.message = Some(match result {
                            Ok(message) => message,
                            Err(err) => {
                                warn!(error = %err, "Delete failed");
                                format!("Delete failed: {err}")
                            }
                        });
                        let len = ConfigScreen::items(&self.services).len();
                        screen.selected = clamp_index(screen.selected, len);
                    }
                    KeyCode::Char('g') => {
                        screen.message = Some(match self.services.regenerate_rclone_conf() {
                            Ok(path) => format!("Wrote {}", path.display()),
                            Err(err) => format!("Writing rclone.conf failed: {err}"),
                        });
                    }
                    KeyCode::Char('v') => match selected {
                        Some(ConfigItem::Remote(name)) => {
                            if screen.testing.is_some() {
                                return Ok(false);
                            }
                            screen.testing = Some(name.clone());
                            screen.message = Some(format!("Testing remote '{name}'..."));
                            if let Err(err) = self.start_remote_test(name)
                                && let Screen::Configuration(screen) = &mut self.screen
                            {
                                screen.testing = None;
                                screen.message = Some(err);
                            }
                        }
                        _ => {
                            screen.message = Some("Select a remote to test.".to_string());
                        }
                    },
                    _ => {}
                }
            }
        }
        Ok(false)
    }
}
