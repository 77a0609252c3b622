use super::*;

impl TuiApp {
    pub(in crate::tui) fn draw(&mut self, frame: &mut ratatui::Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(LOG_PANEL_HEIGHT),
                Constraint::Length(3),
            ])
            .split(frame.size());

        let header = Paragraph::new(self.header_text())
            .block(Block::default().borders(Borders::ALL).title("cloud-backup"));
        frame.render_widget(header, layout[0]);

        match self.screen {
            Screen::Main => self.draw_main(frame, layout[1]),
            Screen::Installation(_) => self.draw_install(frame, layout[1]),
            Screen::Configuration(_) => self.draw_config(frame, layout[1]),
            Screen::BackupRunning(_) => self.draw_backup(frame, layout[1]),
            Screen::LogViewer(_) => self.draw_logs(frame, layout[1]),
            Screen::LaunchdManager(_) => self.draw_launchd(frame, layout[1]),
            Screen::Maintenance(_) => self.draw_maintenance(frame, layout[1]),
            Screen::Help => self.draw_help(frame, layout[1]),
        }

        self.draw_log_panel(frame, layout[2]);

        let footer = Paragraph::new(self.footer_text())
            .block(Block::default().borders(Borders::ALL).title("Help"));
        frame.render_widget(footer, layout[3]);
    }

    pub(in crate::tui) fn header_text(&self) -> String {
        let config = self.services.config();
        let enabled = self.services.pairs().iter().filter(|pair| pair.enabled).count();
        let mut text = format!(
            "{} | remotes: {} | pairs: {}/{} enabled",
            self.screen.title(),
            config.remotes.len(),
            enabled,
            self.services.pairs().len()
        );
        if config.schedule.enabled {
            text.push_str(&format!(" | daily at {}", config.schedule.time_label()));
        }
        if self.tasks.pending() > 0 {
            text.push_str(" | working...");
        }
        text
    }

    pub(in crate::tui) fn footer_text(&self) -> String {
        match &self.screen {
            Screen::Main => "Up/Down: navigate | Enter or 1-8: open | q: quit".to_string(),
            Screen::Installation(wizard) => match wizard.step {
                InstallStep::Ready => "Enter: finish | u: upgrade rclone | Esc: back".to_string(),
                InstallStep::Installing | InstallStep::Checking if wizard.busy => {
                    "Working... | Esc: back".to_string()
                }
                _ => "Enter: continue | Esc: back".to_string(),
            },
            Screen::Configuration(screen) => match screen.mode {
                ConfigMode::Overview => {
                    "a: add remote | p: add pair | t: toggle | d: delete | g: write rclone.conf | v: test remote | Esc: back"
                        .to_string()
                }
                _ => "Enter: next | Tab/Arrows: change choice | Ctrl+C: clear | Esc: cancel"
                    .to_string(),
            },
            Screen::BackupRunning(screen) => {
                if screen.status.is_terminal() {
                    "Enter/Esc: back".to_string()
                } else {
                    "c: cancel backup | Esc: cancel and back".to_string()
                }
            }
            Screen::LogViewer(_) => {
                "Tab/1-5: mode | r: reload | Up/Down/PgUp/PgDn: scroll | Esc: back".to_string()
            }
            Screen::LaunchdManager(screen) => match screen.mode {
                LaunchdMode::Overview => {
                    "s: schedule | u: unload | r: run now | x: stop | l: refresh | Esc: back"
                        .to_string()
                }
                LaunchdMode::Schedule(_) => {
                    "Enter: next | Space: toggle | Ctrl+C: clear | Esc: cancel".to_string()
                }
            },
            Screen::Maintenance(_) => {
                "c: clear lock | g: write script | r: write rclone.conf | o: paths | l: refresh | Esc: back"
                    .to_string()
            }
            Screen::Help => "Up/Down/PgUp/PgDn: scroll | Esc: back".to_string(),
        }
    }

    /// Renders wrapped text lines and returns the scroll offset actually used.
    pub(in crate::tui) fn draw_text(
        &self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
        title: &str,
        lines: Vec<String>,
        scroll: usize,
    ) -> usize {
        let max_scroll = max_scroll_for_lines(lines.len(), area.height);
        let scroll = scroll.min(max_scroll);
        let lines: Vec<Line> = lines.into_iter().map(Line::from).collect();
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0))
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(widget, area);
        scroll
    }
}
