use super::*;

impl TuiApp {
    pub(in crate::tui) fn draw_config(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let Screen::Configuration(screen) = &self.screen else {
            return;
        };
        match &screen.mode {
            ConfigMode::AddRemote(wizard) => {
                let lines = remote_wizard_lines(wizard);
                self.draw_text(frame, area, "Add Remote", lines, 0);
                return;
            }
            ConfigMode::AddPair(wizard) => {
                let lines = pair_wizard_lines(wizard);
                self.draw_text(frame, area, "Add Sync Pair", lines, 0);
                return;
            }
            ConfigMode::Overview => {}
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(4)])
            .split(area);

        let mut rows = Vec::new();
        for item in ConfigScreen::items(&self.services) {
            rows.push(match item {
                ConfigItem::Remote(name) => {
                    let kind = self
                        .services
                        .config()
                        .remote(&name)
                        .map(|remote| remote.kind.label())
                        .unwrap_or("?");
                    format!("remote  {name:<16} {kind}")
                }
                ConfigItem::Pair(name) => {
                    let summary = self
                        .services
                        .pairs()
                        .iter()
                        .find(|pair| pair.name == name)
                        .map(|pair| {
                            let state = if pair.enabled { "on " } else { "off" };
                            format!("{state} {}", pair.summary())
                        })
                        .unwrap_or_default();
                    format!("pair    {name:<16} {summary}")
                }
            });
        }
        let selected = clamp_index(screen.selected, rows.len());
        let body_height = layout[0].height.saturating_sub(2) as usize;
        let scroll = adjust_scroll(selected, screen.scroll, body_height, rows.len());
        let visible = slice_with_scroll(&rows, scroll, body_height);
        let items: Vec<ListItem> = if rows.is_empty() {
            vec![ListItem::new(Line::from(Span::raw(
                "No remotes or sync pairs yet. Press a to add a remote.",
            )))]
        } else {
            visible
                .into_iter()
                .enumerate()
                .map(|(offset, row)| {
                    let mut line = Line::from(Span::raw(row));
                    if scroll + offset == selected {
                        line = line.style(Style::default().add_modifier(Modifier::BOLD));
                    }
                    ListItem::new(line)
                })
                .collect()
        };
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Remotes & Sync Pairs"),
        );
        frame.render_widget(list, layout[0]);

        let message = screen.message.clone().unwrap_or_default();
        self.draw_text(frame, layout[1], "Status", vec![message], 0);

        if let Screen::Configuration(screen) = &mut self.screen {
            screen.selected = selected;
            screen.scroll = scroll;
        }
    }
}

fn field_line(field: &InputField, active: bool) -> String {
    let marker = if active { ">" } else { " " };
    format!("{marker} {}: {}", field.label, field.display_value())
}

fn error_lines(lines: &mut Vec<String>, error: &Option<String>) {
    if let Some(err) = error {
        lines.push(String::new());
        lines.push(format!("Error: {err}"));
    }
}

pub(in crate::tui) fn remote_wizard_lines(wizard: &RemoteWizard) -> Vec<String> {
    let kinds: Vec<&str> = RemoteKind::ALL.iter().map(|kind| kind.label()).collect();
    let mut lines = Vec::new();
    match wizard.step {
        RemoteStep::Name => {
            lines.push("Step 1/4: name the remote (letters, digits, - and _).".to_string());
            lines.push(field_line(&wizard.name, true));
        }
        RemoteStep::Kind => {
            lines.push("Step 2/4: choose the storage provider.".to_string());
            lines.push(selector_line("Type", &kinds, wizard.kind_index));
        }
        RemoteStep::Credentials => {
            lines.push(format!(
                "Step 3/4: {} credentials.",
                wizard.kind().label()
            ));
            for (idx, field) in wizard.fields.iter().enumerate() {
                lines.push(field_line(field, idx == wizard.field_index));
            }
        }
        RemoteStep::Confirm | RemoteStep::Complete => {
            lines.push("Step 4/4: confirm. Press Enter to save.".to_string());
            lines.push(format!("Name: {}", wizard.name.trimmed()));
            lines.push(format!("Type: {}", wizard.kind().label()));
            for field in &wizard.fields {
                if !field.trimmed().is_empty() {
                    lines.push(format!("{}: {}", field.label, field.display_value()));
                }
            }
        }
    }
    error_lines(&mut lines, &wizard.error);
    lines
}

pub(in crate::tui) fn pair_wizard_lines(wizard: &PairWizard) -> Vec<String> {
    let directions: Vec<&str> = SyncDirection::ALL
        .iter()
        .map(|direction| direction.as_str())
        .collect();
    let remotes: Vec<&str> = wizard.remotes.iter().map(String::as_str).collect();
    let mut lines = Vec::new();
    match wizard.step {
        PairStep::Name => {
            lines.push("Step 1/6: name the sync pair.".to_string());
            lines.push(field_line(&wizard.name, true));
        }
        PairStep::LocalPath => {
            lines.push("Step 2/6: local folder (~ expands to your home).".to_string());
            lines.push(field_line(&wizard.local_path, true));
        }
        PairStep::Remote => {
            lines.push("Step 3/6: choose the remote.".to_string());
            lines.push(selector_line("Remote", &remotes, wizard.remote_index));
        }
        PairStep::RemotePath => {
            lines.push("Step 4/6: path on the remote.".to_string());
            lines.push(field_line(&wizard.remote_path, true));
        }
        PairStep::Direction => {
            lines.push("Step 5/6: sync direction.".to_string());
            lines.push(selector_line(
                "Direction",
                &directions,
                wizard.direction_index,
            ));
        }
        PairStep::Confirm | PairStep::Complete => {
            lines.push("Step 6/6: confirm. Press Enter to save.".to_string());
            lines.push(wizard.build().summary());
        }
    }
    error_lines(&mut lines, &wizard.error);
    lines
}

pub(in crate::tui) fn schedule_wizard_lines(wizard: &ScheduleWizard) -> Vec<String> {
    let mut lines = Vec::new();
    match wizard.step {
        ScheduleStep::Hour => {
            lines.push("Step 1/3: hour of the daily backup.".to_string());
            lines.push(field_line(&wizard.hour, true));
        }
        ScheduleStep::Minute => {
            lines.push("Step 2/3: minute of the daily backup.".to_string());
            lines.push(field_line(&wizard.minute, true));
        }
        ScheduleStep::RunAtLoad => {
            lines.push("Step 3/3: also run when the agent loads (login)?".to_string());
            lines.push(selector_line(
                "Run at load",
                &["no", "yes"],
                usize::from(wizard.run_at_load),
            ));
        }
        ScheduleStep::Confirm | ScheduleStep::Complete => {
            let schedule = wizard.schedule();
            lines.push("Confirm. Press Enter to save and load the agent.".to_string());
            lines.push(format!("Daily at {}", schedule.time_label()));
            lines.push(format!("Run at load: {}", yes_no(schedule.run_at_load)));
        }
    }
    error_lines(&mut lines, &wizard.error);
    lines
}
