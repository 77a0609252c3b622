use super::*;
use crate::tui::draw::config_forms::schedule_wizard_lines;

impl TuiApp {
    pub(in crate::tui) fn draw_launchd(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let Screen::LaunchdManager(screen) = &self.screen else {
            return;
        };
        if let LaunchdMode::Schedule(wizard) = &screen.mode {
            let lines = schedule_wizard_lines(wizard);
            self.draw_text(frame, area, "Schedule Backup", lines, 0);
            return;
        }
        let launchd = self.services.launchd();
        let schedule = &self.services.config().schedule;
        let mut lines = vec![
            format!("Label:    {}", launchd.label()),
            format!("Plist:    {}", launchd.plist_path().display()),
            format!(
                "Schedule: daily at {} ({}){}",
                schedule.time_label(),
                if schedule.enabled { "enabled" } else { "disabled" },
                if schedule.run_at_load { ", runs at load" } else { "" }
            ),
            format!(
                "Status:   {}",
                match (&screen.status, screen.busy) {
                    (_, true) => "checking...".to_string(),
                    (Some(status), false) => status.summary(),
                    (None, false) => "unknown".to_string(),
                }
            ),
        ];
        if let Some(status) = &screen.status
            && let Some(code) = status.last_exit
        {
            lines.push(format!("Last exit: {code}"));
        }
        if let Some(message) = &screen.message {
            lines.push(String::new());
            lines.push(message.clone());
        }
        self.draw_text(frame, area, "Schedule (launchd)", lines, 0);
    }

    pub(in crate::tui) fn draw_maintenance(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let Screen::Maintenance(screen) = &self.screen else {
            return;
        };
        let lock = &screen.lock;
        let mut lines = vec![
            format!("Lock file: {}", self.services.paths().lock_file.display()),
            format!("  present: {}", yes_no(lock.present)),
        ];
        if lock.present {
            lines.push(format!(
                "  age:     {}",
                lock.age.map(format_age).unwrap_or_else(|| "-".to_string())
            ));
            lines.push(format!(
                "  stale:   {} (after {})",
                yes_no(lock.stale),
                format_age(DEFAULT_STALE_AFTER)
            ));
            if let Some(created) = &lock.created {
                lines.push(format!("  created: {created}"));
            }
        }
        if screen.show_paths {
            lines.push(String::new());
            lines.push("Resolved paths:".to_string());
            for (name, value) in self.services.paths().describe() {
                lines.push(format!("  {name:<18} {value}"));
            }
        }
        if let Some(message) = &screen.message {
            lines.push(String::new());
            lines.push(message.clone());
        }
        let scroll = self.draw_text(frame, area, "Maintenance", lines, screen.scroll);
        if let Screen::Maintenance(screen) = &mut self.screen {
            screen.scroll = scroll;
        }
    }

    pub(in crate::tui) fn draw_log_panel(
        &self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let max_lines = area.height.saturating_sub(LOG_PANEL_BORDER_HEIGHT) as usize;
        if max_lines == 0 {
            return;
        }
        let header = Line::from(Span::styled(
            "time     level module message",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let mut lines = Vec::new();
        lines.push(header);
        let entries = self
            .log_buffer
            .latest(max_lines.saturating_sub(LOG_HEADER_LINES));
        if entries.is_empty() {
            lines.push(Line::from(Span::raw("No log messages yet.")));
        }
        for entry in entries {
            let style = if entry.is_error() {
                Style::default().fg(Color::Red)
            } else if entry.is_warning() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(entry.panel_line(), style)));
        }
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Logs"));
        frame.render_widget(widget, area);
    }
}
