use super::*;

impl TuiApp {
    pub(in crate::tui) fn draw_backup(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let Screen::BackupRunning(screen) = &self.screen else {
            return;
        };
        let mut lines = vec![
            format!("Status: {}", screen.status.label()),
            format!("Elapsed: {}s", screen.started.elapsed().as_secs()),
            String::new(),
        ];
        if screen.handle.is_some() || screen.summary.is_some() {
            lines.extend(progress_lines(&screen.progress));
        }
        if let Some(summary) = &screen.summary {
            lines.push(String::new());
            lines.push(format!(
                "Pairs: {} run, {} failed | Files: {} | Transferred: {} | Took {}s",
                summary.pairs_run,
                summary.pairs_failed,
                summary.files_transferred,
                format_bytes(summary.bytes_transferred),
                summary.elapsed.as_secs()
            ));
            for failure in &summary.failures {
                lines.push(format!("  {failure}"));
            }
        }
        if let Some(message) = &screen.message {
            lines.push(String::new());
            lines.push(message.clone());
        }
        self.draw_text(frame, area, "Backup", lines, 0);
    }

    pub(in crate::tui) fn draw_logs(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let Screen::LogViewer(viewer) = &self.screen else {
            return;
        };
        let modes: Vec<&str> = LogMode::ALL.iter().map(|mode| mode.label()).collect();
        let index = LogMode::ALL
            .iter()
            .position(|mode| *mode == viewer.mode)
            .unwrap_or(0);
        let mut lines = vec![selector_line("Mode", &modes, index)];
        if let Some(err) = &viewer.error {
            lines.push(format!("Error: {err}"));
        }
        match &viewer.log {
            Some(log) => lines.extend(render_log(log, viewer.mode, local_now().date())),
            None if viewer.loading => lines.push("Loading...".to_string()),
            None => lines.push("No log loaded.".to_string()),
        }
        let title = format!(
            "Logs: {}",
            self.services.paths().log_file.display()
        );
        let scroll = self.draw_text(frame, area, &title, lines, viewer.scroll);
        if let Screen::LogViewer(viewer) = &mut self.screen {
            viewer.scroll = scroll;
        }
    }
}
