use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_backup(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let Screen::BackupRunning(screen) = &mut self.screen else {
            return Ok(false);
        };
        match key.code {
            KeyCode::Char('c') => {
                if screen.request_cancel() {
                    info!("Backup cancellation requested");
                }
            }
            KeyCode::Enter if screen.status.is_terminal() => self.go_main(),
            _ => {}
        }
        Ok(false)
    }

    pub(in crate::tui) fn handle_logs(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let Screen::LogViewer(viewer) = &mut self.screen else {
            return Ok(false);
        };
        let mut reload = false;
        match key.code {
            KeyCode::Tab => {
                viewer.switch(viewer.mode.next());
                reload = true;
            }
            KeyCode::Char(ch @ '1'..='5') => {
                if let Some(mode) = LogMode::from_digit(ch) {
                    viewer.switch(mode);
                    reload = true;
                }
            }
            KeyCode::Char('r') => reload = true,
            code => {
                if let Some(scroll) = scroll_for_key(code, viewer.scroll) {
                    viewer.scroll = scroll;
                }
            }
        }
        if reload {
            self.start_log_load();
        }
        Ok(false)
    }
}
