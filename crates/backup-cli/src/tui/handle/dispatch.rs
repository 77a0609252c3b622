use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        if key.code == KeyCode::Esc
            && !matches!(self.screen, Screen::Main)
            && !self.screen.in_nested_mode()
        {
            self.go_main();
            return Ok(false);
        }
        match self.screen {
            Screen::Main => self.handle_main(key),
            Screen::Installation(_) => self.handle_install(key),
            Screen::Configuration(_) => self.handle_config(key),
            Screen::BackupRunning(_) => self.handle_backup(key),
            Screen::LogViewer(_) => self.handle_logs(key),
            Screen::LaunchdManager(_) => self.handle_launchd(key),
            Screen::Maintenance(_) => self.handle_maintenance(key),
            Screen::Help => self.handle_help(key),
        }
    }

    pub(in crate::tui) fn handle_mouse(&mut self, mouse: MouseEvent) -> anyhow::Result<()> {
        let code = match mouse.kind {
            MouseEventKind::ScrollUp => KeyCode::Up,
            MouseEventKind::ScrollDown => KeyCode::Down,
            _ => return Ok(()),
        };
        self.handle_key(KeyEvent::new(code, KeyModifiers::empty()))?;
        Ok(())
    }
}
