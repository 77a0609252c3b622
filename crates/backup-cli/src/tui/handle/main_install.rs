use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_main(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let len = MenuItem::ALL.len();
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up => {
                self.menu_index = if self.menu_index == 0 {
                    len - 1
                } else {
                    self.menu_index - 1
                };
            }
            KeyCode::Down => {
                self.menu_index = (self.menu_index + 1) % len;
            }
            KeyCode::Enter => {
                let item = MenuItem::ALL[clamp_index(self.menu_index, len)];
                return self.open_menu_item(item);
            }
            KeyCode::Char(ch) => {
                if let Some(item) = MenuItem::from_digit(ch) {
                    self.menu_index = MenuItem::ALL
                        .iter()
                        .position(|candidate| *candidate == item)
                        .unwrap_or(0);
                    return self.open_menu_item(item);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    pub(in crate::tui) fn handle_install(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let Screen::Installation(wizard) = &mut self.screen else {
            return Ok(false);
        };
        if wizard.busy {
            return Ok(false);
        }
        match (wizard.step, key.code) {
            (
                InstallStep::Welcome
                | InstallStep::Checking
                | InstallStep::HomebrewMissing
                | InstallStep::Installing,
                KeyCode::Enter,
            ) => {
                wizard.begin_check();
                self.start_tool_check();
            }
            (InstallStep::NeedsRclone, KeyCode::Enter) => {
                wizard.begin_install(false);
                self.start_tool_install(false);
            }
            (InstallStep::Ready, KeyCode::Char('u')) => {
                wizard.begin_install(true);
                self.start_tool_install(true);
            }
            (InstallStep::Ready, KeyCode::Enter) => {
                wizard.step = InstallStep::Complete;
            }
            (InstallStep::Complete, KeyCode::Enter) => self.go_main(),
            _ => {}
        }
        Ok(false)
    }
}
