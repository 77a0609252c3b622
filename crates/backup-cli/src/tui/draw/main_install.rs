use super::*;

impl TuiApp {
    pub(in crate::tui) fn draw_main(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let items: Vec<ListItem> = MenuItem::ALL
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let mut line = Line::from(Span::raw(format!("{}. {}", idx + 1, item.label())));
                if idx == self.menu_index {
                    line = line.style(Style::default().add_modifier(Modifier::BOLD));
                }
                ListItem::new(line)
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(self.screen.title()),
        );
        frame.render_widget(list, area);
    }

    pub(in crate::tui) fn draw_install(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let Screen::Installation(wizard) = &self.screen else {
            return;
        };
        let mut lines = Vec::new();
        match wizard.step {
            InstallStep::Welcome => {
                lines.push("This wizard checks for Homebrew and rclone.".to_string());
                lines.push("rclone is installed through Homebrew when missing.".to_string());
                lines.push(String::new());
                lines.push("Press Enter to check installed tools.".to_string());
            }
            InstallStep::Checking => {
                lines.push("Checking installed tools...".to_string());
            }
            InstallStep::HomebrewMissing => {
                lines.push("Homebrew was not found.".to_string());
                lines.push("Install it from https://brew.sh, then press Enter to check again."
                    .to_string());
            }
            InstallStep::NeedsRclone => {
                lines.push("rclone is not installed.".to_string());
                lines.push("Press Enter to run `brew install rclone`.".to_string());
            }
            InstallStep::Ready => {
                lines.push("All tools are installed.".to_string());
                lines.push("Press Enter to finish or u to upgrade rclone.".to_string());
            }
            InstallStep::Installing => {
                let verb = if wizard.upgrading { "upgrade" } else { "install" };
                if wizard.busy {
                    lines.push(format!("Running `brew {verb} rclone`..."));
                    lines.push("This can take a few minutes.".to_string());
                } else {
                    lines.push(format!("`brew {verb} rclone` did not complete."));
                }
            }
            InstallStep::Complete => {
                lines.push(format!(
                    "rclone {} is ready.",
                    wizard.version.as_deref().unwrap_or("")
                ));
                lines.push("Press Enter to return to the main menu.".to_string());
            }
        }
        if let Some(status) = &wizard.status {
            lines.push(String::new());
            lines.push(format!(
                "Homebrew: {}",
                status
                    .homebrew
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "missing".to_string())
            ));
            lines.push(format!(
                "rclone:   {}",
                status
                    .rclone
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "missing".to_string())
            ));
            if let Some(version) = &wizard.version {
                lines.push(format!("Version:  {version}"));
            }
        }
        if let Some(err) = &wizard.error {
            lines.push(String::new());
            lines.push(format!("Error: {err}"));
        }
        self.draw_text(frame, area, "Install Tools", lines, 0);
    }

    pub(in crate::tui) fn draw_help(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let lines: Vec<String> = [
            "Main menu",
            "  Up/Down, Enter   choose an item",
            "  1-8              open an item directly",
            "  q                quit",
            "",
            "Everywhere",
            "  Esc              back to the main menu (cancels a running backup)",
            "",
            "Remotes & sync pairs",
            "  a / p            add remote / add sync pair",
            "  t                enable or disable the selected pair",
            "  d                delete the selected remote or pair",
            "  g                write rclone.conf from the saved remotes",
            "  v                test the selected remote with rclone lsd",
            "",
            "Backup",
            "  c                cancel the running backup",
            "",
            "Logs",
            "  Tab, 1-5         All / Today / Recent / Sessions / Stats",
            "  r                reload the log file",
            "",
            "Schedule (launchd)",
            "  s                set the daily time and load the agent",
            "  u                unload and remove the agent",
            "  r / x            start / stop the agent now",
            "  l                refresh agent status",
            "",
            "Maintenance",
            "  c                clear the backup lock file",
            "  g                rewrite the backup script",
            "  r                rewrite rclone.conf",
            "  o                show resolved paths",
        ]
        .iter()
        .map(|line| line.to_string())
        .collect();
        self.help_scroll = self.draw_text(frame, area, "Help", lines, self.help_scroll);
    }
}
