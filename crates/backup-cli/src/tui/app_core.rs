use super::helpers::*;
use super::*;

impl TuiApp {
    pub(super) fn new(services: Services, log_buffer: LogBuffer) -> Self {
        Self {
            services,
            log_buffer,
            screen: Screen::Main,
            menu_index: 0,
            tasks: TaskQueue::new(),
            help_scroll: 0,
        }
    }

    pub(in crate::tui) fn set_screen(&mut self, screen: Screen) {
        self.tasks.advance_epoch();
        debug!(
            screen = screen.title(),
            epoch = self.tasks.epoch(),
            "Switching screen"
        );
        self.screen = screen;
    }

    pub(in crate::tui) fn go_main(&mut self) {
        if let Screen::BackupRunning(screen) = &self.screen
            && screen.status == BackupStatus::Running
        {
            warn!("Leaving backup screen while a backup runs; cancelling it");
        }
        self.set_screen(Screen::Main);
    }

    /// Returns true when the item asks to quit.
    pub(in crate::tui) fn open_menu_item(&mut self, item: MenuItem) -> anyhow::Result<bool> {
        info!(item = item.label(), "Opening menu item");
        match item {
            MenuItem::Install => self.set_screen(Screen::Installation(InstallWizard::new())),
            MenuItem::Configure => self.set_screen(Screen::Configuration(ConfigScreen::new())),
            MenuItem::RunBackup => self.enter_backup(),
            MenuItem::ViewLogs => {
                self.set_screen(Screen::LogViewer(LogViewer::new()));
                self.start_log_load();
            }
            MenuItem::Schedule => {
                self.set_screen(Screen::LaunchdManager(LaunchdScreen::new()));
                self.start_agent_status();
            }
            MenuItem::Maintenance => {
                let lock = self.services.lock().snapshot(DEFAULT_STALE_AFTER);
                self.set_screen(Screen::Maintenance(MaintenanceScreen::new(lock)));
            }
            MenuItem::Help => {
                self.help_scroll = 0;
                self.set_screen(Screen::Help);
            }
            MenuItem::Quit => return Ok(true),
        }
        Ok(false)
    }

    pub(in crate::tui) fn enter_backup(&mut self) {
        let screen = match self.services.backup_plan() {
            Ok(plan) => {
                let pair_total = plan.enabled_pairs().len();
                info!(pairs = pair_total, "Starting manual backup");
                let (tx, rx) = mpsc::channel::<BackupEvent>();
                let handle = BackupRunner::start(plan, move |event| {
                    let _ = tx.send(event);
                });
                BackupScreen::running(handle, rx, pair_total)
            }
            Err(err) => {
                warn!(error = %err, "Backup not started");
                BackupScreen::failed(err)
            }
        };
        self.set_screen(Screen::BackupRunning(screen));
    }
}
