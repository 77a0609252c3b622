use super::*;

pub(in crate::tui) enum Screen {
    Main,
    Installation(InstallWizard),
    Configuration(ConfigScreen),
    BackupRunning(BackupScreen),
    LogViewer(LogViewer),
    LaunchdManager(LaunchdScreen),
    Maintenance(MaintenanceScreen),
    Help,
}

impl Screen {
    pub(in crate::tui) fn title(&self) -> &'static str {
        match self {
            Screen::Main => "Main Menu",
            Screen::Installation(_) => "Install Tools",
            Screen::Configuration(_) => "Remotes & Sync Pairs",
            Screen::BackupRunning(_) => "Backup",
            Screen::LogViewer(_) => "Logs",
            Screen::LaunchdManager(_) => "Schedule (launchd)",
            Screen::Maintenance(_) => "Maintenance",
            Screen::Help => "Help",
        }
    }

    /// True while a nested wizard owns Esc.
    pub(in crate::tui) fn in_nested_mode(&self) -> bool {
        match self {
            Screen::Configuration(screen) => !matches!(screen.mode, ConfigMode::Overview),
            Screen::LaunchdManager(screen) => !matches!(screen.mode, LaunchdMode::Overview),
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::tui) enum MenuItem {
    Install,
    Configure,
    RunBackup,
    ViewLogs,
    Schedule,
    Maintenance,
    Help,
    Quit,
}

impl MenuItem {
    pub(in crate::tui) const ALL: [MenuItem; 8] = [
        MenuItem::Install,
        MenuItem::Configure,
        MenuItem::RunBackup,
        MenuItem::ViewLogs,
        MenuItem::Schedule,
        MenuItem::Maintenance,
        MenuItem::Help,
        MenuItem::Quit,
    ];

    pub(in crate::tui) fn label(self) -> &'static str {
        match self {
            MenuItem::Install => "Install tools",
            MenuItem::Configure => "Configure remotes & sync pairs",
            MenuItem::RunBackup => "Run backup now",
            MenuItem::ViewLogs => "View logs",
            MenuItem::Schedule => "Schedule (launchd)",
            MenuItem::Maintenance => "Maintenance",
            MenuItem::Help => "Help",
            MenuItem::Quit => "Quit",
        }
    }

    pub(in crate::tui) fn from_digit(ch: char) -> Option<MenuItem> {
        let index = ch.to_digit(10)? as usize;
        index
            .checked_sub(1)
            .and_then(|idx| MenuItem::ALL.get(idx).copied())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::tui) enum InstallStep {
    Welcome,
    Checking,
    HomebrewMissing,
    NeedsRclone,
    Ready,
    Installing,
    Complete,
}

pub(in crate::tui) struct InstallWizard {
    pub(in crate::tui) step: InstallStep,
    pub(in crate::tui) status: Option<ToolStatus>,
    pub(in crate::tui) version: Option<String>,
    pub(in crate::tui) upgrading: bool,
    pub(in crate::tui) busy: bool,
    pub(in crate::tui) error: Option<String>,
}

impl InstallWizard {
    pub(in crate::tui) fn new() -> Self {
        Self {
            step: InstallStep::Welcome,
            status: None,
            version: None,
            upgrading: false,
            busy: false,
            error: None,
        }
    }

    pub(in crate::tui) fn begin_check(&mut self) {
        self.step = InstallStep::Checking;
        self.busy = true;
        self.error = None;
    }

    pub(in crate::tui) fn begin_install(&mut self, upgrading: bool) {
        self.step = InstallStep::Installing;
        self.upgrading = upgrading;
        self.busy = true;
        self.error = None;
    }

    pub(in crate::tui) fn checked(&mut self, result: Result<ToolStatus, String>) {
        self.busy = false;
        match result {
            Ok(status) => {
                self.step = if status.rclone_ready() {
                    InstallStep::Ready
                } else if status.homebrew.is_none() {
                    InstallStep::HomebrewMissing
                } else {
                    InstallStep::NeedsRclone
                };
                self.version = status.rclone_version.clone();
                self.status = Some(status);
            }
            Err(err) => self.error = Some(err),
        }
    }

    pub(in crate::tui) fn installed(&mut self, result: Result<String, String>) {
        self.busy = false;
        match result {
            Ok(version) => {
                self.version = Some(version);
                self.step = InstallStep::Complete;
            }
            Err(err) => self.error = Some(err),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::tui) enum ConfigItem {
    Remote(String),
    Pair(String),
}

pub(in crate::tui) enum ConfigMode {
    Overview,
    AddRemote(RemoteWizard),
    AddPair(PairWizard),
}

pub(in crate::tui) struct ConfigScreen {
    pub(in crate::tui) mode: ConfigMode,
    pub(in crate::tui) selected: usize,
    pub(in crate::tui) scroll: usize,
    pub(in crate::tui) message: Option<String>,
    pub(in crate::tui) testing: Option<String>,
}

impl ConfigScreen {
    pub(in crate::tui) fn new() -> Self {
        Self {
            mode: ConfigMode::Overview,
            selected: 0,
            scroll: 0,
            message: None,
            testing: None,
        }
    }

    pub(in crate::tui) fn items(services: &Services) -> Vec<ConfigItem> {
        services
            .config()
            .remotes
            .iter()
            .map(|remote| ConfigItem::Remote(remote.name.clone()))
            .chain(
                services
                    .pairs()
                    .iter()
                    .map(|pair| ConfigItem::Pair(pair.name.clone())),
            )
            .collect()
    }
}

pub(in crate::tui) struct BackupScreen {
    pub(in crate::tui) status: BackupStatus,
    pub(in crate::tui) progress: BackupProgress,
    pub(in crate::tui) summary: Option<BackupSummary>,
    pub(in crate::tui) message: Option<String>,
    pub(in crate::tui) started: Instant,
    pub(in crate::tui) handle: Option<BackupHandle>,
    pub(in crate::tui) events: Option<mpsc::Receiver<BackupEvent>>,
}

impl BackupScreen {
    pub(in crate::tui) fn failed(message: String) -> Self {
        Self {
            status: BackupStatus::Failed,
            progress: BackupProgress::default(),
            summary: None,
            message: Some(message),
            started: Instant::now(),
            handle: None,
            events: None,
        }
    }

    pub(in crate::tui) fn running(
        handle: BackupHandle,
        events: mpsc::Receiver<BackupEvent>,
        pair_total: usize,
    ) -> Self {
        Self {
            status: BackupStatus::Running,
            progress: BackupProgress {
                status: BackupStatus::Running,
                pair_total,
                ..BackupProgress::default()
            },
            summary: None,
            message: None,
            started: Instant::now(),
            handle: Some(handle),
            events: Some(events),
        }
    }

    pub(in crate::tui) fn request_cancel(&mut self) -> bool {
        if self.status != BackupStatus::Running {
            return false;
        }
        if let Some(handle) = &self.handle {
            handle.cancel();
        }
        self.status = BackupStatus::Cancelling;
        true
    }

    pub(in crate::tui) fn apply(&mut self, event: BackupEvent) {
        match event {
            BackupEvent::Progress(progress) => {
                if !(self.status == BackupStatus::Cancelling && !progress.status.is_terminal()) {
                    self.status = progress.status;
                }
                self.progress = progress;
            }
            BackupEvent::Finished(Ok(summary)) => {
                self.status = summary.status;
                self.message = Some(summary.headline());
                self.summary = Some(summary);
            }
            BackupEvent::Finished(Err(err)) => {
                self.status = BackupStatus::Failed;
                self.message = Some(err);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::tui) enum LogMode {
    All,
    Today,
    Recent,
    Sessions,
    Stats,
}

impl LogMode {
    pub(in crate::tui) const ALL: [LogMode; 5] = [
        LogMode::All,
        LogMode::Today,
        LogMode::Recent,
        LogMode::Sessions,
        LogMode::Stats,
    ];

    pub(in crate::tui) fn label(self) -> &'static str {
        match self {
            LogMode::All => "All",
            LogMode::Today => "Today",
            LogMode::Recent => "Recent",
            LogMode::Sessions => "Sessions",
            LogMode::Stats => "Stats",
        }
    }

    pub(in crate::tui) fn next(self) -> LogMode {
        let index = LogMode::ALL
            .iter()
            .position(|mode| *mode == self)
            .unwrap_or(0);
        LogMode::ALL[(index + 1) % LogMode::ALL.len()]
    }

    pub(in crate::tui) fn from_digit(ch: char) -> Option<LogMode> {
        let index = ch.to_digit(10)? as usize;
        index
            .checked_sub(1)
            .and_then(|idx| LogMode::ALL.get(idx).copied())
    }
}

pub(in crate::tui) struct LogViewer {
    pub(in crate::tui) mode: LogMode,
    pub(in crate::tui) log: Option<ParsedLog>,
    pub(in crate::tui) loading: bool,
    pub(in crate::tui) error: Option<String>,
    pub(in crate::tui) scroll: usize,
}

impl LogViewer {
    pub(in crate::tui) fn new() -> Self {
        Self {
            mode: LogMode::All,
            log: None,
            loading: false,
            error: None,
            scroll: 0,
        }
    }

    pub(in crate::tui) fn switch(&mut self, mode: LogMode) {
        self.mode = mode;
        self.scroll = 0;
    }

    pub(in crate::tui) fn loaded(&mut self, result: Result<ParsedLog, String>) {
        self.loading = false;
        match result {
            Ok(log) => {
                self.log = Some(log);
                self.error = None;
            }
            Err(err) => self.error = Some(err),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::tui) enum AgentAction {
    Install,
    Uninstall,
    Start,
    Stop,
}

impl AgentAction {
    pub(in crate::tui) fn label(self) -> &'static str {
        match self {
            AgentAction::Install => "install",
            AgentAction::Uninstall => "uninstall",
            AgentAction::Start => "start",
            AgentAction::Stop => "stop",
        }
    }

    pub(in crate::tui) fn progress_label(self) -> &'static str {
        match self {
            AgentAction::Install => "Loading agent",
            AgentAction::Uninstall => "Unloading agent",
            AgentAction::Start => "Starting agent",
            AgentAction::Stop => "Stopping agent",
        }
    }
}

pub(in crate::tui) enum LaunchdMode {
    Overview,
    Schedule(ScheduleWizard),
}

pub(in crate::tui) struct LaunchdScreen {
    pub(in crate::tui) mode: LaunchdMode,
    pub(in crate::tui) status: Option<AgentStatus>,
    pub(in crate::tui) busy: bool,
    pub(in crate::tui) message: Option<String>,
}

impl LaunchdScreen {
    pub(in crate::tui) fn new() -> Self {
        Self {
            mode: LaunchdMode::Overview,
            status: None,
            busy: false,
            message: None,
        }
    }
}

pub(in crate::tui) struct MaintenanceScreen {
    pub(in crate::tui) lock: LockSnapshot,
    pub(in crate::tui) show_paths: bool,
    pub(in crate::tui) message: Option<String>,
    pub(in crate::tui) scroll: usize,
}

impl MaintenanceScreen {
    pub(in crate::tui) fn new(lock: LockSnapshot) -> Self {
        Self {
            lock,
            show_paths: false,
            message: None,
            scroll: 0,
        }
    }
}
