use super::*;
use backup_core::exec::{CommandOutput, CommandRunner};
use backup_core::paths::DefaultDirs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

struct FakeRunner;

impl CommandRunner for FakeRunner {
    fn look_path(&self, _program: &str) -> Option<PathBuf> {
        None
    }

    fn run(&self, _program: &Path, _args: &[String]) -> anyhow::Result<CommandOutput> {
        Ok(CommandOutput::failed(1, "not available in tests"))
    }
}

fn app(tmp: &TempDir) -> TuiApp {
    let services =
        Services::load(Arc::new(FakeRunner), &DefaultDirs::under(tmp.path()), None).unwrap();
    TuiApp::new(services, LogBuffer::new(50))
}

fn press(app: &mut TuiApp, code: KeyCode) -> bool {
    app.handle_key(KeyEvent::new(code, KeyModifiers::empty()))
        .unwrap()
}

fn type_text(app: &mut TuiApp, text: &str) {
    for ch in text.chars() {
        press(app, KeyCode::Char(ch));
    }
}

fn wait_for_tasks(app: &mut TuiApp) {
    for _ in 0..200 {
        app.poll_tasks().unwrap();
        if app.tasks.pending() == 0 {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("background tasks did not finish");
}

#[test]
fn digit_keys_open_each_screen() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    let expected = [
        ('1', "Install Tools"),
        ('2', "Remotes & Sync Pairs"),
        ('3', "Backup"),
        ('4', "Logs"),
        ('5', "Schedule (launchd)"),
        ('6', "Maintenance"),
        ('7', "Help"),
    ];
    for (digit, title) in expected {
        assert!(!press(&mut app, KeyCode::Char(digit)));
        assert_eq!(app.screen.title(), title);
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.screen, Screen::Main));
    }
    assert!(press(&mut app, KeyCode::Char('8')));
}

#[test]
fn q_quits_only_from_main() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Char('7'));
    assert!(!press(&mut app, KeyCode::Char('q')));
    press(&mut app, KeyCode::Esc);
    assert!(press(&mut app, KeyCode::Char('q')));
}

#[test]
fn menu_index_wraps() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Up);
    assert_eq!(app.menu_index, MenuItem::ALL.len() - 1);
    press(&mut app, KeyCode::Down);
    assert_eq!(app.menu_index, 0);
}

#[test]
fn key_release_events_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    let mut key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::empty());
    key.kind = KeyEventKind::Release;
    assert!(!app.handle_key(key).unwrap());
}

#[test]
fn backup_without_pairs_fails_with_message() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Char('3'));
    let Screen::BackupRunning(screen) = &app.screen else {
        panic!("expected backup screen");
    };
    assert_eq!(screen.status, BackupStatus::Failed);
    assert!(screen.handle.is_none());
    assert!(
        screen
            .message
            .as_deref()
            .unwrap()
            .contains("No enabled sync pairs")
    );
    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Enter);
    assert!(matches!(app.screen, Screen::Main));
}

#[test]
fn remote_wizard_keeps_step_on_invalid_name() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "bad name");
    press(&mut app, KeyCode::Enter);
    {
        let Screen::Configuration(screen) = &app.screen else {
            panic!("expected configuration screen");
        };
        let ConfigMode::AddRemote(wizard) = &screen.mode else {
            panic!("expected remote wizard");
        };
        assert_eq!(wizard.step, RemoteStep::Name);
        assert!(wizard.error.as_deref().unwrap().contains("remote name"));
    }

    press(&mut app, KeyCode::Esc);
    let Screen::Configuration(screen) = &app.screen else {
        panic!("Esc inside a wizard stays on the configuration screen");
    };
    assert!(matches!(screen.mode, ConfigMode::Overview));
}

#[test]
fn remote_wizard_saves_remote_and_rclone_conf() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "b2home");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    {
        let Screen::Configuration(screen) = &app.screen else {
            panic!("expected configuration screen");
        };
        let ConfigMode::AddRemote(wizard) = &screen.mode else {
            panic!("expected remote wizard");
        };
        assert_eq!(wizard.step, RemoteStep::Credentials);
        assert_eq!(wizard.field_index, 1);
    }
    press(&mut app, KeyCode::Enter);
    {
        let Screen::Configuration(screen) = &app.screen else {
            panic!("expected configuration screen");
        };
        let ConfigMode::AddRemote(wizard) = &screen.mode else {
            panic!("expected remote wizard");
        };
        assert_eq!(wizard.step, RemoteStep::Credentials);
        assert!(wizard.error.as_deref().unwrap().contains("account id"));
    }
    press(&mut app, KeyCode::Up);
    type_text(&mut app, "acct");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "secret");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);

    let Screen::Configuration(screen) = &app.screen else {
        panic!("expected configuration screen");
    };
    assert!(matches!(screen.mode, ConfigMode::Overview));
    assert_eq!(app.services.config().remotes.len(), 1);
    let conf = std::fs::read_to_string(&app.services.paths().rclone_config).unwrap();
    assert!(conf.contains("[b2home]"));
    assert!(conf.contains("key = secret"));
}

#[test]
fn pair_wizard_needs_a_remote() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Char('p'));
    let Screen::Configuration(screen) = &app.screen else {
        panic!("expected configuration screen");
    };
    assert!(matches!(screen.mode, ConfigMode::Overview));
    assert!(screen.message.as_deref().unwrap().contains("Add a remote first"));
}

#[test]
fn pair_wizard_adds_pair_and_toggle_flips_it() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    app.services
        .add_remote(RemoteConfig::s3("wasabi", "id", "secret"))
        .unwrap();
    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Char('p'));
    press(&mut app, KeyCode::Enter);
    {
        let Screen::Configuration(screen) = &app.screen else {
            panic!("expected configuration screen");
        };
        let ConfigMode::AddPair(wizard) = &screen.mode else {
            panic!("expected pair wizard");
        };
        assert_eq!(wizard.step, PairStep::Name);
        assert!(wizard.error.is_some());
    }
    type_text(&mut app, "docs");
    press(&mut app, KeyCode::Enter);
    type_text(&mut app, "~/Documents");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    type_text(&mut app, "backup/docs");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);

    let pair = app.services.pairs()[0].clone();
    assert_eq!(pair.name, "docs");
    assert_eq!(pair.remote_name, "wasabi");
    assert_eq!(pair.direction, SyncDirection::Download);
    assert_eq!(pair.local_path, tmp.path().join("home").join("Documents"));

    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char('t'));
    assert!(!app.services.pairs()[0].enabled);
}

#[test]
fn schedule_wizard_rejects_out_of_range_hour() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Char('5'));
    wait_for_tasks(&mut app);
    press(&mut app, KeyCode::Char('s'));
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
        .unwrap();
    type_text(&mut app, "24");
    press(&mut app, KeyCode::Enter);
    let Screen::LaunchdManager(screen) = &app.screen else {
        panic!("expected launchd screen");
    };
    let LaunchdMode::Schedule(wizard) = &screen.mode else {
        panic!("expected schedule wizard");
    };
    assert_eq!(wizard.step, ScheduleStep::Hour);
    assert_eq!(wizard.hour.value, "24");
    assert!(wizard.error.as_deref().unwrap().contains("between 0 and 23"));
}

#[test]
fn failed_launchctl_status_is_reported() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Char('5'));
    wait_for_tasks(&mut app);
    let Screen::LaunchdManager(screen) = &app.screen else {
        panic!("expected launchd screen");
    };
    assert!(!screen.busy);
    assert!(screen.message.as_deref().unwrap().contains("Status check failed"));
}

#[test]
fn log_viewer_switches_modes_and_loads() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    press(&mut app, KeyCode::Char('4'));
    wait_for_tasks(&mut app);
    press(&mut app, KeyCode::Tab);
    {
        let Screen::LogViewer(viewer) = &app.screen else {
            panic!("expected log viewer");
        };
        assert_eq!(viewer.mode, LogMode::Today);
        assert!(viewer.loading);
    }
    wait_for_tasks(&mut app);
    press(&mut app, KeyCode::Char('5'));
    wait_for_tasks(&mut app);
    let Screen::LogViewer(viewer) = &app.screen else {
        panic!("expected log viewer");
    };
    assert_eq!(viewer.mode, LogMode::Stats);
    assert!(!viewer.loading);
    assert_eq!(viewer.log, Some(ParsedLog::default()));
}

#[test]
fn stale_task_results_are_dropped() {
    let mut tasks = TaskQueue::new();
    tasks.spawn("log load", || TaskOutcome::LogLoaded(Ok(ParsedLog::default())));
    tasks.advance_epoch();
    let mut delivered = Vec::new();
    for _ in 0..200 {
        delivered.extend(tasks.drain());
        if tasks.pending() == 0 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(tasks.pending(), 0);
    assert!(delivered.is_empty());
}

#[test]
fn maintenance_clears_lock_and_shows_paths() {
    let tmp = TempDir::new().unwrap();
    let mut app = app(&tmp);
    let lock_file = app.services.paths().lock_file.clone();
    std::fs::create_dir_all(lock_file.parent().unwrap()).unwrap();
    std::fs::write(&lock_file, "2024-01-15T03:00:00Z").unwrap();

    press(&mut app, KeyCode::Char('6'));
    {
        let Screen::Maintenance(screen) = &app.screen else {
            panic!("expected maintenance screen");
        };
        assert!(screen.lock.present);
    }
    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Char('o'));
    let Screen::Maintenance(screen) = &app.screen else {
        panic!("expected maintenance screen");
    };
    assert!(!screen.lock.present);
    assert!(screen.show_paths);
    assert_eq!(screen.message.as_deref(), Some("Lock file removed."));
    assert!(!lock_file.exists());
}

#[test]
fn log_render_modes() {
    let log = ParsedLog::default();
    let today = time::macros::date!(2024 - 01 - 15);
    assert_eq!(
        render_log(&log, LogMode::All, today),
        vec!["The backup log is empty.".to_string()]
    );
    assert_eq!(
        render_log(&log, LogMode::Sessions, today),
        vec!["No backup sessions recorded yet.".to_string()]
    );
    let stats = render_log(&log, LogMode::Stats, today);
    assert!(stats[0].starts_with("Sessions:"));
    assert!(stats.iter().any(|line| line.ends_with("0 B")));
}

#[test]
fn progress_bar_renders_ratio() {
    assert_eq!(progress_bar(1, 2, 4), "[##--]");
    assert_eq!(ratio_bar(1.0, 3), "[###]");
    assert_eq!(format_speed(0.0), "-");
    assert_eq!(format_speed(2048.0), "2.00 KiB/s");
}

#[test]
fn scroll_keys_move_offsets() {
    assert_eq!(scroll_for_key(KeyCode::Down, 0), Some(1));
    assert_eq!(scroll_for_key(KeyCode::Up, 0), Some(0));
    assert_eq!(scroll_for_key(KeyCode::PageDown, 5), Some(15));
    assert_eq!(scroll_for_key(KeyCode::Home, 7), Some(0));
    assert_eq!(scroll_for_key(KeyCode::Enter, 7), None);
}
