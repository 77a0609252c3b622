use crate::logging::LogBuffer;
use crate::services::Services;
use anyhow::Context;
use backup_core::backup::{
    BackupEvent, BackupHandle, BackupProgress, BackupRunner, BackupStatus, BackupSummary,
};
use backup_core::config::{
    RemoteConfig, RemoteKind, ScheduleSettings, parse_bounded, validate_remote_name,
};
use backup_core::installer::ToolStatus;
use backup_core::launchd::AgentStatus;
use backup_core::lockfile::{DEFAULT_STALE_AFTER, LockSnapshot, format_age};
use backup_core::logs::{
    LogLine, LogStats, ParsedLog, SyncSession, format_bytes, format_log_time, local_now,
};
use backup_core::paths::expand_home;
use backup_core::sync_pairs::{SyncDirection, SyncPair};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug)]
pub struct TuiOptions {
    pub alt_screen: bool,
    pub mouse: bool,
    pub tick_rate: Duration,
}

const LOG_PANEL_HEIGHT: u16 = 7;
const LOG_PANEL_BORDER_HEIGHT: u16 = 2;
const LOG_HEADER_LINES: usize = 1;
const RECENT_LOG_LINES: usize = 50;
const PROGRESS_BAR_WIDTH: usize = 30;

pub fn run_tui(
    services: Services,
    log_buffer: LogBuffer,
    options: TuiOptions,
) -> anyhow::Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    if options.alt_screen {
        execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    }
    if options.mouse {
        execute!(stdout, EnableMouseCapture).context("enable mouse capture")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    if !options.alt_screen {
        terminal.clear().context("clear terminal")?;
    }

    info!(
        alt_screen = options.alt_screen,
        mouse = options.mouse,
        "Starting TUI"
    );
    let result = run_app(&mut terminal, services, log_buffer, options.tick_rate);

    disable_raw_mode().ok();
    if options.mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture).ok();
    }
    if options.alt_screen {
        execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    }
    terminal.show_cursor().ok();

    match result {
        Ok(()) => {
            info!("TUI exited");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "TUI exited with error");
            Err(err)
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    services: Services,
    log_buffer: LogBuffer,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let mut app = TuiApp::new(services, log_buffer);
    let mut last_tick = Instant::now();
    debug!(
        tick_rate_ms = tick_rate.as_millis(),
        "TUI event loop started"
    );

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if app.handle_key(key)? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse)?,
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        app.poll_tasks()?;
        app.poll_backup_events()?;
    }
}

#[derive(Clone, Debug)]
struct InputField {
    label: &'static str,
    value: String,
    mask: bool,
}

impl InputField {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            mask: false,
        }
    }

    fn with_mask(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            mask: true,
        }
    }

    fn with_value(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            mask: false,
        }
    }

    fn display_value(&self) -> String {
        if self.mask {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    fn push(&mut self, ch: char) {
        self.value.push(ch);
    }

    fn pop(&mut self) {
        self.value.pop();
    }

    fn trimmed(&self) -> &str {
        self.value.trim()
    }
}

mod app_core;
mod draw;
mod handle;
mod helpers;
mod jobs;
#[cfg(test)]
mod tests;

use helpers::*;

struct TuiApp {
    services: Services,
    log_buffer: LogBuffer,
    screen: Screen,
    menu_index: usize,
    tasks: TaskQueue,
    help_scroll: usize,
}
