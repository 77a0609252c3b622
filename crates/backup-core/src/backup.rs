use crate::config::SyncSettings;
use crate::lockfile::{BackupLock, DEFAULT_STALE_AFTER};
use crate::logs::{finish_marker, format_bytes, local_now, log_timestamp, start_marker};
use crate::rclone::{SyncOutput, sync_args};
use crate::sync_pairs::SyncPair;
use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackupStatus {
    #[default]
    Idle,
    Running,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
}

impl BackupStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BackupStatus::Completed | BackupStatus::Failed | BackupStatus::Cancelled
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            BackupStatus::Idle => "idle",
            BackupStatus::Running => "running",
            BackupStatus::Cancelling => "cancelling",
            BackupStatus::Completed => "completed",
            BackupStatus::Failed => "failed",
            BackupStatus::Cancelled => "cancelled",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            BackupStatus::Completed => "ok",
            BackupStatus::Cancelled => "cancelled",
            _ => "failed",
        }
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackupProgress {
    pub status: BackupStatus,
    pub current_pair: Option<String>,
    pub pair_index: usize,
    pub pair_total: usize,
    pub files_done: u64,
    pub files_total: u64,
    pub bytes_done: u64,
    pub bytes_total: u64,
    pub speed: f64,
    pub errors: u64,
    pub message: String,
}

impl BackupProgress {
    pub fn ratio(&self) -> f64 {
        if self.bytes_total > 0 {
            (self.bytes_done as f64 / self.bytes_total as f64).clamp(0.0, 1.0)
        } else if self.files_total > 0 {
            (self.files_done as f64 / self.files_total as f64).clamp(0.0, 1.0)
        } else if self.status == BackupStatus::Completed {
            1.0
        } else {
            0.0
        }
    }

    fn apply(&mut self, stats: &StatsSnapshot) {
        self.files_done = stats.transfers;
        self.files_total = stats.total_transfers;
        self.bytes_done = stats.bytes;
        self.bytes_total = stats.total_bytes;
        self.speed = stats.speed;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub bytes: u64,
    pub total_bytes: u64,
    pub transfers: u64,
    pub total_transfers: u64,
    pub speed: f64,
    pub errors: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonRecord {
    level: String,
    msg: String,
    object: Option<String>,
    time: Option<String>,
    stats: Option<StatsSnapshot>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StderrLine {
    Stats(StatsSnapshot),
    Record { error: bool, text: String },
    Raw(String),
}

pub fn parse_stats_line(line: &str) -> Option<StatsSnapshot> {
    match parse_stderr_line(line) {
        StderrLine::Stats(stats) => Some(stats),
        _ => None,
    }
}

pub fn parse_stderr_line(line: &str) -> StderrLine {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return StderrLine::Raw(trimmed.to_string());
    }
    let Ok(record) = serde_json::from_str::<JsonRecord>(trimmed) else {
        return StderrLine::Raw(trimmed.to_string());
    };
    if let Some(stats) = record.stats {
        return StderrLine::Stats(stats);
    }
    let level = record.level.to_ascii_uppercase();
    let stamp = record
        .time
        .as_deref()
        .and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok())
        .unwrap_or_else(local_now);
    let text = match record.object.as_deref().filter(|object| !object.is_empty()) {
        Some(object) => format!(
            "{} {:<6}: {object}: {}",
            log_timestamp(stamp),
            level,
            record.msg.trim()
        ),
        None => format!("{} {:<6}: {}", log_timestamp(stamp), level, record.msg.trim()),
    };
    StderrLine::Record {
        error: level == "ERROR",
        text,
    }
}

#[derive(Clone, Debug)]
pub struct BackupPlan {
    pub label: String,
    pub rclone_binary: PathBuf,
    pub rclone_config: PathBuf,
    pub log_file: PathBuf,
    pub lock_file: PathBuf,
    pub pairs: Vec<SyncPair>,
    pub sync: SyncSettings,
    pub stale_after: Duration,
}

impl BackupPlan {
    pub fn enabled_pairs(&self) -> Vec<&SyncPair> {
        self.pairs.iter().filter(|pair| pair.enabled).collect()
    }

    pub fn with_defaults(
        rclone_binary: PathBuf,
        rclone_config: PathBuf,
        log_file: PathBuf,
        lock_file: PathBuf,
    ) -> Self {
        Self {
            label: "all".to_string(),
            rclone_binary,
            rclone_config,
            log_file,
            lock_file,
            pairs: Vec::new(),
            sync: SyncSettings::default(),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackupSummary {
    pub status: BackupStatus,
    pub pairs_run: usize,
    pub pairs_failed: usize,
    pub files_transferred: u64,
    pub bytes_transferred: u64,
    pub errors: u64,
    pub elapsed: Duration,
    pub failures: Vec<String>,
}

impl BackupSummary {
    pub fn headline(&self) -> String {
        match self.status {
            BackupStatus::Completed => format!(
                "Backup completed: {} pair(s), {} file(s), {}",
                self.pairs_run,
                self.files_transferred,
                format_bytes(self.bytes_transferred)
            ),
            BackupStatus::Cancelled => {
                format!("Backup cancelled after {} pair(s)", self.pairs_run)
            }
            _ => format!(
                "Backup failed: {} of {} pair(s) failed",
                self.pairs_failed, self.pairs_run
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub enum BackupEvent {
    Progress(BackupProgress),
    Finished(Result<BackupSummary, String>),
}

pub struct BackupRunner;

impl BackupRunner {
    pub fn start<F>(plan: BackupPlan, on_event: F) -> BackupHandle
    where
        F: FnMut(BackupEvent) + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let child = Arc::new(Mutex::new(None));
        let finished = Arc::new(AtomicBool::new(false));
        let worker = {
            let shared = Shared {
                cancel: cancel.clone(),
                child: child.clone(),
            };
            let finished = finished.clone();
            thread::spawn(move || {
                let mut on_event = on_event;
                let outcome = run_plan(&plan, &shared, &mut on_event);
                finished.store(true, Ordering::SeqCst);
                on_event(BackupEvent::Finished(outcome));
            })
        };
        BackupHandle {
            cancel,
            child,
            finished,
            worker: Some(worker),
        }
    }
}

#[derive(Clone)]
struct Shared {
    cancel: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
}

impl Shared {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

pub struct BackupHandle {
    cancel: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
    finished: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl BackupHandle {
    pub fn cancel(&self) {
        if self.cancel.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Cancelling backup");
        if let Ok(mut guard) = self.child.lock() {
            if let Some(child) = guard.as_mut() {
                if let Err(err) = child.kill() {
                    warn!(error = %err, "Failed to kill rclone");
                }
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for BackupHandle {
    fn drop(&mut self) {
        if self.worker.is_some() && !self.is_finished() {
            self.cancel();
        }
    }
}

fn run_plan(
    plan: &BackupPlan,
    shared: &Shared,
    on_event: &mut dyn FnMut(BackupEvent),
) -> Result<BackupSummary, String> {
    let started = Instant::now();
    let lock = BackupLock::new(&plan.lock_file);
    let _guard = lock
        .acquire(plan.stale_after)
        .map_err(|err| format!("{err:#}"))?;
    let mut log = open_log(&plan.log_file).map_err(|err| format!("{err:#}"))?;

    let pairs = plan.enabled_pairs();
    info!(label = %plan.label, pairs = pairs.len(), "Backup started");
    write_log(&mut log, &marker_line(&start_marker(&plan.label)));

    let mut summary = BackupSummary::default();
    let mut progress = BackupProgress {
        status: BackupStatus::Running,
        pair_total: pairs.len(),
        ..BackupProgress::default()
    };

    for (index, pair) in pairs.iter().enumerate() {
        if shared.cancelled() {
            break;
        }
        progress.current_pair = Some(pair.name.clone());
        progress.pair_index = index + 1;
        progress.apply(&StatsSnapshot::default());
        progress.message = format!("Syncing {}", pair.summary());
        on_event(BackupEvent::Progress(progress.clone()));

        match run_pair(plan, pair, shared, &mut log, &mut progress, on_event) {
            Ok(stats) => {
                summary.pairs_run += 1;
                summary.files_transferred += stats.transfers;
                summary.bytes_transferred += stats.bytes;
                summary.errors += stats.errors;
            }
            Err(err) => {
                summary.pairs_run += 1;
                if shared.cancelled() {
                    break;
                }
                summary.pairs_failed += 1;
                let failure = format!("{}: {err:#}", pair.name);
                error!(pair = %pair.name, error = %format!("{err:#}"), "Sync pair failed");
                write_log(&mut log, &marker_line(&format!("Sync failed: {failure}")));
                summary.failures.push(failure);
            }
        }
    }

    summary.status = if shared.cancelled() {
        BackupStatus::Cancelled
    } else if summary.pairs_failed > 0 {
        BackupStatus::Failed
    } else {
        BackupStatus::Completed
    };
    summary.elapsed = started.elapsed();

    let total = format_bytes(summary.bytes_transferred);
    write_log(&mut log, &format!("Transferred: {total} / {total}, 100%"));
    write_log(&mut log, &marker_line(&finish_marker(summary.status.marker())));
    info!(
        status = %summary.status,
        pairs = summary.pairs_run,
        failed = summary.pairs_failed,
        bytes = summary.bytes_transferred,
        "Backup finished"
    );

    progress.status = summary.status;
    progress.current_pair = None;
    progress.message = summary.headline();
    on_event(BackupEvent::Progress(progress));
    Ok(summary)
}

fn run_pair(
    plan: &BackupPlan,
    pair: &SyncPair,
    shared: &Shared,
    log: &mut File,
    progress: &mut BackupProgress,
    on_event: &mut dyn FnMut(BackupEvent),
) -> anyhow::Result<StatsSnapshot> {
    let args = sync_args(pair, &plan.sync, &plan.rclone_config, &SyncOutput::JsonStats);
    info!(pair = %pair.name, direction = %pair.direction, "Starting rclone");
    let mut child = Command::new(&plan.rclone_binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("start {}", plan.rclone_binary.display()))?;
    let stderr = child.stderr.take().context("capture rclone stderr")?;
    {
        let mut slot = shared
            .child
            .lock()
            .map_err(|_| anyhow::anyhow!("backup state poisoned"))?;
        *slot = Some(child);
        if shared.cancelled() {
            if let Some(child) = slot.as_mut()
                && let Err(err) = child.kill()
            {
                warn!(pair = %pair.name, error = %err, "Failed to kill rclone");
            }
        }
    }

    // rclone's own error count restarts with every process; ERROR records are
    // counted too in case no stats line follows them.
    let errors_before = progress.errors;
    let mut logged_errors = 0;
    let mut last = StatsSnapshot::default();
    for line in BufReader::new(stderr).lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_stderr_line(&line) {
            StderrLine::Stats(stats) => {
                progress.apply(&stats);
                progress.errors = errors_before + logged_errors.max(stats.errors);
                last = stats;
                on_event(BackupEvent::Progress(progress.clone()));
            }
            StderrLine::Record { error, text } => {
                if error {
                    logged_errors += 1;
                    progress.errors = errors_before + logged_errors.max(last.errors);
                }
                write_log(log, &text);
            }
            StderrLine::Raw(text) => write_log(log, &text),
        }
    }

    let child = shared
        .child
        .lock()
        .map_err(|_| anyhow::anyhow!("backup state poisoned"))?
        .take();
    let status = match child {
        Some(mut child) => child.wait().context("wait for rclone")?,
        None => anyhow::bail!("rclone process disappeared"),
    };
    if shared.cancelled() {
        anyhow::bail!("cancelled");
    }
    if !status.success() {
        let code = status
            .code()
            .map(|code| format!("exit code {code}"))
            .unwrap_or_else(|| "termination by signal".to_string());
        anyhow::bail!("rclone exited with {code}");
    }
    Ok(last)
}

fn open_log(path: &std::path::Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create log dir")?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

fn marker_line(message: &str) -> String {
    format!("{} NOTICE: {message}", log_timestamp(local_now()))
}

fn write_log(log: &mut File, line: &str) {
    if let Err(err) = writeln!(log, "{line}") {
        warn!(error = %err, "Failed to append to backup log");
    }
}
