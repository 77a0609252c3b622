use anyhow::Context;
use regex::Regex;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

const LOG_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second]");

pub fn start_marker(label: &str) -> String {
    format!("=== Backup started: {label} ===")
}

pub fn finish_marker(status: &str) -> String {
    format!("=== Backup finished: status={status} ===")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferAction {
    CopiedNew,
    Replaced,
    ServerSideCopy,
    ModTimeUpdated,
    Deleted,
    Error,
}

impl TransferAction {
    pub fn label(self) -> &'static str {
        match self {
            TransferAction::CopiedNew => "copied",
            TransferAction::Replaced => "replaced",
            TransferAction::ServerSideCopy => "server-side copy",
            TransferAction::ModTimeUpdated => "mod time",
            TransferAction::Deleted => "deleted",
            TransferAction::Error => "error",
        }
    }

    pub fn is_copy(self) -> bool {
        matches!(
            self,
            TransferAction::CopiedNew | TransferAction::Replaced | TransferAction::ServerSideCopy
        )
    }

    fn from_message(message: &str) -> Option<Self> {
        if message.starts_with("Copied (new)") {
            Some(TransferAction::CopiedNew)
        } else if message.starts_with("Copied (replaced existing)") {
            Some(TransferAction::Replaced)
        } else if message.starts_with("Copied (server-side copy)") {
            Some(TransferAction::ServerSideCopy)
        } else if message.starts_with("Updated modification time in destination") {
            Some(TransferAction::ModTimeUpdated)
        } else if message.starts_with("Deleted") {
            Some(TransferAction::Deleted)
        } else {
            None
        }
    }
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub time: Option<PrimitiveDateTime>,
    pub file: String,
    pub action: TransferAction,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub raw: String,
    pub time: Option<PrimitiveDateTime>,
    pub level: Option<String>,
    pub transfer: Option<Transfer>,
}

impl LogLine {
    pub fn is_error(&self) -> bool {
        self.level.as_deref() == Some("ERROR")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Success,
    Failed,
    Cancelled,
    Incomplete,
}

impl SessionStatus {
    pub fn from_marker(value: &str) -> Self {
        match value.trim() {
            "ok" | "success" => SessionStatus::Success,
            "cancelled" => SessionStatus::Cancelled,
            _ => SessionStatus::Failed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Success => "success",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncSession {
    pub label: String,
    pub started: Option<PrimitiveDateTime>,
    pub finished: Option<PrimitiveDateTime>,
    pub status: SessionStatus,
    pub files_copied: usize,
    pub files_deleted: usize,
    pub errors: usize,
    pub bytes_transferred: u64,
}

impl SyncSession {
    fn open(label: &str, started: Option<PrimitiveDateTime>) -> Self {
        Self {
            label: label.to_string(),
            started,
            finished: None,
            status: SessionStatus::Incomplete,
            files_copied: 0,
            files_deleted: 0,
            errors: 0,
            bytes_transferred: 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogStats {
    pub sessions: usize,
    pub successful: usize,
    pub failed: usize,
    pub files_copied: usize,
    pub files_deleted: usize,
    pub errors: usize,
    pub bytes_transferred: u64,
    pub last_backup: Option<PrimitiveDateTime>,
    pub last_status: Option<SessionStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedLog {
    pub lines: Vec<LogLine>,
    pub sessions: Vec<SyncSession>,
}

impl ParsedLog {
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.lines.iter().filter_map(|line| line.transfer.as_ref())
    }

    pub fn on_date(&self, date: Date) -> Vec<LogLine> {
        self.lines
            .iter()
            .filter(|line| line.time.map(|time| time.date()) == Some(date))
            .cloned()
            .collect()
    }

    pub fn last(&self, count: usize) -> Vec<LogLine> {
        let skip = self.lines.len().saturating_sub(count);
        self.lines[skip..].to_vec()
    }

    pub fn stats(&self) -> LogStats {
        let mut stats = LogStats {
            sessions: self.sessions.len(),
            ..LogStats::default()
        };
        for transfer in self.transfers() {
            match transfer.action {
                action if action.is_copy() => stats.files_copied += 1,
                TransferAction::Deleted => stats.files_deleted += 1,
                _ => {}
            }
        }
        stats.errors = self.lines.iter().filter(|line| line.is_error()).count();
        for session in &self.sessions {
            match session.status {
                SessionStatus::Success => stats.successful += 1,
                SessionStatus::Failed => stats.failed += 1,
                _ => {}
            }
            stats.bytes_transferred += session.bytes_transferred;
        }
        if let Some(last) = self.sessions.last() {
            stats.last_backup = last.started;
            stats.last_status = Some(last.status);
        }
        stats
    }
}

pub struct LogParser {
    path: PathBuf,
    line_pattern: Regex,
    object_pattern: Regex,
    start_pattern: Regex,
    finish_pattern: Regex,
    transferred_pattern: Regex,
}

impl LogParser {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            line_pattern: Regex::new(
                r"^(\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2})\s+([A-Z]+)\s*:\s*(.*)$",
            )
            .expect("Invalid log line regex"),
            object_pattern: Regex::new(r"^(.+?): (.+)$").expect("Invalid object regex"),
            start_pattern: Regex::new(r"=== Backup started: (.*?) ===")
                .expect("Invalid start marker regex"),
            finish_pattern: Regex::new(r"=== Backup finished: status=(\w+) ===")
                .expect("Invalid finish marker regex"),
            transferred_pattern: Regex::new(
                r"Transferred:\s+([\d.]+\s*[A-Za-z]+)\s*/\s*([\d.]+\s*[A-Za-z]+)",
            )
            .expect("Invalid transferred regex"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<ParsedLog> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(self.parse(&text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(ParsedLog::default()),
            Err(err) => {
                Err(err).with_context(|| format!("read log file {}", self.path.display()))
            }
        }
    }

    pub fn all(&self) -> anyhow::Result<Vec<LogLine>> {
        Ok(self.load()?.lines)
    }

    pub fn today(&self, date: Date) -> anyhow::Result<Vec<LogLine>> {
        Ok(self.load()?.on_date(date))
    }

    pub fn recent(&self, count: usize) -> anyhow::Result<Vec<LogLine>> {
        Ok(self.load()?.last(count))
    }

    pub fn sessions(&self) -> anyhow::Result<Vec<SyncSession>> {
        Ok(self.load()?.sessions)
    }

    pub fn stats(&self) -> anyhow::Result<LogStats> {
        Ok(self.load()?.stats())
    }

    pub fn parse(&self, text: &str) -> ParsedLog {
        let mut parsed = ParsedLog::default();
        let mut open: Option<SyncSession> = None;

        for raw in text.lines() {
            if raw.trim().is_empty() {
                continue;
            }
            let line = self.parse_line(raw);

            if let Some(caps) = self.start_pattern.captures(raw) {
                if let Some(previous) = open.take() {
                    parsed.sessions.push(previous);
                }
                open = Some(SyncSession::open(&caps[1], line.time));
            } else if let Some(caps) = self.finish_pattern.captures(raw) {
                if let Some(mut session) = open.take() {
                    session.status = SessionStatus::from_marker(&caps[1]);
                    session.finished = line.time;
                    parsed.sessions.push(session);
                }
            } else if let Some(session) = open.as_mut() {
                if let Some(caps) = self.transferred_pattern.captures(raw) {
                    if let Some(bytes) = parse_size(&caps[1]) {
                        session.bytes_transferred = bytes;
                    }
                }
                if let Some(transfer) = &line.transfer {
                    match transfer.action {
                        action if action.is_copy() => session.files_copied += 1,
                        TransferAction::Deleted => session.files_deleted += 1,
                        _ => {}
                    }
                }
                if line.is_error() {
                    session.errors += 1;
                }
            }

            parsed.lines.push(line);
        }

        if let Some(session) = open {
            parsed.sessions.push(session);
        }
        parsed
    }

    fn parse_line(&self, raw: &str) -> LogLine {
        let Some(caps) = self.line_pattern.captures(raw) else {
            return LogLine {
                raw: raw.to_string(),
                time: None,
                level: None,
                transfer: None,
            };
        };
        let time = PrimitiveDateTime::parse(&caps[1], LOG_TIME_FORMAT).ok();
        let level = caps[2].to_string();
        let rest = &caps[3];
        let transfer = self.object_pattern.captures(rest).and_then(|object| {
            let file = object[1].trim().to_string();
            let message = object[2].trim().to_string();
            let action = if level == "ERROR" {
                Some(TransferAction::Error)
            } else {
                TransferAction::from_message(&message)
            }?;
            Some(Transfer {
                time,
                file,
                action,
                message,
            })
        });
        LogLine {
            raw: raw.to_string(),
            time,
            level: Some(level),
            transfer,
        }
    }
}

pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn log_timestamp(at: OffsetDateTime) -> String {
    at.format(LOG_TIME_FORMAT)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn format_log_time(at: PrimitiveDateTime) -> String {
    at.format(LOG_TIME_FORMAT)
        .unwrap_or_else(|_| at.to_string())
}

pub fn parse_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let split = text
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number.parse().ok()?;
    let multiplier: f64 = match unit.trim() {
        "" | "B" | "Byte" | "Bytes" => 1.0,
        "k" | "K" | "KB" | "KiB" | "kBytes" | "KBytes" => 1024.0,
        "M" | "MB" | "MiB" | "MBytes" => 1024.0 * 1024.0,
        "G" | "GB" | "GiB" | "GBytes" => 1024.0 * 1024.0 * 1024.0,
        "T" | "TB" | "TiB" | "TBytes" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((value * multiplier).round() as u64)
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}
