use anyhow::Context;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_BUFFER_ENTRIES: usize = 200;

/// Crates whose events reach the TUI log panel. Everything else only goes to
/// the application log file.
const PANEL_SOURCES: [&str; 2] = ["backup_core", "cloud_backup"];

#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub time: String,
    pub level: Level,
    pub source: &'static str,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl LogEntry {
    /// `HH:MM:SS LEVEL module message | key=value ...`
    pub fn panel_line(&self) -> String {
        let module = self.source.rsplit("::").next().unwrap_or(self.source);
        let mut line = format!("{} {:<5} {module} {}", self.time, self.level, self.message);
        if !self.fields.is_empty() {
            let pairs: Vec<String> = self
                .fields
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            line.push_str(" | ");
            line.push_str(&pairs.join(" "));
        }
        line
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::ERROR
    }

    pub fn is_warning(&self) -> bool {
        self.level == Level::WARN
    }
}

/// Shared ring of the most recent panel entries.
#[derive(Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// The newest `count` entries, oldest first.
    pub fn latest(&self, count: usize) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| {
                let skip = entries.len().saturating_sub(count);
                entries.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    fn record(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }
}

/// Copies events from this workspace's crates into a [`LogBuffer`].
pub struct PanelLayer {
    buffer: LogBuffer,
}

impl<S> Layer<S> for PanelLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let metadata = event.metadata();
        let source = metadata.target();
        if !PANEL_SOURCES.iter().any(|prefix| source.starts_with(prefix)) {
            return;
        }
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        self.buffer.record(LogEntry {
            time: clock_time(now),
            level: *metadata.level(),
            source,
            message: collector.message,
            fields: collector.fields,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: BTreeMap<String, String>,
}

impl FieldCollector {
    fn store(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.store(field, format!("{value:?}"));
    }
}

fn clock_time(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour repr:24]:[minute]:[second]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

// The terminal belongs to the TUI, so the fmt layer writes to a file.
pub fn init(app_log: &Path) -> anyhow::Result<LogBuffer> {
    if let Some(parent) = app_log.parent() {
        fs::create_dir_all(parent).context("create app log dir")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(app_log)
        .with_context(|| format!("open app log {}", app_log.display()))?;
    let buffer = LogBuffer::new(LOG_BUFFER_ENTRIES);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(PanelLayer {
            buffer: buffer.clone(),
        })
        .try_init()
        .context("install tracing subscriber")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(time: &str, level: Level) -> LogEntry {
        LogEntry {
            time: time.to_string(),
            level,
            source: "backup_core::sync_pairs",
            message: "Adding sync pair".to_string(),
            fields: BTreeMap::from([
                ("pair".to_string(), "docs".to_string()),
                ("direction".to_string(), "upload".to_string()),
            ]),
        }
    }

    #[test]
    fn panel_line_shows_module_and_sorted_fields() {
        assert_eq!(
            entry("12:34:56", Level::INFO).panel_line(),
            "12:34:56 INFO  sync_pairs Adding sync pair | direction=upload pair=docs"
        );
    }

    #[test]
    fn buffer_keeps_latest_entries() {
        let buffer = LogBuffer::new(2);
        for idx in 0..3 {
            buffer.record(entry(&format!("00:00:0{idx}"), Level::DEBUG));
        }
        let kept = buffer.latest(10);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].time, "00:00:01");
        assert_eq!(buffer.latest(1)[0].time, "00:00:02");
    }

    #[test]
    fn layer_collects_workspace_events_only() {
        let buffer = LogBuffer::new(10);
        let subscriber = tracing_subscriber::registry().with(PanelLayer {
            buffer: buffer.clone(),
        });
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(
                target: "backup_core::lockfile",
                path = "/tmp/x",
                "Taking over stale backup lock"
            );
            tracing::info!(target: "hyper::client", "ignored");
        });
        let kept = buffer.latest(10);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].is_warning());
        assert_eq!(kept[0].message, "Taking over stale backup lock");
        assert_eq!(kept[0].fields.get("path").map(String::as_str), Some("/tmp/x"));
    }
}
