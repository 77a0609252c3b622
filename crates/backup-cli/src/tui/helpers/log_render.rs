use super::*;
use time::Date;

pub(in crate::tui) fn render_log(log: &ParsedLog, mode: LogMode, today: Date) -> Vec<String> {
    match mode {
        LogMode::All => line_texts(&log.lines, "The backup log is empty."),
        LogMode::Today => line_texts(&log.on_date(today), "No log lines for today."),
        LogMode::Recent => line_texts(&log.last(RECENT_LOG_LINES), "The backup log is empty."),
        LogMode::Sessions => session_rows(&log.sessions),
        LogMode::Stats => stats_rows(&log.stats()),
    }
}

fn line_texts(lines: &[LogLine], empty: &str) -> Vec<String> {
    if lines.is_empty() {
        return vec![empty.to_string()];
    }
    lines.iter().map(|line| line.raw.clone()).collect()
}

fn time_label(time: Option<time::PrimitiveDateTime>) -> String {
    time.map(format_log_time).unwrap_or_else(|| "-".to_string())
}

fn session_rows(sessions: &[SyncSession]) -> Vec<String> {
    if sessions.is_empty() {
        return vec!["No backup sessions recorded yet.".to_string()];
    }
    let mut rows = vec![format!(
        "{:<19}  {:<10}  {:<12}  {:>6}  {:>7}  {:>6}  {:>10}",
        "started", "status", "label", "copied", "deleted", "errors", "bytes"
    )];
    for session in sessions.iter().rev() {
        rows.push(format!(
            "{:<19}  {:<10}  {:<12}  {:>6}  {:>7}  {:>6}  {:>10}",
            time_label(session.started),
            session.status.label(),
            session.label,
            session.files_copied,
            session.files_deleted,
            session.errors,
            format_bytes(session.bytes_transferred)
        ));
    }
    rows
}

fn stats_rows(stats: &LogStats) -> Vec<String> {
    vec![
        format!("Sessions:          {}", stats.sessions),
        format!("Successful:        {}", stats.successful),
        format!("Failed:            {}", stats.failed),
        format!("Files copied:      {}", stats.files_copied),
        format!("Files deleted:     {}", stats.files_deleted),
        format!("Errors:            {}", stats.errors),
        format!("Bytes transferred: {}", format_bytes(stats.bytes_transferred)),
        format!("Last backup:       {}", time_label(stats.last_backup)),
        format!(
            "Last status:       {}",
            stats
                .last_status
                .map(|status| status.label())
                .unwrap_or("-")
        ),
    ]
}
