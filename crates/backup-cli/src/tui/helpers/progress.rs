use super::*;

pub(in crate::tui) fn progress_bar(step: usize, total: usize, width: usize) -> String {
    if total == 0 || width == 0 {
        return "[]".to_string();
    }
    let filled = ((step as f32 / total as f32) * width as f32).round() as usize;
    let filled = filled.min(width);
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(empty))
}

pub(in crate::tui) fn ratio_bar(ratio: f64, width: usize) -> String {
    let permille = (ratio.clamp(0.0, 1.0) * 1000.0).round() as usize;
    progress_bar(permille, 1000, width)
}

pub(in crate::tui) fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec <= 0.0 {
        return "-".to_string();
    }
    format!("{}/s", format_bytes(bytes_per_sec.round() as u64))
}

pub(in crate::tui) fn progress_lines(progress: &BackupProgress) -> Vec<String> {
    let pair = progress.current_pair.as_deref().unwrap_or("-");
    let mut lines = vec![
        format!(
            "Pair {}/{}: {pair}",
            progress.pair_index.min(progress.pair_total),
            progress.pair_total
        ),
        format!(
            "{} {:>5.1}%",
            ratio_bar(progress.ratio(), PROGRESS_BAR_WIDTH),
            progress.ratio() * 100.0
        ),
        format!(
            "Files: {}/{}  Bytes: {} / {}  Speed: {}",
            progress.files_done,
            progress.files_total,
            format_bytes(progress.bytes_done),
            format_bytes(progress.bytes_total),
            format_speed(progress.speed)
        ),
        format!("Errors: {}", progress.errors),
    ];
    if !progress.message.is_empty() {
        lines.push(format!("Last: {}", progress.message));
    }
    lines
}
