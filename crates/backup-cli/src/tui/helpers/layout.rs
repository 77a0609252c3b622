use super::*;

pub(in crate::tui) fn slice_with_scroll(
    lines: &[String],
    scroll: usize,
    height: usize,
) -> Vec<String> {
    if lines.is_empty() || height == 0 {
        return Vec::new();
    }
    let start = scroll.min(lines.len());
    let end = (start + height).min(lines.len());
    lines[start..end].to_vec()
}

pub(in crate::tui) fn max_scroll_for_lines(content_len: usize, area_height: u16) -> usize {
    let body_height = area_height.saturating_sub(2) as usize;
    content_len.saturating_sub(body_height)
}

pub(in crate::tui) fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { index.min(len - 1) }
}

pub(in crate::tui) fn adjust_scroll(
    selected: usize,
    scroll: usize,
    height: usize,
    len: usize,
) -> usize {
    if len == 0 || height == 0 {
        return 0;
    }
    if selected < scroll {
        return selected;
    }
    let last_visible = scroll.saturating_add(height).saturating_sub(1);
    if selected > last_visible {
        let new_scroll = selected.saturating_sub(height - 1);
        return new_scroll.min(len.saturating_sub(1));
    }
    scroll
}

/// Applies Up/Down/PgUp/PgDn/Home/End to a scroll offset. Returns `None`
/// for keys that do not scroll.
pub(in crate::tui) fn scroll_for_key(code: KeyCode, scroll: usize) -> Option<usize> {
    const PAGE: usize = 10;
    match code {
        KeyCode::Up => Some(scroll.saturating_sub(1)),
        KeyCode::Down => Some(scroll.saturating_add(1)),
        KeyCode::PageUp => Some(scroll.saturating_sub(PAGE)),
        KeyCode::PageDown => Some(scroll.saturating_add(PAGE)),
        KeyCode::Home => Some(0),
        KeyCode::End => Some(usize::MAX / 2),
        _ => None,
    }
}

pub(in crate::tui) fn selector_line(label: &str, options: &[&str], index: usize) -> String {
    let parts: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            if idx == index {
                format!("[{option}]")
            } else {
                option.to_string()
            }
        })
        .collect();
    format!("{label}: {}", parts.join(" "))
}

pub(in crate::tui) fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(in crate::tui) fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
