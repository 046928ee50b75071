pub mod handler;

use std::time::{SystemTime, UNIX_EPOCH};

use unicode_width::UnicodeWidthChar;

pub fn get_active_track_icon(is_playing: bool) -> &'static str {
    if !is_playing {
        return "⏸";
    }

    const FRAME_STEP_MS: u128 = 150;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    match (now / FRAME_STEP_MS) % 4 {
        0 => "▁",
        1 => "▃",
        2 => "▅",
        _ => "▃",
    }
}

/// Cuts `text` to at most `width` terminal columns, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    let total: usize = text.chars().filter_map(UnicodeWidthChar::width).sum();
    if total <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
