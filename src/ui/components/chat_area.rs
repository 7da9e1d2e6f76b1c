use chrono::Local;

use crate::common::{ContentType, Origin, TimelineEntry, TimelineUpdate};

/// One printable line per entry: `sender • time: content`.
pub fn format_entry(entry: &TimelineEntry, resolve_media: impl Fn(&str) -> String) -> String {
    let message = &entry.message;
    let time = message.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    let marker = match entry.origin {
        Origin::Own => ">",
        Origin::Peer => " ",
        Origin::System => "*",
    };
    let body = match message.content_type {
        ContentType::Text => message.content.clone(),
        ContentType::Image => format!("[image] {}", resolve_media(&message.content)),
    };
    format!("{marker} {} • {time}: {body}", message.sender)
}

pub fn render(update: &TimelineUpdate, resolve_media: impl Fn(&str) -> String) -> Vec<String> {
    match update {
        TimelineUpdate::Cleared => vec!["──────── new room ────────".to_string()],
        TimelineUpdate::Appended(entry) => vec![format_entry(entry, &resolve_media)],
        TimelineUpdate::Prepended(block) => {
            let mut lines = vec![format!("──────── {} earlier ────────", block.len())];
            lines.extend(block.iter().map(|entry| format_entry(entry, &resolve_media)));
            lines
        }
    }
}
