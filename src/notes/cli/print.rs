use super::styles::{PLACE, RULE};
use chrono::{DateTime, Utc};
use colored::Colorize;
use notes::api::{CmdMessage, DisplayNote, MessageLevel, NoteView};
use notes::config::NotesConfig;
use notes::package::NOTE_EXTENSION;
use std::path::PathBuf;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 80;
const TIME_WIDTH: usize = 14;
const PENDING_MARKER: &str = "↓";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn display_stem(name: &str) -> &str {
    name.strip_suffix(NOTE_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(name)
}

pub(super) fn print_notes(notes: &[DisplayNote]) {
    if notes.is_empty() {
        println!("No notes found.");
        return;
    }

    for dn in notes {
        let idx_str = format!("{}. ", dn.index);
        let marker = if dn.entry.openable {
            "  ".to_string()
        } else {
            format!("{} ", PENDING_MARKER)
        };
        let time_ago = dn
            .entry
            .modified
            .map(format_time_ago)
            .unwrap_or_else(|| " ".repeat(TIME_WIDTH));

        let fixed_width = 4 + idx_str.width() + marker.width() + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let name = truncate_to_width(display_stem(&dn.entry.display_name), available);
        let padding = available.saturating_sub(name.width());

        let name_colored = if dn.entry.openable {
            name.normal()
        } else {
            name.dimmed()
        };

        println!(
            "    {}{}{}{}{}",
            idx_str.yellow(),
            name_colored,
            " ".repeat(padding),
            marker.cyan(),
            time_ago.dimmed()
        );
    }
}

pub(super) fn print_full_notes(notes: &[NoteView]) {
    for (i, view) in notes.iter().enumerate() {
        if i > 0 {
            println!();
            println!("{}", RULE.apply_to("================================"));
            println!();
        }
        println!(
            "{} {}",
            view.index.to_string().yellow(),
            display_stem(&view.name).bold()
        );
        if let Some(place) = &view.location {
            let label = match &place.name {
                Some(name) => format!("{} ({:.5}, {:.5})", name, place.latitude, place.longitude),
                None => format!("{:.5}, {:.5}", place.latitude, place.longitude),
            };
            println!("{}", PLACE.apply_to(label));
        }
        println!("{}", RULE.apply_to("--------------------------------"));
        let body = view
            .text
            .to_markdown()
            .unwrap_or_else(|_| view.text.text().to_string());
        println!("{}", body.trim_end());
    }
}

pub(super) fn print_paths(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

pub(super) fn print_config(config: &NotesConfig) {
    let show = |value: Option<String>| value.unwrap_or_else(|| "(unset)".to_string());
    println!(
        "cloud-dir = {}",
        show(config.cloud_dir.as_ref().map(|d| d.display().to_string()))
    );
    println!("download-command = {}", show(config.download_command.clone()));
    println!("poll-interval = {}", config.poll_interval_ms);
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
