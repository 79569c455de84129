//! Plain-text tables for terminal output.

use prettytable::{format, row, Table};

use crate::{notes::Note, semantic::ScoredNote};

/// Longest content preview shown in a table cell
const PREVIEW_CHARS: usize = 60;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn notes_table(notes: &[Note]) -> String {
    let mut table = new_table();
    table.set_titles(row!["ID", "CREATED", "SOURCE", "CONTENT"]);

    for note in notes {
        table.add_row(row![
            note.id,
            note.created_at.format(TIME_FORMAT),
            note.source_file.as_deref().unwrap_or("-"),
            preview(&note.content, PREVIEW_CHARS)
        ]);
    }

    table.to_string()
}

pub fn ranked_table(results: &[ScoredNote]) -> String {
    let mut table = new_table();
    table.set_titles(row!["RANK", "ID", "SCORE", "CONTENT", "CREATED"]);

    for (idx, result) in results.iter().enumerate() {
        table.add_row(row![
            idx + 1,
            result.note.id,
            format!("{:.4}", result.score),
            preview(&result.note.content, PREVIEW_CHARS),
            result.note.created_at.format(TIME_FORMAT)
        ]);
    }

    table.to_string()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table
}

pub fn note_detail(note: &Note) -> String {
    let mut out = format!(
        "ID:      {}\nCreated: {}\n",
        note.id,
        note.created_at.format(TIME_FORMAT)
    );
    if let Some(source) = &note.source_file {
        out.push_str(&format!("Source:  {source}\n"));
    }
    if !note.has_embedding() {
        out.push_str("Embedding: none (excluded from find)\n");
    }
    out.push('\n');
    out.push_str(&note.content);
    out
}

/// Collapse whitespace to single spaces and cut at `max` chars.
fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
