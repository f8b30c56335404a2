//! Export rendering for completed runs.
//!
//! Two formats, both listing the same fields per block: a Markdown A/V
//! table document for humans, and a CSV for spreadsheets. CSV fields are
//! quoted RFC-4180 style so embedded delimiters, quotes and newlines
//! survive a round-trip.

use std::borrow::Cow;

use sr_protocol::{format_timecode, HistoryItem, ScriptBlock};

/// Column headers shared by both exports.
const COLUMNS: [&str; 5] = [
    "timecode",
    "blockType",
    "visualDescription",
    "narration",
    "secondaryText",
];

/// Render a run as a Markdown A/V table document.
pub fn render_document(item: &HistoryItem) -> String {
    let total = item.blocks.last().map(|b| b.timecode_end).unwrap_or(0);

    let mut out = format!(
        "# A/V Script: {}\n\n- Generated: {}\n- Model: {}\n- Blocks: {}\n- Runtime: {}\n\n",
        item.topic,
        item.created_at.format("%Y-%m-%d %H:%M UTC"),
        item.model_id,
        item.blocks.len(),
        format_timecode(total),
    );

    out.push_str("| Timecode | Type | Visual | Narration | Overlay |\n");
    out.push_str("| --- | --- | --- | --- | --- |\n");
    for block in &item.blocks {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            block.timecode(),
            block.block_type.as_str(),
            table_cell(&block.visual_description),
            table_cell(&block.raw_text),
            table_cell(&block.secondary_text),
        ));
    }
    out
}

/// Render blocks as CSV with a header row.
pub fn render_csv(blocks: &[ScriptBlock]) -> String {
    let mut out = COLUMNS.join(",");
    out.push_str("\r\n");
    for block in blocks {
        let fields = [
            block.timecode(),
            block.block_type.as_str().to_string(),
            block.visual_description.clone(),
            block.raw_text.clone(),
            block.secondary_text.clone(),
        ];
        let row: Vec<Cow<'_, str>> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Keep a cell on one line and keep the table's pipes intact.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Quote a field when it contains a delimiter, quote or line break;
/// embedded quotes are doubled.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
