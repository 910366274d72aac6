//! Chat history listing command.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use crate::state::AppState;

/// Print one page of stored messages, newest first.
pub async fn list_history(
    state: &AppState,
    limit: Option<i64>,
    offset: Option<i64>,
    json: bool,
) -> Result<()> {
    let page = state.history.page(limit, offset).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.records.is_empty() {
        println!();
        println!("  {} No messages stored yet.", style("ℹ").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Time").fg(Color::White),
        Cell::new("Sender").fg(Color::White),
        Cell::new("Message").fg(Color::White),
    ]);

    for record in &page.records {
        table.add_row(vec![
            Cell::new(record.id).fg(Color::DarkGrey),
            Cell::new(record.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(record.sender_id).fg(Color::Cyan),
            Cell::new(truncate(&record.content, 80)),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {}",
        style(format!(
            "Showing {}-{} of {} messages",
            page.offset + 1,
            page.offset + page.records.len() as i64,
            page.total
        ))
        .dim()
    );
    println!();

    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
