//! Configuration and storage status command.

use anyhow::Result;
use console::style;

use campus_core::history::HistoryRepository;
use campus_infra::filesystem::config_path;

use crate::state::AppState;

/// Display configuration and stored message count.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let stored = state.history.repository().count().await?;
    let config = &state.config;
    let idle = match config.idle_timeout() {
        Some(timeout) => format!("{}s", timeout.as_secs()),
        None => "disabled".to_string(),
    };

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "config": &**config,
            "stored_messages": stored,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Campus chat v{}",
        style("💬").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Server ──").dim());
    println!("  Listen:       {}:{}", config.host, config.port);
    println!("  Queue size:   {}", config.outbound_capacity);
    println!("  Idle timeout: {idle}");
    println!();

    println!("  {}", style("── History ──").dim());
    println!("  Stored:    {}", style(stored).bold());
    println!(
        "  Page size: {} (max {})",
        config.history_page_size, config.max_page_size
    );
    println!();

    println!("  {}", style("── System ──").dim());
    println!(
        "  Data dir: {}",
        style(state.data_dir.display()).dim()
    );
    println!(
        "  Config:   {}",
        style(config_path(&state.data_dir).display()).dim()
    );
    println!(
        "  Database: {}",
        style("SQLite (WAL mode)").dim()
    );
    println!();

    Ok(())
}
