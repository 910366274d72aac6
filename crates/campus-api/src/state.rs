//! Application state wiring the hub and history services together.
//!
//! AppState holds the concrete instances used by both CLI commands and the
//! HTTP server. The history service is generic over its repository; AppState
//! pins it to the SQLite implementation.

use std::path::PathBuf;
use std::sync::Arc;

use campus_core::history::{HistoryRecorder, HistoryService};
use campus_core::hub::{Hub, PumpOptions};
use campus_infra::config::{apply_overrides, load_config};
use campus_infra::filesystem::{database_path, resolve_data_dir};
use campus_infra::sqlite::history::SqliteHistoryRepository;
use campus_infra::sqlite::pool::DatabasePool;
use campus_types::config::ChatConfig;
use tokio::task::JoinHandle;

/// History service pinned to the SQLite repository.
pub type ConcreteHistoryService = HistoryService<SqliteHistoryRepository>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub history: Arc<ConcreteHistoryService>,
    /// Present only while the server is running.
    pub recorder: Option<HistoryRecorder>,
    pub config: Arc<ChatConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, build the hub.
    pub async fn init(host: Option<String>, port: Option<u16>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = apply_overrides(load_config(&data_dir).await, host, port);
        Self::open(data_dir, config).await
    }

    /// Build the state over an existing data directory with a resolved config.
    pub async fn open(data_dir: PathBuf, config: ChatConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::open(&database_path(&data_dir)).await?;
        let history =
            HistoryService::from_config(SqliteHistoryRepository::new(db_pool.clone()), &config);

        Ok(Self {
            hub: Arc::new(Hub::new(config.outbound_capacity)),
            history: Arc::new(history),
            recorder: None,
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }

    /// Start the background history writer and attach its handle.
    ///
    /// The returned task finishes once every clone of the state (and every
    /// session holding the recorder) has been dropped.
    pub fn with_recorder(mut self) -> (Self, JoinHandle<usize>) {
        let (recorder, writer) =
            HistoryRecorder::spawn(Arc::clone(&self.history), self.config.recorder_capacity);
        self.recorder = Some(recorder);
        (self, writer)
    }

    /// Options for the pumps of a newly accepted session.
    pub fn pump_options(&self) -> PumpOptions {
        PumpOptions {
            idle_timeout: self.config.idle_timeout(),
            recorder: self.recorder.clone(),
        }
    }
}
