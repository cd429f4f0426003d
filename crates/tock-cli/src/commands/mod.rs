pub mod config;
pub mod stats;
pub mod task;
pub mod timer;

use std::path::PathBuf;

use tock_core::storage::{data_dir, database::DB_FILE};
use tock_core::{Config, Coordinator, Database, SessionEngine, TaskStore};

/// Resolved data directory and configuration shared by every command.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn new(data_dir_override: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let data_dir = match data_dir_override {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                dir
            }
            None => data_dir()?,
        };
        let config = Config::load_from(&data_dir).unwrap_or_else(|e| {
            eprintln!("warning: {e}; using default configuration");
            Config::default()
        });
        Ok(Self { data_dir, config })
    }

    pub fn open_store(&self) -> Result<TaskStore<Database>, Box<dyn std::error::Error>> {
        let db = Database::open_at(&self.data_dir.join(DB_FILE))?;
        Ok(TaskStore::load(db))
    }

    /// A fresh engine from config, with the active task's duration applied.
    pub fn coordinator(&self) -> Result<Coordinator<Database>, Box<dyn std::error::Error>> {
        let engine = SessionEngine::from_config(&self.config.timer);
        let mut coord = Coordinator::new(engine, self.open_store()?);
        coord.sync_focus_to_active()?;
        Ok(coord)
    }
}
