use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

const DEFAULT_STORAGE_DIR: &str = "poll-data";

#[derive(Clone, Debug)]
pub struct Config {
    /// Directory backing the durable key/value store.
    pub storage_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let storage_dir = env::var("POLL_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_DIR));
        Self { storage_dir }
    }
}
