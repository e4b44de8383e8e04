pub mod device;
pub mod release;
pub mod session;
pub mod vote;

use actix::prelude::*;
use color_eyre::eyre::Report;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

pub const VOTES_KEY: &str = "turma-volei-votes";
pub const DEVICE_TOKEN_KEY: &str = "turma-volei-fingerprint";
pub const RELEASE_FLAG_KEY: &str = "turma-volei-results-released";
pub const OPERATOR_SESSION_KEY: &str = "turma-volei-admin-session";

/// Durable origin-scoped key/value store: one file per key under the
/// configured directory. Reads of absent keys are `None`; everything else
/// surfaces as an error to the caller.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, Report> {
        match fs::read_to_string(self.dir.join(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), Report> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(key), value)?;
        Ok(())
    }
}

/// Tab-lifetime store: in memory only, gone when the process exits.
#[derive(Debug, Default)]
pub struct SessionStorage {
    items: HashMap<String, String>,
}

impl SessionStorage {
    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_owned(), value.to_owned());
    }

    pub fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Sole owner of persisted state. Every vote, token and flag access goes
/// through a message to this actor.
#[derive(Debug)]
pub struct StorageExecutor {
    local: LocalStorage,
    pub(crate) session: SessionStorage,
}

impl StorageExecutor {
    pub fn new(local: LocalStorage) -> Self {
        Self {
            local,
            session: SessionStorage::default(),
        }
    }

    pub fn local(&mut self) -> LocalStorage {
        self.local.clone()
    }
}

impl Actor for StorageExecutor {
    type Context = Context<Self>;
}

impl Default for StorageExecutor {
    fn default() -> Self {
        unimplemented!("StorageExecutor cannot automatically be started")
    }
}

impl SystemService for StorageExecutor {}
impl Supervised for StorageExecutor {}
