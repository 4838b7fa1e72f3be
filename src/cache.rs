use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::debug;
use serde_json::Value;

/// One raw history payload per calendar day, as `history.MM-DD-YYYY.json`.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotCache { dir: dir.into() }
    }

    /// `NESTORY_CACHE_DIR`, or the working directory.
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("NESTORY_CACHE_DIR").unwrap_or_else(|| ".".into()))
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("history.{}.json", date.format("%m-%d-%Y")))
    }

    pub fn load(&self, date: NaiveDate) -> Result<Option<Value>> {
        let path = self.path_for(date);
        if !path.exists() {
            return Ok(None);
        }
        let buf = fs::read(&path).with_context(|| format!("reading {:?}", path))?;
        let value = serde_json::from_slice(&buf)
            .with_context(|| format!("JSON-deserializing {:?}", path))?;
        debug!("loaded cached history from {:?}", path);
        Ok(Some(value))
    }

    /// Writes the payload unless the day already has a snapshot. Returns whether it wrote.
    pub fn save(&self, date: NaiveDate, history: &Value) -> Result<bool> {
        let path = self.path_for(date);
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {:?}", self.dir))?;
        fs::write(&path, serde_json::to_vec(history)?)
            .with_context(|| format!("writing {:?}", path))?;
        debug!("saved history snapshot to {:?}", path);
        Ok(true)
    }
}
