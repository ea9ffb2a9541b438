//! JSON cache of provider records, one file per `{slug}_{version}` stem.

use std::fs;
use std::path::{Path, PathBuf};

use crate::content::VerseRecord;
use crate::error::{Result, WorksheetError};

#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open (and create if needed) a store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.json"))
    }

    /// A cached record, if one exists. A file that exists but does not
    /// parse is an error, not a cache miss.
    pub fn load(&self, stem: &str) -> Result<Option<VerseRecord>> {
        let path = self.path_for(stem);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        VerseRecord::from_json(&json).map(Some)
    }

    pub fn save(&self, stem: &str, record: &VerseRecord) -> Result<PathBuf> {
        let path = self.path_for(stem);
        fs::write(&path, serde_json::to_string_pretty(record)?)?;
        log::debug!("cached record at {}", path.display());
        Ok(path)
    }

    /// The cached record for `stem`, or else the result of `fetch`. A fetched
    /// record is stamped with the requested `cursive` flag and saved before it
    /// is returned; a cached one is returned untouched.
    pub fn load_or_fetch<E, F>(&self, stem: &str, cursive: bool, fetch: F) -> Result<VerseRecord, E>
    where
        E: From<WorksheetError>,
        F: FnOnce() -> Result<VerseRecord, E>,
    {
        if let Some(record) = self.load(stem)? {
            log::info!("using cached record {}", self.path_for(stem).display());
            return Ok(record);
        }
        let mut record = fetch()?;
        record.cursive = Some(cursive);
        self.save(stem, &record)?;
        Ok(record)
    }

    /// Every `*.json` file in the store, sorted by name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();
        Ok(paths)
    }
}
