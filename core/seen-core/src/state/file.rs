//! Durable storage for the session map.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "sessions": {
//!     "Steve": { "joined": 1700000000, "left": 1700000500 },
//!     "Steve@bot": { "joined": 1700000600, "left": 0 }
//!   }
//! }
//! ```
//!
//! Sessions with both timestamps zero are never written.
//!
//! # Legacy Formats
//!
//! Older releases wrote an unversioned map, either `{name: {joined, left}}` or
//! the signed form `{name: n}` where a negative `n` means "online since `-n`".
//! A legacy file found at one of the legacy paths is migrated once: records
//! the bot classifier flags are renamed to their bot alias, the canonical file
//! is written, and the legacy file is removed. An unversioned map at the
//! canonical path is upgraded without renaming.
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a failed save leaves the previous file intact.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use super::store::SessionStore;
use super::types::SessionRecord;
use crate::error::{Result, SeenError};
use crate::identity::{bot_alias, has_bot_marker, BotClassifier};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    sessions: BTreeMap<String, SessionRecord>,
}

/// A record as older releases wrote it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
enum LegacyRecord {
    Record(SessionRecord),
    Signed(i64),
}

enum Decoded {
    Current(BTreeMap<String, SessionRecord>),
    Legacy(BTreeMap<String, LegacyRecord>),
}

/// Location of the canonical store file and the legacy files it replaces.
#[derive(Debug, Clone)]
pub struct Persistence {
    store_file: PathBuf,
    legacy_files: Vec<PathBuf>,
}

impl Persistence {
    pub fn new(store_file: impl Into<PathBuf>, legacy_files: Vec<PathBuf>) -> Self {
        Persistence {
            store_file: store_file.into(),
            legacy_files,
        }
    }

    pub fn store_file(&self) -> &Path {
        &self.store_file
    }

    /// Reads the store, migrating a legacy file if the canonical one is absent.
    /// With no file at all, writes an empty store so the next start finds one.
    pub fn load(&self, classifier: &dyn BotClassifier) -> Result<SessionStore> {
        if self.store_file.exists() {
            return self.load_canonical();
        }

        if let Some(legacy) = self.legacy_files.iter().find(|p| p.is_file()) {
            return self.migrate_from(legacy, classifier);
        }

        tracing::info!(
            path = %self.store_file.display(),
            "No store file found, creating empty store"
        );
        let store = SessionStore::new();
        self.save(&store.records())?;
        Ok(store)
    }

    pub fn save(&self, records: &BTreeMap<String, SessionRecord>) -> Result<()> {
        let store_file = StoreFile {
            version: STORE_VERSION,
            sessions: records.clone(),
        };
        let content = serde_json::to_string_pretty(&store_file).map_err(|e| SeenError::Json {
            context: "serializing store file".to_string(),
            source: e,
        })?;

        let write_failure = |source: std::io::Error| SeenError::PersistenceWriteFailure {
            path: self.store_file.clone(),
            source,
        };

        let parent_dir = parent_dir(&self.store_file);
        fs::create_dir_all(parent_dir).map_err(write_failure)?;
        let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(write_failure)?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(write_failure)?;
        temp_file.flush().map_err(write_failure)?;
        temp_file
            .persist(&self.store_file)
            .map_err(|e| write_failure(e.error))?;

        tracing::debug!(path = %self.store_file.display(), sessions = records.len(), "Store saved");
        Ok(())
    }

    fn load_canonical(&self) -> Result<SessionStore> {
        let path = &self.store_file;
        let content = read_store_file(path)?;

        if content.trim().is_empty() {
            tracing::warn!(path = %path.display(), "Empty store file, starting with empty store");
            return Ok(SessionStore::new());
        }

        match decode(path, &content)? {
            Decoded::Current(records) => Ok(SessionStore::from_records(records)),
            Decoded::Legacy(entries) => {
                let records = migrate_legacy(entries, None);
                tracing::info!(
                    path = %path.display(),
                    sessions = records.len(),
                    "Upgraded unversioned store file"
                );
                self.save(&records)?;
                Ok(SessionStore::from_records(records))
            }
        }
    }

    fn migrate_from(&self, legacy: &Path, classifier: &dyn BotClassifier) -> Result<SessionStore> {
        let content = read_store_file(legacy)?;
        let records = if content.trim().is_empty() {
            BTreeMap::new()
        } else {
            match decode(legacy, &content)? {
                Decoded::Current(records) => records,
                Decoded::Legacy(entries) => migrate_legacy(entries, Some(classifier)),
            }
        };

        self.save(&records)?;
        fs::remove_file(legacy).map_err(|e| SeenError::Io {
            context: format!("removing migrated legacy store {}", legacy.display()),
            source: e,
        })?;

        tracing::info!(
            from = %legacy.display(),
            to = %self.store_file.display(),
            sessions = records.len(),
            "Migrated legacy store file"
        );
        Ok(SessionStore::from_records(records))
    }
}

fn read_store_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SeenError::Io {
        context: "reading store file".to_string(),
        source: e,
    })
}

fn decode(path: &Path, content: &str) -> Result<Decoded> {
    let malformed = |details: String| SeenError::MalformedStoreFile {
        path: path.to_path_buf(),
        details,
    };

    let value: Value = serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?;
    let is_versioned = value.get("version").is_some_and(Value::is_number)
        && value.get("sessions").is_some_and(Value::is_object);

    if is_versioned {
        let file: StoreFile = serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
        if file.version != STORE_VERSION {
            return Err(malformed(format!(
                "unsupported version {} (expected {})",
                file.version, STORE_VERSION
            )));
        }
        Ok(Decoded::Current(file.sessions))
    } else {
        serde_json::from_value(value)
            .map(Decoded::Legacy)
            .map_err(|e| malformed(e.to_string()))
    }
}

/// Converts legacy entries to current records. With a classifier, names it
/// flags as bots are moved to their bot alias.
fn migrate_legacy(
    entries: BTreeMap<String, LegacyRecord>,
    classifier: Option<&dyn BotClassifier>,
) -> BTreeMap<String, SessionRecord> {
    let mut records: BTreeMap<String, SessionRecord> = BTreeMap::new();

    for (name, legacy) in entries {
        let record = match legacy {
            LegacyRecord::Record(record) => record,
            LegacyRecord::Signed(n) if n < 0 => SessionRecord { joined: -n, left: 0 },
            LegacyRecord::Signed(0) => SessionRecord::default(),
            LegacyRecord::Signed(n) => SessionRecord { joined: n - 1, left: n },
        };
        if record == SessionRecord::default() {
            continue;
        }

        let key = match classifier {
            Some(c) if !has_bot_marker(&name) && c.is_bot(&name) => bot_alias(&name),
            _ => name,
        };

        let newer = records
            .get(&key)
            .map_or(true, |existing| target_of(existing) < target_of(&record));
        if newer {
            records.insert(key, record);
        }
    }

    records
}

fn target_of(record: &SessionRecord) -> i64 {
    if record.joined > record.left {
        record.joined
    } else {
        record.left
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
