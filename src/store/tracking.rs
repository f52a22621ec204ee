use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::store::day_store::write_atomic;

/// On-disk format of tracked modification times.
pub const TRACKING_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Last-seen source modification time per file name.
#[derive(Debug, Clone)]
pub struct TrackingState {
    path: PathBuf,
    entries: BTreeMap<String, NaiveDateTime>,
}

impl TrackingState {
    /// Missing or unreadable state starts empty; bad entries are skipped.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, String>>(&text) {
                Ok(raw) => raw
                    .into_iter()
                    .filter_map(|(name, stamp)| {
                        NaiveDateTime::parse_from_str(&stamp, TRACKING_TIME_FORMAT)
                            .ok()
                            .map(|t| (name, t))
                    })
                    .collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring malformed sync tracking file");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries }
    }

    /// Tracked time, if any. Untracked files compare against the epoch.
    pub fn last_seen(&self, file_name: &str) -> Option<NaiveDateTime> {
        self.entries.get(file_name).copied()
    }

    pub fn last_seen_or_epoch(&self, file_name: &str) -> NaiveDateTime {
        // NaiveDateTime's default is the Unix epoch.
        self.last_seen(file_name).unwrap_or_default()
    }

    pub fn record(&mut self, file_name: &str, modified: NaiveDateTime) {
        self.entries.insert(file_name.to_string(), modified);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn flush(&self) -> EngineResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
        }
        let raw: BTreeMap<&str, String> = self
            .entries
            .iter()
            .map(|(name, t)| (name.as_str(), t.format(TRACKING_TIME_FORMAT).to_string()))
            .collect();
        let text = serde_json::to_vec_pretty(&raw).map_err(|e| EngineError::parse(&self.path, e))?;
        write_atomic(&self.path, &text)
    }
}

/// Local wall-clock modification time at whole-second precision, matching
/// what the tracking file can represent.
pub fn modified_at(path: &Path) -> EngineResult<NaiveDateTime> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| EngineError::io(path, e))?;
    let local: DateTime<Local> = modified.into();
    Ok(whole_second(local.naive_local()))
}

/// The current local second. A modification time at or after it can still be
/// followed by another write with the same tracked value.
pub fn current_second() -> NaiveDateTime {
    whole_second(Local::now().naive_local())
}

fn whole_second(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}
