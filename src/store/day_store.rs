use chrono::NaiveDate;
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::model::attendance::{AttendanceEvent, DayFile};
use crate::utils::time_utils::{DATE_FORMAT, parse_date};

pub const DAY_FILE_EXTENSION: &str = "json";

/// Directory of `YYYY-MM-DD.json` day files.
#[derive(Debug)]
pub struct DayStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles issued through this store.
    write_lock: Mutex<()>,
}

impl DayStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("{}.{DAY_FILE_EXTENSION}", date.format(DATE_FORMAT)))
    }

    /// Hold this for the whole read-modify-write of a day file.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail-closed read: absent or malformed files are an empty day.
    pub fn read_day(&self, date: NaiveDate) -> DayFile {
        match self.try_read_day(date) {
            Ok(Some(day)) => day,
            Ok(None) => DayFile::empty(date),
            Err(e) => {
                warn!(date = %date, error = %e, "Treating unreadable day file as empty");
                DayFile::empty(date)
            }
        }
    }

    /// `Ok(None)` when the file does not exist; `Err` when it exists but is unusable.
    pub fn try_read_day(&self, date: NaiveDate) -> EngineResult<Option<DayFile>> {
        let path = self.path_for(date);
        match read_events(&path) {
            Ok(events) => Ok(Some(DayFile { date, events })),
            Err(EngineError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn write_day(&self, day: &DayFile) -> EngineResult<()> {
        let path = self.path_for(day.date);
        fs::create_dir_all(&self.root).map_err(|e| EngineError::io(&self.root, e))?;
        write_events(&path, &day.events)
    }
}

/// Date encoded in a day file's stem.
pub fn day_of(path: &Path) -> Option<NaiveDate> {
    path.file_stem().and_then(|s| s.to_str()).and_then(parse_date)
}

/// Regular `.json` files directly under `dir`, skipping our own temp files.
pub fn list_json_files(dir: &Path) -> EngineResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::io(dir, e))?;
        let path = entry.path();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(DAY_FILE_EXTENSION));
        let is_temp = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if is_file && is_json && !is_temp {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse a day file; anything but a JSON list of events is an error.
pub fn read_events(path: &Path) -> EngineResult<Vec<AttendanceEvent>> {
    let bytes = fs::read(path).map_err(|e| EngineError::io(path, e))?;
    parse_events(path, &bytes)
}

/// The file must be a JSON list; a row that is not an event object is skipped with a warning.
pub fn parse_events(path: &Path, bytes: &[u8]) -> EngineResult<Vec<AttendanceEvent>> {
    let rows: Vec<Value> = serde_json::from_slice(bytes).map_err(|e| EngineError::parse(path, e))?;
    let mut events = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<AttendanceEvent>(row) {
            Ok(event) => events.push(event),
            Err(e) => warn!(path = %path.display(), index, error = %e, "Skipping malformed row"),
        }
    }
    Ok(events)
}

pub fn render_events(path: &Path, events: &[AttendanceEvent]) -> EngineResult<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(events).map_err(|e| EngineError::parse(path, e))?;
    out.push(b'\n');
    Ok(out)
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
pub fn write_events(path: &Path, events: &[AttendanceEvent]) -> EngineResult<()> {
    write_atomic(path, &render_events(path, events)?)
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> EngineResult<()> {
    let temp = temp_path_for(path);
    let result = (|| {
        let mut file = fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(EngineError::io(path, e));
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
