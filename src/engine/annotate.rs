use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::engine::DelayEngine;
use crate::error::{EngineError, EngineResult};
use crate::model::attendance::DayFile;
use crate::store::day_store::{day_of, list_json_files, parse_events, render_events, write_atomic};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileError {
    #[schema(example = "2025-01-07.json")]
    pub file: String,
    pub error: String,
}

impl FileError {
    pub fn new(path: &Path, error: impl ToString) -> Self {
        Self {
            file: file_name(path),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct AnnotationReport {
    pub annotated: Vec<String>,
    pub errors: Vec<FileError>,
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Normalize legacy fields and put one delay on every event of each person.
pub fn annotate_day(engine: &DelayEngine, day: &mut DayFile) {
    for event in day.events.iter_mut() {
        event.normalize();
    }
    for staff in day.staff_ids() {
        engine.reapply(day, &staff);
    }
}

/// Annotated rendering of a day file's contents. `path` supplies the date and names
/// the file in errors; nothing is read from or written to it.
pub fn annotate_bytes(engine: &DelayEngine, path: &Path, bytes: &[u8]) -> EngineResult<Vec<u8>> {
    let date = day_of(path)
        .ok_or_else(|| EngineError::parse(path, "file name is not a YYYY-MM-DD date"))?;

    let mut day = DayFile {
        date,
        events: parse_events(path, bytes)?,
    };
    annotate_day(engine, &mut day);
    render_events(path, &day.events)
}

/// Annotate one day file in place. Returns whether the file was rewritten;
/// a file already carrying current annotations is left untouched.
pub fn annotate_file(engine: &DelayEngine, path: &Path) -> EngineResult<bool> {
    let original = fs::read(path).map_err(|e| EngineError::io(path, e))?;
    let rendered = annotate_bytes(engine, path, &original)?;
    if rendered == original {
        debug!(file = %path.display(), "Annotation unchanged");
        return Ok(false);
    }

    write_atomic(path, &rendered)?;
    debug!(file = %path.display(), "Annotated day file");
    Ok(true)
}

/// Annotate every day file under `dir`; per-file failures are collected, not raised.
pub fn annotate_dir(engine: &DelayEngine, dir: &Path) -> AnnotationReport {
    let mut report = AnnotationReport::default();

    let files = match list_json_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Cannot list directory for annotation");
            report.errors.push(FileError {
                file: "*".to_string(),
                error: e.to_string(),
            });
            return report;
        }
    };

    for path in files {
        match annotate_file(engine, &path) {
            Ok(_) => report.annotated.push(file_name(&path)),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Annotation failed");
                report.errors.push(FileError::new(&path, e));
            }
        }
    }

    info!(
        dir = %dir.display(),
        annotated = report.annotated.len(),
        errors = report.errors.len(),
        "Annotation pass complete"
    );
    report
}
