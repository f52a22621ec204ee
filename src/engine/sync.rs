use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::engine::DelayEngine;
use crate::engine::annotate::{FileError, annotate_bytes, file_name};
use crate::error::{EngineError, EngineResult};
use crate::store::day_store::{list_json_files, write_atomic};
use crate::store::tracking::{TRACKING_TIME_FORMAT, current_second, modified_at};
use crate::store::{DayStore, TrackingState};

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SyncReport {
    /// Files copied for the first time.
    pub newly_copied: Vec<String>,
    /// Previously tracked files whose source changed.
    pub updated: Vec<String>,
    pub errors: Vec<FileError>,
}

impl SyncReport {
    pub fn changed(&self) -> usize {
        self.newly_copied.len() + self.updated.len()
    }
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SyncStatus {
    #[schema(example = "07-01-2025 18:04:09")]
    pub last_run: Option<String>,
    pub last_report: Option<SyncReport>,
    /// Set when the last pass failed as a whole.
    pub last_error: Option<String>,
    pub passes: u64,
}

/// Copies changed source day files into the derived store and annotates them.
#[derive(Debug)]
pub struct SyncEngine {
    source_dir: PathBuf,
    derived: Arc<DayStore>,
    tracking_path: PathBuf,
    engine: DelayEngine,
    pass_lock: Mutex<()>,
    status: RwLock<SyncStatus>,
}

impl SyncEngine {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        derived: Arc<DayStore>,
        tracking_path: impl Into<PathBuf>,
        engine: DelayEngine,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            derived,
            tracking_path: tracking_path.into(),
            engine,
            pass_lock: Mutex::new(()),
            status: RwLock::new(SyncStatus::default()),
        }
    }

    pub fn derived(&self) -> &DayStore {
        &self.derived
    }

    pub fn engine(&self) -> &DelayEngine {
        &self.engine
    }

    pub fn status(&self) -> SyncStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one full pass. Only one pass runs at a time; a second caller waits.
    pub fn sync(&self) -> EngineResult<SyncReport> {
        let _pass = self.pass_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let result = self.run_pass();

        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        status.passes += 1;
        status.last_run = Some(format_tracked(Local::now().naive_local()));
        match &result {
            Ok(report) => {
                status.last_report = Some(report.clone());
                status.last_error = None;
            }
            Err(e) => status.last_error = Some(e.to_string()),
        }
        result
    }

    fn run_pass(&self) -> EngineResult<SyncReport> {
        let files = list_json_files(&self.source_dir)?;
        fs::create_dir_all(self.derived.root())
            .map_err(|e| EngineError::io(self.derived.root(), e))?;

        let mut tracking = TrackingState::load(&self.tracking_path);
        let mut report = SyncReport::default();

        for source in files {
            let name = file_name(&source);
            let modified = match modified_at(&source) {
                Ok(t) => t,
                Err(e) => {
                    warn!(file = %name, error = %e, "Cannot stat source file");
                    report.errors.push(FileError::new(&source, e));
                    continue;
                }
            };

            if modified <= tracking.last_seen_or_epoch(&name) {
                continue;
            }
            let previous = tracking.last_seen(&name);
            let read_at = current_second();

            match self.copy_and_annotate(&source, &name) {
                Ok(()) => {
                    // A write later in the same second would not move the tracked time.
                    if modified < read_at {
                        tracking.record(&name, modified);
                    } else {
                        debug!(file = %name, "Source modified this second; rechecking next pass");
                    }
                    if previous.is_some() {
                        report.updated.push(name);
                    } else {
                        report.newly_copied.push(name);
                    }
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "Sync failed for file");
                    report.errors.push(FileError::new(&source, e));
                }
            }
        }

        if report.changed() > 0 {
            if let Err(e) = tracking.flush() {
                warn!(path = %self.tracking_path.display(), error = %e, "Could not persist sync tracking");
            }
        }

        info!(
            newly_copied = report.newly_copied.len(),
            updated = report.updated.len(),
            errors = report.errors.len(),
            tracked = tracking.len(),
            "Sync pass complete"
        );
        Ok(report)
    }

    /// The derived copy is replaced only once the source has been annotated in full.
    fn copy_and_annotate(&self, source: &Path, name: &str) -> EngineResult<()> {
        let bytes = fs::read(source).map_err(|e| EngineError::io(source, e))?;
        let target = self.derived.root().join(name);
        let annotated = annotate_bytes(&self.engine, &target, &bytes)?;

        let _guard = self.derived.lock();
        write_atomic(&target, &annotated)?;
        debug!(file = %name, bytes = annotated.len(), "Copied and annotated");
        Ok(())
    }
}

/// Tracked time rendered the way the tracking file stores it.
pub fn format_tracked(t: NaiveDateTime) -> String {
    t.format(TRACKING_TIME_FORMAT).to_string()
}
