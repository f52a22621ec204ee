use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Config, StoreKind};
use crate::engine::DelayEngine;
use crate::engine::classifier::ProfileTable;
use crate::engine::delay::DelayCalculator;
use crate::engine::resolver::RecordResolver;
use crate::engine::sync::SyncEngine;
use crate::store::DayStore;

/// Shared by every handler through `web::Data`.
#[derive(Debug)]
pub struct AppState {
    pub engine: DelayEngine,
    /// Store for listings, reports and mutations.
    pub store: Arc<DayStore>,
    pub resolver: RecordResolver,
    pub sync: Arc<SyncEngine>,
}

impl AppState {
    pub fn new(
        engine: DelayEngine,
        source: Arc<DayStore>,
        derived: Arc<DayStore>,
        tracking_path: impl Into<std::path::PathBuf>,
        store: StoreKind,
    ) -> Self {
        let working = match store {
            StoreKind::Source => Arc::clone(&source),
            StoreKind::Derived => Arc::clone(&derived),
        };
        let sync = Arc::new(SyncEngine::new(
            source.root(),
            derived,
            tracking_path,
            engine.clone(),
        ));
        Self {
            resolver: RecordResolver::new(engine.clone(), Arc::clone(&working)),
            engine,
            store: working,
            sync,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let profiles = Arc::new(ProfileTable::load(&config.profile_path));
        if profiles.is_empty() {
            warn!(path = %config.profile_path.display(), "No staff profiles loaded; everyone classifies as Teaching");
        }
        let calculator = DelayCalculator::new(config.delay_model, config.missing_checkout);
        info!(
            model = config.delay_model.as_ref(),
            missing_checkout = config.missing_checkout.as_ref(),
            store = config.store.as_ref(),
            profiles = profiles.len(),
            "Delay engine ready"
        );

        Self::new(
            DelayEngine::new(profiles, calculator),
            Arc::new(DayStore::new(&config.attendance_dir)),
            Arc::new(DayStore::new(&config.derived_dir)),
            &config.tracking_path,
            config.store,
        )
    }
}
