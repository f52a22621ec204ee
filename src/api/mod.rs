pub mod attendance;
pub mod reports;
pub mod staff;
pub mod sync;

use actix_web::web;

use crate::error::{EngineError, EngineResult};

/// Run file-bound engine work on the blocking pool.
pub(crate) async fn blocking<F, T>(f: F) -> actix_web::Result<T>
where
    F: FnOnce() -> EngineResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = web::block(f).await.map_err(EngineError::from)?;
    Ok(result?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    use crate::config::StoreKind;
    use crate::engine::DelayEngine;
    use crate::engine::classifier::ProfileTable;
    use crate::engine::delay::DelayCalculator;
    use crate::model::staff::StaffProfile;
    use crate::state::AppState;
    use crate::store::DayStore;

    /// State over `root/source` and `root/derived` with two teaching profiles.
    pub fn state(root: &Path) -> AppState {
        let mut raw = HashMap::new();
        for (id, name) in [("T1", "Asha"), ("T2", "Ravi")] {
            raw.insert(
                id.to_string(),
                StaffProfile {
                    name: name.into(),
                    category: "Teaching Faculty".into(),
                    ..Default::default()
                },
            );
        }
        let engine = DelayEngine::new(Arc::new(ProfileTable::from_entries(raw)), DelayCalculator::default());
        std::fs::create_dir_all(root.join("source")).unwrap();
        AppState::new(
            engine,
            Arc::new(DayStore::new(root.join("source"))),
            Arc::new(DayStore::new(root.join("derived"))),
            root.join("tracking.json"),
            StoreKind::Derived,
        )
    }
}
