pub mod day_store;
pub mod tracking;

pub use day_store::DayStore;
pub use tracking::TrackingState;
