pub mod di;
pub mod metrics;
pub mod reconciler;
pub mod state;
