pub mod lifecycle;
pub mod reconcile;
pub mod sweeper;
