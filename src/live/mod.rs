//! Live metrics pipeline
//!
//! Polling feeds deliver sensor snapshots to views; each view folds them into
//! its own rolling window and renders through a sink.

pub mod aggregator;
pub mod marker;
pub mod poller;
pub mod selection;
pub mod summary;
pub mod view;

pub use aggregator::{AggregatePoint, LiveAggregator, LiveTotals, RollingWindow};
pub use poller::{FeedHandle, SensorSource, Snapshot};
pub use selection::{Selection, SelectionStore};
pub use summary::{DistrictRanking, DistrictStats, FleetSummary};
pub use view::WindowView;
