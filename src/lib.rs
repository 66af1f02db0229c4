//! recordedBy identifier quality dashboard.
//!
//! Loads the publisher and hosting-organization statistics produced by the
//! GBIF SQL downloads, normalizes both schemas into [`model::EntityMetric`],
//! and drives a searchable, sortable list with a per-entity identifier-type
//! breakdown.

pub mod breakdown;
pub mod config;
pub mod enrich;
pub mod ingest;
pub mod model;
pub mod nodes;
pub mod normalize;
pub mod query;
pub mod render;
pub mod view;

pub use breakdown::{Breakdown, Bucket};
pub use config::DashboardConfig;
pub use model::{coerce_number, Collections, Dataset, EntityMetric};
pub use normalize::normalize;
pub use query::{query, SortDirection, SortSpec};
pub use view::{current_view, reduce, Event, View, ViewState};
