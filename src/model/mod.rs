pub mod coerce;
pub mod types;

pub use coerce::coerce_number;
pub use types::{Collections, Dataset, EntityMetric, Metric, MetricPair, TOTAL_RECORDS};
