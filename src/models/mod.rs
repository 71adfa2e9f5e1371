// Domain models

mod metric;
mod results;
mod snapshot;
mod window;

pub use metric::{AggregationMode, MetricKind};
pub use results::{AggregateResult, MetricOutcome, SampleEntry, SampleResult};
pub use snapshot::Snapshot;
pub use window::{Inclusivity, TimeWindow, WindowError};
