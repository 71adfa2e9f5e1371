// Query runners: one provider query per metric, normalized to the display unit

mod aggregate;
mod samples;

pub use aggregate::AggregationQueryRunner;
pub use samples::SampleSeriesQueryRunner;
