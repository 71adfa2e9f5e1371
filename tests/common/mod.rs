// Shared test helpers

use chrono::{DateTime, Duration, TimeZone, Utc};
use healthmetrics::models::{Inclusivity, TimeWindow};
use healthmetrics::provider::{MemoryProvider, StoredSample};
use healthmetrics::registry::ids;
use healthmetrics::units::Unit;
use std::sync::Arc;

pub fn day0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap()
}

pub fn at(day: i64, hour: i64) -> DateTime<Utc> {
    day0() + Duration::days(day) + Duration::hours(hour)
}

/// `[day0 00:00, day0 00:00 + 7d]`, strict start.
pub fn week_window() -> TimeWindow {
    TimeWindow::new(day0(), at(7, 0), Inclusivity::StrictStart).unwrap()
}

/// Steps sum to 12345, distance to 3.1 mi, heart rate averages 72,
/// three systolic readings on days 1, 3 and 2.
pub fn demo_provider() -> Arc<MemoryProvider> {
    Arc::new(MemoryProvider::with_samples(vec![
        StoredSample::new(ids::STEP_COUNT, 12000.0, Unit::Count, at(1, 8), at(1, 9)),
        StoredSample::new(ids::STEP_COUNT, 345.0, Unit::Count, at(2, 8), at(2, 9)),
        StoredSample::new(
            ids::DISTANCE_WALKING_RUNNING,
            3.1,
            Unit::Mile,
            at(1, 8),
            at(1, 9),
        ),
        StoredSample::instant(ids::HEART_RATE, 70.0, Unit::CountPerMinute, at(1, 10)),
        StoredSample::instant(ids::HEART_RATE, 74.0, Unit::CountPerMinute, at(4, 10)),
        StoredSample::instant(
            ids::BLOOD_PRESSURE_SYSTOLIC,
            118.0,
            Unit::MillimeterOfMercury,
            at(1, 7),
        ),
        StoredSample::instant(
            ids::BLOOD_PRESSURE_SYSTOLIC,
            124.0,
            Unit::MillimeterOfMercury,
            at(3, 7),
        ),
        StoredSample::instant(
            ids::BLOOD_PRESSURE_SYSTOLIC,
            121.0,
            Unit::MillimeterOfMercury,
            at(2, 7),
        ),
    ]))
}
