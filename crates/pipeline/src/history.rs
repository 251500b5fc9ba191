//! Historical series for charting.

use vibewatch_core::reading::StoredReading;
use vibewatch_core::sampling::{sample_uniform, try_sample_adaptive, SampleMethod};
use vibewatch_core::store::VibrationStore;
use vibewatch_core::types::{DbId, TimeRange};

use crate::error::PipelineError;

/// Default output cap for charted series.
pub const DEFAULT_SERIES_LIMIT: usize = 1000;

/// Stored readings for `sensor_id` in `range`, oldest first, reduced to at
/// most `limit` points with `method`.
pub async fn load_series<S: VibrationStore + ?Sized>(
    store: &S,
    sensor_id: DbId,
    range: TimeRange,
    method: SampleMethod,
    limit: usize,
) -> Result<Vec<StoredReading>, PipelineError> {
    let series = store.query_readings(sensor_id, range).await?;
    let total = series.len();

    let sampled = match method {
        SampleMethod::None => series,
        SampleMethod::Uniform => sample_uniform(&series, limit),
        SampleMethod::Adaptive => match try_sample_adaptive(&series, limit) {
            Ok(sampled) => sampled,
            Err(e) => {
                tracing::warn!(sensor_id, error = %e, "Adaptive sampling failed, using uniform spacing");
                sample_uniform(&series, limit)
            }
        },
    };

    tracing::debug!(sensor_id, total, returned = sampled.len(), ?method, "Loaded reading series");
    Ok(sampled)
}
