use std::time::Duration;

/// Estimator configuration.
#[derive(Debug, Clone, Default)]
pub struct EstimatorConfig {
    /// Wall-clock budget for the whole measurement.
    ///
    /// When it elapses before the sample window fills, the estimate is
    /// finalized from whatever deltas exist (the default duration if none).
    /// `None` waits indefinitely, which parks `on_ready` callbacks forever on a
    /// host whose primitive never fires.
    pub measurement_timeout: Option<Duration>,
}

impl EstimatorConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { measurement_timeout: Some(timeout) }
    }
}
