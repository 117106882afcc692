/// Post-processing applied by [`RefreshRateEstimator::duration_for_frames`].
///
/// `min` is applied before `max`; when `min > max` the result can end up at
/// `max`. The bounds are not reconciled.
///
/// [`RefreshRateEstimator::duration_for_frames`]: super::RefreshRateEstimator::duration_for_frames
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct DurationOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub rounded: bool,
}

impl DurationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min_ms: f64) -> Self {
        self.min = Some(min_ms);
        self
    }

    pub fn max(mut self, max_ms: f64) -> Self {
        self.max = Some(max_ms);
        self
    }

    pub fn rounded(mut self) -> Self {
        self.rounded = true;
        self
    }

    pub(crate) fn apply(&self, mut duration_ms: f64) -> f64 {
        if let Some(min) = self.min {
            if duration_ms < min {
                duration_ms = min;
            }
        }
        if let Some(max) = self.max {
            if duration_ms > max {
                duration_ms = max;
            }
        }
        if self.rounded {
            duration_ms = duration_ms.round();
        }
        duration_ms
    }
}
