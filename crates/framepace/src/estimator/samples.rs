/// Deltas collected before the estimate is finalized.
pub const SAMPLE_WINDOW: usize = 60;

/// Frame duration assumed until a measurement completes (60 Hz).
pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;

/// Shortest accepted frame duration (100 Hz).
pub const MIN_FRAME_MS: f64 = 10.0;

/// Longest accepted frame duration (50 Hz).
pub const MAX_FRAME_MS: f64 = 20.0;

/// Ordered inter-wakeup deltas in milliseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    deltas: Vec<f64>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self { deltas: Vec::with_capacity(SAMPLE_WINDOW + 1) }
    }

    /// Pairwise differences of consecutive absolute timestamps.
    pub fn from_timestamps(stamps: &[f64]) -> Self {
        Self { deltas: stamps.windows(2).map(|w| w[1] - w[0]).collect() }
    }

    pub fn push(&mut self, delta_ms: f64) {
        self.deltas.push(delta_ms);
    }

    /// Collection stops once the buffer holds more than the sample window.
    pub fn is_full(&self) -> bool {
        self.deltas.len() > SAMPLE_WINDOW
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.deltas
    }

    /// Arithmetic mean, or `None` for an empty buffer.
    pub fn mean(&self) -> Option<f64> {
        if self.deltas.is_empty() {
            return None;
        }
        Some(self.deltas.iter().sum::<f64>() / self.deltas.len() as f64)
    }
}

/// Constrains an averaged delta to the accepted frame duration range.
///
/// NaN falls back to the default assumption.
pub fn clamp_frame_duration(mean_ms: f64) -> f64 {
    if mean_ms.is_nan() {
        return DEFAULT_FRAME_MS;
    }
    mean_ms.clamp(MIN_FRAME_MS, MAX_FRAME_MS)
}
