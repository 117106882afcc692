use std::fmt;

use framepace::{DurationOptions, Primitive, RefreshRateEstimator};

/// Frame counts shown as example animation spans.
const SPANS: [u32; 3] = [1, 10, 60];

/// Snapshot of a finished measurement.
#[derive(Debug, Clone)]
pub struct Report {
    pub source: Primitive,
    pub refresh_rate_hz: f64,
    pub frame_duration_ms: f64,
    pub samples: usize,
    pub spans_ms: Vec<(u32, f64)>,
}

impl Report {
    pub fn from_estimator(estimator: &RefreshRateEstimator) -> Self {
        Self {
            source: estimator.source(),
            refresh_rate_hz: estimator.refresh_rate_hz(),
            frame_duration_ms: estimator.duration(0.0),
            samples: estimator.sample_count(),
            spans_ms: SPANS
                .iter()
                .map(|&n| (n, estimator.duration_for_frames(n, DurationOptions::new().rounded())))
                .collect(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  source      {}", self.source)?;
        writeln!(f, "  samples     {}", self.samples)?;
        writeln!(f, "  frame       {:.3} ms", self.frame_duration_ms)?;
        write!(f, "  refresh     {:.2} Hz", self.refresh_rate_hz)?;
        for (frames, ms) in &self.spans_ms {
            write!(f, "\n  {frames:>3} frames  {ms} ms")?;
        }
        Ok(())
    }
}
