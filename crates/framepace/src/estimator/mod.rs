//! Refresh-rate estimation.
//!
//! A [`RefreshRateEstimator`] samples the host's best wake-up primitive for
//! roughly one second's worth of frames, averages the intervals, clamps the
//! result to a sane range and then serves it for animation timing.

mod config;
mod estimator;
mod options;
mod samples;

pub use config::EstimatorConfig;
pub use estimator::RefreshRateEstimator;
pub use options::DurationOptions;
pub use samples::{
    clamp_frame_duration, SampleBuffer, DEFAULT_FRAME_MS, MAX_FRAME_MS, MIN_FRAME_MS,
    SAMPLE_WINDOW,
};
