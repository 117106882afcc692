//! Display refresh-interval estimation.
//!
//! `framepace` measures how long a display frame lasts from inside a host
//! event loop and serves a clamped, smoothed frame duration for animation
//! timing.
//!
//! ```rust,ignore
//! let host = Rc::new(SimHost::new(SimConfig::display(120.0)));
//! let estimator = RefreshRateEstimator::new(Rc::clone(&host))?;
//! estimator.on_ready(|hz| log::info!("display runs at {hz:.1} Hz"));
//!
//! host.run_until_idle(1_000);
//! let fade_ms = estimator.duration_for_frames(12, DurationOptions::new().rounded());
//! ```

pub mod estimator;
pub mod host;
pub mod logging;
pub mod time;

pub use estimator::{DurationOptions, EstimatorConfig, RefreshRateEstimator};
pub use host::{Capabilities, Host, HostError, Primitive};
