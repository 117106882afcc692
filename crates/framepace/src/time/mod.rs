//! Native time source.
//!
//! Provides the millisecond clock native hosts hand to the estimator. Browser
//! hosts use `performance.now()` instead.

mod clock;

pub use clock::MonotonicClock;
