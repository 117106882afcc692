//! Host timing primitives.
//!
//! The estimator never touches a platform API directly. Everything it needs
//! (a monotonic clock plus three ways of being woken up later) goes through the
//! [`Host`] trait, so the same sampling code runs inside a browser page, a
//! native window loop, or a deterministic simulation.

mod error;
mod primitive;
mod sim;
#[cfg(feature = "web")]
mod web;

pub use error::HostError;
pub use primitive::{
    Capabilities, FrameCallback, Host, IdleCallback, IdleDeadline, Primitive, TimerCallback,
};
pub use sim::{SimConfig, SimHost};
#[cfg(feature = "web")]
pub use web::WebHost;
