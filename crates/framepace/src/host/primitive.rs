use std::fmt;

use super::HostError;

/// Invoked once on the next display refresh with the frame timestamp (ms).
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Invoked once when the host loop has nothing else to do.
pub type IdleCallback = Box<dyn FnOnce(IdleDeadline)>;

/// Invoked once after a fixed delay.
pub type TimerCallback = Box<dyn FnOnce()>;

/// One of the three wake-up primitives a host may offer.
///
/// Ordered by measurement accuracy: frame-synchronized callbacks first, the
/// fixed-delay timer last.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    AnimationFrame,
    IdleCallback,
    Timer,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Primitive::AnimationFrame => "animation-frame callback",
            Primitive::IdleCallback => "idle callback",
            Primitive::Timer => "timer",
        })
    }
}

/// Optional primitives reported by a host. The timer is always assumed present.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Capabilities {
    pub animation_frame: bool,
    pub idle_callback: bool,
}

impl Capabilities {
    /// Every primitive available.
    pub const ALL: Capabilities = Capabilities { animation_frame: true, idle_callback: true };

    /// Only the timer fallback.
    pub const TIMER_ONLY: Capabilities = Capabilities { animation_frame: false, idle_callback: false };

    /// Picks the most accurate primitive this host offers for sampling.
    pub fn best_source(self) -> Primitive {
        if self.animation_frame {
            Primitive::AnimationFrame
        } else if self.idle_callback {
            Primitive::IdleCallback
        } else {
            Primitive::Timer
        }
    }

    pub fn supports(self, primitive: Primitive) -> bool {
        match primitive {
            Primitive::AnimationFrame => self.animation_frame,
            Primitive::IdleCallback => self.idle_callback,
            Primitive::Timer => true,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// Budget information handed to idle callbacks.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct IdleDeadline {
    /// Milliseconds left before the host expects control back.
    pub time_remaining_ms: f64,
    /// Whether the callback fired because a timeout expired rather than idleness.
    pub did_timeout: bool,
}

/// Platform services used by the estimator.
///
/// All callbacks run on the host's single event-loop thread. A host must never
/// invoke a callback from inside the `request_*`/`set_timeout` call that
/// registered it.
pub trait Host {
    /// Monotonic high-resolution clock in milliseconds.
    fn now(&self) -> f64;

    /// Which optional primitives exist. Queried once per estimator.
    fn capabilities(&self) -> Capabilities;

    fn request_animation_frame(&self, callback: FrameCallback) -> Result<(), HostError> {
        let _ = callback;
        Err(HostError::Unsupported(Primitive::AnimationFrame))
    }

    fn request_idle_callback(&self, callback: IdleCallback) -> Result<(), HostError> {
        let _ = callback;
        Err(HostError::Unsupported(Primitive::IdleCallback))
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_source_prefers_animation_frame() {
        assert_eq!(Capabilities::ALL.best_source(), Primitive::AnimationFrame);
    }

    #[test]
    fn best_source_falls_back_to_idle() {
        let caps = Capabilities { animation_frame: false, idle_callback: true };
        assert_eq!(caps.best_source(), Primitive::IdleCallback);
    }

    #[test]
    fn best_source_falls_back_to_timer() {
        assert_eq!(Capabilities::TIMER_ONLY.best_source(), Primitive::Timer);
    }

    #[test]
    fn timer_is_always_supported() {
        assert!(Capabilities::TIMER_ONLY.supports(Primitive::Timer));
        assert!(!Capabilities::TIMER_ONLY.supports(Primitive::IdleCallback));
    }
}
