use std::cell::RefCell;
use std::time::Instant;

use framepace::host::{FrameCallback, IdleCallback, IdleDeadline, TimerCallback};
use framepace::time::MonotonicClock;
use framepace::{Capabilities, Host, HostError, Primitive};

/// Budget handed to idle callbacks when no timer is due sooner.
const IDLE_BUDGET_MS: f64 = 50.0;

/// Host backed by a winit event loop.
///
/// - animation frames run on `RedrawRequested`
/// - idle callbacks run from `about_to_wait`
/// - timers are honored through `ControlFlow::WaitUntil`
///
/// Requests are only queued here; [`crate::app::ProbeApp`] drains them from
/// the event-loop callbacks.
pub struct WinitHost {
    clock: MonotonicClock,
    capabilities: Capabilities,
    queues: RefCell<Queues>,
}

#[derive(Default)]
struct Queues {
    frames: Vec<FrameCallback>,
    idle: Vec<IdleCallback>,
    timers: Vec<(f64, TimerCallback)>,
}

impl WinitHost {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            clock: MonotonicClock::new(),
            capabilities,
            queues: RefCell::new(Queues::default()),
        }
    }

    pub fn wants_frame(&self) -> bool {
        !self.queues.borrow().frames.is_empty()
    }

    pub fn has_idle_work(&self) -> bool {
        !self.queues.borrow().idle.is_empty()
    }

    /// Earliest timer deadline, as an `Instant` for `ControlFlow::WaitUntil`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queues
            .borrow()
            .timers
            .iter()
            .map(|(due, _)| *due)
            .min_by(f64::total_cmp)
            .map(|due| self.clock.instant_at(due))
    }

    /// Runs every queued frame callback with one shared timestamp.
    pub fn run_frame(&self) {
        let callbacks = std::mem::take(&mut self.queues.borrow_mut().frames);
        let timestamp = self.clock.now_ms();
        for callback in callbacks {
            callback(timestamp);
        }
    }

    /// Runs expired timers in deadline order.
    pub fn run_due_timers(&self) {
        let now = self.clock.now_ms();
        let mut due = {
            let mut queues = self.queues.borrow_mut();
            let (due, pending): (Vec<_>, Vec<_>) =
                std::mem::take(&mut queues.timers).into_iter().partition(|(at, _)| *at <= now);
            queues.timers = pending;
            due
        };
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (_, callback) in due {
            callback();
        }
    }

    /// Runs the idle callbacks queued before this call.
    pub fn run_idle(&self) {
        let callbacks = std::mem::take(&mut self.queues.borrow_mut().idle);
        if callbacks.is_empty() {
            return;
        }

        let now = self.clock.now_ms();
        let budget = self
            .next_deadline()
            .map_or(IDLE_BUDGET_MS, |at| (self.clock.ms_at(at) - now).max(0.0))
            .min(IDLE_BUDGET_MS);

        for callback in callbacks {
            callback(IdleDeadline { time_remaining_ms: budget, did_timeout: false });
        }
    }
}

impl Host for WinitHost {
    fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn request_animation_frame(&self, callback: FrameCallback) -> Result<(), HostError> {
        if !self.capabilities.animation_frame {
            return Err(HostError::Unsupported(Primitive::AnimationFrame));
        }
        self.queues.borrow_mut().frames.push(callback);
        Ok(())
    }

    fn request_idle_callback(&self, callback: IdleCallback) -> Result<(), HostError> {
        if !self.capabilities.idle_callback {
            return Err(HostError::Unsupported(Primitive::IdleCallback));
        }
        self.queues.borrow_mut().idle.push(callback);
        Ok(())
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> Result<(), HostError> {
        let due = self.clock.now_ms() + delay_ms.max(0.0);
        self.queues.borrow_mut().timers.push((due, callback));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn frames_share_a_timestamp() {
        let host = WinitHost::new(Capabilities::ALL);
        let stamps = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..2 {
            let s = Rc::clone(&stamps);
            host.request_animation_frame(Box::new(move |ts| s.borrow_mut().push(ts))).unwrap();
        }

        assert!(host.wants_frame());
        host.run_frame();

        let stamps = stamps.borrow();
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps[0], stamps[1]);
        assert!(!host.wants_frame());
    }

    #[test]
    fn future_timers_stay_queued() {
        let host = WinitHost::new(Capabilities::TIMER_ONLY);
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        host.set_timeout(60_000.0, Box::new(move || f.set(true))).unwrap();

        host.run_due_timers();

        assert!(!fired.get());
        assert!(host.next_deadline().is_some());
    }

    #[test]
    fn expired_timers_run() {
        let host = WinitHost::new(Capabilities::TIMER_ONLY);
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        host.set_timeout(0.0, Box::new(move || f.set(true))).unwrap();

        host.run_due_timers();

        assert!(fired.get());
        assert!(host.next_deadline().is_none());
    }

    #[test]
    fn hidden_primitives_are_unsupported() {
        let host = WinitHost::new(Capabilities::TIMER_ONLY);
        assert_eq!(
            host.request_idle_callback(Box::new(|_: IdleDeadline| {})).unwrap_err(),
            HostError::Unsupported(Primitive::IdleCallback)
        );
    }
}
