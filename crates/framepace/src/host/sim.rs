use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::{
    Capabilities, FrameCallback, Host, HostError, IdleCallback, IdleDeadline, Primitive,
    TimerCallback,
};

/// Longest idle period a browser grants a single idle callback.
const MAX_IDLE_BUDGET_MS: f64 = 50.0;

/// Simulated host configuration.
///
/// Interval lists are cycled, so `vec![16.0, 17.0]` models a display that
/// alternates between the two periods.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub capabilities: Capabilities,
    /// Time between display refreshes (ms).
    pub frame_intervals: Vec<f64>,
    /// Time from an idle request until the loop is idle again (ms).
    pub idle_intervals: Vec<f64>,
    /// Added to every timer delay (ms).
    pub timer_latency_ms: f64,
    /// Primitives that accept requests but never fire.
    pub stalled: Vec<Primitive>,
    /// Primitives that reject every request.
    pub rejected: Vec<Primitive>,
}

impl SimConfig {
    /// A display refreshing at `hz` with every primitive available.
    pub fn display(hz: f64) -> Self {
        Self { frame_intervals: vec![1000.0 / hz], ..Self::default() }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn stall(mut self, primitive: Primitive) -> Self {
        self.stalled.push(primitive);
        self
    }

    pub fn reject(mut self, primitive: Primitive) -> Self {
        self.rejected.push(primitive);
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::ALL,
            frame_intervals: vec![1000.0 / 60.0],
            idle_intervals: vec![4.0],
            timer_latency_ms: 0.0,
            stalled: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Deterministic single-threaded host with a virtual clock.
///
/// Nothing runs on its own: callers drive the loop with [`SimHost::step`],
/// [`SimHost::run_until_idle`] or [`SimHost::advance_by`]. Time jumps straight
/// to the next due task.
pub struct SimHost {
    config: SimConfig,
    now: Cell<f64>,
    seq: Cell<u64>,
    next_vsync: Cell<f64>,
    frame_cursor: Cell<usize>,
    idle_cursor: Cell<usize>,
    queue: RefCell<BinaryHeap<Task>>,
    requested: RefCell<HashMap<Primitive, usize>>,
    fired: RefCell<HashMap<Primitive, usize>>,
}

impl SimHost {
    /// Intervals that are not finite and positive are dropped; a list left
    /// empty falls back to the default.
    pub fn new(mut config: SimConfig) -> Self {
        let defaults = SimConfig::default();
        usable_intervals(&mut config.frame_intervals, &defaults.frame_intervals, "frame");
        usable_intervals(&mut config.idle_intervals, &defaults.idle_intervals, "idle");
        if !(config.timer_latency_ms.is_finite() && config.timer_latency_ms >= 0.0) {
            log::warn!("ignoring timer latency {} ms", config.timer_latency_ms);
            config.timer_latency_ms = 0.0;
        }

        let first_vsync = config.frame_intervals[0];
        Self {
            config,
            now: Cell::new(0.0),
            seq: Cell::new(0),
            next_vsync: Cell::new(first_vsync),
            frame_cursor: Cell::new(1),
            idle_cursor: Cell::new(0),
            queue: RefCell::new(BinaryHeap::new()),
            requested: RefCell::new(HashMap::new()),
            fired: RefCell::new(HashMap::new()),
        }
    }

    /// Runs the earliest due task. Returns `false` when nothing is queued.
    pub fn step(&self) -> bool {
        let Some(task) = self.queue.borrow_mut().pop() else {
            return false;
        };

        if task.due > self.now.get() {
            self.now.set(task.due);
        }
        *self.fired.borrow_mut().entry(task.job.primitive()).or_default() += 1;

        // The queue borrow is released; callbacks are free to schedule more work.
        match task.job {
            Job::Frame(callback) => callback(task.due),
            Job::Idle(callback) => {
                let now = self.now.get();
                let budget = self
                    .queue
                    .borrow()
                    .peek()
                    .map_or(MAX_IDLE_BUDGET_MS, |next| (next.due - now).max(0.0))
                    .min(MAX_IDLE_BUDGET_MS);
                callback(IdleDeadline { time_remaining_ms: budget, did_timeout: false });
            }
            Job::Timer(callback) => callback(),
        }

        true
    }

    /// Steps until the queue drains or `max_steps` tasks have run.
    pub fn run_until_idle(&self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && self.step() {
            steps += 1;
        }
        steps
    }

    /// Runs every task due within the next `ms` milliseconds, then moves the
    /// clock to exactly `now + ms`.
    pub fn advance_by(&self, ms: f64) -> usize {
        let target = self.now.get() + ms;
        let mut steps = 0;
        loop {
            let due = self.queue.borrow().peek().map(|t| t.due);
            match due {
                Some(due) if due <= target => {
                    self.step();
                    steps += 1;
                }
                _ => break,
            }
        }
        self.now.set(target);
        steps
    }

    /// Number of callbacks waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// How many requests were made for `primitive`, including rejected ones.
    pub fn requests(&self, primitive: Primitive) -> usize {
        self.requested.borrow().get(&primitive).copied().unwrap_or(0)
    }

    /// How many callbacks of `primitive` have run.
    pub fn fired(&self, primitive: Primitive) -> usize {
        self.fired.borrow().get(&primitive).copied().unwrap_or(0)
    }

    fn admit(&self, primitive: Primitive) -> Result<bool, HostError> {
        *self.requested.borrow_mut().entry(primitive).or_default() += 1;

        if !self.config.capabilities.supports(primitive) {
            return Err(HostError::Unsupported(primitive));
        }
        if self.config.rejected.contains(&primitive) {
            return Err(HostError::rejected(primitive, "rejected by simulation config"));
        }
        Ok(!self.config.stalled.contains(&primitive))
    }

    fn enqueue(&self, due: f64, job: Job) {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.queue.borrow_mut().push(Task { due, seq, job });
    }

    fn next_cycled(values: &[f64], cursor: &Cell<usize>) -> f64 {
        let i = cursor.get();
        cursor.set(i.wrapping_add(1));
        values[i % values.len()]
    }

    /// First refresh strictly after the current time.
    fn upcoming_vsync(&self) -> f64 {
        let now = self.now.get();
        let mut vsync = self.next_vsync.get();
        while vsync <= now {
            vsync += Self::next_cycled(&self.config.frame_intervals, &self.frame_cursor);
        }
        self.next_vsync.set(vsync);
        vsync
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Host for SimHost {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    fn request_animation_frame(&self, callback: FrameCallback) -> Result<(), HostError> {
        if self.admit(Primitive::AnimationFrame)? {
            let due = self.upcoming_vsync();
            self.enqueue(due, Job::Frame(callback));
        }
        Ok(())
    }

    fn request_idle_callback(&self, callback: IdleCallback) -> Result<(), HostError> {
        if self.admit(Primitive::IdleCallback)? {
            let gap = Self::next_cycled(&self.config.idle_intervals, &self.idle_cursor);
            self.enqueue(self.now.get() + gap, Job::Idle(callback));
        }
        Ok(())
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> Result<(), HostError> {
        if self.admit(Primitive::Timer)? {
            let due = self.now.get() + delay_ms.max(0.0) + self.config.timer_latency_ms;
            self.enqueue(due, Job::Timer(callback));
        }
        Ok(())
    }
}

fn usable_intervals(intervals: &mut Vec<f64>, fallback: &[f64], what: &str) {
    let before = intervals.len();
    intervals.retain(|ms| ms.is_finite() && *ms > 0.0);
    if intervals.len() != before {
        log::warn!("dropped {} unusable {what} intervals", before - intervals.len());
    }
    if intervals.is_empty() {
        intervals.extend_from_slice(fallback);
    }
}

enum Job {
    Frame(FrameCallback),
    Idle(IdleCallback),
    Timer(TimerCallback),
}

impl Job {
    fn primitive(&self) -> Primitive {
        match self {
            Job::Frame(_) => Primitive::AnimationFrame,
            Job::Idle(_) => Primitive::IdleCallback,
            Job::Timer(_) => Primitive::Timer,
        }
    }
}

struct Task {
    due: f64,
    seq: u64,
    job: Job,
}

// `BinaryHeap` is a max-heap; invert so the earliest (due, seq) pops first.
impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        other.due.total_cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Task {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn log_into(log: &Rc<RefCell<Vec<String>>>, entry: &str) -> TimerCallback {
        let log = Rc::clone(log);
        let entry = entry.to_string();
        Box::new(move || log.borrow_mut().push(entry))
    }

    // ── timers ────────────────────────────────────────────────────────────

    #[test]
    fn timers_fire_in_due_order() {
        let host = SimHost::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        host.set_timeout(30.0, log_into(&log, "late")).unwrap();
        host.set_timeout(10.0, log_into(&log, "early")).unwrap();

        assert_eq!(host.run_until_idle(10), 2);
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(host.now(), 30.0);
    }

    #[test]
    fn equal_deadlines_keep_registration_order() {
        let host = SimHost::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        host.set_timeout(5.0, log_into(&log, "a")).unwrap();
        host.set_timeout(5.0, log_into(&log, "b")).unwrap();
        host.run_until_idle(10);

        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn timer_latency_is_added() {
        let host = SimHost::new(SimConfig { timer_latency_ms: 4.0, ..SimConfig::default() });
        host.set_timeout(16.0, Box::new(|| {})).unwrap();
        host.step();
        assert_eq!(host.now(), 20.0);
    }

    #[test]
    fn advance_by_stops_before_later_tasks() {
        let host = SimHost::default();
        host.set_timeout(10.0, Box::new(|| {})).unwrap();
        host.set_timeout(50.0, Box::new(|| {})).unwrap();

        assert_eq!(host.advance_by(20.0), 1);
        assert_eq!(host.now(), 20.0);
        assert_eq!(host.pending(), 1);
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn frames_land_on_vsync_boundaries() {
        let host = SimHost::new(SimConfig::display(100.0));
        let stamps = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..2 {
            let stamps = Rc::clone(&stamps);
            host.request_animation_frame(Box::new(move |ts| stamps.borrow_mut().push(ts)))
                .unwrap();
        }
        host.run_until_idle(10);

        let s = Rc::clone(&stamps);
        host.request_animation_frame(Box::new(move |ts| s.borrow_mut().push(ts))).unwrap();
        host.run_until_idle(10);

        // Both early requests share the first refresh.
        assert_eq!(*stamps.borrow(), vec![10.0, 10.0, 20.0]);
    }

    #[test]
    fn frame_intervals_cycle() {
        let host = SimHost::new(SimConfig {
            frame_intervals: vec![10.0, 20.0],
            ..SimConfig::default()
        });
        let stamps = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..3 {
            let s = Rc::clone(&stamps);
            host.request_animation_frame(Box::new(move |ts| s.borrow_mut().push(ts))).unwrap();
            host.run_until_idle(1);
        }

        assert_eq!(*stamps.borrow(), vec![10.0, 30.0, 40.0]);
    }

    // ── idle ──────────────────────────────────────────────────────────────

    #[test]
    fn idle_budget_is_capped() {
        let host = SimHost::default();
        let seen = Rc::new(Cell::new(IdleDeadline::default()));

        let s = Rc::clone(&seen);
        host.request_idle_callback(Box::new(move |d| s.set(d))).unwrap();
        host.step();

        assert_eq!(seen.get().time_remaining_ms, MAX_IDLE_BUDGET_MS);
        assert_eq!(host.now(), 4.0);
    }

    // ── interval validation ───────────────────────────────────────────────

    fn first_frame_at(config: SimConfig) -> f64 {
        let host = SimHost::new(config);
        let stamp = Rc::new(Cell::new(f64::NAN));
        let s = Rc::clone(&stamp);
        host.request_animation_frame(Box::new(move |ts| s.set(ts))).unwrap();
        host.run_until_idle(10);
        stamp.get()
    }

    #[test]
    fn zero_frame_interval_falls_back_to_default() {
        let config = SimConfig { frame_intervals: vec![0.0], ..SimConfig::default() };
        assert_eq!(first_frame_at(config), 1000.0 / 60.0);
    }

    #[test]
    fn degenerate_display_rates_fall_back_to_default() {
        assert_eq!(first_frame_at(SimConfig::display(f64::INFINITY)), 1000.0 / 60.0);
        assert_eq!(first_frame_at(SimConfig::display(0.0)), 1000.0 / 60.0);
        assert_eq!(first_frame_at(SimConfig::display(-30.0)), 1000.0 / 60.0);
    }

    #[test]
    fn unusable_intervals_are_skipped_in_cycle() {
        let host = SimHost::new(SimConfig {
            frame_intervals: vec![10.0, f64::NAN, -5.0, 20.0],
            ..SimConfig::default()
        });
        let stamps = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..3 {
            let s = Rc::clone(&stamps);
            host.request_animation_frame(Box::new(move |ts| s.borrow_mut().push(ts))).unwrap();
            host.run_until_idle(1);
        }
        assert_eq!(*stamps.borrow(), vec![10.0, 30.0, 40.0]);
    }

    #[test]
    fn zero_idle_interval_still_advances_time() {
        let host = SimHost::new(SimConfig { idle_intervals: vec![0.0], ..SimConfig::default() });
        host.request_idle_callback(Box::new(|_: IdleDeadline| {})).unwrap();
        host.step();
        assert_eq!(host.now(), 4.0);
    }

    // ── failure modes ─────────────────────────────────────────────────────

    #[test]
    fn unsupported_primitive_is_reported() {
        let host = SimHost::new(SimConfig::default().with_capabilities(Capabilities::TIMER_ONLY));
        let err = host.request_animation_frame(Box::new(|_: f64| {})).unwrap_err();
        assert_eq!(err, HostError::Unsupported(Primitive::AnimationFrame));
        assert_eq!(host.requests(Primitive::AnimationFrame), 1);
    }

    #[test]
    fn rejected_primitive_errors() {
        let host = SimHost::new(SimConfig::default().reject(Primitive::Timer));
        let err = host.set_timeout(1.0, Box::new(|| {})).unwrap_err();
        assert!(matches!(err, HostError::Rejected { primitive: Primitive::Timer, .. }));
    }

    #[test]
    fn stalled_primitive_never_fires() {
        let host = SimHost::new(SimConfig::default().stall(Primitive::IdleCallback));
        host.request_idle_callback(Box::new(|_: IdleDeadline| panic!("stalled callback ran"))).unwrap();

        assert_eq!(host.pending(), 0);
        assert!(!host.step());
        assert_eq!(host.requests(Primitive::IdleCallback), 1);
        assert_eq!(host.fired(Primitive::IdleCallback), 0);
    }
}
