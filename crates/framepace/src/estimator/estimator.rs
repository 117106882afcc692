use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use crate::host::{Host, HostError, IdleDeadline, Primitive};

use super::config::EstimatorConfig;
use super::options::DurationOptions;
use super::samples::{clamp_frame_duration, SampleBuffer, DEFAULT_FRAME_MS, SAMPLE_WINDOW};

/// Poll period of the timer fallback.
const TIMER_INTERVAL_MS: f64 = 16.0;

type ReadyCallback = Box<dyn FnOnce(f64)>;

/// Estimates the display refresh interval and serves it for animation timing.
///
/// Construction selects the host's best wake-up primitive and starts sampling
/// immediately. Until the sample window fills, queries return the 60 Hz
/// default. The handle is cheap to clone; all clones share one measurement.
///
/// The estimator is single-threaded (`!Send`) and expects its host to run
/// callbacks on the same loop that created it.
#[derive(Clone)]
pub struct RefreshRateEstimator {
    shared: Rc<Shared>,
}

struct Shared {
    host: Rc<dyn Host>,
    source: Primitive,
    state: RefCell<EstimatorState>,
}

struct EstimatorState {
    frame_duration_ms: f64,
    ready: bool,
    pending: Vec<ReadyCallback>,
    sampler: Sampler,
    samples_used: usize,
    /// Construction failed; no handle exists and queued callbacks must not run.
    abandoned: bool,
}

/// Per-source collection state. Exactly one variant exists per estimator.
enum Sampler {
    /// Running deltas between frame timestamps.
    AnimationFrame { last: f64, samples: SampleBuffer },
    /// Absolute wake-up times; differenced once the window is full.
    IdleCallback { stamps: Vec<f64> },
    /// Running deltas between fixed-delay ticks.
    Timer { last: f64, samples: SampleBuffer },
}

impl Sampler {
    fn start(source: Primitive, now: f64) -> Self {
        match source {
            Primitive::AnimationFrame => Sampler::AnimationFrame { last: now, samples: SampleBuffer::new() },
            Primitive::IdleCallback => Sampler::IdleCallback { stamps: Vec::with_capacity(SAMPLE_WINDOW + 1) },
            Primitive::Timer => Sampler::Timer { last: now, samples: SampleBuffer::new() },
        }
    }

    /// Records one wake-up. Returns the completed buffer once the window is full.
    fn record(&mut self, now: f64) -> Option<SampleBuffer> {
        match self {
            Sampler::AnimationFrame { last, samples } | Sampler::Timer { last, samples } => {
                samples.push(now - *last);
                if samples.is_full() {
                    return Some(mem::take(samples));
                }
                *last = now;
                None
            }
            Sampler::IdleCallback { stamps } => {
                stamps.push(now);
                if stamps.len() > SAMPLE_WINDOW {
                    let samples = SampleBuffer::from_timestamps(stamps);
                    stamps.clear();
                    return Some(samples);
                }
                None
            }
        }
    }

    /// Whatever has been collected so far, for a forced finalization.
    fn take_partial(&mut self) -> SampleBuffer {
        match self {
            Sampler::AnimationFrame { samples, .. } | Sampler::Timer { samples, .. } => mem::take(samples),
            Sampler::IdleCallback { stamps } => {
                let samples = SampleBuffer::from_timestamps(stamps);
                stamps.clear();
                samples
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Sampler::AnimationFrame { samples, .. } | Sampler::Timer { samples, .. } => samples.len(),
            Sampler::IdleCallback { stamps } => stamps.len().saturating_sub(1),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Completion {
    WindowFilled,
    TimedOut,
}

impl RefreshRateEstimator {
    /// Starts measuring on `host` with the default configuration.
    pub fn new<H: Host + 'static>(host: Rc<H>) -> Result<Self, HostError> {
        Self::with_config(host, EstimatorConfig::default())
    }

    /// Starts measuring on `host`.
    ///
    /// Fails only if the host refuses to arm the measurement timeout or to
    /// schedule the first sample. Later
    /// scheduling failures are logged and leave the estimator measuring (or
    /// are resolved by the configured timeout).
    pub fn with_config<H: Host + 'static>(
        host: Rc<H>,
        config: EstimatorConfig,
    ) -> Result<Self, HostError> {
        let host: Rc<dyn Host> = host;
        let source = host.capabilities().best_source();
        let now = host.now();

        log::debug!("refresh-rate estimation using {source}");

        let shared = Rc::new(Shared {
            host,
            source,
            state: RefCell::new(EstimatorState {
                frame_duration_ms: DEFAULT_FRAME_MS,
                ready: false,
                pending: Vec::new(),
                sampler: Sampler::start(source, now),
                samples_used: 0,
                abandoned: false,
            }),
        });

        // Timeout first: if it cannot be armed, nothing has been queued yet.
        if let Some(timeout) = config.measurement_timeout {
            let timeout_ms = timeout.as_secs_f64() * 1000.0;
            let s = Rc::clone(&shared);
            shared
                .host
                .set_timeout(timeout_ms, Box::new(move || on_timeout(&s)))?;
            log::debug!("measurement timeout armed at {timeout_ms:.0} ms");
        }

        if let Err(e) = schedule_sample(&shared) {
            // The armed timeout still holds the state; make it a no-op.
            shared.state.borrow_mut().abandoned = true;
            return Err(e);
        }

        Ok(Self { shared })
    }

    /// Current frame duration plus `offset_ms`.
    ///
    /// Before measurement completes this is based on the 60 Hz default.
    pub fn duration(&self, offset_ms: f64) -> f64 {
        self.shared.state.borrow().frame_duration_ms + offset_ms
    }

    /// Duration of `frames` frames, post-processed by `options`.
    pub fn duration_for_frames(&self, frames: u32, options: DurationOptions) -> f64 {
        options.apply(f64::from(frames) * self.duration(0.0))
    }

    /// Runs `callback` with the refresh rate (Hz) once measurement completes.
    ///
    /// If it already has, the callback runs immediately, before `on_ready`
    /// returns. Otherwise it is queued and run during finalization in
    /// registration order. The queue is unbounded; callers registering
    /// repeatedly on a host that never fires are responsible for its growth.
    pub fn on_ready(&self, callback: impl FnOnce(f64) + 'static) {
        let hz = {
            let mut state = self.shared.state.borrow_mut();
            if !state.ready {
                state.pending.push(Box::new(callback));
                return;
            }
            1000.0 / state.frame_duration_ms
        };
        callback(hz);
    }

    pub fn is_ready(&self) -> bool {
        self.shared.state.borrow().ready
    }

    /// `1000 / duration`, using the default before measurement completes.
    pub fn refresh_rate_hz(&self) -> f64 {
        1000.0 / self.duration(0.0)
    }

    /// The primitive chosen for sampling.
    pub fn source(&self) -> Primitive {
        self.shared.source
    }

    /// Deltas collected so far, or the number averaged once ready.
    pub fn sample_count(&self) -> usize {
        let state = self.shared.state.borrow();
        if state.ready {
            state.samples_used
        } else {
            state.sampler.len()
        }
    }

    /// Callbacks waiting for measurement to complete.
    pub fn pending_callbacks(&self) -> usize {
        self.shared.state.borrow().pending.len()
    }
}

impl std::fmt::Debug for RefreshRateEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("RefreshRateEstimator")
            .field("source", &self.shared.source)
            .field("frame_duration_ms", &state.frame_duration_ms)
            .field("ready", &state.ready)
            .field("pending", &state.pending.len())
            .finish()
    }
}

fn schedule_sample(shared: &Rc<Shared>) -> Result<(), HostError> {
    let s = Rc::clone(shared);
    match shared.source {
        Primitive::AnimationFrame => shared
            .host
            .request_animation_frame(Box::new(move |timestamp| on_sample(&s, timestamp))),
        Primitive::IdleCallback => {
            shared.host.request_idle_callback(Box::new(move |_deadline: IdleDeadline| {
                let now = s.host.now();
                on_sample(&s, now);
            }))
        }
        Primitive::Timer => shared.host.set_timeout(
            TIMER_INTERVAL_MS,
            Box::new(move || {
                let now = s.host.now();
                on_sample(&s, now);
            }),
        ),
    }
}

fn on_sample(shared: &Rc<Shared>, now: f64) {
    let completed = {
        let mut state = shared.state.borrow_mut();
        if state.ready {
            return;
        }
        state.sampler.record(now)
    };

    match completed {
        Some(samples) => finalize(shared, samples, Completion::WindowFilled),
        None => {
            if let Err(e) = schedule_sample(shared) {
                log::error!("refresh-rate sampling stalled: {e}");
            }
        }
    }
}

fn on_timeout(shared: &Rc<Shared>) {
    let samples = {
        let mut state = shared.state.borrow_mut();
        if state.ready || state.abandoned {
            return;
        }
        state.sampler.take_partial()
    };
    log::warn!(
        "refresh-rate measurement timed out with {} of {} samples",
        samples.len(),
        SAMPLE_WINDOW + 1
    );
    finalize(shared, samples, Completion::TimedOut);
}

fn finalize(shared: &Rc<Shared>, samples: SampleBuffer, completion: Completion) {
    let (hz, callbacks) = {
        let mut state = shared.state.borrow_mut();
        if state.ready {
            return;
        }

        let duration = match samples.mean() {
            Some(mean) => {
                let clamped = clamp_frame_duration(mean);
                if clamped != mean {
                    log::warn!("mean frame interval {mean:.3} ms clamped to {clamped:.3} ms");
                }
                clamped
            }
            None => DEFAULT_FRAME_MS,
        };

        state.frame_duration_ms = duration;
        state.ready = true;
        state.samples_used = samples.len();
        (1000.0 / duration, mem::take(&mut state.pending))
    };

    log::info!(
        "refresh rate {hz:.2} Hz ({:.3} ms/frame, {} samples via {}, {completion:?})",
        1000.0 / hz,
        samples.len(),
        shared.source,
    );

    // No borrow is held here; callbacks may query or register on the estimator.
    for callback in callbacks {
        callback(hz);
    }
}
