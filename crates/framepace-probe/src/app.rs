use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use framepace::{EstimatorConfig, RefreshRateEstimator};

use crate::config::ProbeConfig;
use crate::host::WinitHost;
use crate::report::Report;

/// Opens a window, measures while the loop runs, exits once ready.
pub fn run(config: &ProbeConfig) -> Result<Report> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut app = ProbeApp::new(config);

    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    if let Some(e) = app.failure.take() {
        return Err(e);
    }
    app.report().context("window closed before the measurement finished")
}

pub struct ProbeApp {
    host: Rc<WinitHost>,
    estimator_config: EstimatorConfig,
    window: Option<Window>,
    estimator: Option<RefreshRateEstimator>,
    measured_hz: Rc<Cell<Option<f64>>>,
    failure: Option<anyhow::Error>,
}

impl ProbeApp {
    fn new(config: &ProbeConfig) -> Self {
        Self {
            host: Rc::new(WinitHost::new(config.source.capabilities())),
            estimator_config: EstimatorConfig { measurement_timeout: config.timeout() },
            window: None,
            estimator: None,
            measured_hz: Rc::new(Cell::new(None)),
            failure: None,
        }
    }

    fn report(&self) -> Option<Report> {
        let estimator = self.estimator.as_ref()?;
        self.measured_hz.get().map(|_| Report::from_estimator(estimator))
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("framepace probe")
            .with_inner_size(LogicalSize::new(320.0, 120.0));
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let estimator =
            RefreshRateEstimator::with_config(Rc::clone(&self.host), self.estimator_config.clone())
                .context("failed to start refresh-rate measurement")?;

        let measured = Rc::clone(&self.measured_hz);
        estimator.on_ready(move |hz| measured.set(Some(hz)));

        self.window = Some(window);
        self.estimator = Some(estimator);
        Ok(())
    }

    fn request_redraw_if_needed(&self) {
        if self.host.wants_frame() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

impl ApplicationHandler for ProbeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            log::error!("{e:#}");
            self.failure = Some(e);
            event_loop.exit();
            return;
        }

        self.request_redraw_if_needed();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                self.host.run_frame();
                self.request_redraw_if_needed();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.host.run_due_timers();
        self.host.run_idle();

        if self.measured_hz.get().is_some() {
            event_loop.exit();
            return;
        }

        self.request_redraw_if_needed();

        let flow = if self.host.has_idle_work() {
            ControlFlow::Poll
        } else if let Some(deadline) = self.host.next_deadline() {
            ControlFlow::WaitUntil(deadline)
        } else {
            ControlFlow::Wait
        };
        event_loop.set_control_flow(flow);
    }
}
