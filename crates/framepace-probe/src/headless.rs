use std::rc::Rc;

use anyhow::{Context, Result};

use framepace::host::{SimConfig, SimHost};
use framepace::{EstimatorConfig, Host, RefreshRateEstimator};

use crate::config::ProbeConfig;
use crate::report::Report;

/// Upper bound on simulated callbacks; a full window needs 61.
const MAX_STEPS: usize = 10_000;

/// Measures against a simulated display instead of a real window.
pub fn run(config: &ProbeConfig) -> Result<Report> {
    let sim = SimConfig::display(config.sim_hz).with_capabilities(config.source.capabilities());
    let host = Rc::new(SimHost::new(sim));

    let estimator = RefreshRateEstimator::with_config(
        Rc::clone(&host),
        EstimatorConfig { measurement_timeout: config.timeout() },
    )
    .context("failed to start refresh-rate measurement")?;

    let steps = host.run_until_idle(MAX_STEPS);
    log::debug!("simulation ran {steps} callbacks, clock at {:.1} ms", host.now());

    anyhow::ensure!(
        estimator.is_ready(),
        "simulated measurement did not finish after {steps} callbacks"
    );
    Ok(Report::from_estimator(&estimator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> ProbeConfig {
        ProbeConfig::parse_from(["framepace-probe", "--headless"].iter().chain(args).copied())
    }

    #[test]
    fn headless_reports_simulated_rate() {
        let report = run(&config(&["--sim-hz", "50"])).unwrap();
        assert!((report.refresh_rate_hz - 50.0).abs() < 1e-6);
        assert_eq!(report.source, framepace::Primitive::AnimationFrame);
    }

    #[test]
    fn headless_timer_source() {
        let report = run(&config(&["--source", "timer"])).unwrap();
        assert_eq!(report.frame_duration_ms, 16.0);
        assert_eq!(report.samples, 61);
    }
}
