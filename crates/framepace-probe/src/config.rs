use std::time::Duration;

use clap::{Parser, ValueEnum};

use framepace::Capabilities;

/// Which primitive the probe lets the estimator see.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum SourceChoice {
    /// Best primitive the window loop offers.
    Auto,
    /// Redraw-driven frame callbacks.
    #[value(name = "raf", alias = "frame")]
    AnimationFrame,
    /// Callbacks from the idle point of the loop.
    Idle,
    /// 16 ms polling.
    Timer,
}

impl SourceChoice {
    /// Hides the primitives that would outrank the chosen one.
    pub fn capabilities(self) -> Capabilities {
        match self {
            SourceChoice::Auto | SourceChoice::AnimationFrame => Capabilities::ALL,
            SourceChoice::Idle => Capabilities { animation_frame: false, idle_callback: true },
            SourceChoice::Timer => Capabilities::TIMER_ONLY,
        }
    }
}

/// Measures the display refresh rate and prints it.
#[derive(Debug, Clone, Parser)]
#[command(name = "framepace-probe", version, about)]
pub struct ProbeConfig {
    /// Timing primitive to sample.
    #[arg(long, value_enum, default_value_t = SourceChoice::Auto)]
    pub source: SourceChoice,

    /// Measure a simulated display instead of opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Refresh rate of the simulated display (headless only).
    #[arg(long, value_name = "HZ", default_value_t = 60.0, value_parser = positive_hz)]
    pub sim_hz: f64,

    /// Give up waiting for samples after this many milliseconds.
    #[arg(
        long = "timeout-ms",
        value_name = "MS",
        default_value_t = 5_000,
        value_parser = clap::value_parser!(u64).range(1..),
        conflicts_with = "no_timeout"
    )]
    pub timeout_ms: u64,

    /// Wait for the full sample window however long it takes.
    #[arg(long)]
    pub no_timeout: bool,

    /// `env_logger` filter, e.g. `framepace=debug`.
    #[arg(long = "log", value_name = "FILTER")]
    pub log_filter: Option<String>,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (!self.no_timeout).then(|| Duration::from_millis(self.timeout_ms))
    }
}

fn positive_hz(raw: &str) -> Result<f64, String> {
    let hz: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(format!("expected a finite rate above 0, got {raw}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<ProbeConfig, clap::Error> {
        ProbeConfig::try_parse_from(std::iter::once("framepace-probe").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_valid() {
        ProbeConfig::command().debug_assert();
    }

    #[test]
    fn defaults_without_flags() {
        let c = parse(&[]).unwrap();
        assert_eq!(c.source, SourceChoice::Auto);
        assert!(!c.headless);
        assert_eq!(c.sim_hz, 60.0);
        assert_eq!(c.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn all_flags() {
        let c = parse(&[
            "--source", "idle", "--headless", "--sim-hz", "144", "--timeout-ms", "750",
            "--log", "framepace=debug",
        ])
        .unwrap();
        assert_eq!(c.source, SourceChoice::Idle);
        assert!(c.headless);
        assert_eq!(c.sim_hz, 144.0);
        assert_eq!(c.timeout(), Some(Duration::from_millis(750)));
        assert_eq!(c.log_filter.as_deref(), Some("framepace=debug"));
    }

    #[test]
    fn frame_source_aliases() {
        assert_eq!(parse(&["--source", "raf"]).unwrap().source, SourceChoice::AnimationFrame);
        assert_eq!(parse(&["--source", "frame"]).unwrap().source, SourceChoice::AnimationFrame);
    }

    #[test]
    fn no_timeout_clears_default() {
        assert_eq!(parse(&["--no-timeout"]).unwrap().timeout(), None);
    }

    #[test]
    fn no_timeout_conflicts_with_explicit_timeout() {
        let err = parse(&["--no-timeout", "--timeout-ms", "100"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_unknown_source() {
        assert!(parse(&["--source", "vsync"]).is_err());
    }

    #[test]
    fn rejects_missing_value() {
        assert!(parse(&["--sim-hz"]).is_err());
    }

    #[test]
    fn rejects_non_positive_rate() {
        assert!(parse(&["--sim-hz", "0"]).is_err());
        assert!(parse(&["--sim-hz", "-60"]).is_err());
        assert!(parse(&["--sim-hz", "inf"]).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(parse(&["--timeout-ms", "0"]).is_err());
    }

    #[test]
    fn source_choice_hides_better_primitives() {
        assert_eq!(SourceChoice::Timer.capabilities().best_source(), framepace::Primitive::Timer);
        assert_eq!(
            SourceChoice::Idle.capabilities().best_source(),
            framepace::Primitive::IdleCallback
        );
    }
}
