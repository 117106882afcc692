//! Reports the display refresh rate measured by `framepace`.
//!
//! By default a small window is opened and the estimator samples the window
//! loop. `--headless` measures a simulated display instead.

mod app;
mod config;
mod headless;
mod host;
mod report;

use anyhow::Result;
use clap::Parser;

use framepace::logging::{init_logging, LoggingConfig};

use crate::config::ProbeConfig;

fn main() -> Result<()> {
    let config = ProbeConfig::parse();

    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..LoggingConfig::default()
    });
    log::debug!("probe config: {config:?}");

    let report = if config.headless {
        headless::run(&config)?
    } else {
        app::run(&config)?
    };

    println!();
    println!("{report}");
    println!();
    Ok(())
}
