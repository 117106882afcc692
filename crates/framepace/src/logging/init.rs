use std::sync::Once;

use env_logger::fmt::TimestampPrecision;

/// Backend settings for binaries and demos built on `framepace`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directives such as `"framepace=debug"`. Wins over `RUST_LOG`.
    pub env_filter: Option<String>,
    /// Level used when neither `env_filter` nor `RUST_LOG` is set.
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
    /// Millisecond timestamps make sampling intervals readable in the log.
    pub timestamps: Option<TimestampPrecision>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
            timestamps: Some(TimestampPrecision::Millis),
        }
    }
}

/// Where the active filter came from.
#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Directives(String),
    Level(log::LevelFilter),
}

impl LoggingConfig {
    fn resolve_filter(&self, rust_log: Option<String>) -> Filter {
        self.env_filter
            .clone()
            .or(rust_log)
            .filter(|d| !d.trim().is_empty())
            .map_or(Filter::Level(self.default_level), Filter::Directives)
    }

    fn builder(&self, filter: &Filter) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        match filter {
            Filter::Directives(directives) => builder.parse_filters(directives),
            Filter::Level(level) => builder.filter_level(*level),
        };
        builder.write_style(self.write_style);
        builder.format_timestamp(self.timestamps);
        builder
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger.
///
/// Only the first call does anything. Returns `true` when that call installed
/// the logger, `false` otherwise (already called, or some other logger won).
pub fn init_logging(config: LoggingConfig) -> bool {
    let mut installed = false;

    INIT.call_once(|| {
        let filter = config.resolve_filter(std::env::var("RUST_LOG").ok());
        installed = config.builder(&filter).try_init().is_ok();
        if installed {
            log::trace!("logger installed with {filter:?}");
        }
    });

    installed
}
