use std::sync::Once;

use log::LevelFilter;

/// Used when neither the config nor `RUST_LOG` names a filter. Windowing and
/// context crates are chatty at `info` on every resize and focus change.
pub const DEFAULT_FILTER: &str = "info,winit=warn,glutin=warn,glutin_winit=warn";

/// `env_filter` uses `env_logger` syntax, e.g. `"scene_viewer=debug"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Filter precedence: the configured filter, then `RUST_LOG`, then
    /// [`DEFAULT_FILTER`].
    pub fn filter(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }

    fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&self.filter());
        builder.write_style(self.write_style);
        // Texture loads finish between frames; millisecond stamps show how far apart.
        builder.format_timestamp_millis();
        builder
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Returns true only for the call that did it;
/// later calls, or a logger installed by someone else, leave things as they
/// are.
pub fn init_logging(config: LoggingConfig) -> bool {
    let mut installed = false;
    INIT.call_once(|| {
        let logger = config.builder().build();
        let level = logger.filter();

        if log::set_boxed_logger(Box::new(logger)).is_err() {
            return;
        }
        log::set_max_level(level);
        installed = true;
        log::debug!("logging initialized with filter {:?}", config.filter());
    });
    installed
}

/// Most verbose level the filter lets through for any target.
pub fn max_level(config: &LoggingConfig) -> LevelFilter {
    config.builder().build().filter()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_filter(filter: &str) -> LoggingConfig {
        LoggingConfig { env_filter: Some(filter.to_string()), ..Default::default() }
    }

    #[test]
    fn configured_filter_wins() {
        assert_eq!(with_filter("warn").filter(), "warn");
        assert_eq!(max_level(&with_filter("warn")), LevelFilter::Warn);
        assert_eq!(max_level(&with_filter("warn,scene_viewer=trace")), LevelFilter::Trace);
    }

    #[test]
    fn default_filter_keeps_windowing_quiet() {
        let level = max_level(&with_filter(DEFAULT_FILTER));
        assert_eq!(level, LevelFilter::Info);
    }

    #[test]
    fn second_init_keeps_the_first_logger() {
        assert!(init_logging(with_filter("warn,scene_viewer=debug")));
        assert_eq!(log::max_level(), LevelFilter::Debug);

        assert!(!init_logging(with_filter("error")));
        assert_eq!(log::max_level(), LevelFilter::Debug);
    }
}
