use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Build the log filter: `--log-level` sets the floor, `RUST_LOG` may
/// override per target (e.g. `RUST_LOG=twibc_client=trace`).
fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.as_filter().into())
        .from_env_lossy()
}

/// Logs go to stderr so command output on stdout stays pipeable.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter_for(level))
        .with_ansi(false)
        .with_target(true);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_maps_to_matching_filter() {
        assert_eq!(LogLevel::Error.as_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Trace.as_filter(), LevelFilter::TRACE);
    }

    #[test]
    fn cli_level_is_the_filter_default() {
        let filter = EnvFilter::builder()
            .with_default_directive(LogLevel::Debug.as_filter().into())
            .with_env_var("TWIBC_LOG_UNSET_FOR_TEST")
            .from_env_lossy();
        assert_eq!(filter.to_string(), "debug");
    }
}
