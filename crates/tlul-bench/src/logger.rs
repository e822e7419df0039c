//! Stderr logging for the bench binary, backed by `env_logger`.

use env_logger::Builder;
use log::{LevelFilter, SetLoggerError};

/// Maps `-v` repetitions to a level: warnings by default, then info, debug
/// and trace.
#[must_use]
pub const fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Logger builder for `verbosity`; records print as `[LEVEL target] message`.
#[must_use]
pub fn builder(verbosity: u8) -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(level_for(verbosity))
        .format_timestamp(None);
    builder
}

/// Installs the logger globally.
///
/// # Errors
///
/// Fails if another logger was installed first.
pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
    builder(verbosity).try_init()
}

#[cfg(test)]
mod tests {
    use log::{Level, LevelFilter, Log, MetadataBuilder};

    use super::{builder, level_for};

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn records_below_the_level_are_disabled() {
        let logger = builder(1).build();
        assert_eq!(logger.filter(), LevelFilter::Info);
        let debug = MetadataBuilder::new()
            .level(Level::Debug)
            .target("tlul_bfm::machine")
            .build();
        let warn = MetadataBuilder::new()
            .level(Level::Warn)
            .target("tlul_bfm::machine")
            .build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&warn));
    }
}
