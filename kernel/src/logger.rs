//! Minimal stderr backend for the `log` facade.

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the logger. Calling it again only changes the level.
pub fn init(level: LevelFilter) {
    // fails harmlessly when a logger is already installed
    log::set_logger(&LOGGER).ok();
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_only_changes_level() {
        init(LevelFilter::Warn);
        init(LevelFilter::Trace);
        assert_eq!(log::max_level(), LevelFilter::Trace);
        init(LevelFilter::Warn);
        assert_eq!(log::max_level(), LevelFilter::Warn);
    }
}
