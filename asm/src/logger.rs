use color_print::ceprintln;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes records to stderr, tagged by level.
struct Logger;

static LOGGER: Logger = Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => ceprintln!("<red,bold>error</>: {}", record.args()),
            Level::Warn => ceprintln!("<yellow,bold>warn</>: {}", record.args()),
            Level::Info => ceprintln!("<green>info</>: {}", record.args()),
            Level::Debug => ceprintln!("<blue>debug</>: {}", record.args()),
            Level::Trace => ceprintln!("<dim>trace</>: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

/// Install the logger. `verbose` counts `-v` flags.
pub fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
