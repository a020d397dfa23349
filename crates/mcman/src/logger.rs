use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

struct ColorLogger;

static LOGGER: ColorLogger = ColorLogger;

impl Log for ColorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        match record.level() {
            Level::Error => eprintln!("{} {}", "error".red().bold(), message),
            Level::Warn => eprintln!("{} {}", "warn".yellow().bold(), message),
            Level::Info => eprintln!("{}", message.dimmed()),
            Level::Debug | Level::Trace => {
                eprintln!("{} {}", record.target().blue(), message.dimmed())
            }
        }
    }

    fn flush(&self) {}
}

pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
