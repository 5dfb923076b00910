//! Kernel console: counted output plus the log sink.

use core::convert::Infallible;
use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU64, Ordering};

use crust::declare_module;
use log::{Level, Log, Metadata, Record};
use x86_64::instructions::interrupts::without_interrupts;

use crate::serial;

/// Everything at or below this level gets printed.
pub const LOG_LEVEL: Level = Level::Debug;

static WRITTEN: AtomicU64 = AtomicU64::new(0);

/// Writer for all human-facing kernel output. Counts what it emits.
#[derive(Clone, Copy, Debug)]
pub struct Console;

impl Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        WRITTEN.fetch_add(s.len() as u64, Ordering::Relaxed);
        serial::write_str(s);
        Ok(())
    }
}

/// Prints to the console. Same shape as the standard `print!`.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::console::_print(format_args!($($arg)*)));
}

/// Prints to the console, appending a newline.
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($fmt:expr) => ($crate::print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::print!(concat!($fmt, "\n"), $($arg)*));
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    without_interrupts(|| {
        Console.write_fmt(args).unwrap();
    });
}

/// Characters written to the console since boot.
pub fn written() -> u64 {
    WRITTEN.load(Ordering::Relaxed)
}

/// Prints console statistics.
pub fn print_stats() {
    crate::println!("Console: {} characters output", written());
}

/// Pushes buffered console output onto the wire.
pub fn flush() {
    serial::flush();
}

impl Log for Console {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= LOG_LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // [level] target message
        crate::println!("[{}] {} {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        serial::flush();
    }
}

static LOGGER: Console = Console;

fn init() -> Result<(), Infallible> {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LOG_LEVEL.to_level_filter());
    Ok(())
}

declare_module!("console", init);
