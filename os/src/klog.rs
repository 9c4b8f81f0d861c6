//! Leveled kernel logging over COM1.
//!
//! Each record is written as `LEVEL [file:line] message`. Records below the
//! configured maximum level are dropped before formatting.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialOrd, PartialEq, Eq)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO ",
            Level::Warn => "WARN ",
            Level::Error => "ERROR",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            _ => Level::Error,
        }
    }
}

pub struct Record<'a> {
    pub line: u32,
    pub file: &'a str,
    pub level: Level,
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Sets the least severe level that still gets written.
pub fn set_max_level(level: Level) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn max_level() -> Level {
    Level::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

pub fn enabled(level: Level) -> bool {
    level >= max_level()
}

/// Writes `LEVEL [file:line] message` into any formatter sink.
pub fn format_record(out: &mut dyn Write, args: fmt::Arguments, record: &Record) -> fmt::Result {
    write!(out, "{} [{}:{}] ", record.level.label(), record.file, record.line)?;
    out.write_fmt(args)?;
    out.write_str("\n")
}

#[doc(hidden)]
pub fn _log(args: fmt::Arguments, record: Record) {
    if !enabled(record.level) {
        return;
    }

    #[cfg(not(test))]
    {
        crate::serial::with_port(|port| {
            let _ = format_record(port, args, &record);
        });
    }

    #[cfg(test)]
    {
        let mut line = String::new();
        let _ = format_record(&mut line, args, &record);
        print!("{line}");
    }
}

#[macro_export]
macro_rules! klog_at {
    ($level:expr, $($arg:tt)+) => {
        $crate::klog::_log(
            format_args!($($arg)+),
            $crate::klog::Record { line: line!(), file: file!(), level: $level },
        )
    };
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)+) => ($crate::klog_at!($crate::klog::Level::Trace, $($arg)+))
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)+) => ($crate::klog_at!($crate::klog::Level::Debug, $($arg)+))
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)+) => ($crate::klog_at!($crate::klog::Level::Info, $($arg)+))
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)+) => ($crate::klog_at!($crate::klog::Level::Warn, $($arg)+))
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)+) => ($crate::klog_at!($crate::klog::Level::Error, $($arg)+))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_prefixed_with_level_and_location() {
        let mut out = String::new();
        let record = Record { line: 42, file: "src/interrupts/irq.rs", level: Level::Warn };
        format_record(&mut out, format_args!("vector {}", 33), &record).unwrap();
        assert_eq!(out, "WARN  [src/interrupts/irq.rs:42] vector 33\n");
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(Level::Error > Level::Warn);
        assert!(Level::Debug < Level::Info);
        assert_eq!(Level::from_u8(Level::Trace as u8), Level::Trace);
        assert_eq!(Level::from_u8(200), Level::Error);
    }
}
