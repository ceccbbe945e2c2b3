/// Structured logging module for the echo driver
/// Provides logging with format: [subsys][LEVEL] message
/// Supports log levels: ERROR, WARN, INFO, DEBUG, TRACE
use crate::config::{LOG_BUFFER_SIZE, LOG_LINE_MAX};
use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};
use spin::Mutex;

/// Log levels for kernel logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Critical errors that may cause system instability
    Error = 0,
    /// Warning conditions that should be addressed
    Warn = 1,
    /// Informational messages about important events
    Info = 2,
    /// Detailed debugging information
    Debug = 3,
    /// Very verbose tracing information
    Trace = 4,
}

impl LogLevel {
    /// Get the string representation of the log level
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global log level filter
/// Only messages at or below this level will be logged
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Set the global log level
pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Get the current global log level
pub fn get_log_level() -> LogLevel {
    match LOG_LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Error,
        1 => LogLevel::Warn,
        2 => LogLevel::Info,
        3 => LogLevel::Debug,
        4 => LogLevel::Trace,
        _ => LogLevel::Info,
    }
}

/// Check if a log level should be logged
#[inline]
pub fn should_log(level: LogLevel) -> bool {
    level <= get_log_level()
}

/// Console output hook (serial port in the kernel image)
static CONSOLE_SINK: Mutex<Option<fn(&str)>> = Mutex::new(None);

/// Install the function every accepted log line is mirrored to
pub fn set_console_sink(sink: fn(&str)) {
    *CONSOLE_SINK.lock() = Some(sink);
}

/// Kernel log ring for dmesg
///
/// Messages are stored newline-terminated. When a message does not fit
/// behind the write position the ring restarts from the beginning.
struct LogBuffer {
    buffer: [u8; LOG_BUFFER_SIZE],
    write_pos: usize,
    entries: usize,
}

impl LogBuffer {
    const fn new() -> Self {
        Self {
            buffer: [0; LOG_BUFFER_SIZE],
            write_pos: 0,
            entries: 0,
        }
    }

    fn add_message(&mut self, message: &str) {
        let bytes = message.as_bytes();
        let len = bytes.len();

        if len >= LOG_BUFFER_SIZE {
            return;
        }

        if self.write_pos + len + 1 > LOG_BUFFER_SIZE {
            self.write_pos = 0;
            self.entries = 0;
        }

        self.buffer[self.write_pos..self.write_pos + len].copy_from_slice(bytes);
        self.buffer[self.write_pos + len] = b'\n';
        self.write_pos += len + 1;
        self.entries += 1;
    }

    fn read_all(&self) -> &[u8] {
        &self.buffer[..self.write_pos]
    }
}

static LOG_BUFFER: Mutex<LogBuffer> = Mutex::new(LogBuffer::new());

/// Read the kernel log ring into a provided buffer
/// Returns the number of bytes copied
pub fn read_log_buffer(dest: &mut [u8]) -> usize {
    let buffer = LOG_BUFFER.lock();
    let data = buffer.read_all();
    let to_copy = core::cmp::min(data.len(), dest.len());
    dest[..to_copy].copy_from_slice(&data[..to_copy]);
    to_copy
}

/// Number of messages currently held in the log ring
pub fn log_entries() -> usize {
    LOG_BUFFER.lock().entries
}

/// Fixed-size formatter; output past the end is dropped
struct LineWriter {
    buffer: [u8; LOG_LINE_MAX],
    pos: usize,
}

impl LineWriter {
    const fn new() -> Self {
        Self {
            buffer: [0u8; LOG_LINE_MAX],
            pos: 0,
        }
    }

    fn as_str(&self) -> &str {
        match core::str::from_utf8(&self.buffer[..self.pos]) {
            Ok(s) => s,
            // Cut inside a multi-byte character: keep the valid prefix
            Err(e) => core::str::from_utf8(&self.buffer[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl fmt::Write for LineWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buffer.len() - self.pos;
        let to_write = core::cmp::min(bytes.len(), remaining);
        self.buffer[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Internal logging function
/// Format: [subsys][LEVEL] message
#[doc(hidden)]
pub fn _log(level: LogLevel, subsys: &str, args: fmt::Arguments) {
    if !should_log(level) {
        return;
    }

    use core::fmt::Write;
    let mut writer = LineWriter::new();
    let _ = write!(writer, "[{}][{}] {}", subsys, level.as_str(), args);
    let message = writer.as_str();

    let sink = *CONSOLE_SINK.lock();
    if let Some(sink) = sink {
        sink(message);
    }

    LOG_BUFFER.lock().add_message(message);
}

/// Log an error message
/// Format: [subsys][ERROR] message
#[macro_export]
macro_rules! log_error {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Error,
            $subsys,
            format_args!($($arg)*)
        )
    };
}

/// Log a warning message
/// Format: [subsys][WARN] message
#[macro_export]
macro_rules! log_warn {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Warn,
            $subsys,
            format_args!($($arg)*)
        )
    };
}

/// Log an informational message
/// Format: [subsys][INFO] message
#[macro_export]
macro_rules! log_info {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Info,
            $subsys,
            format_args!($($arg)*)
        )
    };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Debug,
            $subsys,
            format_args!($($arg)*)
        )
    };
}

/// Log a trace message
#[macro_export]
macro_rules! log_trace {
    ($subsys:expr, $($arg:tt)*) => {
        $crate::log::_log(
            $crate::log::LogLevel::Trace,
            $subsys,
            format_args!($($arg)*)
        )
    };
}
