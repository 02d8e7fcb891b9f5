//! A [`log::Log`] implementation backed by the kernel ring buffer.
//!
//! Every record becomes exactly one `_printk` call of the form
//! `<KERN_SOH><level><name>: <message>`. Messages are formatted into a fixed
//! stack buffer since the module has no allocator; anything past
//! [`LINE_CAPACITY`] bytes is dropped.

use core::fmt::{self, Write as _};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Size of the per-record line buffer.
pub const LINE_CAPACITY: usize = 256;

struct LineBuffer {
    buf: [u8; LINE_CAPACITY],
    len: usize,
}

impl LineBuffer {
    const fn new() -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            len: 0,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut n = s.len().min(LINE_CAPACITY - self.len);
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

/// The digit following `KERN_SOH` for a record of `level`.
pub fn kern_level(level: Level) -> u8 {
    match level {
        Level::Error => b'3',
        Level::Warn => b'4',
        Level::Info => b'6',
        Level::Debug | Level::Trace => b'7',
    }
}

/// Forwards [`log`] records to `_printk`, prefixed with the module name.
pub struct KernelLogger {
    name: &'static str,
}

impl KernelLogger {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Log for KernelLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let mut line = LineBuffer::new();
        // LineBuffer never fails; overflow truncates.
        let _ = write!(line, "{}: {}", self.name, record.args());
        emit(kern_level(record.level()), line.as_bytes());
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger::new(crate::NAME);

/// Installs [`KernelLogger`] as the global logger.
///
/// May be called any number of times; only the first call installs the
/// logger, every call resets the max level.
pub fn init() {
    // The only logger that can already be installed is this one.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}

#[cfg(not(test))]
fn emit(level: u8, line: &[u8]) {
    use core::ffi::{c_char, c_int};

    unsafe extern "C" {
        fn _printk(fmt: *const c_char, ...) -> c_int;
    }

    // KERN_SOH, level, then the line as a length-bounded string argument so
    // that it is never parsed as a format string.
    let fmt = [0x01, level, b'%', b'.', b'*', b's', b'\n', 0];
    // SAFETY: `fmt` is NUL terminated and consumes exactly an int and a
    // pointer to at least that many bytes. `line.len()` is at most
    // LINE_CAPACITY, which fits in a c_int.
    unsafe {
        _printk(
            fmt.as_ptr().cast::<c_char>(),
            line.len() as c_int,
            line.as_ptr(),
        );
    }
}

#[cfg(test)]
fn emit(level: u8, line: &[u8]) {
    fake::record(level, line);
}
