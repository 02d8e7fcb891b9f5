//! One invocation of the `justatest` syscall.

use std::{
    ffi::{c_int, c_long},
    fmt,
};

use log::debug;

use crate::{errors::SysError, sys};

/// The syscall number the patched kernel assigns to `justatest`.
pub const SYS_JUSTATEST: c_long = 600;

/// Arguments of a single `justatest` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe {
    nr: c_long,
    a: c_int,
    b: c_int,
}

impl Default for Probe {
    /// `justatest(1337, 42)` on [`SYS_JUSTATEST`].
    fn default() -> Self {
        Self::new(1337, 42)
    }
}

impl Probe {
    /// Creates a probe passing `a` and `b` to [`SYS_JUSTATEST`].
    pub fn new(a: c_int, b: c_int) -> Self {
        Self {
            nr: SYS_JUSTATEST,
            a,
            b,
        }
    }

    /// Targets syscall `nr` instead of [`SYS_JUSTATEST`].
    pub fn nr(mut self, nr: c_long) -> Self {
        self.nr = nr;
        self
    }

    /// Performs exactly one syscall.
    ///
    /// A failing syscall is not an error here: the raw return value (`-1`) is
    /// kept in [`Outcome::ret`] and the reason in [`Outcome::error`]. The
    /// kernel's `long` result is truncated to `int`, wrapping on overflow.
    pub fn invoke(&self) -> Outcome {
        let Self { nr, a, b } = *self;
        debug!("invoking syscall {nr} with ({a}, {b})");
        let (ret, error) = match sys::justatest(nr, a, b) {
            Ok(ret) => (ret, None),
            Err((ret, error)) => (ret, Some(error)),
        };
        #[allow(clippy::cast_possible_truncation)]
        let ret = ret as c_int;
        Outcome { a, b, ret, error }
    }
}

/// What the kernel returned for a [`Probe`].
#[derive(Debug)]
pub struct Outcome {
    /// First argument.
    pub a: c_int,
    /// Second argument.
    pub b: c_int,
    /// The value returned by the syscall as an `int`, `-1` on failure.
    pub ret: c_int,
    /// Set when the kernel reported an error.
    pub error: Option<SysError>,
}

impl Outcome {
    /// Whether the kernel returned the product of the two arguments, with
    /// `int` wrapping.
    pub fn is_product(&self) -> bool {
        self.a.wrapping_mul(self.b) == self.ret
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { a, b, ret, error: _ } = self;
        write!(f, "Result from the kernel: {a} * {b} = {ret}")
    }
}
