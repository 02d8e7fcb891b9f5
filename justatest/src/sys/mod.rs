//! Raw system calls made by the probe.


use std::{
    ffi::{c_int, c_long},
    io,
};

#[cfg(test)]
pub(crate) use fake::*;

use crate::errors::SysError;

/// The raw return value of a failed syscall, and why it failed.
pub(crate) type SysResult<T> = Result<T, (i64, SysError)>;

pub(crate) enum Syscall {
    /// The out-of-tree `justatest` syscall. `nr` is not part of any upstream
    /// syscall table.
    JustATest { nr: c_long, a: c_int, b: c_int },
}

impl std::fmt::Debug for Syscall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JustATest { nr, a, b } => f
                .debug_struct("Syscall::JustATest")
                .field("nr", nr)
                .field("a", a)
                .field("b", b)
                .finish(),
        }
    }
}

fn syscall(call: Syscall) -> SysResult<i64> {
    #[cfg(test)]
    return TEST_SYSCALL.with(|test_impl| unsafe { test_impl.borrow()(call) });

    #[cfg_attr(test, allow(unreachable_code))]
    {
        let call_name = match call {
            Syscall::JustATest { nr, .. } => format!("justatest({nr})"),
        };
        // SAFETY: the arguments are plain integers; the kernel either
        // dispatches them or fails with ENOSYS.
        let ret = unsafe {
            match call {
                Syscall::JustATest { nr, a, b } => libc::syscall(nr, a, b),
            }
        };

        // `libc::syscall` returns i32 on armv7.
        #[allow(clippy::useless_conversion)]
        match ret.into() {
            -1 => Err((
                -1,
                SysError::Syscall {
                    call: call_name,
                    io_error: io::Error::last_os_error(),
                },
            )),
            ret => Ok(ret),
        }
    }
}

/// Calls syscall `nr` with `a` and `b`.
///
/// The C library reports any raw kernel return in `-4095..=-1` as `-1` with
/// `errno` set to its negation, so `-1` is always an error here. A kernel that
/// computes `-1` as a genuine result is seen as failing with `EPERM`.
pub(crate) fn justatest(nr: c_long, a: c_int, b: c_int) -> SysResult<i64> {
    syscall(Syscall::JustATest { nr, a, b })
}
