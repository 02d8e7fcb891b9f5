//! Error types.

use std::io;

use thiserror::Error;

/// Errors from syscalls.
#[derive(Debug, Error)]
pub enum SysError {
    /// A syscall failed.
    #[error("{call} failed")]
    Syscall {
        /// The name of the syscall which failed.
        call: String,
        /// The [`io::Error`] returned by the syscall.
        #[source]
        io_error: io::Error,
    },
}

impl SysError {
    /// The OS error code reported by the kernel, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Syscall { io_error, .. } => io_error.raw_os_error(),
        }
    }
}
