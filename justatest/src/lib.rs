//! Userspace probe for the out-of-tree `justatest` system call.
//!
//! `justatest` is not part of any upstream syscall table; it lives at number
//! [`SYS_JUSTATEST`] (600) in a patched kernel and is expected to multiply its
//! two arguments. On any other kernel the call fails with `ENOSYS` and the
//! probe reports the raw `-1` the C library hands back.
//!
//! ```no_run
//! use justatest::Probe;
//!
//! let outcome = Probe::default().invoke();
//! println!("{outcome}");
//! ```
#![deny(clippy::all)]

pub mod errors;
pub mod probe;
mod sys;

pub use probe::{Outcome, Probe, SYS_JUSTATEST};
