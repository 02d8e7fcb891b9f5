//! A minimal loadable Linux kernel module.
//!
//! The module registers two entry points with the kernel module loader:
//! [`init_module`], run by `insmod`/`finit_module(2)`, and [`cleanup_module`],
//! run by `rmmod`/`delete_module(2)`. Each writes a single line to the kernel
//! ring buffer at `KERN_INFO` and returns. The module holds no state, so any
//! number of load/unload cycles produce the same two lines.
//!
//! Logging goes through the [`log`] facade; the [`printk`] module provides the
//! [`log::Log`] implementation that forwards records to the kernel's `_printk`.
//!
//! The crate is built as a static archive for `x86_64-unknown-none` and linked
//! into `lkm_test.ko` by Kbuild. Use `cargo xtask build-module`.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod modinfo;
pub mod printk;

use core::ffi::c_int;

use log::info;

/// Prefix of every line this module writes to the kernel log.
pub const NAME: &str = "lkm-test";

modinfo! {
    author: "itewqq",
    description: "lkm_test",
    license: "GPL",
    version: "0.1",
}

/// Module load hook.
///
/// Always succeeds.
#[unsafe(no_mangle)]
pub extern "C" fn init_module() -> c_int {
    printk::init();
    info!("init");
    0
}

/// Module unload hook.
#[unsafe(no_mangle)]
pub extern "C" fn cleanup_module() {
    info!("exit");
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo<'_>) -> ! {
    unsafe extern "C" {
        #[link_name = "panic"]
        fn kernel_panic(fmt: *const core::ffi::c_char, ...) -> !;
    }

    // SAFETY: the format string is NUL terminated and takes no arguments.
    unsafe { kernel_panic(c"lkm-test: rust panic\n".as_ptr()) }
}
