use std::ffi::{c_int, c_long};

use clap::Parser;
use justatest::{Probe, SYS_JUSTATEST, errors::SysError};
use log::{info, warn};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Opt {
    /// First argument passed to the syscall.
    #[arg(default_value_t = 1337, allow_negative_numbers = true)]
    a: c_int,

    /// Second argument passed to the syscall.
    #[arg(default_value_t = 42, allow_negative_numbers = true)]
    b: c_int,

    /// Syscall number to invoke.
    #[arg(long, env = "JUSTATEST_NR", default_value_t = SYS_JUSTATEST)]
    nr: c_long,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let Opt { a, b, nr, verbose } = Opt::parse();

    env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let outcome = Probe::new(a, b).nr(nr).invoke();
    if let Some(SysError::Syscall { call, io_error }) = &outcome.error {
        warn!("{call} failed: {io_error}");
    } else if !outcome.is_product() {
        info!("syscall {nr} did not return {a} * {b}");
    }

    println!("{outcome}");
}
