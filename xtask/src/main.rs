mod build_module;
mod run;

use std::process::exit;

use clap::{Parser, Subcommand};

#[derive(Parser)]
pub struct XtaskOptions {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Builds `lkm_test.ko` against a kernel build tree.
    BuildModule(build_module::Options),
    /// Builds the module and runs the integration tests with it.
    IntegrationTest(run::Options),
}

fn main() {
    let XtaskOptions { command } = Parser::parse();

    let ret = match command {
        Command::BuildModule(opts) => build_module::build_module(opts).map(|module| {
            println!("{}", module.display());
        }),
        Command::IntegrationTest(opts) => run::run(opts),
    };

    if let Err(e) = ret {
        eprintln!("{e:#}");
        exit(1);
    }
}
