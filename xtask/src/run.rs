use std::{
    ffi::OsString,
    fmt::Write as _,
    io::BufReader,
    path::PathBuf,
    process::{Child, Command, Stdio},
};

use anyhow::{Context as _, Result, anyhow, bail};
use cargo_metadata::{Artifact, CompilerMessage, Message, Target};
use clap::Parser;
use xtask::LKM_TEST_MODULE;

use crate::build_module::{self, build_module};

#[derive(Debug, Parser)]
pub(crate) struct Options {
    #[clap(flatten)]
    module: build_module::Options,

    /// The command used to wrap the test binaries.
    #[clap(short, long, default_value = "sudo -E")]
    runner: String,

    /// Arguments to pass to the test binaries.
    #[clap(last = true)]
    run_args: Vec<OsString>,
}

/// Builds the test binaries of `package` and returns their names and paths.
fn build_tests(package: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut cargo = Command::new("cargo");
    cargo.args([
        "build",
        "--message-format=json",
        "--package",
        package,
        "--tests",
    ]);

    let mut cargo_child = cargo
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn {cargo:?}"))?;
    let Child { stdout, .. } = &mut cargo_child;

    let stdout = stdout
        .take()
        .ok_or_else(|| anyhow!("{cargo:?} has no stdout"))?;
    let stdout = BufReader::new(stdout);
    let mut executables = Vec::new();
    for message in Message::parse_stream(stdout) {
        match message.context("valid JSON")? {
            Message::CompilerArtifact(Artifact {
                executable: Some(executable),
                target: Target { name, .. },
                ..
            }) => executables.push((name, executable.into())),
            Message::CompilerMessage(CompilerMessage { message, .. }) => {
                print!("{}", message.rendered.unwrap_or_default());
            }
            Message::TextLine(line) => {
                println!("{line}");
            }
            _ => {}
        }
    }

    let status = cargo_child
        .wait()
        .with_context(|| format!("failed to wait for {cargo:?}"))?;
    if status.code() != Some(0) {
        bail!("{cargo:?} failed: {status:?}")
    }
    Ok(executables)
}

/// Builds the module and runs the integration tests against it.
pub(crate) fn run(opts: Options) -> Result<()> {
    let Options {
        module,
        runner,
        run_args,
    } = opts;

    let module = build_module(module)?;
    let binaries = build_tests("integration-test")?;

    let mut args = runner.split_whitespace();
    let runner = args.next().ok_or(anyhow!("no first argument"))?;
    let args = args.collect::<Vec<_>>();

    // Loading the module twice fails, so the tests must not overlap.
    let default_args = [OsString::from("--test-threads=1")];
    let run_args = default_args.iter().chain(run_args.iter());

    let mut failures = String::new();
    for (name, binary) in binaries {
        let mut cmd = Command::new(runner);
        cmd.args(args.iter())
            .arg(binary)
            .args(run_args.clone())
            .env(LKM_TEST_MODULE, &module)
            .env("RUST_BACKTRACE", "1")
            .env("RUST_LOG", "debug");

        println!("{name} running {cmd:?}");

        let status = cmd
            .status()
            .with_context(|| format!("failed to run {cmd:?}"))?;
        if status.code() != Some(0) {
            writeln!(&mut failures, "{name} failed: {status:?}").context("String write failed")?
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("failures:\n{}", failures))
    }
}
