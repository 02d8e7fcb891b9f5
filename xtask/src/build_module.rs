use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use xtask::{exec, workspace_dirs};

#[derive(Debug, Parser)]
pub(crate) struct Options {
    /// Build the module archive in release mode.
    #[clap(long)]
    pub release: bool,

    /// Kernel build tree to compile against. Defaults to the build tree of
    /// the running kernel.
    #[clap(long)]
    pub kernel_dir: Option<PathBuf>,

    /// Freestanding target triple the module archive is built for. The
    /// x86_64 kernel code model and control-flow hardening are applied only
    /// to x86_64 triples.
    #[clap(long, default_value = "x86_64-unknown-none")]
    pub target: String,
}

/// Builds `lkm_test.ko` and returns its path.
///
/// The Rust code is compiled into a static archive with a freestanding target
/// and a core library built from source, then Kbuild links that archive into
/// the module object.
pub(crate) fn build_module(opts: Options) -> Result<PathBuf> {
    let Options {
        release,
        kernel_dir,
        target,
    } = opts;

    let (workspace_root, target_dir) = workspace_dirs()?;
    let module_dir = workspace_root.join("lkm-test");

    let mut cargo = Command::new("cargo");
    cargo
        .args([
            "+nightly",
            "build",
            "--package",
            "lkm-test",
            "-Z",
            "build-std=core",
            "--target",
            &target,
        ])
        .env("RUSTFLAGS", rustflags(&target));
    if release {
        cargo.arg("--release");
    }
    exec(&mut cargo)?;

    let profile = if release { "release" } else { "debug" };
    let archive = target_dir.join(&target).join(profile).join("liblkm_test.a");

    let kernel_dir = match kernel_dir {
        Some(kernel_dir) => kernel_dir,
        None => running_kernel_build_dir()?,
    };
    let mut make = Command::new("make");
    make.arg("-C")
        .arg(&kernel_dir)
        .arg(format!("M={}", module_dir.display()))
        .arg(format!("LKM_TEST_ARCHIVE={}", archive.display()))
        .arg("modules");
    exec(&mut make)?;

    let module = module_dir.join("lkm_test.ko");
    if !module.try_exists().with_context(|| {
        format!("failed to check existence of {}", module.display())
    })? {
        bail!("{make:?} did not produce {}", module.display());
    }
    Ok(module)
}

/// Code generation flags matching how the kernel builds its own objects.
fn rustflags(target: &str) -> String {
    // The module loader does not resolve GOT relocations.
    let mut flags = vec!["-C relocation-model=static"];
    if target.starts_with("x86_64") {
        flags.extend([
            "-C code-model=kernel",
            // ENDBR64 landing pads, required by CONFIG_X86_KERNEL_IBT since
            // the loader reaches the init and exit hooks by indirect call.
            "-Z cf-protection=branch",
            // Returns through __x86_return_thunk, as CONFIG_RETHUNK kernels
            // expect.
            "-Z function-return=thunk-extern",
        ]);
    }
    flags.join(" ")
}

fn running_kernel_build_dir() -> Result<PathBuf> {
    let mut uname = Command::new("uname");
    uname.arg("-r");
    let output = uname
        .output()
        .with_context(|| format!("failed to run {uname:?}"))?;
    if !output.status.success() {
        bail!("{uname:?} failed: {:?}", output.status);
    }
    let release = String::from_utf8(output.stdout).context("uname output is not UTF-8")?;
    Ok(Path::new("/lib/modules").join(release.trim()).join("build"))
}
