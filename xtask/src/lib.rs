use std::{path::PathBuf, process::Command};

use anyhow::{Context as _, Result, bail};
use cargo_metadata::MetadataCommand;

/// Environment variable through which the integration tests receive the path
/// of the built `lkm_test.ko`.
pub const LKM_TEST_MODULE: &str = "LKM_TEST_MODULE";

pub fn exec(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .status()
        .with_context(|| format!("failed to run {cmd:?}"))?;
    if status.code() != Some(0) {
        bail!("{cmd:?} failed: {status:?}")
    }
    Ok(())
}

/// The workspace root and cargo's target directory.
pub fn workspace_dirs() -> Result<(PathBuf, PathBuf)> {
    let metadata = MetadataCommand::new()
        .no_deps()
        .exec()
        .context("cargo metadata failed")?;
    Ok((
        metadata.workspace_root.into(),
        metadata.target_directory.into(),
    ))
}
