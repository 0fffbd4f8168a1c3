//! Git fetch operations.
//!
//! Repositories are brought into the workspace as submodules of a freshly
//! initialized top-level repository, via the system `git`. Each checkout
//! keeps its own history and upstream, which is what makes the assembled
//! workspace a super-repository rather than a one-shot export.

use std::path::Path;

use anyhow::{Context, Result};

use crate::util::process::ProcessBuilder;

/// Initialize a fresh git repository at the workspace root.
pub fn init_repository(workspace_root: &Path) -> Result<()> {
    ProcessBuilder::new("git")
        .arg("init")
        .cwd(workspace_root)
        .exec_and_check()
        .context("failed to initialize workspace repository")?;
    Ok(())
}

/// Add one repository as a submodule tracking `branch`.
///
/// `checkout_rel` is the checkout path relative to the workspace root.
/// Failure here is recoverable for the run as a whole: the caller skips the
/// repository and continues with the rest.
pub fn add_submodule(
    workspace_root: &Path,
    locator: &str,
    branch: &str,
    checkout_rel: &str,
) -> Result<()> {
    ProcessBuilder::new("git")
        .args(["submodule", "add", "-b", branch, locator, checkout_rel])
        .cwd(workspace_root)
        .exec_and_check()
        .with_context(|| format!("failed to add submodule for `{locator}`"))?;
    Ok(())
}
