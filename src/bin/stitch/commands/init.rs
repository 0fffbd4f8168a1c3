//! `stitch init` command

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use crate::cli::InitArgs;
use crate::GlobalOptions;
use stitch::ops::assemble::{assemble, AssembleOptions};
use stitch::util::Status;

pub fn execute(args: InitArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    let dest = args.folder.unwrap_or_else(default_folder);

    let opts = AssembleOptions {
        repos: args.repos,
        branch: args.branch,
        dest,
        filters: args.filters,
    };

    let report = assemble(&opts, shell)?;

    shell.status(
        Status::Created,
        format!("workspace at {}", report.workspace_root.display()),
    );
    if report.repositories_failed > 0 {
        shell.warn(format!(
            "{} of {} repositories could not be fetched",
            report.repositories_failed,
            report.repositories_added + report.repositories_failed
        ));
    }

    Ok(())
}

/// Timestamped default so repeated runs do not collide.
fn default_folder() -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("workspace-{stamp}"))
}
