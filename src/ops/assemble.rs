//! End-to-end workspace assembly.
//!
//! Assembly is strictly two-phase around the identity map: every selected
//! crate is relocated and mapped before the first manifest is rewritten, so
//! rewriting always sees the complete picture of what lives in the
//! workspace. Rewrites are independent per manifest and run in parallel.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use thiserror::Error;

use crate::core::discovery::discover;
use crate::core::locator::repo_name;
use crate::core::project::{ProjectKind, SubProject};
use crate::ops::identity::IdentityMap;
use crate::ops::rewrite::{rewrite_manifest, RewriteOutcome};
use crate::ops::{scaffold, web};
use crate::sources::git;
use crate::util::fs;
use crate::util::shell::{Shell, Status};

/// Directory (relative to the workspace root) holding fetched repositories.
pub const REPOS_DIR: &str = "repos";

/// Directory (relative to the workspace root) holding relocated crates.
pub const CRATES_DIR: &str = "crates";

/// Options for assembling a workspace.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Repository locators to fetch.
    pub repos: Vec<String>,
    /// Branch to track for every repository.
    pub branch: String,
    /// Workspace destination; must not exist yet.
    pub dest: PathBuf,
    /// Project selection filters; empty selects everything.
    pub filters: Vec<String>,
}

/// Conditions that abort the whole assembly.
///
/// Everything else degrades to a per-repository or per-project warning; only
/// an ambiguous top-level state is worth tearing the run down for.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("destination `{}` already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("failed to create repositories area at `{}`", .path.display())]
    ReposAreaCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What an assembly run produced.
#[derive(Debug)]
pub struct AssembleReport {
    /// Absolute path of the assembled workspace.
    pub workspace_root: PathBuf,
    /// Repositories fetched successfully.
    pub repositories_added: usize,
    /// Repositories that failed to fetch and were skipped.
    pub repositories_failed: usize,
    /// Crates relocated into the workspace.
    pub crates_relocated: usize,
    /// Web workspace projects discovered.
    pub web_projects: usize,
    /// Published dependencies replaced with path dependencies.
    pub references_replaced: usize,
    /// Declarations pruned as dangling.
    pub declarations_pruned: usize,
}

/// Assemble a workspace from scratch: fetch, discover, relocate, rewrite,
/// scaffold.
pub fn assemble(opts: &AssembleOptions, shell: &Shell) -> Result<AssembleReport> {
    if opts.dest.exists() {
        return Err(AssembleError::DestinationExists(opts.dest.clone()).into());
    }

    let repos_root = opts.dest.join(REPOS_DIR);
    std::fs::create_dir_all(&repos_root).map_err(|source| AssembleError::ReposAreaCreate {
        path: repos_root.clone(),
        source,
    })?;
    let workspace_root = fs::normalize_path(&opts.dest);

    git::init_repository(&workspace_root)?;

    let mut added = 0usize;
    let mut failed = 0usize;
    for locator in &opts.repos {
        let name = repo_name(locator);
        shell.status(Status::Fetching, format!("{} (branch {})", name, opts.branch));
        match git::add_submodule(
            &workspace_root,
            locator,
            &opts.branch,
            &format!("{REPOS_DIR}/{name}"),
        ) {
            Ok(()) => added += 1,
            Err(err) => {
                failed += 1;
                shell.warn(format!("skipping `{name}`: {err:#}"));
            }
        }
    }

    let summary = integrate_workspace(&workspace_root, &opts.filters, shell)?;

    shell.status(
        Status::Finished,
        format!(
            "{} crates, {} web projects, {} references rewritten",
            summary.crates_relocated, summary.web_projects, summary.references_replaced
        ),
    );

    Ok(AssembleReport {
        workspace_root,
        repositories_added: added,
        repositories_failed: failed,
        crates_relocated: summary.crates_relocated,
        web_projects: summary.web_projects,
        references_replaced: summary.references_replaced,
        declarations_pruned: summary.declarations_pruned,
    })
}

/// Result of integrating already-fetched repositories into the workspace.
#[derive(Debug, Default)]
pub struct WorkspaceSummary {
    /// Crates relocated into the workspace.
    pub crates_relocated: usize,
    /// Web workspace projects discovered.
    pub web_projects: usize,
    /// Published dependencies replaced with path dependencies.
    pub references_replaced: usize,
    /// Declarations pruned as dangling.
    pub declarations_pruned: usize,
}

/// Discover, relocate, map, rewrite, and scaffold over whatever checkouts
/// exist in the repositories area.
///
/// Split out from [`assemble`] so the dependency-graph pipeline can run (and
/// be tested) without any fetch having happened.
pub fn integrate_workspace(
    workspace_root: &Path,
    filters: &[String],
    shell: &Shell,
) -> Result<WorkspaceSummary> {
    let repos_root = workspace_root.join(REPOS_DIR);

    let crates = discover(&repos_root, ProjectKind::Crate, filters);
    let web_projects = discover(&repos_root, ProjectKind::WebWorkspace, filters);
    shell.status(
        Status::Discovering,
        format!(
            "{} crates, {} web workspaces",
            crates.len(),
            web_projects.len()
        ),
    );

    // Phase one: relocate everything and build the identity map.
    let relocated = relocate_crates(workspace_root, &crates, shell)?;

    let map = IdentityMap::build(relocated.iter().cloned());
    for duplicate in map.duplicates() {
        shell.warn(format!(
            "duplicate package identity `{}`: {} shadows {}",
            duplicate.identity,
            duplicate.kept.display(),
            duplicate.shadowed.display()
        ));
    }

    // Phase two: the map is complete and frozen; rewrites are independent.
    let (replaced, pruned) = rewrite_crates(workspace_root, &relocated, &map, shell);

    let members: Vec<String> = relocated
        .iter()
        .filter_map(|dir| dir.file_name())
        .map(|name| format!("{}/{}", CRATES_DIR, name.to_string_lossy()))
        .collect();
    scaffold::write_workspace_manifest(workspace_root, &members, &[REPOS_DIR])
        .context("failed to write workspace manifest")?;

    if !web_projects.is_empty() {
        web::integrate_web_projects(workspace_root, &web_projects, shell)?;
    }

    Ok(WorkspaceSummary {
        crates_relocated: relocated.len(),
        web_projects: web_projects.len(),
        references_replaced: replaced,
        declarations_pruned: pruned,
    })
}

/// Copy each selected crate into the crates area.
///
/// A copy failure skips that crate; the run continues with the rest.
fn relocate_crates(
    workspace_root: &Path,
    crates: &[SubProject],
    shell: &Shell,
) -> Result<Vec<PathBuf>> {
    let crates_root = workspace_root.join(CRATES_DIR);
    let mut relocated = Vec::new();

    let progress = shell.progress(crates.len() as u64, "relocating crates");
    for project in crates {
        let dest = crates_root.join(&project.name);
        match fs::copy_tree(&project.root_dir, &dest, project.kind.excluded_dirs()) {
            Ok(()) => {
                shell.status(Status::Added, &project.relative_path);
                relocated.push(dest);
            }
            Err(err) => shell.warn(format!("skipping `{}`: {err:#}", project.relative_path)),
        }
        progress.inc(1);
    }
    progress.finish();

    // Same-named projects from different repositories land in the same
    // directory; the last copy wins and the directory is processed once.
    relocated.sort();
    relocated.dedup();

    Ok(relocated)
}

/// Rewrite every relocated manifest against the frozen identity map.
///
/// Manifests are independent, so rewrites run in parallel; results are
/// reported in deterministic order afterwards.
fn rewrite_crates(
    workspace_root: &Path,
    relocated: &[PathBuf],
    map: &IdentityMap,
    shell: &Shell,
) -> (usize, usize) {
    let progress = shell.progress(relocated.len() as u64, "rewriting manifests");
    let results: Vec<(PathBuf, Result<RewriteOutcome>)> = relocated
        .par_iter()
        .map(|dir| {
            let manifest = dir.join("Cargo.toml");
            let result = rewrite_manifest(&manifest, map, workspace_root);
            progress.inc(1);
            (manifest, result)
        })
        .collect();
    progress.finish();

    let mut replaced = 0;
    let mut pruned = 0;
    for (manifest, result) in results {
        match result {
            Ok(outcome) => {
                if outcome.changed {
                    shell.status(
                        Status::Rewriting,
                        format!(
                            "{} ({} references, {} pruned)",
                            fs::relative_path(workspace_root, &manifest).display(),
                            outcome.replaced.len(),
                            outcome.pruned.len()
                        ),
                    );
                }
                replaced += outcome.replaced.len();
                pruned += outcome.pruned.len();
            }
            Err(err) => shell.warn(format!("leaving `{}` untouched: {err:#}", manifest.display())),
        }
    }

    (replaced, pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::shell::ColorChoice;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn quiet_shell() -> Shell {
        Shell::from_flags(true, false, ColorChoice::Never)
    }

    fn write_crate(repos_root: &Path, rel: &str, manifest: &str) {
        let dir = repos_root.join(rel);
        stdfs::create_dir_all(dir.join("src")).unwrap();
        stdfs::write(dir.join("Cargo.toml"), manifest).unwrap();
        stdfs::write(dir.join("src/lib.rs"), "").unwrap();
    }

    #[test]
    fn test_destination_exists_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let opts = AssembleOptions {
            repos: vec![],
            branch: "main".to_string(),
            dest: tmp.path().to_path_buf(),
            filters: vec![],
        };

        let err = assemble(&opts, &quiet_shell()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AssembleError>(),
            Some(AssembleError::DestinationExists(_))
        ));
    }

    #[test]
    fn test_end_to_end_cross_repo_reference() {
        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        let repos = ws.join(REPOS_DIR);

        // Repository A consumes `shared-lib` from the registry; repository B
        // provides it under a differently named directory.
        write_crate(
            &repos,
            "repo-a/app",
            "[package]\nname = \"app\"\nversion = \"0.1.0\"\n\n[dependencies]\nshared-lib = \"1.0\"\n",
        );
        write_crate(
            &repos,
            "repo-b/libs/shared",
            "[package]\nname = \"shared-lib\"\nversion = \"1.0.0\"\n",
        );

        let summary = integrate_workspace(&ws, &[], &quiet_shell()).unwrap();

        assert_eq!(summary.crates_relocated, 2);
        assert_eq!(summary.references_replaced, 1);

        let manifest = stdfs::read_to_string(ws.join("crates/app/Cargo.toml")).unwrap();
        assert!(manifest.contains("path = \"../shared\""));
        assert!(!manifest.contains("shared-lib = \"1.0\""));

        let workspace = stdfs::read_to_string(ws.join("Cargo.toml")).unwrap();
        assert!(workspace.contains("\"crates/app\""));
        assert!(workspace.contains("\"crates/shared\""));
        assert!(workspace.contains("\"repos\""));
    }

    #[test]
    fn test_reintegration_converges() {
        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        let repos = ws.join(REPOS_DIR);

        write_crate(
            &repos,
            "repo-a/app",
            "[package]\nname = \"app\"\nversion = \"0.1.0\"\n\n[dependencies]\nshared-lib = \"1.0\"\n",
        );
        write_crate(
            &repos,
            "repo-b/shared-lib",
            "[package]\nname = \"shared-lib\"\nversion = \"1.0.0\"\n",
        );

        integrate_workspace(&ws, &[], &quiet_shell()).unwrap();
        let snapshot1 = stdfs::read_to_string(ws.join("crates/app/Cargo.toml")).unwrap();

        // Re-integration copies the pristine checkouts again and rewrites
        // them to the same result.
        integrate_workspace(&ws, &[], &quiet_shell()).unwrap();
        let snapshot2 = stdfs::read_to_string(ws.join("crates/app/Cargo.toml")).unwrap();

        assert_eq!(snapshot1, snapshot2);
    }

    #[test]
    fn test_filters_restrict_selection() {
        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        let repos = ws.join(REPOS_DIR);

        write_crate(
            &repos,
            "repo/apps/app",
            "[package]\nname = \"app\"\nversion = \"0.1.0\"\n",
        );
        write_crate(
            &repos,
            "repo/libs/lib",
            "[package]\nname = \"lib\"\nversion = \"0.1.0\"\n",
        );

        let filters = vec!["repo/apps/**".to_string()];
        let summary = integrate_workspace(&ws, &filters, &quiet_shell()).unwrap();

        assert_eq!(summary.crates_relocated, 1);
        assert!(ws.join("crates/app").exists());
        assert!(!ws.join("crates/lib").exists());
    }

    #[test]
    fn test_empty_repositories_area() {
        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        stdfs::create_dir_all(&ws).unwrap();

        let summary = integrate_workspace(&ws, &[], &quiet_shell()).unwrap();

        assert_eq!(summary.crates_relocated, 0);
        assert!(ws.join("Cargo.toml").exists());
    }
}
