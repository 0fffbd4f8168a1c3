//! Project discovery across fetched repositories.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::core::filter;
use crate::core::project::{ProjectKind, SubProject};

/// Find every selected project of `kind` under the repositories area.
///
/// A missing repositories area is not an error: before any repository has
/// been fetched there is simply nothing to discover. Generated-output
/// directories are skipped at any depth. Results are sorted by manifest path
/// so output is reproducible.
pub fn discover(repos_root: &Path, kind: ProjectKind, filters: &[String]) -> Vec<SubProject> {
    if !repos_root.is_dir() {
        return Vec::new();
    }

    let mut projects: Vec<SubProject> = WalkDir::new(repos_root)
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry, kind))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == kind.manifest_name())
        .filter_map(|entry| SubProject::from_manifest(kind, entry.path(), repos_root))
        .filter(|project| filter::matches(&project.name, &project.relative_path, filters))
        .collect();

    projects.sort_by(|a, b| a.manifest_path.cmp(&b.manifest_path));
    projects
}

fn is_excluded_dir(entry: &DirEntry, kind: ProjectKind) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == ".git" || kind.excluded_dirs().iter().any(|d| *d == name)
}
