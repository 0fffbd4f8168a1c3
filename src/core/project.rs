//! Discovered sub-project descriptors.

use std::path::{Path, PathBuf};

use crate::util::fs;

/// The kinds of buildable sub-project the tool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    /// A Cargo package, marked by its `Cargo.toml`.
    Crate,
    /// An Angular workspace, marked by its `angular.json`.
    WebWorkspace,
}

impl ProjectKind {
    /// File name of the manifest that marks this kind of project.
    pub fn manifest_name(&self) -> &'static str {
        match self {
            ProjectKind::Crate => "Cargo.toml",
            ProjectKind::WebWorkspace => "angular.json",
        }
    }

    /// Generated-output directories that are never searched or copied.
    pub fn excluded_dirs(&self) -> &'static [&'static str] {
        match self {
            ProjectKind::Crate => &["target", "node_modules"],
            ProjectKind::WebWorkspace => &["node_modules", "dist"],
        }
    }
}

/// One discovered sub-project inside a fetched repository.
#[derive(Debug, Clone)]
pub struct SubProject {
    /// What kind of project this is.
    pub kind: ProjectKind,
    /// Absolute path to the project's manifest file.
    pub manifest_path: PathBuf,
    /// Directory containing the manifest.
    pub root_dir: PathBuf,
    /// Project directory relative to the repositories area, slash-normalized.
    pub relative_path: String,
    /// Short name, derived from the project directory.
    pub name: String,
}

impl SubProject {
    /// Build a descriptor from a manifest path found under `repos_root`.
    ///
    /// Returns `None` when the path has no usable parent directory or does
    /// not live under the repositories area.
    pub fn from_manifest(kind: ProjectKind, manifest_path: &Path, repos_root: &Path) -> Option<Self> {
        let root_dir = manifest_path.parent()?.to_path_buf();
        let relative = root_dir.strip_prefix(repos_root).ok()?;
        let name = root_dir.file_name()?.to_string_lossy().into_owned();
        let relative_path = fs::slash_path(relative);

        Some(SubProject {
            kind,
            manifest_path: manifest_path.to_path_buf(),
            root_dir,
            relative_path,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_manifest() {
        let project = SubProject::from_manifest(
            ProjectKind::Crate,
            Path::new("/ws/repos/repo-a/libs/foo/Cargo.toml"),
            Path::new("/ws/repos"),
        )
        .unwrap();

        assert_eq!(project.name, "foo");
        assert_eq!(project.relative_path, "repo-a/libs/foo");
        assert_eq!(project.root_dir, PathBuf::from("/ws/repos/repo-a/libs/foo"));
    }

    #[test]
    fn test_from_manifest_outside_root() {
        let project = SubProject::from_manifest(
            ProjectKind::Crate,
            Path::new("/elsewhere/foo/Cargo.toml"),
            Path::new("/ws/repos"),
        );
        assert!(project.is_none());
    }

    #[test]
    fn test_kind_signatures() {
        assert_eq!(ProjectKind::Crate.manifest_name(), "Cargo.toml");
        assert_eq!(ProjectKind::WebWorkspace.manifest_name(), "angular.json");
        assert!(ProjectKind::Crate.excluded_dirs().contains(&"target"));
        assert!(ProjectKind::WebWorkspace
            .excluded_dirs()
            .contains(&"node_modules"));
    }
}
