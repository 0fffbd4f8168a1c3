//! Package-identity mapping for relocated crates.
//!
//! After every selected crate has been copied into the workspace, this map
//! answers the one question rewriting needs: which workspace directory now
//! provides a given published package name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::util::fs;

/// The `[package]` head of a crate manifest; nothing else matters here.
#[derive(Debug, Deserialize)]
struct ManifestHead {
    package: Option<PackageHead>,
}

#[derive(Debug, Deserialize)]
struct PackageHead {
    name: Option<String>,
}

/// A collision between two projects claiming the same identity.
#[derive(Debug, Clone)]
pub struct DuplicateIdentity {
    /// The contested package identity.
    pub identity: String,
    /// The project that won (last write).
    pub kept: PathBuf,
    /// The project that was shadowed.
    pub shadowed: PathBuf,
}

/// Map from published package identity to the crate directory that now
/// provides it inside the workspace.
///
/// Built once after relocation, read-only during rewriting.
#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: HashMap<String, PathBuf>,
    duplicates: Vec<DuplicateIdentity>,
}

impl IdentityMap {
    /// Build the map from relocated crate directories.
    ///
    /// Identity is the declared `package.name`, or the directory name when
    /// the manifest declares none or cannot be read. Duplicate identities
    /// are a workspace-authoring problem, not a tool failure: the later
    /// project wins and the collision is recorded for the caller to report.
    pub fn build<I>(project_dirs: I) -> IdentityMap
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut map = IdentityMap::default();
        for dir in project_dirs {
            let identity = declared_identity(&dir);
            map.insert(identity, dir);
        }
        map
    }

    fn insert(&mut self, identity: String, dir: PathBuf) {
        if let Some(shadowed) = self.entries.insert(identity.clone(), dir.clone()) {
            if shadowed != dir {
                self.duplicates.push(DuplicateIdentity {
                    identity,
                    kept: dir,
                    shadowed,
                });
            }
        }
    }

    /// Look up the workspace directory providing a published identity.
    pub fn get(&self, identity: &str) -> Option<&Path> {
        self.entries.get(identity).map(PathBuf::as_path)
    }

    /// Number of distinct identities in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identity collisions recorded while building.
    pub fn duplicates(&self) -> &[DuplicateIdentity] {
        &self.duplicates
    }
}

/// Declared `package.name`, falling back to the directory's file name.
fn declared_identity(dir: &Path) -> String {
    let fallback = || {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    let manifest_path = dir.join("Cargo.toml");
    let content = match fs::read_to_string(&manifest_path) {
        Ok(content) => content,
        Err(_) => return fallback(),
    };

    match toml::from_str::<ManifestHead>(&content) {
        Ok(head) => head
            .package
            .and_then(|p| p.name)
            .unwrap_or_else(fallback),
        Err(err) => {
            tracing::warn!("unreadable manifest {}: {}", manifest_path.display(), err);
            fallback()
        }
    }
}
