//! Manifest rewriting.
//!
//! Relocating a crate into the workspace invalidates two classes of
//! declarations in its manifest: path-style entries that reached outside the
//! project into its old repository layout, and published dependencies on
//! packages that are now siblings in the workspace. The rewriter prunes the
//! former and turns the latter into path dependencies.
//!
//! Edits are structural: parse to a document tree, mutate nodes, serialize.
//! The file is only written back when something actually changed, and running
//! the rewrite a second time leaves it byte-identical.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use toml_edit::{value, DocumentMut, InlineTable, Item, TableLike, Value};

use crate::ops::identity::IdentityMap;
use crate::util::fs;

/// Dependency tables a Cargo manifest may carry, at top level and per target.
const DEP_TABLES: &[&str] = &["dependencies", "dev-dependencies", "build-dependencies"];

/// `[package]` keys that point at files by path.
const PACKAGE_FILE_KEYS: &[&str] = &["workspace", "build", "license-file", "readme"];

/// Array-of-table sections whose entries name source files by path.
const TARGET_SECTIONS: &[&str] = &["bin", "example", "test", "bench"];

/// What a rewrite did to one manifest.
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    /// Published identities replaced with path dependencies.
    pub replaced: Vec<String>,
    /// Declarations removed because their target no longer resolves.
    pub pruned: Vec<String>,
    /// Whether the file was written back.
    pub changed: bool,
}

/// Rewrite one relocated manifest in place.
///
/// Every published dependency whose identity appears in `map` becomes a path
/// dependency on the sibling project, inside whichever dependency table held
/// the original declaration. Path-style declarations that escape the project
/// and no longer resolve inside `workspace_root` are removed.
pub fn rewrite_manifest(
    manifest_path: &Path,
    map: &IdentityMap,
    workspace_root: &Path,
) -> Result<RewriteOutcome> {
    let content = fs::read_to_string(manifest_path)?;
    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

    let manifest_dir = manifest_path
        .parent()
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let mut outcome = RewriteOutcome::default();

    prune_file_entries(&mut doc, &mut outcome);
    for_each_dep_table(&mut doc, |table| {
        prune_dangling_paths(table, &manifest_dir, workspace_root, &mut outcome);
        substitute_published(table, &manifest_dir, map, &mut outcome);
    });

    let rewritten = doc.to_string();
    if rewritten != content {
        fs::write_string(manifest_path, &rewritten)?;
        outcome.changed = true;
    }

    Ok(outcome)
}

/// Apply `f` to every dependency table in the document, including the
/// per-target variants under `[target.<cfg>]`.
fn for_each_dep_table<F>(doc: &mut DocumentMut, mut f: F)
where
    F: FnMut(&mut dyn TableLike),
{
    for name in DEP_TABLES {
        if let Some(table) = doc.get_mut(name).and_then(|i| i.as_table_like_mut()) {
            f(table);
        }
    }

    let target_keys: Vec<String> = doc
        .get("target")
        .and_then(|i| i.as_table_like())
        .map(|t| t.iter().map(|(key, _)| key.to_string()).collect())
        .unwrap_or_default();

    for key in target_keys {
        for name in DEP_TABLES {
            let table = doc
                .get_mut("target")
                .and_then(|i| i.as_table_like_mut())
                .and_then(|t| t.get_mut(&key))
                .and_then(|i| i.as_table_like_mut())
                .and_then(|t| t.get_mut(name))
                .and_then(|i| i.as_table_like_mut());
            if let Some(table) = table {
                f(table);
            }
        }
    }
}

/// Remove file-pointer entries that reach outside the project directory.
///
/// These were relative to the project's original location inside its own
/// repository; their targets are not carried into the workspace, so the
/// declarations are deleted rather than rewritten.
fn prune_file_entries(doc: &mut DocumentMut, outcome: &mut RewriteOutcome) {
    if let Some(package) = doc.get_mut("package").and_then(|i| i.as_table_like_mut()) {
        for key in PACKAGE_FILE_KEYS {
            let escapes = package
                .get(key)
                .and_then(|i| i.as_str())
                .is_some_and(escapes_project);
            if escapes {
                package.remove(key);
                outcome.pruned.push(format!("package.{key}"));
            }
        }
    }

    if let Some(lib) = doc.get_mut("lib").and_then(|i| i.as_table_like_mut()) {
        let escapes = lib
            .get("path")
            .and_then(|i| i.as_str())
            .is_some_and(escapes_project);
        if escapes {
            lib.remove("path");
            outcome.pruned.push("lib.path".to_string());
        }
    }

    for name in TARGET_SECTIONS {
        if let Some(tables) = doc.get_mut(name).and_then(|i| i.as_array_of_tables_mut()) {
            let stale: Vec<usize> = tables
                .iter()
                .enumerate()
                .filter(|(_, t)| {
                    t.get("path")
                        .and_then(|i| i.as_str())
                        .is_some_and(escapes_project)
                })
                .map(|(idx, _)| idx)
                .collect();
            for idx in stale.into_iter().rev() {
                tables.remove(idx);
                outcome.pruned.push(format!("{name}.path"));
            }
        }
    }
}

/// Remove path dependencies that point back into the old repository layout
/// and no longer resolve to a crate inside the workspace.
fn prune_dangling_paths(
    table: &mut dyn TableLike,
    manifest_dir: &Path,
    workspace_root: &Path,
    outcome: &mut RewriteOutcome,
) {
    let dangling: Vec<String> = table
        .iter()
        .filter(|(_, item)| {
            dep_path(item).is_some_and(|path| {
                escapes_project(path) && !resolves_in_workspace(manifest_dir, workspace_root, path)
            })
        })
        .map(|(key, _)| key.to_string())
        .collect();

    for key in dangling {
        table.remove(&key);
        outcome.pruned.push(key);
    }
}

/// Replace published dependencies on workspace siblings with path
/// dependencies.
fn substitute_published(
    table: &mut dyn TableLike,
    manifest_dir: &Path,
    map: &IdentityMap,
    outcome: &mut RewriteOutcome,
) {
    // Decide first; the table cannot be mutated while iterating it.
    let targets: Vec<(String, String, PathBuf)> = table
        .iter()
        .filter(|(_, item)| is_published_dep(item))
        .filter_map(|(key, item)| {
            let identity = dep_identity(key, item).to_string();
            let target = map.get(&identity)?.to_path_buf();
            if target == *manifest_dir {
                return None;
            }
            Some((key.to_string(), identity, target))
        })
        .collect();

    for (key, identity, target) in targets {
        let rel = fs::slash_path(&fs::relative_path(manifest_dir, &target));
        if let Some(item) = table.get_mut(&key) {
            replace_with_path_dep(item, &rel);
            outcome.replaced.push(identity);
        }
    }
}

/// Turn one published declaration into a path declaration, keeping whatever
/// else it carried (features, optionality, a `package` rename).
fn replace_with_path_dep(item: &mut Item, rel: &str) {
    match item {
        Item::Value(Value::InlineTable(t)) => {
            t.remove("version");
            t.remove("registry");
            t.remove("workspace");
            t.insert("path", rel.into());
        }
        Item::Table(t) => {
            t.remove("version");
            t.remove("registry");
            t.remove("workspace");
            t.insert("path", value(rel));
        }
        _ => {
            let mut dep = InlineTable::new();
            dep.insert("path", rel.into());
            *item = Item::Value(Value::InlineTable(dep));
        }
    }
}

/// The `path` of a path dependency, if this declaration is one.
fn dep_path(item: &Item) -> Option<&str> {
    match item {
        Item::Value(Value::InlineTable(t)) => t.get("path").and_then(Value::as_str),
        Item::Table(t) => t.get("path").and_then(Item::as_str),
        _ => None,
    }
}

/// A dependency declared purely by registry identity: a bare version string,
/// or a table carrying neither `path` nor `git`.
fn is_published_dep(item: &Item) -> bool {
    match item {
        Item::Value(Value::String(_)) => true,
        Item::Value(Value::InlineTable(t)) => !t.contains_key("path") && !t.contains_key("git"),
        Item::Table(t) => !t.contains_key("path") && !t.contains_key("git"),
        _ => false,
    }
}

/// The published identity of a dependency entry: the `package` rename when
/// present, the table key otherwise.
fn dep_identity<'a>(key: &'a str, item: &'a Item) -> &'a str {
    let rename = match item {
        Item::Value(Value::InlineTable(t)) => t.get("package").and_then(Value::as_str),
        Item::Table(t) => t.get("package").and_then(Item::as_str),
        _ => None,
    };
    rename.unwrap_or(key)
}

fn escapes_project(path: &str) -> bool {
    path.starts_with("..")
}

/// True when a relative path, resolved from the manifest directory, lands on
/// a crate that still exists inside the workspace.
fn resolves_in_workspace(manifest_dir: &Path, workspace_root: &Path, path: &str) -> bool {
    let resolved = fs::normalize_lexically(&manifest_dir.join(path));
    resolved.starts_with(workspace_root) && resolved.join("Cargo.toml").is_file()
}
