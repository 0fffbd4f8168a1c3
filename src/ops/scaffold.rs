//! Top-level workspace manifest generation.

use std::path::Path;

use anyhow::Result;
use toml_edit::{value, Array, DocumentMut, Item, Table};

use crate::util::fs;

/// Write the virtual workspace manifest tying the relocated crates together.
///
/// The repositories area is excluded so Cargo does not pick up the pristine
/// checkouts as workspace members. Members are sorted so regeneration is
/// reproducible.
pub fn write_workspace_manifest(
    workspace_root: &Path,
    members: &[String],
    exclude: &[&str],
) -> Result<()> {
    let mut sorted: Vec<&str> = members.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut workspace = Table::new();
    workspace["resolver"] = value("2");

    let mut member_list = Array::new();
    for member in sorted {
        member_list.push(member);
    }
    workspace["members"] = value(member_list);

    let mut exclude_list = Array::new();
    for dir in exclude {
        exclude_list.push(*dir);
    }
    workspace["exclude"] = value(exclude_list);

    let mut doc = DocumentMut::new();
    doc["workspace"] = Item::Table(workspace);

    fs::write_string(&workspace_root.join("Cargo.toml"), &doc.to_string())
}
