//! Filesystem utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Recursively copy a directory, skipping named directories at any depth.
///
/// `.git` is always skipped in addition to `exclude_dirs`. Existing files at
/// the destination are overwritten.
pub fn copy_tree(src: &Path, dst: &Path, exclude_dirs: &[&str]) -> Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("failed to create directory: {}", dst.display()))?;

    for entry in
        fs::read_dir(src).with_context(|| format!("failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let ty = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        let name = entry.file_name();
        let name = name.to_string_lossy();
        // Submodule checkouts carry `.git` as a gitlink file, not a directory.
        if name == ".git" {
            continue;
        }

        if ty.is_dir() {
            if exclude_dirs.iter().any(|d| *d == name) {
                continue;
            }
            copy_tree(&src_path, &dst_path, exclude_dirs)?;
        } else if ty.is_file() {
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    src_path.display(),
                    dst_path.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Canonicalize a path, falling back to the path as-is if it does not exist.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// Unlike canonicalization this works for paths whose target does not exist,
/// which is exactly the case when checking whether a relocated reference
/// still points anywhere.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut out = if let Some(c @ Component::Prefix(..)) = components.peek().copied() {
        components.next();
        PathBuf::from(c.as_os_str())
    } else {
        PathBuf::new()
    };

    for component in components {
        match component {
            Component::Prefix(..) => unreachable!(),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(c) => out.push(c),
        }
    }
    out
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a path with forward slashes, for manifests and filter matching.
pub fn slash_path(path: &Path) -> String {
    let segments: Vec<_> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_skips_excluded_dirs() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        fs::create_dir_all(src.join("code")).unwrap();
        fs::create_dir_all(src.join("target/debug")).unwrap();
        fs::create_dir_all(src.join(".git")).unwrap();
        fs::write(src.join("file.txt"), "content").unwrap();
        fs::write(src.join("code/lib.rs"), "pub fn f() {}").unwrap();
        fs::write(src.join("target/debug/out"), "bin").unwrap();
        fs::write(src.join(".git/HEAD"), "ref").unwrap();

        copy_tree(&src, &dst, &["target"]).unwrap();

        assert!(dst.join("file.txt").exists());
        assert!(dst.join("code/lib.rs").exists());
        assert!(!dst.join("target").exists());
        assert!(!dst.join(".git").exists());
    }

    #[test]
    fn test_copy_tree_overwrites() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("file.txt"), "new").unwrap();
        fs::write(dst.join("file.txt"), "old").unwrap();

        copy_tree(&src, &dst, &[]).unwrap();

        assert_eq!(fs::read_to_string(dst.join("file.txt")).unwrap(), "new");
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../../x")),
            PathBuf::from("/x")
        );
    }

    #[test]
    fn test_relative_path() {
        let rel = relative_path(Path::new("/ws/crates/app"), Path::new("/ws/crates/lib"));
        assert_eq!(rel, PathBuf::from("../lib"));
    }

    #[test]
    fn test_slash_path() {
        assert_eq!(slash_path(Path::new("a/b/c")), "a/b/c");
    }
}
