//! Web workspace integration.
//!
//! Web projects ride along as an external-tool concern: the Angular CLI
//! scaffolds a fresh workspace and the discovered projects are copied into
//! it. None of this is dependency-graph logic, so every failure here is a
//! warning at worst.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::project::{ProjectKind, SubProject};
use crate::util::fs;
use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Directory (relative to the workspace root) holding the web workspace.
pub const WEB_DIR: &str = "web";

/// The slice of `angular.json` the integration needs.
#[derive(Debug, Deserialize)]
struct AngularWorkspace {
    #[serde(default)]
    projects: BTreeMap<String, AngularProject>,
}

#[derive(Debug, Deserialize)]
struct AngularProject {
    root: Option<String>,
    #[serde(rename = "projectType")]
    project_type: Option<String>,
}

/// True when the Angular CLI is installed and on PATH.
pub fn angular_cli_available() -> bool {
    find_executable("ng").is_some()
}

/// Scaffold the web workspace and copy every discovered project into it.
///
/// A missing CLI or a failed scaffold downgrades the whole phase to a
/// warning; individual project failures skip just that project.
pub fn integrate_web_projects(
    workspace_root: &Path,
    projects: &[SubProject],
    shell: &Shell,
) -> Result<()> {
    if !angular_cli_available() {
        shell.warn("Angular CLI not found; skipping web workspace (npm install -g @angular/cli)");
        return Ok(());
    }

    let output = ProcessBuilder::new("ng")
        .args(["new", WEB_DIR, "--skip-git", "--create-application=false"])
        .cwd(workspace_root)
        .exec()?;
    if tool_failed(&output) {
        shell.warn(format!(
            "failed to scaffold web workspace: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
        return Ok(());
    }

    let web_root = workspace_root.join(WEB_DIR);
    for project in projects {
        match copy_workspace_projects(&web_root, project) {
            Ok(names) => {
                for name in names {
                    shell.status(Status::Added, format!("web project {name}"));
                }
            }
            Err(err) => shell.warn(format!(
                "failed to integrate web project `{}`: {:#}",
                project.name, err
            )),
        }
    }

    Ok(())
}

/// Copy each project listed in one `angular.json` into the web workspace.
///
/// Returns the names of the projects that were copied.
pub fn copy_workspace_projects(web_root: &Path, project: &SubProject) -> Result<Vec<String>> {
    let content = fs::read_to_string(&project.manifest_path)?;
    let workspace: AngularWorkspace = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", project.manifest_path.display()))?;

    let mut copied = Vec::new();
    for (name, entry) in workspace.projects {
        let Some(root) = entry.root else {
            continue;
        };
        let source = project.root_dir.join(&root);
        if !source.is_dir() {
            tracing::warn!(
                "web project `{}` declares missing root `{}`",
                name,
                source.display()
            );
            continue;
        }

        let dest = web_root.join("projects").join(&name);
        fs::copy_tree(
            &source,
            &dest,
            ProjectKind::WebWorkspace.excluded_dirs(),
        )?;

        tracing::debug!(
            "copied web {} `{}`",
            entry.project_type.as_deref().unwrap_or("application"),
            name
        );
        copied.push(name);
    }

    Ok(copied)
}

/// External-tool failure rule: non-zero exit with anything on stderr.
fn tool_failed(output: &Output) -> bool {
    !output.status.success() && !String::from_utf8_lossy(&output.stderr).trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn web_project(root: &Path, dir: &str, angular_json: &str) -> SubProject {
        let project_dir = root.join(dir);
        stdfs::create_dir_all(&project_dir).unwrap();
        let manifest_path = project_dir.join("angular.json");
        stdfs::write(&manifest_path, angular_json).unwrap();
        SubProject::from_manifest(ProjectKind::WebWorkspace, &manifest_path, root).unwrap()
    }

    #[test]
    fn test_copies_declared_projects() {
        let tmp = TempDir::new().unwrap();
        let repos = tmp.path().join("repos");
        let project = web_project(
            &repos,
            "frontend",
            r#"{
                "projects": {
                    "dashboard": { "root": "apps/dashboard", "projectType": "application" },
                    "widgets": { "root": "libs/widgets", "projectType": "library" }
                }
            }"#,
        );

        let dashboard = repos.join("frontend/apps/dashboard/src");
        stdfs::create_dir_all(&dashboard).unwrap();
        stdfs::write(dashboard.join("main.ts"), "bootstrap();").unwrap();
        let widgets = repos.join("frontend/libs/widgets");
        stdfs::create_dir_all(widgets.join("node_modules/x")).unwrap();
        stdfs::write(widgets.join("index.ts"), "export {};").unwrap();

        let web_root = tmp.path().join("web");
        let copied = copy_workspace_projects(&web_root, &project).unwrap();

        assert_eq!(copied, ["dashboard", "widgets"]);
        assert!(web_root.join("projects/dashboard/src/main.ts").exists());
        assert!(web_root.join("projects/widgets/index.ts").exists());
        assert!(!web_root.join("projects/widgets/node_modules").exists());
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let repos = tmp.path().join("repos");
        let project = web_project(
            &repos,
            "frontend",
            r#"{ "projects": { "ghost": { "root": "nowhere" } } }"#,
        );

        let copied = copy_workspace_projects(&tmp.path().join("web"), &project).unwrap();
        assert!(copied.is_empty());
    }

    #[test]
    fn test_bad_angular_json_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let repos = tmp.path().join("repos");
        let project = web_project(&repos, "frontend", "not json");

        let result = copy_workspace_projects(&tmp.path().join("web"), &project);
        assert!(result.is_err());
    }
}
