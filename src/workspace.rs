//! The persistent forge project that scripts and files are kept in

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use walkdir::WalkDir;

use crate::error::{ToolError, ToolResult};
use crate::executor::CommandRunner;
use crate::foundry::{Binary, Toolchain};

/// File whose presence marks the directory as an initialized forge project.
pub const PROJECT_MARKER: &str = "foundry.toml";

/// A fixed root directory, initialized as a forge project on first use.
///
/// Concurrent writers to the same file race; the last write wins.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    initialized: OnceCell<()>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            initialized: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and run `forge init` there if it is not a project yet.
    ///
    /// Runs at most once successfully per process; a failed init is retried on the
    /// next call.
    pub async fn ensure(&self, toolchain: &Toolchain, runner: &dyn CommandRunner) -> ToolResult<&Path> {
        self.initialized
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.root)
                    .await
                    .map_err(|e| ToolError::io(&self.root, e))?;

                if tokio::fs::metadata(self.root.join(PROJECT_MARKER)).await.is_ok() {
                    return Ok(());
                }

                tracing::info!(root = %self.root.display(), "initializing forge workspace");
                let init = toolchain
                    .command(Binary::Forge)
                    .arg("init")
                    .flag("--no-git", true)
                    .flag("--force", true)
                    .arg(".")
                    .current_dir(&self.root);
                runner.run(&init).await.into_result().map(|_| ())
            })
            .await?;
        Ok(&self.root)
    }

    /// Join `relative` onto the root, refusing absolute paths and `..`.
    pub fn resolve(&self, relative: &str) -> ToolResult<PathBuf> {
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ToolError::PathOutsideWorkspace(path.to_path_buf()));
        }
        Ok(self.root.join(path))
    }

    /// Write `content` to `relative`, creating parent directories.
    ///
    /// An existing file is only replaced when `overwrite` is set; otherwise it is left
    /// untouched and [`ToolError::FileExists`] is returned.
    pub async fn write_file(&self, relative: &str, content: &str, overwrite: bool) -> ToolResult<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::io(parent, e))?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => ToolError::FileExists(PathBuf::from(relative)),
            _ => ToolError::io(&path, e),
        })?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| ToolError::io(&path, e))?;
        file.flush().await.map_err(|e| ToolError::io(&path, e))?;

        Ok(path)
    }

    pub async fn read_file(&self, relative: &str) -> ToolResult<String> {
        let path = self.resolve(relative)?;
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ToolError::FileNotFound(PathBuf::from(relative)),
            _ => ToolError::io(&path, e),
        })
    }

    /// Every file under `directory` (the root when `None`), relative to that directory,
    /// depth-first in name order. Directories themselves are not listed; symlinks to
    /// files are, symlinked directories are not descended into.
    pub async fn list_files(&self, directory: Option<&str>) -> ToolResult<Vec<String>> {
        let dir = self.resolve(directory.unwrap_or(""))?;
        let shown = directory.unwrap_or(".").to_string();

        tokio::task::spawn_blocking(move || walk_files(&dir, &shown))
            .await
            .map_err(|e| ToolError::CommandFailed(format!("Task error: {}", e)))?
    }
}

fn walk_files(dir: &Path, shown: &str) -> ToolResult<Vec<String>> {
    if !dir.is_dir() {
        return Err(ToolError::FileNotFound(PathBuf::from(shown)));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ToolError::io(path, e.into())
        })?;
        // Symlinked files count; WalkDir reports the link itself, not its target.
        if !entry.path().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            files.push(parts.join("/"));
        }
    }
    Ok(files)
}
