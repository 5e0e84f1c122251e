//! Project Files
//!
//! Shader sources are referenced by path from pipeline items. Paths are
//! resolved against a project directory by the [`ProjectFiles`] collaborator;
//! the engine only ever calls [`ProjectFiles::load_project_file`].
//!
//! [`ProjectDirectory`] is the file-system implementation. It also offers the
//! save / relative-path helpers a host editor needs when it writes shader
//! files back next to the project.

use std::path::{Component, Path, PathBuf};

use crate::errors::{Result, ShaderLabError};

/// Read access to files that belong to the open project.
pub trait ProjectFiles {
    /// Returns the text content of `path` (relative to the project root,
    /// or absolute).
    fn load_project_file(&self, path: &str) -> Result<String>;
}

/// A project rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct ProjectDirectory {
    root: PathBuf,
}

impl Default for ProjectDirectory {
    fn default() -> Self {
        Self::new(current_dir())
    }
}

impl ProjectDirectory {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = root.into();
    }

    /// Points the project back at the process working directory.
    pub fn reset_root(&mut self) {
        self.root = current_dir();
    }

    /// The root, made absolute against the working directory when relative.
    #[must_use]
    pub fn absolute_root(&self) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            current_dir().join(&self.root)
        }
    }

    /// Absolute location of `path` inside the project.
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.absolute_root().join(path)
        }
    }

    /// Writes `data` to `path`, creating parent directories as needed.
    pub fn save_project_file(&self, path: &str, data: &str) -> Result<()> {
        let full = self.resolve(path);
        let to_error = |source| ShaderLabError::ProjectFile {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(to_error)?;
        }
        std::fs::write(&full, data).map_err(to_error)
    }

    /// Expresses `to` relative to the project root.
    ///
    /// Relative inputs are returned unchanged. The computation is purely
    /// lexical; symlinks are not resolved.
    #[must_use]
    pub fn relative_path(&self, to: impl AsRef<Path>) -> PathBuf {
        let to = to.as_ref();
        if to.is_relative() {
            return to.to_path_buf();
        }
        relative_to(&self.absolute_root(), to)
    }
}

impl ProjectFiles for ProjectDirectory {
    fn load_project_file(&self, path: &str) -> Result<String> {
        std::fs::read_to_string(self.resolve(path)).map_err(|source| ShaderLabError::ProjectFile {
            path: path.to_string(),
            source,
        })
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn normalized(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base = normalized(base);
    let target = normalized(target);

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &target[common..] {
        result.push(component.as_os_str());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_inside_root() {
        let project = ProjectDirectory::new("/home/user/project");
        assert_eq!(
            project.relative_path("/home/user/project/shaders/simple.wgsl"),
            PathBuf::from("shaders/simple.wgsl")
        );
    }

    #[test]
    fn relative_path_outside_root_climbs() {
        let project = ProjectDirectory::new("/home/user/project");
        assert_eq!(
            project.relative_path("/home/user/shared/common.wgsl"),
            PathBuf::from("../shared/common.wgsl")
        );
    }

    #[test]
    fn relative_root_is_anchored_at_the_working_directory() {
        let project = ProjectDirectory::new("shaders_root");
        let cwd = current_dir();

        assert_eq!(
            project.relative_path(cwd.join("shaders_root/pass.wgsl")),
            PathBuf::from("pass.wgsl")
        );
        assert_eq!(
            project.relative_path(cwd.join("other/common.wgsl")),
            PathBuf::from("../other/common.wgsl")
        );
        assert!(project.resolve("pass.wgsl").is_absolute());
    }

    #[test]
    fn relative_input_is_unchanged() {
        let project = ProjectDirectory::new("/home/user/project");
        assert_eq!(
            project.relative_path("shaders/a.wgsl"),
            PathBuf::from("shaders/a.wgsl")
        );
    }

    #[test]
    fn save_then_load_through_project_root() {
        let dir = std::env::temp_dir().join(format!(
            "shaderlab-project-test-{}",
            std::process::id()
        ));
        let project = ProjectDirectory::new(&dir);

        project
            .save_project_file("shaders/pass.wgsl", "// hello")
            .unwrap();
        assert_eq!(
            project.load_project_file("shaders/pass.wgsl").unwrap(),
            "// hello"
        );

        let missing = project.load_project_file("shaders/missing.wgsl");
        assert!(matches!(missing, Err(ShaderLabError::ProjectFile { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
