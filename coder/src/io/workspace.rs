//! Working-root path resolution and the shared tool failure taxonomy.
//!
//! Every primitive resolves its path argument against the working root and
//! refuses the operation if the result escapes it. The containment check is
//! identical in shape for read, write, delete, and list. Failures are
//! returned as [`ToolError`] values; nothing crosses the orchestrator
//! boundary as a panic.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::core::splice::RangeError;

/// Failure of a single tool invocation. Always reported, never fatal to a
/// run.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("path {path} is outside the working directory")]
    PathEscape { path: String },
    #[error("{path} does not exist")]
    NotFound { path: String },
    #[error("{path} is not a file")]
    NotAFile { path: String },
    #[error("{path} is not a directory")]
    NotADirectory { path: String },
    #[error("cannot decode {path} as UTF-8")]
    NotUtf8 { path: String },
    #[error("permission denied for {path}")]
    PermissionDenied { path: String },
    #[error("invalid search pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("{path}: {source}")]
    Io { path: String, source: io::Error },
}

impl ToolError {
    pub(crate) fn from_io(path: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => ToolError::NotFound {
                path: path.to_string(),
            },
            io::ErrorKind::PermissionDenied => ToolError::PermissionDenied {
                path: path.to_string(),
            },
            io::ErrorKind::InvalidData => ToolError::NotUtf8 {
                path: path.to_string(),
            },
            _ => ToolError::Io {
                path: path.to_string(),
                source,
            },
        }
    }
}

/// Resolve `target` against the working root, rejecting anything that
/// escapes it.
///
/// Resolution is lexical: `.` and `..` segments are folded without touching
/// the filesystem, so the check runs before any operation and an escaping
/// path is refused even if it does not exist. The root must already be
/// absolute.
pub fn resolve_in_root(root: &Path, target: &str) -> Result<PathBuf, ToolError> {
    let normalized = normalize(&root.join(target));
    if !normalized.starts_with(root) {
        return Err(ToolError::PathEscape {
            path: target.to_string(),
        });
    }
    Ok(normalized)
}

/// Fold `.` and `..` components lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/work/project")
    }

    #[test]
    fn plain_relative_path_resolves_under_root() {
        let resolved = resolve_in_root(&root(), "src/lib.rs").expect("resolve");
        assert_eq!(resolved, PathBuf::from("/work/project/src/lib.rs"));
    }

    #[test]
    fn empty_target_resolves_to_root() {
        let resolved = resolve_in_root(&root(), "").expect("resolve");
        assert_eq!(resolved, root());
    }

    #[test]
    fn inner_dotdot_staying_inside_is_allowed() {
        let resolved = resolve_in_root(&root(), "src/../README.md").expect("resolve");
        assert_eq!(resolved, PathBuf::from("/work/project/README.md"));
    }

    /// Containment: every `..` form that resolves outside the root is
    /// refused before any filesystem access.
    #[test]
    fn escaping_paths_are_rejected() {
        for target in [
            "..",
            "../sibling.txt",
            "../../etc/passwd",
            "src/../../outside.txt",
            "a/../../../b",
        ] {
            let err = resolve_in_root(&root(), target).unwrap_err();
            assert!(
                matches!(err, ToolError::PathEscape { .. }),
                "expected PathEscape for {target}, got {err:?}"
            );
        }
    }

    #[test]
    fn absolute_target_outside_root_is_rejected() {
        let err = resolve_in_root(&root(), "/etc/passwd").unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { .. }));
    }

    /// A sibling directory sharing the root's name prefix does not pass the
    /// containment check.
    #[test]
    fn prefix_sibling_is_rejected() {
        let err = resolve_in_root(&root(), "../project-backup/file.txt").unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { .. }));
    }
}
