//! File primitives: read, line-range replace, delete.
//!
//! Each primitive resolves its target inside the working root, checks its
//! preconditions, and returns every failure as a [`ToolError`] value for the
//! orchestrator to record.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::core::splice::splice_lines;
use crate::core::types::EditOp;
use crate::io::workspace::{ToolError, resolve_in_root};

/// Read a file inside the working root as UTF-8.
pub fn read_file(root: &Path, target: &str) -> Result<String, ToolError> {
    let path = resolve_in_root(root, target)?;
    ensure_is_file(&path, target)?;
    let content = fs::read_to_string(&path).map_err(|err| ToolError::from_io(target, err))?;
    debug!(file = target, bytes = content.len(), "read file");
    Ok(content)
}

/// Replace one inclusive line range in a file inside the working root.
///
/// Reads the current content, validates the range against it, splices the
/// replacement, and writes the whole file back. Range validation happens
/// here, against the file as it is at application time.
pub fn replace_lines(root: &Path, target: &str, op: &EditOp) -> Result<String, ToolError> {
    let path = resolve_in_root(root, target)?;
    ensure_is_file(&path, target)?;
    let content = fs::read_to_string(&path).map_err(|err| ToolError::from_io(target, err))?;
    let updated = splice_lines(&content, op)?;
    fs::write(&path, updated).map_err(|err| ToolError::from_io(target, err))?;
    info!(
        file = target,
        start_line = op.start_line,
        end_line = op.end_line,
        "replaced lines"
    );
    Ok(format!(
        "replaced lines {}-{} in {}",
        op.start_line, op.end_line, target
    ))
}

/// Delete a file inside the working root. Directories are refused.
pub fn delete_file(root: &Path, target: &str) -> Result<String, ToolError> {
    let path = resolve_in_root(root, target)?;
    ensure_is_file(&path, target)?;
    fs::remove_file(&path).map_err(|err| ToolError::from_io(target, err))?;
    info!(file = target, "deleted file");
    Ok(format!("deleted {target}"))
}

fn ensure_is_file(path: &Path, target: &str) -> Result<(), ToolError> {
    if !path.exists() {
        return Err(ToolError::NotFound {
            path: target.to_string(),
        });
    }
    if !path.is_file() {
        return Err(ToolError::NotAFile {
            path: target.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::splice::RangeError;
    use crate::test_support::TempWorkspace;

    fn op(start: usize, end: usize, replacement: &str) -> EditOp {
        EditOp {
            start_line: start,
            end_line: end,
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn read_returns_content() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("notes.txt", "hello\n").expect("write");
        let content = read_file(ws.root(), "notes.txt").expect("read");
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn read_missing_file_reports_not_found() {
        let ws = TempWorkspace::new().expect("workspace");
        let err = read_file(ws.root(), "absent.txt").unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[test]
    fn read_directory_reports_not_a_file() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("dir/inner.txt", "x\n").expect("write");
        let err = read_file(ws.root(), "dir").unwrap_err();
        assert!(matches!(err, ToolError::NotAFile { .. }));
    }

    /// Containment holds for every primitive: nothing outside the root is
    /// touched, even for paths that do not exist.
    #[test]
    fn primitives_refuse_escaping_paths() {
        let ws = TempWorkspace::new().expect("workspace");
        let target = "../outside.txt";
        assert!(matches!(
            read_file(ws.root(), target).unwrap_err(),
            ToolError::PathEscape { .. }
        ));
        assert!(matches!(
            replace_lines(ws.root(), target, &op(1, 1, "x")).unwrap_err(),
            ToolError::PathEscape { .. }
        ));
        assert!(matches!(
            delete_file(ws.root(), target).unwrap_err(),
            ToolError::PathEscape { .. }
        ));
    }

    #[test]
    fn replace_rewrites_range_and_reports() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("a.txt", "one\ntwo\nthree\n").expect("write");
        let message = replace_lines(ws.root(), "a.txt", &op(2, 2, "TWO")).expect("replace");
        assert_eq!(message, "replaced lines 2-2 in a.txt");
        assert_eq!(ws.read("a.txt").expect("read back"), "one\nTWO\nthree\n");
    }

    #[test]
    fn replace_out_of_range_leaves_file_untouched() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("a.txt", "one\ntwo\n").expect("write");
        let err = replace_lines(ws.root(), "a.txt", &op(1, 9, "x")).unwrap_err();
        assert!(matches!(
            err,
            ToolError::Range(RangeError::EndOutOfRange { end: 9, total: 2 })
        ));
        assert_eq!(ws.read("a.txt").expect("read back"), "one\ntwo\n");
    }

    #[test]
    fn delete_removes_file() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("old.txt", "bye\n").expect("write");
        let message = delete_file(ws.root(), "old.txt").expect("delete");
        assert_eq!(message, "deleted old.txt");
        assert!(!ws.root().join("old.txt").exists());
    }

    #[test]
    fn delete_refuses_directories() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("dir/inner.txt", "x\n").expect("write");
        let err = delete_file(ws.root(), "dir").unwrap_err();
        assert!(matches!(err, ToolError::NotAFile { .. }));
        assert!(ws.root().join("dir/inner.txt").exists());
    }
}
