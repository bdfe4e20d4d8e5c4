//! Directory-tree rendering for the list_dir tool.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::io::workspace::{ToolError, resolve_in_root};

/// Rendering limits for one listing.
#[derive(Debug, Clone, Copy)]
pub struct ListLimits {
    /// Maximum depth below the listed directory.
    pub max_depth: usize,
    /// Maximum total entries rendered.
    pub max_items: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_items: 50,
        }
    }
}

/// Entries rendered per directory before eliding the rest.
const DIR_ENTRY_CAP: usize = 20;

/// Names never rendered (hidden entries are skipped separately).
const SKIP_NAMES: &[&str] = &["node_modules", "target", "__pycache__", "venv", "env"];

/// Render a tree listing of a directory inside the working root.
///
/// Directories sort before files, each group alphabetically. Large
/// directories and deep trees are elided with explicit notices so the
/// rendering stays bounded.
pub fn list_dir(root: &Path, target: &str, limits: ListLimits) -> Result<String, ToolError> {
    let path = if matches!(target, "" | "." | "/") {
        root.to_path_buf()
    } else {
        resolve_in_root(root, target)?
    };
    if !path.exists() {
        return Err(ToolError::NotFound {
            path: target.to_string(),
        });
    }
    if !path.is_dir() {
        return Err(ToolError::NotADirectory {
            path: target.to_string(),
        });
    }

    let display = match target {
        "" | "/" => ".",
        other => other.trim_end_matches('/'),
    };
    let mut lines = vec![format!("{display}/")];
    let mut budget = limits.max_items;
    render(&path, "", 0, &limits, &mut budget, &mut lines);
    if budget == 0 {
        lines.push(format!("\n... (showing first {} items)", limits.max_items));
    }
    debug!(path = target, lines = lines.len(), "rendered directory tree");
    Ok(lines.join("\n"))
}

fn render(
    dir: &Path,
    prefix: &str,
    depth: usize,
    limits: &ListLimits,
    budget: &mut usize,
    lines: &mut Vec<String>,
) {
    if depth > limits.max_depth || *budget == 0 {
        return;
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            lines.push(format!("{prefix}[permission denied]"));
            return;
        }
    };

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || SKIP_NAMES.contains(&name.as_str()) {
            continue;
        }
        if entry.path().is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();

    let mut names: Vec<(String, bool)> = dirs
        .into_iter()
        .map(|name| (name, true))
        .chain(files.into_iter().map(|name| (name, false)))
        .collect();
    let elided = names.len().saturating_sub(DIR_ENTRY_CAP);
    if elided > 0 {
        names.truncate(DIR_ENTRY_CAP);
    }

    let last_index = names.len().saturating_sub(1);
    for (i, (name, is_dir)) in names.iter().enumerate() {
        if *budget == 0 {
            return;
        }
        let is_last = i == last_index && elided == 0;
        let (branch, child_prefix) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let path = dir.join(name);
        if *is_dir {
            lines.push(format!("{prefix}{branch}{name}/"));
            *budget -= 1;
            if depth < limits.max_depth && *budget > 0 {
                render(
                    &path,
                    &format!("{prefix}{child_prefix}"),
                    depth + 1,
                    limits,
                    budget,
                    lines,
                );
            }
        } else {
            match fs::metadata(&path) {
                Ok(meta) => lines.push(format!(
                    "{prefix}{branch}{name} ({})",
                    format_size(meta.len())
                )),
                Err(_) => lines.push(format!("{prefix}{branch}{name}")),
            }
            *budget -= 1;
        }
    }
    if elided > 0 {
        lines.push(format!("{prefix}... ({elided} more items)"));
    }
}

/// Human-readable size: one decimal, `.0` stripped.
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{rounded:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempWorkspace;

    #[test]
    fn renders_directories_before_files() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("zeta.txt", "z\n").expect("write");
        ws.write("alpha/inner.txt", "i\n").expect("write");

        let tree = list_dir(ws.root(), ".", ListLimits::default()).expect("list");
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines[0], "./");
        assert_eq!(lines[1], "├── alpha/");
        assert!(lines[2].contains("inner.txt"));
        assert!(lines[3].starts_with("└── zeta.txt"));
    }

    #[test]
    fn shows_file_sizes() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("two.txt", "ab\n").expect("write");
        let tree = list_dir(ws.root(), ".", ListLimits::default()).expect("list");
        assert!(tree.contains("two.txt (3 B)"));
    }

    #[test]
    fn missing_directory_is_reported() {
        let ws = TempWorkspace::new().expect("workspace");
        let err = list_dir(ws.root(), "nope", ListLimits::default()).unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[test]
    fn file_target_is_not_a_directory() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("plain.txt", "x\n").expect("write");
        let err = list_dir(ws.root(), "plain.txt", ListLimits::default()).unwrap_err();
        assert!(matches!(err, ToolError::NotADirectory { .. }));
    }

    #[test]
    fn escaping_target_is_rejected() {
        let ws = TempWorkspace::new().expect("workspace");
        let err = list_dir(ws.root(), "../elsewhere", ListLimits::default()).unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { .. }));
    }

    #[test]
    fn crowded_directory_is_elided() {
        let ws = TempWorkspace::new().expect("workspace");
        for i in 0..25 {
            ws.write(&format!("file{i:02}.txt"), "x\n").expect("write");
        }
        let tree = list_dir(
            ws.root(),
            ".",
            ListLimits {
                max_depth: 3,
                max_items: 100,
            },
        )
        .expect("list");
        assert!(tree.contains("... (5 more items)"));
        assert!(!tree.contains("file24.txt"));
    }

    #[test]
    fn global_cap_truncates_with_notice() {
        let ws = TempWorkspace::new().expect("workspace");
        for dir in 0..5 {
            for i in 0..5 {
                ws.write(&format!("d{dir}/f{i}.txt"), "x\n").expect("write");
            }
        }
        let tree = list_dir(
            ws.root(),
            ".",
            ListLimits {
                max_depth: 3,
                max_items: 10,
            },
        )
        .expect("list");
        assert!(tree.contains("... (showing first 10 items)"));
    }

    #[test]
    fn depth_limit_stops_recursion() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write("a/b/c/d/deep.txt", "x\n").expect("write");
        let tree = list_dir(
            ws.root(),
            ".",
            ListLimits {
                max_depth: 2,
                max_items: 50,
            },
        )
        .expect("list");
        assert!(tree.contains("c/"));
        assert!(!tree.contains("deep.txt"));
    }

    #[test]
    fn sizes_format_human_readable() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1 MB");
    }
}
