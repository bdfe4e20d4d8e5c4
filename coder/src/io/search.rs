//! Recursive pattern search over the working root.
//!
//! A bounded grep: regex matching over text files under the root, with
//! include/exclude globs. Truncation keeps first-encountered walk order; the
//! walk itself is sorted by file name so results are deterministic.

use std::fs;
use std::path::Path;

use regex::RegexBuilder;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::core::types::SearchMatch;
use crate::io::workspace::ToolError;

/// Result cap. Matches beyond this are discarded in walk order.
const MAX_MATCHES: usize = 50;
/// Scan cap. Files beyond this are not opened.
const MAX_FILES: usize = 100;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &["node_modules", "target", "__pycache__", "venv", "env"];

/// Extensions searched when no include pattern narrows the file set.
/// Files without an extension are searched too.
const TEXT_EXTENSIONS: &[&str] = &[
    "bat", "cfg", "css", "html", "ini", "js", "json", "log", "md", "py", "rs", "sh", "sql", "toml",
    "ts", "txt", "xml", "yaml", "yml",
];

/// Parameters of one search invocation.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub case_sensitive: bool,
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
}

/// Search files under `root` for the request's regex.
pub fn grep_search(root: &Path, request: &SearchRequest) -> Result<Vec<SearchMatch>, ToolError> {
    if !root.is_dir() {
        return Err(ToolError::NotADirectory {
            path: root.display().to_string(),
        });
    }
    let pattern = RegexBuilder::new(&request.query)
        .case_insensitive(!request.case_sensitive)
        .build()
        .map_err(|err| ToolError::InvalidPattern {
            pattern: request.query.clone(),
            message: err.to_string(),
        })?;
    let include = compile_glob(request.include_pattern.as_deref())?;
    let exclude = compile_glob(request.exclude_pattern.as_deref())?;

    let mut matches = Vec::new();
    let mut scanned = 0usize;
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || keep_entry(entry));
    for entry in walker {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let rel_str = rel.to_string_lossy().into_owned();
        let name = entry.file_name().to_string_lossy().into_owned();

        match &include {
            Some(glob) => {
                if !glob_matches(glob, &rel_str, &name) {
                    continue;
                }
            }
            None => {
                if !has_text_extension(entry.path()) {
                    continue;
                }
            }
        }
        if let Some(glob) = &exclude
            && glob_matches(glob, &rel_str, &name)
        {
            continue;
        }

        if scanned >= MAX_FILES {
            debug!(scanned, "file scan cap reached");
            break;
        }
        scanned += 1;

        // Unreadable and non-UTF-8 files are skipped, not failed.
        let Ok(content) = fs::read_to_string(entry.path()) else {
            continue;
        };
        for (idx, line) in content.lines().enumerate() {
            for found in pattern.find_iter(line) {
                matches.push(SearchMatch {
                    file: rel_str.clone(),
                    line: idx + 1,
                    text: line.to_string(),
                    matched: found.as_str().to_string(),
                    span: (found.start(), found.end()),
                });
                if matches.len() >= MAX_MATCHES {
                    debug!(matches = matches.len(), "match cap reached");
                    return Ok(matches);
                }
            }
        }
    }
    debug!(matches = matches.len(), scanned, "search complete");
    Ok(matches)
}

fn keep_entry(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return false;
    }
    !(entry.file_type().is_dir() && SKIP_DIRS.contains(&name.as_ref()))
}

fn has_text_extension(path: &Path) -> bool {
    match path.extension() {
        None => true,
        Some(ext) => TEXT_EXTENSIONS.contains(&ext.to_string_lossy().to_lowercase().as_str()),
    }
}

fn compile_glob(pattern: Option<&str>) -> Result<Option<glob::Pattern>, ToolError> {
    match pattern {
        None => Ok(None),
        Some(raw) => glob::Pattern::new(raw).map(Some).map_err(|err| {
            ToolError::InvalidPattern {
                pattern: raw.to_string(),
                message: err.to_string(),
            }
        }),
    }
}

/// Patterns containing a separator match the root-relative path; bare
/// patterns like `*.rs` match the file name at any depth.
fn glob_matches(glob: &glob::Pattern, rel_path: &str, file_name: &str) -> bool {
    if glob.as_str().contains('/') {
        glob.matches(rel_path)
    } else {
        glob.matches(file_name)
    }
}
