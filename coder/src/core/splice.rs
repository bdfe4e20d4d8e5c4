//! Line-range replacement against an immutable file snapshot.
//!
//! This is the primitive underneath the edit batch: replace one inclusive,
//! 1-indexed line range with new content. Batches stay correct without any
//! line-number bookkeeping because ops are applied in descending `start_line`
//! order — every application only touches lines below anything already
//! rewritten, so prior applications never shift the lines a later op refers
//! to.

use thiserror::Error;

use crate::core::types::EditOp;

/// Line numbers outside the file, or an inverted range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("start_line {start} is out of range (1-{total})")]
    StartOutOfRange { start: usize, total: usize },
    #[error("end_line {end} is out of range (1-{total})")]
    EndOutOfRange { end: usize, total: usize },
    #[error("start_line {start} cannot be greater than end_line {end}")]
    Inverted { start: usize, end: usize },
}

/// Replace the line range of `op` in `content`, returning the new content.
///
/// The replacement is newline-normalized: a non-empty replacement without a
/// trailing newline gets one appended. An empty replacement deletes the
/// range. `start_line == end_line` with a replacement is a single-line
/// replace (which doubles as insertion when the replacement carries extra
/// lines).
pub fn splice_lines(content: &str, op: &EditOp) -> Result<String, RangeError> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let total = lines.len();

    if op.start_line < 1 || op.start_line > total {
        return Err(RangeError::StartOutOfRange {
            start: op.start_line,
            total,
        });
    }
    if op.end_line < 1 || op.end_line > total {
        return Err(RangeError::EndOutOfRange {
            end: op.end_line,
            total,
        });
    }
    if op.start_line > op.end_line {
        return Err(RangeError::Inverted {
            start: op.start_line,
            end: op.end_line,
        });
    }

    let mut out = String::with_capacity(content.len() + op.replacement.len());
    for line in &lines[..op.start_line - 1] {
        out.push_str(line);
    }
    if !op.replacement.is_empty() {
        out.push_str(&op.replacement);
        if !op.replacement.ends_with('\n') {
            out.push('\n');
        }
    }
    for line in &lines[op.end_line..] {
        out.push_str(line);
    }
    Ok(out)
}
