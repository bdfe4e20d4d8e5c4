//! Parsing and ordering of edit-planner output.
//!
//! The planner is asked for a fenced JSON block of
//! `{"edits": [{start_line, end_line, replacement}, ...]}`. Entries missing
//! any required field are dropped individually; an unusable document
//! degrades to the empty plan, which the orchestrator reports as a no-op
//! batch.

use serde_json::Value;
use tracing::warn;

use crate::core::decision::extract_json_block;
use crate::core::types::EditOp;

/// Parse raw planner output into edit operations, sorted for application.
pub fn parse_edit_plan(raw: &str) -> Vec<EditOp> {
    let Some(body) = extract_json_block(raw) else {
        warn!("no JSON object in edit plan output");
        return Vec::new();
    };
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "invalid JSON in edit plan output");
            return Vec::new();
        }
    };
    let Some(entries) = value.get("edits").and_then(Value::as_array) else {
        warn!("edit plan output has no edits array");
        return Vec::new();
    };

    let mut ops = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<EditOp>(entry.clone()) {
            Ok(op) => ops.push(op),
            Err(err) => warn!(%err, "dropping invalid edit entry"),
        }
    }
    sort_for_apply(&mut ops);
    ops
}

/// Order ops by `start_line` descending.
///
/// Applying in this order keeps every remaining op's stored line numbers
/// valid: each application only touches lines below anything applied before
/// it, so nothing it changes can shift a later op's range. Relative order of
/// equal `start_line`s is preserved (overlap within one batch is caller
/// error and left undefined).
pub fn sort_for_apply(ops: &mut [EditOp]) {
    ops.sort_by(|a, b| b.start_line.cmp(&a.start_line));
}
