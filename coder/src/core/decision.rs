//! Parsing of decision-oracle output into a typed [`Decision`].
//!
//! The oracle is asked for a fenced JSON block naming one tool from the
//! closed set. Output is validated against an embedded JSON Schema before
//! deserialization; anything unusable at any stage degrades to a `finish`
//! decision carrying a diagnostic reason, never an error.

use std::sync::LazyLock;

use jsonschema::{Draft, Validator};
use serde_json::Value;
use tracing::warn;

use crate::core::types::{Decision, ToolAction};

const DECISION_SCHEMA: &str = include_str!("../../schemas/decision.schema.json");

static DECISION_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(DECISION_SCHEMA).expect("decision schema should be valid json");
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .expect("decision schema should compile")
});

/// Parse raw oracle text into a decision.
///
/// Never fails: unusable output substitutes `finish` with a diagnostic
/// reason so the run terminates through the normal response path.
pub fn parse_decision(raw: &str) -> Decision {
    match try_parse(raw) {
        Ok(decision) => decision,
        Err(message) => {
            warn!(%message, "unusable decision output, substituting finish");
            Decision::finish(format!("unable to parse tool selection: {message}"))
        }
    }
}

fn try_parse(raw: &str) -> Result<Decision, String> {
    let body = extract_json_block(raw).ok_or_else(|| "no JSON object in output".to_string())?;
    let value: Value = serde_json::from_str(body).map_err(|err| format!("invalid JSON: {err}"))?;

    let errors: Vec<String> = DECISION_VALIDATOR
        .iter_errors(&value)
        .map(|err| err.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }

    let Some(fields) = value.as_object() else {
        return Err("decision is not a JSON object".to_string());
    };
    let reason = fields
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Re-shape to exactly {tool, params} so stray top-level keys cannot
    // break the tagged-union deserialization.
    let mut wire = serde_json::Map::new();
    wire.insert("tool".to_string(), fields["tool"].clone());
    if let Some(params) = fields.get("params") {
        wire.insert("params".to_string(), params.clone());
    }
    let action: ToolAction = serde_json::from_value(Value::Object(wire))
        .map_err(|err| format!("invalid params: {err}"))?;

    Ok(Decision { action, reason })
}

/// Extract the first fenced ```json block, or fall back to the outermost
/// `{...}` span.
pub(crate) fn extract_json_block(raw: &str) -> Option<&str> {
    if let Some(start) = raw.find("```json") {
        let rest = &raw[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| raw[start..=end].trim())
}
