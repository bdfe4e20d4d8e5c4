//! Shared contracts for a single agent run.
//!
//! These types define the stable data model threaded through the decision
//! loop. They should not depend on external state or I/O and must remain
//! deterministic across runs.

use serde::{Deserialize, Serialize};

fn default_list_path() -> String {
    ".".to_string()
}

/// One tool invocation chosen by the decision step, carrying only the fields
/// that tool actually needs.
///
/// Serialized as `{"tool": <name>, "params": {...}}`, matching the wire shape
/// the decision oracle is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "params", rename_all = "snake_case")]
pub enum ToolAction {
    ReadFile {
        target_file: String,
    },
    EditFile {
        target_file: String,
        #[serde(default)]
        instructions: String,
        #[serde(default)]
        code_edit: String,
    },
    DeleteFile {
        target_file: String,
    },
    GrepSearch {
        query: String,
        #[serde(default)]
        case_sensitive: bool,
        #[serde(default)]
        include_pattern: Option<String>,
        #[serde(default)]
        exclude_pattern: Option<String>,
    },
    ListDir {
        #[serde(default = "default_list_path")]
        relative_workspace_path: String,
    },
    Finish {},
}

impl ToolAction {
    /// Wire name of the tool, as used in prompts and reports.
    pub fn name(&self) -> &'static str {
        match self {
            ToolAction::ReadFile { .. } => "read_file",
            ToolAction::EditFile { .. } => "edit_file",
            ToolAction::DeleteFile { .. } => "delete_file",
            ToolAction::GrepSearch { .. } => "grep_search",
            ToolAction::ListDir { .. } => "list_dir",
            ToolAction::Finish {} => "finish",
        }
    }
}

/// Parsed output of one decision step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: ToolAction,
    pub reason: String,
}

impl Decision {
    /// The substitute decision used whenever oracle output cannot be used.
    pub fn finish(reason: impl Into<String>) -> Self {
        Self {
            action: ToolAction::Finish {},
            reason: reason.into(),
        }
    }
}

/// One line-range replacement against an immutable snapshot of a file.
///
/// Lines are 1-indexed and the range is inclusive. Ranges refer to the file
/// content the plan was computed from, never to intermediate states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOp {
    pub start_line: usize,
    pub end_line: usize,
    pub replacement: String,
}

/// Per-op outcome inside an edit batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOpReport {
    pub start_line: usize,
    pub end_line: usize,
    pub success: bool,
    pub message: String,
}

/// One match produced by the search tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    /// Path relative to the working root.
    pub file: String,
    /// 1-indexed line number.
    pub line: usize,
    /// Full line content without its trailing newline.
    pub text: String,
    /// The matched text itself.
    pub matched: String,
    /// Byte offsets of the match within `text`.
    pub span: (usize, usize),
}

/// Result of one completed action: a success flag plus the tool's payload,
/// or a failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(flatten)]
    pub detail: OutcomeDetail,
}

impl ActionOutcome {
    pub fn ok(detail: OutcomeDetail) -> Self {
        Self {
            success: true,
            detail,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: OutcomeDetail::Failed {
                message: message.into(),
            },
        }
    }
}

/// Typed payload of a resolved action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeDetail {
    FileRead {
        content: String,
    },
    Search {
        query: String,
        matches: Vec<SearchMatch>,
    },
    DirTree {
        tree: String,
    },
    Deleted {
        message: String,
    },
    EditBatch {
        total_edits: usize,
        successful_edits: usize,
        details: Vec<EditOpReport>,
    },
    Finished,
    Failed {
        message: String,
    },
}

/// One entry in the append-only history of a run.
///
/// `result` is `None` only while the action is in flight; the history type
/// guarantees at most one such record exists and that it is the newest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub action: ToolAction,
    pub reason: String,
    pub result: Option<ActionOutcome>,
    /// Target file content stashed by the edit read step, consumed by the
    /// edit planner. `None` for every other tool.
    pub file_content: Option<String>,
}
