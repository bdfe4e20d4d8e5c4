//! Append-only action history with a single-unresolved-record discipline.
//!
//! Every decision appends one record with no result; the result must be
//! attached before the next decision is appended. The type enforces this
//! rather than relying on caller convention.

use thiserror::Error;

use crate::core::types::{ActionOutcome, ActionRecord, Decision, OutcomeDetail};

/// Violations of the history discipline. These indicate orchestrator bugs,
/// not tool failures, and are surfaced as run errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("previous action is still awaiting its result")]
    UnresolvedPending,
    #[error("no action is awaiting a result")]
    NothingPending,
}

/// Ordered record of every action taken during one run.
#[derive(Debug, Default)]
pub struct History {
    records: Vec<ActionRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decision as a new record with no result yet.
    ///
    /// Fails if the previously appended record has not been resolved.
    pub fn begin(&mut self, decision: Decision) -> Result<(), HistoryError> {
        if self.pending().is_some() {
            return Err(HistoryError::UnresolvedPending);
        }
        self.records.push(ActionRecord {
            action: decision.action,
            reason: decision.reason,
            result: None,
            file_content: None,
        });
        Ok(())
    }

    /// Attach the result to the record appended by the last [`History::begin`].
    pub fn resolve(&mut self, outcome: ActionOutcome) -> Result<(), HistoryError> {
        let record = self.pending_mut().ok_or(HistoryError::NothingPending)?;
        record.result = Some(outcome);
        Ok(())
    }

    /// Stash target file content on the pending record for the edit planner.
    pub fn stash_file_content(&mut self, content: String) -> Result<(), HistoryError> {
        let record = self.pending_mut().ok_or(HistoryError::NothingPending)?;
        record.file_content = Some(content);
        Ok(())
    }

    /// The record still awaiting its result, if any. Always the newest one.
    pub fn pending(&self) -> Option<&ActionRecord> {
        self.records.last().filter(|record| record.result.is_none())
    }

    fn pending_mut(&mut self) -> Option<&mut ActionRecord> {
        self.records
            .last_mut()
            .filter(|record| record.result.is_none())
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bounded rendering of the newest entries for the decide prompt.
    ///
    /// At most `max_entries` entries, each with its result preview capped at
    /// `preview_chars` characters, so oracle input stays stable regardless of
    /// run length. Returns `None` for an empty history.
    pub fn recent_context(&self, max_entries: usize, preview_chars: usize) -> Option<String> {
        if self.records.is_empty() {
            return None;
        }
        let skip = self.records.len().saturating_sub(max_entries);
        let mut out = String::new();
        for (i, record) in self.records.iter().skip(skip).enumerate() {
            out.push_str(&format!(
                "{}. {}: {}\n",
                i + 1,
                record.action.name(),
                record.reason
            ));
            if let Some(result) = &record.result {
                let rendered =
                    serde_json::to_string(result).unwrap_or_else(|_| "<unrenderable>".to_string());
                out.push_str(&format!("   result: {}\n", preview(&rendered, preview_chars)));
            }
        }
        Some(out)
    }

    /// Full per-action report for the response composer and for fallback
    /// output when the composer is unavailable.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        for (i, record) in self.records.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} - {}\n",
                i + 1,
                record.action.name(),
                record.reason
            ));
            if let Some(result) = &record.result {
                out.push_str(&format!("   {}\n", describe_outcome(result)));
            }
        }
        out
    }
}

fn describe_outcome(outcome: &ActionOutcome) -> String {
    let mark = if outcome.success { "✓" } else { "✗" };
    match &outcome.detail {
        OutcomeDetail::FileRead { content } => format!(
            "{mark} read {} characters. Preview: {}",
            content.chars().count(),
            preview(content, 200)
        ),
        OutcomeDetail::Search { query, matches } => {
            let mut line = format!("{mark} found {} matches for '{query}'", matches.len());
            for m in matches.iter().take(3) {
                line.push_str(&format!(
                    "\n     - {}:{} {}",
                    m.file,
                    m.line,
                    preview(&m.text, 50)
                ));
            }
            line
        }
        OutcomeDetail::DirTree { .. } => format!("{mark} listed directory contents"),
        OutcomeDetail::Deleted { message } => format!("{mark} {message}"),
        OutcomeDetail::EditBatch {
            total_edits,
            successful_edits,
            details,
        } => {
            let mut line = format!("{mark} applied {successful_edits}/{total_edits} edits");
            for d in details.iter().filter(|d| !d.success) {
                line.push_str(&format!(
                    "\n     - lines {}-{}: {}",
                    d.start_line, d.end_line, d.message
                ));
            }
            line
        }
        OutcomeDetail::Finished => format!("{mark} finished"),
        OutcomeDetail::Failed { message } => format!("{mark} {message}"),
    }
}

/// Truncate to at most `max_chars` characters, marking elision.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ToolAction;

    fn read_decision(target: &str) -> Decision {
        Decision {
            action: ToolAction::ReadFile {
                target_file: target.to_string(),
            },
            reason: format!("inspect {target}"),
        }
    }

    /// The core invariant: a second `begin` without a `resolve` is rejected,
    /// so at most one record is ever unresolved and it is the newest.
    #[test]
    fn begin_twice_without_resolve_is_rejected() {
        let mut history = History::new();
        history.begin(read_decision("a.txt")).expect("first begin");
        let err = history.begin(read_decision("b.txt")).unwrap_err();
        assert_eq!(err, HistoryError::UnresolvedPending);

        history
            .resolve(ActionOutcome::ok(OutcomeDetail::FileRead {
                content: "x".to_string(),
            }))
            .expect("resolve");
        history.begin(read_decision("b.txt")).expect("second begin");
        assert_eq!(history.records().len(), 2);
        assert!(history.records()[0].result.is_some());
        assert!(history.records()[1].result.is_none());
    }

    #[test]
    fn resolve_without_begin_is_rejected() {
        let mut history = History::new();
        let err = history
            .resolve(ActionOutcome::failed("nothing to resolve"))
            .unwrap_err();
        assert_eq!(err, HistoryError::NothingPending);
    }

    #[test]
    fn resolve_twice_is_rejected() {
        let mut history = History::new();
        history.begin(read_decision("a.txt")).expect("begin");
        history
            .resolve(ActionOutcome::failed("first"))
            .expect("resolve");
        let err = history
            .resolve(ActionOutcome::failed("second"))
            .unwrap_err();
        assert_eq!(err, HistoryError::NothingPending);
    }

    /// Context rendering is bounded: only the newest entries appear and each
    /// result preview is capped.
    #[test]
    fn recent_context_is_bounded() {
        let mut history = History::new();
        for i in 0..5 {
            history
                .begin(read_decision(&format!("file{i}.txt")))
                .expect("begin");
            history
                .resolve(ActionOutcome::ok(OutcomeDetail::FileRead {
                    content: "long ".repeat(100),
                }))
                .expect("resolve");
        }

        let context = history.recent_context(3, 100).expect("context");
        assert!(!context.contains("file0.txt"));
        assert!(!context.contains("file1.txt"));
        assert!(context.contains("file2.txt"));
        assert!(context.contains("file4.txt"));
        for line in context.lines().filter(|l| l.contains("result:")) {
            assert!(line.chars().count() <= 100 + "   result: ...".len());
        }
    }

    #[test]
    fn recent_context_of_empty_history_is_none() {
        assert!(History::new().recent_context(3, 100).is_none());
    }

    /// The report stays coherent when every action failed.
    #[test]
    fn report_renders_all_failures() {
        let mut history = History::new();
        for target in ["a.txt", "b.txt"] {
            history.begin(read_decision(target)).expect("begin");
            history
                .resolve(ActionOutcome::failed(format!(
                    "file {target} does not exist"
                )))
                .expect("resolve");
        }

        let report = history.render_report();
        assert!(report.contains("1. read_file - inspect a.txt"));
        assert!(report.contains("✗ file a.txt does not exist"));
        assert!(report.contains("2. read_file - inspect b.txt"));
        assert!(report.contains("✗ file b.txt does not exist"));
    }

    #[test]
    fn report_shows_edit_ratio_and_failed_ops() {
        let mut history = History::new();
        history
            .begin(Decision {
                action: ToolAction::EditFile {
                    target_file: "a.txt".to_string(),
                    instructions: "fix".to_string(),
                    code_edit: String::new(),
                },
                reason: "apply fix".to_string(),
            })
            .expect("begin");
        history
            .resolve(ActionOutcome {
                success: false,
                detail: OutcomeDetail::EditBatch {
                    total_edits: 3,
                    successful_edits: 2,
                    details: vec![crate::core::types::EditOpReport {
                        start_line: 10,
                        end_line: 12,
                        success: false,
                        message: "end_line 12 is out of range (1-4)".to_string(),
                    }],
                },
            })
            .expect("resolve");

        let report = history.render_report();
        assert!(report.contains("✗ applied 2/3 edits"));
        assert!(report.contains("lines 10-12: end_line 12 is out of range (1-4)"));
    }
}
