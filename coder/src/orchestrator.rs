//! Decision-execution loop for one request.
//!
//! Drives decide → execute → record cycles until the oracle selects finish
//! or the cycle bound forces it, including the edit sub-loop (read target →
//! plan edits → apply batch → resume). Tool failures never abort a run:
//! every failure becomes a recorded result that the next decision sees. The
//! only hard stop is reaching [`Phase::Done`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument, warn};

use crate::core::decision::parse_decision;
use crate::core::edit_plan::parse_edit_plan;
use crate::core::history::History;
use crate::core::types::{
    ActionOutcome, ActionRecord, Decision, EditOp, EditOpReport, OutcomeDetail, ToolAction,
};
use crate::io::config::AgentConfig;
use crate::io::file_ops::{delete_file, read_file, replace_lines};
use crate::io::listing::{ListLimits, list_dir};
use crate::io::oracle::Oracle;
use crate::io::prompt::PromptBuilder;
use crate::io::search::{SearchRequest, grep_search};
use crate::io::workspace::ToolError;

/// History entries rendered into the decide prompt.
const RECENT_HISTORY: usize = 3;
/// Character cap on each rendered result preview.
const RESULT_PREVIEW_CHARS: usize = 100;

/// Loop phases. `Done` is terminal; the run starts in `Deciding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Deciding,
    Executing,
    EditReading,
    EditPlanning,
    EditApplying,
    Responding,
    Done,
}

/// Why the run stopped deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The oracle selected finish (or its output degraded to it).
    Finished,
    /// The configured cycle bound was hit and finish was forced.
    CycleLimit,
}

/// Mutable state threaded through one run. Created per request, discarded
/// after the response is composed.
#[derive(Debug)]
struct RunState {
    request: String,
    working_dir: PathBuf,
    history: History,
    /// Scratch space for the edit sub-loop; empty outside it.
    pending_edits: Vec<EditOp>,
    response: String,
}

/// Final report of one completed run.
#[derive(Debug)]
pub struct RunReport {
    pub response: String,
    pub actions: Vec<ActionRecord>,
    pub stop: StopReason,
}

/// Execute one request to completion.
///
/// The working directory is canonicalized up front and bounds every file
/// operation of the run.
#[instrument(skip_all, fields(working_dir = %working_dir.display()))]
pub fn run_task<O: Oracle>(
    oracle: &O,
    request: &str,
    working_dir: &Path,
    config: &AgentConfig,
) -> Result<RunReport> {
    let working_dir = working_dir
        .canonicalize()
        .with_context(|| format!("resolve working directory {}", working_dir.display()))?;
    info!(request, "starting run");

    let mut state = RunState {
        request: request.to_string(),
        working_dir,
        history: History::new(),
        pending_edits: Vec::new(),
        response: String::new(),
    };
    let prompts = PromptBuilder::new(config.prompt_budget_bytes);
    let mut stop = StopReason::Finished;
    let mut cycles = 0u32;
    let mut phase = Phase::Deciding;

    while phase != Phase::Done {
        phase = match phase {
            Phase::Deciding => {
                cycles += 1;
                let decision = if cycles > config.max_cycles {
                    warn!(max_cycles = config.max_cycles, "cycle limit reached, forcing finish");
                    stop = StopReason::CycleLimit;
                    Decision::finish(format!("cycle limit of {} reached", config.max_cycles))
                } else {
                    decide(oracle, &state, &prompts)
                };
                debug!(tool = decision.action.name(), reason = %decision.reason, "decided next action");
                let next = next_phase(&decision.action);
                state
                    .history
                    .begin(decision)
                    .context("append decision to history")?;
                next
            }
            Phase::Executing => {
                execute(&mut state)?;
                Phase::Deciding
            }
            Phase::EditReading => edit_read(&mut state)?,
            Phase::EditPlanning => {
                edit_plan(oracle, &mut state, &prompts)?;
                Phase::EditApplying
            }
            Phase::EditApplying => {
                edit_apply(&mut state)?;
                Phase::Deciding
            }
            Phase::Responding => {
                respond(oracle, &mut state, &prompts)?;
                Phase::Done
            }
            Phase::Done => Phase::Done,
        };
    }

    info!(actions = state.history.records().len(), "run complete");
    Ok(RunReport {
        response: state.response,
        actions: state.history.records().to_vec(),
        stop,
    })
}

fn next_phase(action: &ToolAction) -> Phase {
    match action {
        ToolAction::Finish {} => Phase::Responding,
        ToolAction::EditFile { .. } => Phase::EditReading,
        _ => Phase::Executing,
    }
}

/// Ask the oracle for the next action. Transport failures degrade to a
/// finish decision so the run ends through the normal response path.
fn decide<O: Oracle>(oracle: &O, state: &RunState, prompts: &PromptBuilder) -> Decision {
    let history = state
        .history
        .recent_context(RECENT_HISTORY, RESULT_PREVIEW_CHARS);
    let prompt = prompts.build_decide(
        &state.request,
        &state.working_dir.display().to_string(),
        history.as_deref(),
    );
    match oracle.complete(&prompt) {
        Ok(raw) => parse_decision(&raw),
        Err(err) => {
            warn!(%err, "decision oracle call failed, finishing");
            Decision::finish(format!("decision oracle unavailable: {err:#}"))
        }
    }
}

/// Dispatch the pending action to its primitive and record the result.
fn execute(state: &mut RunState) -> Result<()> {
    let Some(record) = state.history.pending() else {
        bail!("executing with no pending action");
    };
    let action = record.action.clone();
    let root = &state.working_dir;

    let outcome = match &action {
        ToolAction::ReadFile { target_file } => match read_file(root, target_file) {
            Ok(content) => ActionOutcome::ok(OutcomeDetail::FileRead { content }),
            Err(err) => failed(&err),
        },
        ToolAction::DeleteFile { target_file } => match delete_file(root, target_file) {
            Ok(message) => ActionOutcome::ok(OutcomeDetail::Deleted { message }),
            Err(err) => failed(&err),
        },
        ToolAction::GrepSearch {
            query,
            case_sensitive,
            include_pattern,
            exclude_pattern,
        } => {
            let request = SearchRequest {
                query: query.clone(),
                case_sensitive: *case_sensitive,
                include_pattern: include_pattern.clone(),
                exclude_pattern: exclude_pattern.clone(),
            };
            match grep_search(root, &request) {
                Ok(matches) => ActionOutcome::ok(OutcomeDetail::Search {
                    query: query.clone(),
                    matches,
                }),
                Err(err) => failed(&err),
            }
        }
        ToolAction::ListDir {
            relative_workspace_path,
        } => match list_dir(root, relative_workspace_path, ListLimits::default()) {
            Ok(tree) => ActionOutcome::ok(OutcomeDetail::DirTree { tree }),
            Err(err) => failed(&err),
        },
        // Routed to the edit sub-loop / responder, never here.
        ToolAction::EditFile { .. } | ToolAction::Finish {} => {
            bail!("{} routed to the wrong executor", action.name())
        }
    };

    state
        .history
        .resolve(outcome)
        .context("record action result")
}

fn failed(err: &ToolError) -> ActionOutcome {
    ActionOutcome::failed(err.to_string())
}

/// First step of the edit sub-loop: read the target and stash its content
/// for the planner. An unreadable target resolves the action as failed and
/// returns to deciding — it is a reported failure, not a fatal one.
fn edit_read(state: &mut RunState) -> Result<Phase> {
    let target = pending_edit_target(state)?;
    match read_file(&state.working_dir, &target) {
        Ok(content) => {
            debug!(file = target, bytes = content.len(), "read edit target");
            state
                .history
                .stash_file_content(content)
                .context("stash file content")?;
            Ok(Phase::EditPlanning)
        }
        Err(err) => {
            warn!(file = target, %err, "edit target unreadable, skipping edit");
            state
                .history
                .resolve(failed(&err))
                .context("record failed edit read")?;
            Ok(Phase::Deciding)
        }
    }
}

/// Ask the planner for line edits against the stashed snapshot. The valid
/// set is sorted descending by start line before application; a failed call
/// or unusable plan degrades to zero edits.
fn edit_plan<O: Oracle>(oracle: &O, state: &mut RunState, prompts: &PromptBuilder) -> Result<()> {
    let Some(record) = state.history.pending() else {
        bail!("planning with no pending action");
    };
    let ToolAction::EditFile {
        instructions,
        code_edit,
        ..
    } = &record.action
    else {
        bail!("planning a non-edit action");
    };
    let content = record.file_content.clone().unwrap_or_default();
    let prompt = prompts.build_edit_plan(&content, instructions, code_edit);

    let ops = match oracle.complete(&prompt) {
        Ok(raw) => parse_edit_plan(&raw),
        Err(err) => {
            warn!(%err, "edit planner call failed, applying no edits");
            Vec::new()
        }
    };
    info!(ops = ops.len(), "edit plan ready");
    state.pending_edits = ops;
    Ok(())
}

/// Apply the pending batch in its already-sorted order. Each op succeeds or
/// fails on its own; one failure does not stop the rest. The summary reports
/// partial success explicitly.
fn edit_apply(state: &mut RunState) -> Result<()> {
    let target = pending_edit_target(state)?;
    let ops = std::mem::take(&mut state.pending_edits);

    let mut details = Vec::with_capacity(ops.len());
    let mut successful = 0usize;
    for op in &ops {
        match replace_lines(&state.working_dir, &target, op) {
            Ok(message) => {
                successful += 1;
                details.push(EditOpReport {
                    start_line: op.start_line,
                    end_line: op.end_line,
                    success: true,
                    message,
                });
            }
            Err(err) => {
                warn!(
                    file = target,
                    start_line = op.start_line,
                    end_line = op.end_line,
                    %err,
                    "edit op failed"
                );
                details.push(EditOpReport {
                    start_line: op.start_line,
                    end_line: op.end_line,
                    success: false,
                    message: err.to_string(),
                });
            }
        }
    }

    let total = details.len();
    info!(file = target, successful, total, "edit batch applied");
    let outcome = ActionOutcome {
        success: successful == total,
        detail: OutcomeDetail::EditBatch {
            total_edits: total,
            successful_edits: successful,
            details,
        },
    };
    state
        .history
        .resolve(outcome)
        .context("record edit batch result")
}

/// Compose the final response from the full history. A failed composer call
/// falls back to the locally rendered report — the run always ends with a
/// coherent response, even when every action failed.
fn respond<O: Oracle>(oracle: &O, state: &mut RunState, prompts: &PromptBuilder) -> Result<()> {
    state
        .history
        .resolve(ActionOutcome::ok(OutcomeDetail::Finished))
        .context("record finish decision")?;

    let report = state.history.render_report();
    let prompt = prompts.build_respond(&state.request, &report);
    state.response = match oracle.complete(&prompt) {
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            warn!(%err, "response oracle call failed, using rendered report");
            format!("The response oracle was unavailable ({err:#}). Actions taken:\n\n{report}")
        }
    };
    Ok(())
}

fn pending_edit_target(state: &RunState) -> Result<String> {
    match state.history.pending().map(|record| &record.action) {
        Some(ToolAction::EditFile { target_file, .. }) => Ok(target_file.clone()),
        _ => bail!("edit step with no pending edit action"),
    }
}
