//! Test-only scripted oracle and workspace helpers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::io::oracle::Oracle;

/// Oracle returning a fixed sequence of canned completions.
///
/// Records every prompt it receives so tests can assert on prompt content.
/// Running out of responses is an error, surfacing scripts that drifted from
/// the flow under test.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    responses: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Oracle for ScriptedOracle {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted oracle ran out of responses"))
    }
}

/// Oracle whose every call fails, for degradation tests.
#[derive(Debug, Default)]
pub struct FailingOracle;

impl Oracle for FailingOracle {
    fn complete(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("oracle unavailable"))
    }
}

/// Temporary working directory for file-tool tests.
pub struct TempWorkspace {
    dir: tempfile::TempDir,
}

impl TempWorkspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file under the root, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        Ok(fs::read_to_string(self.dir.path().join(rel))?)
    }
}

/// A decision completion in the oracle's wire shape, wrapped in a fence.
pub fn decision_json(tool: &str, reason: &str, params: serde_json::Value) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!({ "tool": tool, "reason": reason, "params": params })
    )
}

/// An edit-plan completion in the planner's wire shape, wrapped in a fence.
pub fn edit_plan_json(edits: serde_json::Value) -> String {
    format!("```json\n{}\n```", serde_json::json!({ "edits": edits }))
}
