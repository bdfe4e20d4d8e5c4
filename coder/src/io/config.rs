//! Agent configuration stored under `.coder/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Agent configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable.
/// Missing fields default to sensible values; a missing file means all
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Upper bound on decide cycles before the run is forced to finish.
    pub max_cycles: u32,

    /// Maximum bytes for any single oracle prompt before truncation.
    pub prompt_budget_bytes: usize,

    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Command invoked for completions (prompt on stdin, text on stdout).
    pub command: Vec<String>,

    /// Maximum seconds to wait for one completion.
    pub timeout_secs: u64,

    /// Truncate oracle stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: vec!["claude".to_string(), "-p".to_string()],
            timeout_secs: 120,
            output_limit_bytes: 200_000,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_cycles: 20,
            prompt_budget_bytes: 40_000,
            oracle: OracleConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_cycles == 0 {
            return Err(anyhow!("max_cycles must be > 0"));
        }
        if self.prompt_budget_bytes == 0 {
            return Err(anyhow!("prompt_budget_bytes must be > 0"));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(anyhow!("oracle.timeout_secs must be > 0"));
        }
        if self.oracle.output_limit_bytes == 0 {
            return Err(anyhow!("oracle.output_limit_bytes must be > 0"));
        }
        if self.oracle.command.is_empty() || self.oracle.command[0].trim().is_empty() {
            return Err(anyhow!("oracle.command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Location of the config file under a working directory.
pub fn config_path(working_dir: &Path) -> PathBuf {
    working_dir.join(".coder").join("config.toml")
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if !path.exists() {
        let cfg = AgentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AgentConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AgentConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempWorkspace;

    #[test]
    fn load_missing_returns_default() {
        let ws = TempWorkspace::new().expect("workspace");
        let cfg = load_config(&config_path(ws.root())).expect("load");
        assert_eq!(cfg, AgentConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let ws = TempWorkspace::new().expect("workspace");
        let path = config_path(ws.root());
        let cfg = AgentConfig {
            max_cycles: 5,
            ..AgentConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write(".coder/config.toml", "max_cycles = 3\n")
            .expect("write");
        let cfg = load_config(&config_path(ws.root())).expect("load");
        assert_eq!(cfg.max_cycles, 3);
        assert_eq!(cfg.oracle, OracleConfig::default());
    }

    #[test]
    fn zero_cycles_is_rejected() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write(".coder/config.toml", "max_cycles = 0\n")
            .expect("write");
        let err = load_config(&config_path(ws.root())).unwrap_err();
        assert!(err.to_string().contains("max_cycles"));
    }

    #[test]
    fn empty_oracle_command_is_rejected() {
        let ws = TempWorkspace::new().expect("workspace");
        ws.write(".coder/config.toml", "[oracle]\ncommand = []\n")
            .expect("write");
        let err = load_config(&config_path(ws.root())).unwrap_err();
        assert!(err.to_string().contains("oracle.command"));
    }
}
