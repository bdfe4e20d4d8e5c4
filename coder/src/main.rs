//! CLI host for the coding agent.
//!
//! One-shot mode runs a single request to completion and prints the response
//! plus an action summary. Without a query the CLI enters interactive mode,
//! running one independent agent loop per entered request. The host also
//! owns the loop bound: `max_cycles` from config caps decide cycles so an
//! oracle that never selects finish cannot loop forever.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use coder::io::config::{AgentConfig, config_path, load_config};
use coder::io::oracle::CommandOracle;
use coder::orchestrator::{RunReport, StopReason, run_task};
use coder::{exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "coder",
    version,
    about = "LLM coding agent for workspace file operations"
)]
struct Cli {
    /// Request to execute. Starts interactive mode when omitted.
    #[arg(short, long)]
    query: Option<String>,

    /// Working directory for file operations. Defaults to the current
    /// directory.
    #[arg(short, long)]
    working_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(exit_codes::INVALID);
    }
}

fn run(cli: Cli) -> Result<()> {
    let working_dir = match cli.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let config = load_config(&config_path(&working_dir))?;
    let oracle = CommandOracle::new(
        config.oracle.command.clone(),
        Duration::from_secs(config.oracle.timeout_secs),
        config.oracle.output_limit_bytes,
    )?;

    match cli.query {
        Some(query) => {
            let report = run_task(&oracle, &query, &working_dir, &config)?;
            print_report(&report);
            Ok(())
        }
        None => interactive(&oracle, &working_dir, &config),
    }
}

fn interactive(oracle: &CommandOracle, working_dir: &Path, config: &AgentConfig) -> Result<()> {
    println!("coder interactive mode — enter requests, 'quit' to exit");
    println!("working directory: {}", working_dir.display());

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().context("flush prompt")?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("read request")? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "quit" | "exit" | "q") {
            break;
        }
        match run_task(oracle, query, working_dir, config) {
            Ok(report) => print_report(&report),
            Err(err) => eprintln!("{err:#}"),
        }
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("{}", report.response);
    if report.actions.is_empty() {
        return;
    }
    println!();
    println!("actions performed: {}", report.actions.len());
    for (i, record) in report.actions.iter().enumerate() {
        let ok = record.result.as_ref().is_some_and(|result| result.success);
        let mark = if ok { "✓" } else { "✗" };
        println!("  {}. {} {}: {}", i + 1, mark, record.action.name(), record.reason);
    }
    if report.stop == StopReason::CycleLimit {
        println!("  (stopped at the cycle limit)");
    }
}
