//! External statistics tool boundary
//!
//! Model statistics come from `connectome-stats` (connectome-tools). The tool
//! is run once per validation, blocks until it exits, and its `--short` table
//! output is parsed into a [`StatSet`].

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::{parse_stat_table, KeyLayout, StatSet, StatsError};

pub const DEFAULT_PROGRAM: &str = "connectome-stats";

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("'{program}' not found. It is part of connectome-tools; please load the connectome-tools module")]
    NotFound { program: String },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("'{program}' produced non UTF-8 output")]
    NonUtf8Output { program: String },

    #[error("Cannot parse '{program}' output: {source}")]
    Parse {
        program: String,
        #[source]
        source: StatsError,
    },
}

/// Which executable to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsToolConfig {
    /// Executable name looked up on `PATH`, or a path to it
    pub program: String,
}

impl Default for StatsToolConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

/// One statistics computation.
#[derive(Debug, Clone)]
pub struct StatsInvocation<'a> {
    /// e.g. `bouton-density`, `nsyn-per-connection`
    pub subcommand: &'a str,
    pub extra_args: &'a [String],
    pub target_args: Vec<String>,
    pub circuit_config: &'a Path,
}

impl StatsInvocation<'_> {
    /// Arguments after the program name
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.subcommand.to_string(), "--short".to_string()];
        args.extend(self.extra_args.iter().cloned());
        args.extend(self.target_args.iter().cloned());
        args.push(self.circuit_config.display().to_string());
        args
    }
}

/// Find the executable on `PATH` (or check it directly when given as a path).
pub fn locate(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Run the tool and parse its table output with `layout`.
pub fn run_stats_tool(
    tool: &StatsToolConfig,
    invocation: &StatsInvocation,
    layout: &KeyLayout,
) -> Result<StatSet, ToolError> {
    let program = tool.program.as_str();
    let args = invocation.args();

    tracing::info!("Calling {}. This might take a while...", program);
    tracing::debug!("{} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(&args)
        .output()
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ToolError::NotFound {
                program: program.to_string(),
            },
            _ => ToolError::Spawn {
                program: program.to_string(),
                source,
            },
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|_| ToolError::NonUtf8Output {
        program: program.to_string(),
    })?;

    let stats = parse_stat_table(&stdout, layout).map_err(|source| ToolError::Parse {
        program: program.to_string(),
        source,
    })?;
    tracing::info!("{} returned {} rows", program, stats.len());
    Ok(stats)
}
