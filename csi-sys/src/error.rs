// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use thiserror::Error;

/// Error types for host command execution
#[derive(Error, Debug)]
pub enum SysError {
    #[error("Program not found on PATH: {0}")]
    ProgramNotFound(String),

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed ({}): {command}; stderr: {stderr}", exit_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out after {timeout:?}: {command}")]
    TimedOut { command: String, timeout: Duration },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
