//! Core types for stack execution

use serde::{Deserialize, Serialize};
use std::process::Output;

/// Result of running the engine over one stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackResult {
    /// Stack was applied
    Applied,
    /// Stack was destroyed
    Destroyed,
    /// Engine run failed
    Failed { error: String },
    /// Stack was not run
    Skipped { reason: String },
}

impl StackResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub applied: usize,
    pub destroyed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of stacks processed
    pub fn total(&self) -> usize {
        self.applied + self.destroyed + self.skipped + self.failed
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &StackResult) {
        match result {
            StackResult::Applied => self.applied += 1,
            StackResult::Destroyed => self.destroyed += 1,
            StackResult::Failed { .. } => self.failed += 1,
            StackResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't run the engine, just report what would run
    pub dry_run: bool,
    /// Number of stacks of one wave run at the same time
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 2,
        }
    }
}

/// Output from an engine command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// The engine's error diagnostics, without box-drawing frames
    ///
    /// Everything from the first `Error:` line of stderr on, blank lines
    /// collapsed, so provisioner output that follows the error is kept.
    /// Without an `Error:` line this is the last non-empty line of stderr,
    /// then of stdout.
    pub fn diagnostics(&self) -> Option<String> {
        let stderr = unframe(&self.stderr_str());
        if let Some(start) = stderr.iter().position(|l| l.starts_with("Error:")) {
            return Some(stderr[start..].join("\n"));
        }

        stderr
            .last()
            .cloned()
            .or_else(|| unframe(&self.stdout_str()).pop())
    }
}

/// Non-empty lines with the `╷ │ ╵` diagnostic frame stripped
fn unframe(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim_start_matches(['╷', '│', '╵'])
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        summary.add_result(&StackResult::Applied);
        summary.add_result(&StackResult::Skipped {
            reason: "upstream failed".into(),
        });
        summary.add_result(&StackResult::Failed {
            error: "exit 1".into(),
        });

        assert_eq!(summary.total(), 3);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_diagnostics_keep_framed_error_and_shell_output() {
        let output = CommandOutput {
            stdout: b"null_resource.kind-cluster: Creating...\n".to_vec(),
            stderr: "\u{2577}\n\
                     \u{2502} Error: local-exec provisioner error\n\
                     \u{2502} \n\
                     \u{2502}   with null_resource.kind-cluster,\n\
                     \u{2502}   on cdk.tf.json line 42, in resource.null_resource.kind-cluster:\n\
                     \u{2502} \n\
                     \u{2502} Error running command 'kind create cluster': exit status 127. Output:\n\
                     \u{2502} sh: kind: not found\n\
                     \u{2502} \n\
                     \u{2575}\n"
                .as_bytes()
                .to_vec(),
            success: false,
        };

        let text = output.diagnostics().unwrap();
        assert!(text.starts_with("Error: local-exec provisioner error"));
        assert!(text.contains("exit status 127"));
        assert!(text.ends_with("sh: kind: not found"));
        assert!(!text.contains('\u{2575}'));
        assert!(!text.contains('\u{2502}'));
    }

    #[test]
    fn test_diagnostics_fallbacks() {
        let plain = CommandOutput {
            stdout: b"Plan: 1 to add\n".to_vec(),
            stderr: b"\nsomething went wrong\n\n".to_vec(),
            success: false,
        };
        assert_eq!(plain.diagnostics().as_deref(), Some("something went wrong"));

        let quiet = CommandOutput {
            stdout: b"only stdout\n".to_vec(),
            stderr: Vec::new(),
            success: false,
        };
        assert_eq!(quiet.diagnostics().as_deref(), Some("only stdout"));

        let silent = CommandOutput {
            stdout: Vec::new(),
            stderr: Vec::new(),
            success: false,
        };
        assert_eq!(silent.diagnostics(), None);
    }
}
