use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Run a command in `dir` and capture its output, whatever the exit status
pub fn run_in(dir: &Path, cmd: &str, args: &[&str]) -> Result<Output> {
    log::debug!("{} $ {} {}", dir.display(), cmd, args.join(" "));
    Command::new(cmd)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))
}

/// Run a command and capture output
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Command failed: {}", stderr.trim())
    }
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_in_uses_working_directory() {
        let dir = TempDir::new().unwrap();
        let output = run_in(dir.path(), "pwd", &[]).unwrap();
        assert!(output.status.success());

        let printed = String::from_utf8_lossy(&output.stdout);
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(printed.trim()).canonicalize().unwrap(), expected);
    }

    #[test]
    fn test_run_capture_reports_failure() {
        assert_eq!(run_capture("echo", &["hello"]).unwrap(), "hello");
        assert!(run_capture("false", &[]).is_err());
    }

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("definitely-not-a-command-12345"));
    }
}
