//! The provisioning engine
//!
//! Every stack is a self-contained Terraform working directory; applying it
//! is `init` followed by `apply` (or `destroy`) without prompts.

use anyhow::Result;
use stackgraph::{CommandOutput, Operation, PlannedStack, StackRunner};

use crate::runner;

pub struct TerraformRunner {
    binary: String,
}

impl TerraformRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, stack: &PlannedStack, args: &[&str]) -> Result<CommandOutput> {
        if !stack.working_dir.is_dir() {
            anyhow::bail!(
                "{} has not been synthesized ({} is missing); run `devstack synth` first",
                stack.name,
                stack.working_dir.display()
            );
        }
        let output = runner::run_in(&stack.working_dir, &self.binary, args)?;
        Ok(output.into())
    }

    /// `init` then the operation, stopping at the first failure
    fn init_then(&self, stack: &PlannedStack, operation: Operation) -> Result<CommandOutput> {
        let init = self.run(stack, &init_args())?;
        if !init.success {
            log::warn!("{}: {} init failed", stack.name, self.binary);
            return Ok(init);
        }
        self.run(stack, &operation_args(operation))
    }
}

impl StackRunner for TerraformRunner {
    fn apply(&self, stack: &PlannedStack) -> Result<CommandOutput> {
        self.init_then(stack, Operation::Deploy)
    }

    fn destroy(&self, stack: &PlannedStack) -> Result<CommandOutput> {
        self.init_then(stack, Operation::Destroy)
    }
}

fn init_args() -> [&'static str; 2] {
    ["init", "-input=false"]
}

fn operation_args(operation: Operation) -> [&'static str; 3] {
    match operation {
        Operation::Deploy => ["apply", "-input=false", "-auto-approve"],
        Operation::Destroy => ["destroy", "-input=false", "-auto-approve"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn planned(dir: &std::path::Path) -> PlannedStack {
        PlannedStack {
            name: "docker-registry".to_string(),
            working_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_operation_args() {
        assert_eq!(
            operation_args(Operation::Deploy),
            ["apply", "-input=false", "-auto-approve"]
        );
        assert_eq!(operation_args(Operation::Destroy)[0], "destroy");
    }

    #[test]
    fn test_missing_working_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let runner = TerraformRunner::new("terraform");
        let err = runner.apply(&planned(&dir.path().join("absent"))).unwrap_err();
        assert!(err.to_string().contains("devstack synth"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_maps_to_success() {
        let dir = TempDir::new().unwrap();
        assert!(TerraformRunner::new("true").apply(&planned(dir.path())).unwrap().success);
        assert!(!TerraformRunner::new("false").destroy(&planned(dir.path())).unwrap().success);
    }
}
