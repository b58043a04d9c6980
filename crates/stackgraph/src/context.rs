//! Runner and callback traits
//!
//! These traits let the executor drive stacks without depending on a
//! particular engine binary, progress display or prompt library.

use crate::planner::PlannedStack;
use crate::types::{CommandOutput, StackResult};
use anyhow::Result;

/// Runs the provisioning engine over a synthesized stack
///
/// Implementations block until the engine exits. A non-successful
/// [`CommandOutput`] marks the stack as failed.
pub trait StackRunner: Send + Sync {
    /// Create or update everything the stack declares
    fn apply(&self, stack: &PlannedStack) -> Result<CommandOutput>;

    /// Tear down everything the stack declares
    fn destroy(&self, stack: &PlannedStack) -> Result<CommandOutput>;
}

/// Progress callback for execution operations
pub trait ProgressCallback: Send {
    /// Called when a wave of independent stacks starts
    fn on_wave_start(&mut self, index: usize, stacks: &[PlannedStack]);

    /// Called before the engine runs for one stack
    fn on_stack_start(&mut self, name: &str);

    /// Called when a stack finishes, fails or is skipped
    fn on_stack_complete(&mut self, name: &str, result: &StackResult);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_wave_start(&mut self, _index: usize, _stacks: &[PlannedStack]) {}
    fn on_stack_start(&mut self, _name: &str) {}
    fn on_stack_complete(&mut self, _name: &str, _result: &StackResult) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
