//! Execution engine - runs stacks wave by wave
//!
//! Stacks inside one wave do not depend on each other and may run in
//! parallel. Once any stack fails, every stack in later waves is skipped;
//! there are no retries.

use crate::context::{AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback, StackRunner};
use crate::planner::{ExecutionPlan, Operation, PlannedStack};
use crate::types::{ExecuteOptions, ExecuteSummary, StackResult};
use anyhow::Result;
use rayon::prelude::*;
use std::sync::Mutex;

/// Execute a plan with the given runner and callbacks
///
/// # Arguments
/// * `plan` - Stacks grouped into waves, already in execution order
/// * `opts` - Execution options (dry_run, jobs)
/// * `runner` - Engine wrapper that applies or destroys one stack
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback, asked once before anything runs
pub fn execute<R, P, C>(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    runner: &R,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    R: StackRunner,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut summary = ExecuteSummary::default();
    if plan.is_empty() {
        return Ok(summary);
    }

    if opts.dry_run {
        skip_all(plan, "dry run", progress, &mut summary);
        return Ok(summary);
    }

    let prompt = format!(
        "{} {} stack(s): {}?",
        capitalize(plan.operation.verb()),
        plan.total_stacks(),
        plan.stack_names().join(", ")
    );
    if !confirm.confirm(&prompt)? {
        skip_all(plan, "not confirmed", progress, &mut summary);
        return Ok(summary);
    }

    let mut failed = false;
    for (index, wave) in plan.waves.iter().enumerate() {
        progress.on_wave_start(index, wave);

        if failed {
            for stack in wave {
                let result = StackResult::Skipped {
                    reason: "an earlier stack failed".to_string(),
                };
                progress.on_stack_complete(&stack.name, &result);
                summary.add_result(&result);
            }
            continue;
        }

        let results = run_wave(wave, plan.operation, opts.jobs, runner, progress)?;
        for (name, result) in &results {
            if !result.is_success() {
                log::warn!("stack {name} failed; remaining waves will be skipped");
                failed = true;
            }
            summary.add_result(result);
        }
    }

    Ok(summary)
}

/// Execute with auto-confirm and no progress display
pub fn execute_simple<R: StackRunner>(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    runner: &R,
) -> Result<ExecuteSummary> {
    execute(plan, opts, runner, &mut NoProgress, &mut AutoConfirm)
}

/// Run one wave, sequentially or on a bounded pool
fn run_wave<R: StackRunner, P: ProgressCallback>(
    wave: &[PlannedStack],
    operation: Operation,
    jobs: usize,
    runner: &R,
    progress: &mut P,
) -> Result<Vec<(String, StackResult)>> {
    if jobs <= 1 || wave.len() == 1 {
        let mut results = Vec::with_capacity(wave.len());
        for stack in wave {
            progress.on_stack_start(&stack.name);
            let result = run_stack(runner, stack, operation);
            progress.on_stack_complete(&stack.name, &result);
            results.push((stack.name.clone(), result));
        }
        return Ok(results);
    }

    // The progress callback is not shared across threads; report after the wave.
    for stack in wave {
        progress.on_stack_start(&stack.name);
    }

    let results: Mutex<Vec<(String, StackResult)>> = Mutex::new(Vec::with_capacity(wave.len()));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.min(wave.len()))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    pool.install(|| {
        wave.par_iter().for_each(|stack| {
            let result = run_stack(runner, stack, operation);
            match results.lock() {
                Ok(mut locked) => locked.push((stack.name.clone(), result)),
                Err(poisoned) => poisoned.into_inner().push((stack.name.clone(), result)),
            }
        });
    });

    let mut results = match results.into_inner() {
        Ok(collected) => collected,
        Err(poisoned) => poisoned.into_inner(),
    };
    // Report in plan order, not completion order
    results.sort_by_key(|(name, _)| wave.iter().position(|s| &s.name == name));

    for (name, result) in &results {
        progress.on_stack_complete(name, result);
    }

    Ok(results)
}

/// Run the engine for a single stack
fn run_stack<R: StackRunner>(runner: &R, stack: &PlannedStack, operation: Operation) -> StackResult {
    log::info!("{} {}", operation.verb(), stack.name);

    let output = match operation {
        Operation::Deploy => runner.apply(stack),
        Operation::Destroy => runner.destroy(stack),
    };

    match output {
        Ok(out) if out.success => match operation {
            Operation::Deploy => StackResult::Applied,
            Operation::Destroy => StackResult::Destroyed,
        },
        Ok(out) => {
            log::error!(
                "{} {} failed\n{}",
                operation.verb(),
                stack.name,
                out.stderr_str().trim_end()
            );
            log::debug!("{} stdout:\n{}", stack.name, out.stdout_str().trim_end());
            StackResult::Failed {
                error: out
                    .diagnostics()
                    .unwrap_or_else(|| "engine exited with an error".to_string()),
            }
        }
        Err(e) => StackResult::Failed {
            error: format!("{e:#}"),
        },
    }
}

fn skip_all<P: ProgressCallback>(
    plan: &ExecutionPlan,
    reason: &str,
    progress: &mut P,
    summary: &mut ExecuteSummary,
) {
    for (index, wave) in plan.waves.iter().enumerate() {
        progress.on_wave_start(index, wave);
        for stack in wave {
            let result = StackResult::Skipped {
                reason: reason.to_string(),
            };
            progress.on_stack_complete(&stack.name, &result);
            summary.add_result(&result);
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AutoDecline;
    use crate::types::CommandOutput;
    use std::path::PathBuf;

    /// Records every call and fails the stacks it is told to fail
    #[derive(Default)]
    struct MockRunner {
        calls: Mutex<Vec<String>>,
        failing: Vec<String>,
    }

    impl MockRunner {
        fn failing(name: &str) -> Self {
            Self {
                failing: vec![name.to_string()],
                ..Default::default()
            }
        }

        fn record(&self, verb: &str, stack: &PlannedStack) -> CommandOutput {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{verb} {}", stack.name));
            CommandOutput {
                stdout: Vec::new(),
                stderr: b"Error: local-exec provisioner error\n".to_vec(),
                success: !self.failing.contains(&stack.name),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl StackRunner for MockRunner {
        fn apply(&self, stack: &PlannedStack) -> Result<CommandOutput> {
            Ok(self.record("apply", stack))
        }

        fn destroy(&self, stack: &PlannedStack) -> Result<CommandOutput> {
            Ok(self.record("destroy", stack))
        }
    }

    fn planned(name: &str) -> PlannedStack {
        PlannedStack {
            name: name.to_string(),
            working_dir: PathBuf::from("stacks").join(name),
        }
    }

    fn chain(operation: Operation) -> ExecutionPlan {
        let mut waves = vec![
            vec![planned("docker-registry")],
            vec![planned("kind-cluster")],
            vec![planned("cluster-config")],
        ];
        if operation == Operation::Destroy {
            waves.reverse();
        }
        ExecutionPlan { operation, waves }
    }

    #[test]
    fn test_empty_plan() {
        let plan = ExecutionPlan {
            operation: Operation::Deploy,
            waves: Vec::new(),
        };
        let runner = MockRunner::default();
        let summary = execute(
            &plan,
            &ExecuteOptions::default(),
            &runner,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_deploy_runs_in_order() {
        let runner = MockRunner::default();
        let summary = execute(
            &chain(Operation::Deploy),
            &ExecuteOptions::default(),
            &runner,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(summary.applied, 3);
        assert_eq!(
            runner.calls(),
            vec!["apply docker-registry", "apply kind-cluster", "apply cluster-config"]
        );
    }

    #[test]
    fn test_failure_skips_later_waves() {
        let runner = MockRunner::failing("kind-cluster");
        let summary = execute(
            &chain(Operation::Deploy),
            &ExecuteOptions::default(),
            &runner,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(runner.calls(), vec!["apply docker-registry", "apply kind-cluster"]);
    }

    #[test]
    fn test_failed_stack_carries_engine_diagnostics() {
        let runner = MockRunner::failing("kind-cluster");
        let result = run_stack(&runner, &planned("kind-cluster"), Operation::Deploy);
        assert_eq!(
            result,
            StackResult::Failed {
                error: "Error: local-exec provisioner error".to_string()
            }
        );
    }

    #[test]
    fn test_destroy_runs_in_reverse() {
        let runner = MockRunner::default();
        let summary =
            execute_simple(&chain(Operation::Destroy), &ExecuteOptions::default(), &runner).unwrap();

        assert_eq!(summary.destroyed, 3);
        assert_eq!(runner.calls()[0], "destroy cluster-config");
    }

    #[test]
    fn test_dry_run_and_decline_run_nothing() {
        let runner = MockRunner::default();
        let dry = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };
        let summary = execute(
            &chain(Operation::Deploy),
            &dry,
            &runner,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();
        assert_eq!(summary.skipped, 3);

        let summary = execute(
            &chain(Operation::Deploy),
            &ExecuteOptions::default(),
            &runner,
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();
        assert_eq!(summary.skipped, 3);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_parallel_wave_runs_every_stack() {
        let plan = ExecutionPlan {
            operation: Operation::Deploy,
            waves: vec![vec![planned("a"), planned("b"), planned("c")], vec![planned("d")]],
        };
        let runner = MockRunner::default();
        let opts = ExecuteOptions {
            dry_run: false,
            jobs: 3,
        };
        let summary = execute(&plan, &opts, &runner, &mut NoProgress, &mut AutoConfirm).unwrap();

        assert_eq!(summary.applied, 4);
        let calls = runner.calls();
        assert_eq!(calls.last().map(String::as_str), Some("apply d"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("deploy"), "Deploy");
        assert_eq!(capitalize(""), "");
    }
}
