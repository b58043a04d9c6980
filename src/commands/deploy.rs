use anyhow::{Result, bail};
use colored::Colorize;
use dialoguer::Confirm;
use stackgraph::{
    AutoConfirm, ConfirmCallback, ExecuteOptions, ExecuteSummary, ExecutionPlan, Manifest,
    Operation, execute,
};

use crate::Context;
use crate::cli::RunArgs;
use crate::commands::synth::synth_app;
use crate::progress::StackProgress;
use crate::terraform::TerraformRunner;
use crate::ui;

/// Asks on the terminal before the engine runs
struct TerminalConfirm;

impl ConfirmCallback for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

/// Synthesize the app, then deploy or destroy the selected stacks
pub fn run(ctx: &Context, args: RunArgs, operation: Operation) -> Result<()> {
    let config = ctx.load_config()?;
    let kind = args.app;

    let title = match operation {
        Operation::Deploy => format!("Deploying {kind}"),
        Operation::Destroy => format!("Destroying {kind}"),
    };
    ui::header(&title);
    if args.dry_run {
        ui::warn("Dry run - the engine will not be run");
    }

    let out_dir = kind.out_dir(&config);
    synth_app(&config, kind, &config.out_path())?;
    let manifest = Manifest::load(&out_dir)?;
    let plan = ExecutionPlan::from_manifest(&manifest, &out_dir, &args.stacks, operation)?;

    if plan.is_empty() {
        ui::info("Nothing to do");
        return Ok(());
    }

    if !ctx.quiet {
        ui::section("Plan");
        for (i, wave) in plan.waves.iter().enumerate() {
            let names: Vec<&str> = wave.iter().map(|s| s.name.as_str()).collect();
            ui::kv(&format!("wave {}", i + 1), &names.join(", "));
        }
        println!();
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
    };
    let runner = TerraformRunner::new(config.terraform.binary.clone());
    let mut progress = StackProgress::new(ctx.quiet);

    let summary = if args.auto_approve {
        execute(&plan, &opts, &runner, &mut progress, &mut AutoConfirm)?
    } else {
        execute(&plan, &opts, &runner, &mut progress, &mut TerminalConfirm)?
    };

    print_summary(&summary, operation);

    if !summary.is_success() {
        bail!("{} stack(s) failed to {}", summary.failed, operation.verb());
    }
    Ok(())
}

fn print_summary(summary: &ExecuteSummary, operation: Operation) {
    println!();
    let done = match operation {
        Operation::Deploy => summary.applied,
        Operation::Destroy => summary.destroyed,
    };

    if summary.is_success() && summary.skipped == 0 {
        println!(
            "  {} {} stack(s) {}ed",
            "✓".green(),
            done,
            operation.verb()
        );
        return;
    }

    println!(
        "  {} done, {} skipped, {} failed",
        done.to_string().green(),
        summary.skipped.to_string().yellow(),
        summary.failed.to_string().red()
    );
}
