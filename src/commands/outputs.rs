use anyhow::{Context as _, Result, bail};
use chrono::Local;
use stackgraph::state_file_name;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::{DevVarsArgs, OutputsArgs};
use crate::config::DevstackConfig;
use crate::stacks::AppKind;
use crate::state::{self, OutputsFile};
use crate::ui;

/// Extract a stack's outputs into a JSON file
pub fn extract(ctx: &Context, args: OutputsArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let state_path = match args.state {
        Some(path) => path,
        None => locate_state(&config, &args.stack)?,
    };

    let outputs = OutputsFile::from_state(&state_path)?;
    outputs.save(&args.out)?;

    if ctx.quiet {
        return Ok(());
    }

    ui::header(&format!("{} outputs", args.stack));
    ui::dim(&format!(
        "from {} at {}",
        state_path.display(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    println!();
    for (name, output) in &outputs.outputs {
        ui::kv(name, &output.display_value());
    }
    println!();
    ui::success(&format!(
        "Wrote {} output(s) to {}",
        outputs.outputs.len(),
        args.out.display()
    ));
    Ok(())
}

/// Write the local app environment file from extracted outputs
pub fn dev_vars(ctx: &Context, args: DevVarsArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let outputs = OutputsFile::load(&args.outputs)?;

    let vars = state::dev_vars(&outputs, &config.identity)?;
    fs::write(&args.out, state::render_dev_vars(&vars))
        .with_context(|| format!("Could not write {}", args.out.display()))?;

    if !ctx.quiet {
        for (key, _) in &vars {
            ui::dim(key);
        }
        ui::success(&format!("Wrote {} variable(s) to {}", vars.len(), args.out.display()));
    }
    Ok(())
}

/// Find the local state file of a stack
///
/// A configured state directory wins; otherwise each app's synthesized
/// output is searched for a stack of that name.
pub fn locate_state(config: &DevstackConfig, stack: &str) -> Result<PathBuf> {
    let file = state_file_name(stack);
    if let Some(dir) = config.terraform.state_path() {
        let path = dir.join(&file);
        if path.exists() {
            return Ok(path);
        }
        bail!("No state for {stack} at {}", path.display());
    }

    let candidates: Vec<PathBuf> = AppKind::ALL
        .iter()
        .map(|kind| stack_dir(&kind.out_dir(config), stack).join(&file))
        .collect();

    candidates
        .iter()
        .find(|path| path.exists())
        .cloned()
        .with_context(|| {
            format!(
                "No state for {stack}; deploy it first or pass --state (looked in {})",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
}

fn stack_dir(app_out: &Path, stack: &str) -> PathBuf {
    app_out.join("stacks").join(stack)
}
