use anyhow::{Context as _, Result};
use stackgraph::SynthReport;
use std::path::Path;

use crate::Context;
use crate::cli::SynthArgs;
use crate::config::DevstackConfig;
use crate::stacks::AppKind;
use crate::ui;

pub fn run(ctx: &Context, args: SynthArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let out_root = args.out.unwrap_or_else(|| config.out_path());

    if !ctx.quiet {
        ui::header("Synthesizing");
    }

    for kind in args.app.apps() {
        let report = synth_app(&config, kind, &out_root)?;
        if ctx.quiet {
            continue;
        }

        ui::section(kind.name());
        for stack in &report.stacks {
            let status = if stack.changed { "written" } else { "unchanged" };
            ui::kv(&stack.name, &format!("{} ({status})", stack.path.display()));
            if ctx.verbose > 0 {
                ui::dim(&format!("  blake3 {}", stack.content_hash));
            }
        }
        ui::dim(&format!("manifest: {}", report.manifest_path.display()));
    }

    if !ctx.quiet {
        println!();
        ui::success("Synthesis complete");
    }
    Ok(())
}

/// Build one app and write it under `out_root/<app>`
pub fn synth_app(config: &DevstackConfig, kind: AppKind, out_root: &Path) -> Result<SynthReport> {
    let app = kind.build(config)?;
    let out_dir = out_root.join(kind.name());
    let report = app
        .synth(&out_dir)
        .with_context(|| format!("Failed to synthesize {kind} into {}", out_dir.display()))?;

    log::info!(
        "synthesized {kind}: {} stack(s), {} changed",
        report.stacks.len(),
        report.changed()
    );
    Ok(report)
}
