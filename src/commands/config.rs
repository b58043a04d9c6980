use anyhow::{Result, bail};

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::DevstackConfig;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Init { force } => init(ctx, force),
        ConfigCommand::Path => {
            println!("{}", ctx.config_file.display());
            Ok(())
        }
    }
}

fn show(ctx: &Context) -> Result<()> {
    let config = DevstackConfig::load(&ctx.config_file)?;

    if !ctx.quiet {
        ui::header("Configuration");
        if ctx.config_file.exists() {
            ui::kv("File", &ctx.config_file.display().to_string());
        } else {
            ui::kv("File", &format!("{} (not found, defaults)", ctx.config_file.display()));
        }
        println!();
    }

    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn init(ctx: &Context, force: bool) -> Result<()> {
    let path = &ctx.config_file;
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let written = DevstackConfig::default().save(path)?;
    ui::success(&format!("Wrote {}", written.display()));
    Ok(())
}
