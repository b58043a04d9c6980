use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::stacks::AppKind;
use crate::ui;

pub fn run(ctx: &Context, app: Option<AppKind>) -> Result<()> {
    let config = ctx.load_config()?;
    let kinds = app.map_or_else(|| AppKind::ALL.to_vec(), |kind| vec![kind]);

    ui::header("Stacks");

    for kind in kinds {
        let app = kind.outline(&config)?;
        ui::section(kind.name());

        for (i, name) in app.deploy_order()?.iter().enumerate() {
            let Some(stack) = app.stack(name) else {
                continue;
            };
            let deps = if stack.dependencies().is_empty() {
                String::new()
            } else {
                format!("(after {})", stack.dependencies().join(", "))
            };
            println!(
                "  {} {} {} {}",
                format!("{}.", i + 1).dimmed(),
                name.bold(),
                format!("{} resource(s)", stack.resources().len()).dimmed(),
                deps.dimmed()
            );
        }
    }

    Ok(())
}
