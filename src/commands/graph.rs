use anyhow::{Result, bail};
use colored::Colorize;
use stackgraph::DependencyGraph;
use std::fmt::Write as _;

use crate::Context;
use crate::cli::GraphArgs;
use crate::ui;

pub fn run(ctx: &Context, args: GraphArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let app = args.app.outline(&config)?;

    let Some(stack_name) = args.stack else {
        let graph = app.stack_graph();
        if args.dot {
            print!("{}", to_dot(app.name(), &graph));
            return Ok(());
        }

        ui::header(&format!("{} waves", app.name()));
        for (i, wave) in graph.waves()?.iter().enumerate() {
            println!("  {} {}", format!("{}.", i + 1).dimmed(), wave.join(", "));
        }
        return Ok(());
    };

    let Some(stack) = app.stack(&stack_name) else {
        let known: Vec<&str> = app.stacks().iter().map(|s| s.name()).collect();
        bail!(
            "{} has no stack '{stack_name}' (known: {})",
            app.name(),
            known.join(", ")
        );
    };

    let graph = stack.resource_graph()?;
    if args.dot {
        print!("{}", to_dot(stack.name(), &graph));
        return Ok(());
    }

    ui::header(&format!("{stack_name} resource order"));
    for (i, resource) in graph.order()?.iter().enumerate() {
        let deps: Vec<&str> = graph.dependencies_of(resource).collect();
        if deps.is_empty() {
            println!("  {} {}", format!("{}.", i + 1).dimmed(), resource);
        } else {
            println!(
                "  {} {} {}",
                format!("{}.", i + 1).dimmed(),
                resource,
                format!("<- {}", deps.join(", ")).dimmed()
            );
        }
    }
    Ok(())
}

/// Graphviz rendering; arrows point from a dependency to what needs it
pub fn to_dot(name: &str, graph: &DependencyGraph) -> String {
    let mut out = format!("digraph \"{name}\" {{\n  rankdir=LR;\n");
    for (dependent, dependency) in graph.edges() {
        let _ = writeln!(out, "  \"{dependency}\" -> \"{dependent}\";");
    }
    out.push_str("}\n");
    out
}
