use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::config::DevstackConfig;
use crate::runner;
use crate::stacks::AppKind;
use crate::ui;

struct Issue {
    category: &'static str,
    summary: String,
    detail: Option<String>,
    fix: Option<String>,
    fix_cmd: Option<String>,
}

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("Environment Check");

    let mut issues: Vec<Issue> = Vec::new();

    // Check 1: Configuration file
    let config = check_config(ctx, &mut issues);

    // Check 2: Required commands
    check_commands(&config, &mut issues);

    // Check 3: Docker daemon
    check_docker(&mut issues);

    // Check 4: Files the identity app needs
    check_identity(&config, &mut issues);

    // Check 5: Synthesized output
    check_output(&config);

    // Summary
    println!();
    if issues.is_empty() {
        ui::success("Ready to deploy");
    } else {
        print_issue_summary(&issues);
    }

    Ok(())
}

fn print_issue_summary(issues: &[Issue]) {
    let count = issues.len();
    let label = if count == 1 { "Issue" } else { "Issues" };
    ui::header(&format!("{count} {label} Found"));

    for (i, issue) in issues.iter().enumerate() {
        let num = i + 1;
        println!(
            "  {}  {} {}",
            format!("{num}.").bold(),
            issue.summary,
            format!("[{}]", issue.category).dimmed()
        );
        if let Some(detail) = &issue.detail {
            for line in detail.lines() {
                println!("      {}", line.dimmed());
            }
        }
        if let Some(fix) = &issue.fix {
            println!("      {} {}", "Fix:".cyan(), fix);
        }
        if let Some(cmd) = &issue.fix_cmd {
            println!("      {} {}", "$".dimmed(), cmd.bold());
        }
        println!();
    }
}

fn check_config(ctx: &Context, issues: &mut Vec<Issue>) -> DevstackConfig {
    ui::section("Configuration");

    let path = &ctx.config_file;
    if path.exists() {
        println!("  {} {}", "✓".green(), path.display());
    } else {
        println!(
            "  {} {} {}",
            "○".dimmed(),
            path.display(),
            "(not found, using defaults)".dimmed()
        );
    }

    let config = match DevstackConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            println!("  {} {}", "✗".red(), "could not be parsed".red());
            issues.push(Issue {
                category: "Configuration",
                summary: format!("{} is not valid", path.display()),
                detail: Some(format!("{e:#}")),
                fix: Some("Fix the file or regenerate it".into()),
                fix_cmd: Some("devstack config init --force".into()),
            });
            return DevstackConfig::default();
        }
    };

    if let Err(e) = config.validate() {
        println!("  {} {}", "✗".red(), "invalid values".red());
        issues.push(Issue {
            category: "Configuration",
            summary: "Configuration has invalid values".into(),
            detail: Some(format!("{e:#}")),
            fix: Some(format!("Edit {}", path.display())),
            fix_cmd: None,
        });
    }

    config
}

fn check_commands(config: &DevstackConfig, issues: &mut Vec<Issue>) {
    ui::section("Required Commands");

    let commands = [
        (config.terraform.binary.as_str(), "Provisioning engine"),
        ("docker", "Container runtime for the registry and kind nodes"),
        ("kind", "Local Kubernetes cluster"),
        ("kubectl", "Setup steps against the cluster"),
        ("base64", "Copying the TLS certificate out of the cluster"),
    ];

    for (cmd, desc) in commands {
        if runner::command_exists(cmd) {
            println!("  {} {} - {}", "✓".green(), cmd, desc.dimmed());
        } else {
            println!("  {} {} - {} {}", "✗".red(), cmd, desc, "(missing)".red());
            issues.push(Issue {
                category: "Required Commands",
                summary: format!("{cmd} is not on PATH"),
                detail: Some(desc.to_string()),
                fix: Some(format!("Install {cmd}")),
                fix_cmd: None,
            });
        }
    }
}

fn check_docker(issues: &mut Vec<Issue>) {
    ui::section("Docker");

    if !runner::command_exists("docker") {
        ui::dim("skipped (docker missing)");
        return;
    }

    match runner::run_capture("docker", &["info", "--format", "{{.ServerVersion}}"]) {
        Ok(version) => println!("  {} daemon {}", "✓".green(), version.dimmed()),
        Err(e) => {
            println!("  {} {}", "✗".red(), "daemon not reachable".red());
            issues.push(Issue {
                category: "Docker",
                summary: "Docker daemon is not reachable".into(),
                detail: Some(format!("{e:#}")),
                fix: Some("Start Docker".into()),
                fix_cmd: None,
            });
        }
    }
}

fn check_identity(config: &DevstackConfig, issues: &mut Vec<Issue>) {
    ui::section("Identity");

    let key = config.identity.key_path();
    if key.exists() {
        println!("  {} {}", "✓".green(), key.display());
    } else {
        println!(
            "  {} {} {}",
            "✗".red(),
            key.display(),
            "(missing)".red()
        );
        issues.push(Issue {
            category: "Identity",
            summary: "Service-account key not found".into(),
            detail: Some(
                "The identity app authenticates with the zitadel-admin-sa machine key".into(),
            ),
            fix: Some(
                "Deploy the components app, export the machine key, then set identity.key_file"
                    .into(),
            ),
            fix_cmd: Some("devstack deploy components".into()),
        });
    }

    ui::kv("domain", &config.identity.domain);
}

fn check_output(config: &DevstackConfig) {
    ui::section("Synthesized Apps");

    for kind in AppKind::ALL {
        let dir = kind.out_dir(config);
        if dir.join(stackgraph::MANIFEST_FILE).exists() {
            println!("  {} {} {}", "✓".green(), kind, dir.display().to_string().dimmed());
        } else {
            println!("  {} {} {}", "○".dimmed(), kind, "(not synthesized)".dimmed());
        }
    }
}
