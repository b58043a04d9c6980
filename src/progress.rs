//! Spinners shown while the engine runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use stackgraph::{PlannedStack, ProgressCallback, StackResult};
use std::collections::HashMap;
use std::time::Duration;

/// A spinner with a message, drawn as part of `multi`
fn spinner(multi: &MultiProgress, msg: &str) -> ProgressBar {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// One spinner per running stack
pub struct StackProgress {
    multi: MultiProgress,
    spinners: HashMap<String, ProgressBar>,
    quiet: bool,
}

impl StackProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            spinners: HashMap::new(),
            quiet,
        }
    }
}

impl ProgressCallback for StackProgress {
    fn on_wave_start(&mut self, index: usize, stacks: &[PlannedStack]) {
        if self.quiet {
            return;
        }
        let names: Vec<&str> = stacks.iter().map(|s| s.name.as_str()).collect();
        let line = format!("Wave {}: {}", index + 1, names.join(", "));
        let _ = self.multi.println(line.dimmed().to_string());
    }

    fn on_stack_start(&mut self, name: &str) {
        if self.quiet {
            return;
        }
        let pb = spinner(&self.multi, name);
        self.spinners.insert(name.to_string(), pb);
    }

    fn on_stack_complete(&mut self, name: &str, result: &StackResult) {
        let line = match result {
            StackResult::Applied => format!("{} {name}", "✓".green()),
            StackResult::Destroyed => format!("{} {name} {}", "✓".green(), "(destroyed)".dimmed()),
            StackResult::Failed { error } => format!("{} {name}: {}", "✗".red(), error.red()),
            StackResult::Skipped { reason } => {
                format!("{} {name} {}", "○".dimmed(), format!("({reason})").dimmed())
            }
        };

        match self.spinners.remove(name) {
            Some(pb) => pb.finish_with_message(line),
            None if !self.quiet || !result.is_success() => {
                let _ = self.multi.println(line);
            }
            None => {}
        }
    }
}
