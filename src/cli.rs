use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::stacks::AppKind;
use crate::stacks::identity::IDENTITY_STACK;
use crate::state::{DEV_VARS_FILE, OUTPUTS_FILE};

#[derive(Parser)]
#[command(name = "devstack")]
#[command(author = "Makers Platform Team")]
#[command(version)]
#[command(about = "Declare, synthesize and deploy the local development stacks", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: $DEVSTACK_CONFIG, then ./devstack.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write Terraform JSON and the manifest for one app or all of them
    Synth(SynthArgs),

    /// List stacks in deploy order with their dependencies
    List {
        /// Only this app
        #[arg(value_enum)]
        app: Option<AppKind>,
    },

    /// Show the resource or stack dependency graph
    Graph(GraphArgs),

    /// Synthesize an app and apply its stacks in dependency order
    Deploy(RunArgs),

    /// Synthesize an app and destroy its stacks in reverse dependency order
    Destroy(RunArgs),

    /// Extract outputs from a stack's state into a JSON file
    Outputs(OutputsArgs),

    /// Write .dev.vars from extracted identity outputs
    DevVars(DevVarsArgs),

    /// Check that required tools and files are present
    Doctor,

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Synth / Graph
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppTarget {
    Cluster,
    Components,
    Identity,
    All,
}

impl AppTarget {
    pub fn apps(self) -> Vec<AppKind> {
        match self {
            Self::Cluster => vec![AppKind::Cluster],
            Self::Components => vec![AppKind::Components],
            Self::Identity => vec![AppKind::Identity],
            Self::All => AppKind::ALL.to_vec(),
        }
    }
}

#[derive(Args)]
pub struct SynthArgs {
    /// App to synthesize
    #[arg(value_enum, default_value = "all")]
    pub app: AppTarget,

    /// Output directory (default: out_dir from the config)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct GraphArgs {
    #[arg(value_enum)]
    pub app: AppKind,

    /// Show resources of this stack instead of the stacks of the app
    #[arg(short, long)]
    pub stack: Option<String>,

    /// Print Graphviz DOT instead of a list
    #[arg(long)]
    pub dot: bool,
}

// ============================================================================
// Deploy / Destroy
// ============================================================================

#[derive(Args)]
pub struct RunArgs {
    #[arg(value_enum)]
    pub app: AppKind,

    /// Only these stacks (plus what they depend on, or what depends on them for destroy)
    pub stacks: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub auto_approve: bool,

    /// Show what would run without running the engine
    #[arg(short, long)]
    pub dry_run: bool,

    /// Number of independent stacks run at the same time
    #[arg(short, long, default_value = "2")]
    pub jobs: usize,
}

// ============================================================================
// Outputs
// ============================================================================

#[derive(Args)]
pub struct OutputsArgs {
    /// Stack whose state is read
    #[arg(default_value = IDENTITY_STACK)]
    pub stack: String,

    /// State file (default: located from the config and the synthesized apps)
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Where to write the extracted outputs
    #[arg(short, long, value_name = "FILE", default_value = OUTPUTS_FILE)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct DevVarsArgs {
    /// Extracted outputs file
    #[arg(long, value_name = "FILE", default_value = OUTPUTS_FILE)]
    pub outputs: PathBuf,

    /// Where to write the environment file
    #[arg(short, long, value_name = "FILE", default_value = DEV_VARS_FILE)]
    pub out: PathBuf,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a configuration file with every default filled in
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}
