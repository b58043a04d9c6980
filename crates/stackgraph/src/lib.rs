//! # Stackgraph
//!
//! Declarative resource graphs synthesized to Terraform JSON.
//!
//! Infrastructure is declared as typed resources grouped into stacks;
//! stacks are grouped into apps. Nothing here talks to a cloud or a
//! cluster: an app is rendered to `cdk.tf.json` files plus a
//! `manifest.json`, and the external engine does the provisioning.
//!
//! ## Core Concepts
//!
//! - **Resource**: A typed attribute struct with a Terraform resource type
//! - **Stack**: Resources, providers and outputs applied as one unit
//! - **App**: Stacks with hand-encoded stack-level dependencies
//! - **ExecutionPlan**: Synthesized stacks grouped into waves
//! - **Executor**: Runs the engine over a plan with bounded parallelism
//!
//! ## Example
//!
//! ```ignore
//! use serde::Serialize;
//! use stackgraph::{App, Resource, Stack};
//!
//! #[derive(Debug, Serialize)]
//! struct Org { name: String }
//!
//! impl Resource for Org {
//!     const TYPE: &'static str = "zitadel_org";
//! }
//!
//! let mut stack = Stack::new("zitadel-dev")?;
//! let org = stack.resource("org", &Org { name: "makers".into() })?;
//! assert_eq!(org.id(), "${zitadel_org.org.id}");
//!
//! let mut app = App::new("identity");
//! app.add_stack(stack)?;
//! app.synth(std::path::Path::new("cdktf.out"))?;
//! ```
//!
//! ## Runner Traits
//!
//! - [`StackRunner`]: Applies or destroys one synthesized stack
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations

pub mod app;
pub mod context;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod planner;
pub mod resource;
pub mod stack;
pub mod synth;
pub mod testing;
pub mod token;
pub mod types;

// Re-export main types at crate root
pub use app::{App, SynthReport, SynthesizedStack};
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback, StackRunner};
pub use error::{Error, Result};
pub use executor::{execute, execute_simple};
pub use manifest::{MANIFEST_FILE, Manifest, StackEntry};
pub use planner::{DependencyGraph, ExecutionPlan, Operation, PlannedStack};
pub use resource::{Provider, Provisioner, Resource, ResourceNode, ResourceOptions, When};
pub use stack::{Output, RequiredProvider, Stack};
pub use synth::{STACK_FILE, content_hash, state_file_name};
pub use token::ResourceRef;
pub use types::{CommandOutput, ExecuteOptions, ExecuteSummary, StackResult};
