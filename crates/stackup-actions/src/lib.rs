//! Stackup Actions
//!
//! This crate provides the actions stackup provisioning flows are built
//! from, and the [`ActionRegistry`] that maps action identifiers to
//! factories.
//!
//! Actions receive their dependencies when they are constructed: the
//! [`Project`] being provisioned, the [`Prompter`] used for questions, and
//! per-action parameters. Nothing is looked up from global state.
//!
//! # Usage
//!
//! ```ignore
//! use stackup_actions::{ActionArgs, ActionRegistry, Project};
//!
//! let registry = ActionRegistry::with_builtins();
//! let args = ActionArgs::new(project, prompter, json!({ "path": "services" }));
//! let mkdir = registry.create("create_directory", &args)?;
//! ```

mod error;
mod fs;
mod project;
mod prompt;
mod registry;
mod template;

pub use error::{ProvisionError, RegistryError};
pub use fs::{CreateDirectory, WriteTemplate};
pub use project::Project;
pub use prompt::{Ask, DialoguerPrompter, PresetPrompter, Prompter};
pub use registry::{ActionArgs, ActionFactory, ActionRegistry};
pub use template::render;
