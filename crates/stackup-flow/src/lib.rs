//! Stackup Flow
//!
//! This crate provides the step graph engine that drives every stackup
//! provisioning workflow. A workflow is declared with the fluent
//! [`FlowBuilder`] and run with [`FlowBuilder::start`].
//!
//! # Architecture
//!
//! ```text
//! FlowBuilder
//! ├── then(step) / then_all(steps)   - extend the frontier (fan-out)
//! ├── if_then(pred, f) / otherwise(g) - build-time branch selection
//! ├── after(names, step)             - join on named steps (fan-in)
//! └── start(entries) -> FlowResult   - build + execute
//!
//! Flow
//! └── run(entries) - in-degree scheduling, context merges, events
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use stackup_flow::{FlowBuilder, Step, action_fn};
//!
//! let result = FlowBuilder::new("init")
//!   .then_all([Step::named("x", fetch), Step::bare(mkdir)])
//!   .after("x", Step::named("config", write_config))
//!   .start([("root", json!("/tmp/project"))])
//!   .await?;
//!
//! let config = result.context.get("config");
//! ```

mod action;
mod builder;
mod context;
mod error;
mod events;
mod executor;
mod graph;
mod step;

pub use action::{Action, ActionError, Constant, FnAction, SharedAction, action_fn, constant};
pub use builder::{FlowBuilder, JoinNames};
pub use context::Context;
pub use error::{BuildError, ContextError, FlowError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::{Flow, FlowResult};
pub use graph::Graph;
pub use step::{Step, StepId, StepKind, StepNode};
