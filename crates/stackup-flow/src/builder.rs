//! Fluent construction of step graphs.
//!
//! The builder tracks a *frontier*: the steps the next `then` attaches to.
//! `then` moves the frontier forward, `then_all` fans out into several
//! steps, and `after` repositions the frontier onto named steps anywhere in
//! the graph so a join can wait on work from unrelated branches.
//!
//! Branches are chosen while the graph is being built. `if_then` evaluates
//! its predicate against the builder's context immediately, and only the
//! selected continuation ever reaches the graph.
//!
//! Build errors are recorded at the first failing call. Later calls become
//! no-ops and the error is returned from [`FlowBuilder::build`].

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;

use tracing::debug;

use crate::action::ActionError;
use crate::context::Context;
use crate::error::{BuildError, FlowError};
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::executor::{Flow, FlowResult};
use crate::graph::Graph;
use crate::step::{Step, StepId};

/// One or more step names for a join.
pub trait JoinNames {
  fn into_names(self) -> Vec<String>;
}

impl JoinNames for &str {
  fn into_names(self) -> Vec<String> {
    vec![self.to_string()]
  }
}

impl JoinNames for String {
  fn into_names(self) -> Vec<String> {
    vec![self]
  }
}

impl JoinNames for &[&str] {
  fn into_names(self) -> Vec<String> {
    self.iter().map(|s| s.to_string()).collect()
  }
}

impl<const N: usize> JoinNames for [&str; N] {
  fn into_names(self) -> Vec<String> {
    self.iter().map(|s| s.to_string()).collect()
  }
}

impl JoinNames for Vec<&str> {
  fn into_names(self) -> Vec<String> {
    self.into_iter().map(str::to_string).collect()
  }
}

impl JoinNames for Vec<String> {
  fn into_names(self) -> Vec<String> {
    self
  }
}

/// Builds a flow one step at a time.
pub struct FlowBuilder {
  name: String,
  context: Context,
  graph: Graph,
  frontier: Vec<StepId>,
  /// Names the next created steps join on, set by `after`.
  pending_joins: Vec<String>,
  /// Predicate outcome of an `if_then` that was the previous call.
  branch: Option<bool>,
  error: Option<BuildError>,
  notifier: Arc<dyn ExecutionNotifier>,
}

impl FlowBuilder {
  /// Start an empty flow.
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_context(name, Context::new())
  }

  /// Start a flow whose branch predicates see `context`.
  ///
  /// The same entries seed the run context when the flow starts.
  pub fn with_context(name: impl Into<String>, context: impl Into<Context>) -> Self {
    Self {
      name: name.into(),
      context: context.into(),
      graph: Graph::new(),
      frontier: Vec::new(),
      pending_joins: Vec::new(),
      branch: None,
      error: None,
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Send execution events to `notifier`.
  pub fn notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  /// The context branch predicates are evaluated against.
  pub fn context(&self) -> &Context {
    &self.context
  }

  /// Steps the next `then` attaches to.
  pub fn frontier(&self) -> &[StepId] {
    &self.frontier
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// The first build error, if any.
  pub fn error(&self) -> Option<&BuildError> {
    self.error.as_ref()
  }

  /// Append a step after the current frontier.
  pub fn then(self, step: impl Into<Step>) -> Self {
    self.then_all([step.into()])
  }

  /// Append several independent steps after the current frontier.
  ///
  /// Each step's predecessors are the whole frontier; the new frontier is
  /// the set of created steps.
  pub fn then_all(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
    if self.error.is_some() {
      return self;
    }
    self.branch = None;

    let steps: Vec<Step> = steps.into_iter().collect();
    if steps.is_empty() {
      return self.fail(BuildError::EmptyThen);
    }

    let joins = std::mem::take(&mut self.pending_joins);
    let mut frontier = Vec::with_capacity(steps.len());

    for step in steps {
      let (name, action) = step.into_parts();
      match self
        .graph
        .push(name, action, self.frontier.clone(), joins.clone())
      {
        Ok(id) => frontier.push(id),
        Err(e) => return self.fail(e),
      }
    }

    debug!(
      flow = %self.name,
      predecessors = ?self.frontier,
      steps = ?frontier,
      "steps attached"
    );

    self.frontier = frontier;
    self
  }

  /// Apply `f` when `predicate` holds for the build-time context.
  ///
  /// When the predicate is false the builder is returned unchanged and a
  /// following [`otherwise`](Self::otherwise) applies its continuation.
  pub fn if_then<P, F>(self, predicate: P, f: F) -> Self
  where
    P: FnOnce(&Context) -> bool,
    F: FnOnce(Self) -> Self,
  {
    self.try_if_then(|ctx| Ok::<_, Infallible>(predicate(ctx)), f)
  }

  /// Like [`if_then`](Self::if_then) with a fallible predicate.
  ///
  /// A predicate error is recorded as [`BuildError::Predicate`].
  pub fn try_if_then<P, E, F>(mut self, predicate: P, f: F) -> Self
  where
    P: FnOnce(&Context) -> Result<bool, E>,
    E: Into<ActionError>,
    F: FnOnce(Self) -> Self,
  {
    if self.error.is_some() {
      return self;
    }
    self.branch = None;

    match predicate(&self.context) {
      Ok(true) => {
        debug!(flow = %self.name, "if_then branch selected");
        let mut builder = f(self);
        builder.branch = Some(true);
        builder
      }
      Ok(false) => {
        debug!(flow = %self.name, "if_then branch skipped");
        self.branch = Some(false);
        self
      }
      Err(e) => self.fail(BuildError::Predicate { source: e.into() }),
    }
  }

  /// Apply `f` when the directly preceding `if_then` predicate was false.
  pub fn otherwise<F>(mut self, f: F) -> Self
  where
    F: FnOnce(Self) -> Self,
  {
    if self.error.is_some() {
      return self;
    }

    match self.branch.take() {
      Some(false) => f(self),
      Some(true) => self,
      None => self.fail(BuildError::OtherwiseWithoutIfThen),
    }
  }

  /// Append a join step that waits on the named steps.
  pub fn after(self, names: impl JoinNames, step: impl Into<Step>) -> Self {
    self.after_all(names, [step.into()])
  }

  /// Append several join steps, each waiting on the named steps.
  pub fn after_all(self, names: impl JoinNames, steps: impl IntoIterator<Item = Step>) -> Self {
    self.position_after(names).then_all(steps)
  }

  /// Position the builder after the named steps and continue with `f`.
  ///
  /// The first steps `f` attaches become joins on the named steps.
  pub fn after_with<F>(self, names: impl JoinNames, f: F) -> Self
  where
    F: FnOnce(Self) -> Self,
  {
    let builder = self.position_after(names);
    if builder.error.is_some() {
      return builder;
    }
    f(builder)
  }

  /// Finish the graph.
  pub fn build(mut self) -> Result<Flow, BuildError> {
    if let Some(e) = self.error {
      return Err(e);
    }
    self.graph.set_terminals(self.frontier);
    Ok(Flow::new(self.name, self.graph, self.context, self.notifier))
  }

  /// Build the flow and run it, seeding the context with `entries`.
  ///
  /// `entries` are visible to actions only. Branch predicates have already
  /// been evaluated against the builder's context by the time the flow
  /// runs, so values that select a branch belong in
  /// [`with_context`](Self::with_context).
  pub async fn start(self, entries: impl Into<Context>) -> Result<FlowResult, FlowError> {
    let flow = self.build()?;
    flow.run(entries).await
  }

  fn position_after(mut self, names: impl JoinNames) -> Self {
    if self.error.is_some() {
      return self;
    }
    self.branch = None;

    let mut names = names.into_names();
    let mut seen = HashSet::new();
    names.retain(|name| seen.insert(name.clone()));
    if names.is_empty() {
      return self.fail(BuildError::EmptyJoin);
    }

    let mut ids = Vec::with_capacity(names.len());
    for name in &names {
      match self.graph.lookup(name) {
        Some(id) if !ids.contains(&id) => ids.push(id),
        Some(_) => {}
        None => return self.fail(BuildError::UnknownStep { name: name.clone() }),
      }
    }

    self.frontier = ids;
    self.pending_joins = names;
    self
  }

  fn fail(mut self, error: BuildError) -> Self {
    debug!(flow = %self.name, error = %error, "flow build failed");
    if self.error.is_none() {
      self.error = Some(error);
    }
    self
  }
}
