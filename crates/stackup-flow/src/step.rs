//! Step arguments and graph vertices.

use std::fmt;
use std::sync::Arc;

use crate::action::{Action, SharedAction};

/// A step as passed to the builder: a bare action, or an action whose
/// result is published into the context under a name.
#[derive(Clone)]
pub enum Step {
  Bare(SharedAction),
  Named(String, SharedAction),
}

impl Step {
  pub fn bare(action: impl Action + 'static) -> Self {
    Step::Bare(Arc::new(action))
  }

  pub fn named(name: impl Into<String>, action: impl Action + 'static) -> Self {
    Step::Named(name.into(), Arc::new(action))
  }

  pub fn name(&self) -> Option<&str> {
    match self {
      Step::Bare(_) => None,
      Step::Named(name, _) => Some(name),
    }
  }

  pub(crate) fn into_parts(self) -> (Option<String>, SharedAction) {
    match self {
      Step::Bare(action) => (None, action),
      Step::Named(name, action) => (Some(name), action),
    }
  }
}

impl fmt::Debug for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Step::Bare(action) => f.debug_tuple("Bare").field(&action.name()).finish(),
      Step::Named(name, action) => f
        .debug_tuple("Named")
        .field(name)
        .field(&action.name())
        .finish(),
    }
  }
}

impl<A: Action + 'static> From<A> for Step {
  fn from(action: A) -> Self {
    Step::bare(action)
  }
}

/// Index of a step in its graph. Assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub(crate) usize);

impl StepId {
  pub fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for StepId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// How a step was attached to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
  /// Attached to the frontier, result not published.
  Sequential,
  /// Attached to the frontier, result published under its name.
  Named,
  /// Attached to an explicit list of named steps.
  Join,
}

/// A vertex of the step graph.
#[derive(Clone)]
pub struct StepNode {
  pub(crate) id: StepId,
  pub(crate) name: Option<String>,
  pub(crate) action: SharedAction,
  pub(crate) predecessors: Vec<StepId>,
  pub(crate) joins: Vec<String>,
}

impl StepNode {
  pub fn id(&self) -> StepId {
    self.id
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn action(&self) -> &SharedAction {
    &self.action
  }

  pub fn predecessors(&self) -> &[StepId] {
    &self.predecessors
  }

  /// Names this step joins on; empty unless it was created by `after`.
  pub fn joins(&self) -> &[String] {
    &self.joins
  }

  pub fn kind(&self) -> StepKind {
    if !self.joins.is_empty() {
      StepKind::Join
    } else if self.name.is_some() {
      StepKind::Named
    } else {
      StepKind::Sequential
    }
  }

  /// Label used in logs: the step name, or the action name and id.
  pub fn label(&self) -> String {
    match &self.name {
      Some(name) => name.clone(),
      None => format!("{}{}", self.action.name(), self.id),
    }
  }
}

impl fmt::Debug for StepNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StepNode")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("action", &self.action.name())
      .field("predecessors", &self.predecessors)
      .field("joins", &self.joins)
      .finish()
  }
}
