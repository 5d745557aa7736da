use std::collections::HashMap;

use crate::action::SharedAction;
use crate::error::BuildError;
use crate::step::{StepId, StepNode};

/// Step graph for traversal and scheduling.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  /// Steps in creation order; a step's id is its index.
  steps: Vec<StepNode>,
  /// Adjacency list: step -> steps that list it as a predecessor.
  successors: Vec<Vec<StepId>>,
  /// Symbolic name -> step.
  names: HashMap<String, StepId>,
  /// The builder frontier at the time the graph was finished.
  terminals: Vec<StepId>,
}

impl Graph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a step.
  ///
  /// Predecessors must already be in the graph, which keeps it acyclic.
  pub(crate) fn push(
    &mut self,
    name: Option<String>,
    action: SharedAction,
    predecessors: Vec<StepId>,
    joins: Vec<String>,
  ) -> Result<StepId, BuildError> {
    let id = StepId(self.steps.len());

    if let Some(name) = &name
      && self.names.contains_key(name)
    {
      return Err(BuildError::DuplicateName { name: name.clone() });
    }

    if let Some(bad) = predecessors.iter().find(|p| p.0 >= id.0) {
      return Err(BuildError::InvalidPredecessor {
        step: id.0,
        predecessor: bad.0,
      });
    }

    for pred in &predecessors {
      self.successors[pred.0].push(id);
    }
    if let Some(name) = &name {
      self.names.insert(name.clone(), id);
    }

    self.successors.push(Vec::new());
    self.steps.push(StepNode {
      id,
      name,
      action,
      predecessors,
      joins,
    });

    Ok(id)
  }

  pub(crate) fn set_terminals(&mut self, terminals: Vec<StepId>) {
    self.terminals = terminals;
  }

  pub fn steps(&self) -> &[StepNode] {
    &self.steps
  }

  pub fn step(&self, id: StepId) -> Option<&StepNode> {
    self.steps.get(id.0)
  }

  /// Find a named step.
  pub fn lookup(&self, name: &str) -> Option<StepId> {
    self.names.get(name).copied()
  }

  /// Steps that list `id` as a predecessor.
  pub fn successors(&self, id: StepId) -> &[StepId] {
    self
      .successors
      .get(id.0)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Steps with no predecessors; ready as soon as a run starts.
  pub fn entry_points(&self) -> Vec<StepId> {
    self
      .steps
      .iter()
      .filter(|s| s.predecessors.is_empty())
      .map(|s| s.id)
      .collect()
  }

  /// The steps whose results make up the run output.
  pub fn terminals(&self) -> &[StepId] {
    &self.terminals
  }

  /// Number of unmet predecessors per step, indexed by step id.
  pub fn in_degrees(&self) -> Vec<usize> {
    self.steps.iter().map(|s| s.predecessors.len()).collect()
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use serde_json::json;

  use super::*;
  use crate::action::constant;

  fn noop() -> SharedAction {
    Arc::new(constant("noop", json!(null)))
  }

  #[test]
  fn test_push_links_successors() {
    let mut graph = Graph::new();
    let a = graph.push(Some("a".into()), noop(), vec![], vec![]).unwrap();
    let b = graph.push(None, noop(), vec![a], vec![]).unwrap();
    let c = graph.push(None, noop(), vec![a], vec![]).unwrap();

    assert_eq!(graph.successors(a), &[b, c]);
    assert_eq!(graph.entry_points(), vec![a]);
    assert_eq!(graph.lookup("a"), Some(a));
    assert_eq!(graph.in_degrees(), vec![0, 1, 1]);
  }

  #[test]
  fn test_push_rejects_duplicate_name() {
    let mut graph = Graph::new();
    graph.push(Some("x".into()), noop(), vec![], vec![]).unwrap();

    let err = graph
      .push(Some("x".into()), noop(), vec![], vec![])
      .unwrap_err();
    assert!(matches!(err, BuildError::DuplicateName { name } if name == "x"));
    assert_eq!(graph.len(), 1);
  }

  #[test]
  fn test_push_rejects_forward_predecessor() {
    let mut graph = Graph::new();
    let err = graph.push(None, noop(), vec![StepId(0)], vec![]).unwrap_err();

    assert!(matches!(
      err,
      BuildError::InvalidPredecessor {
        step: 0,
        predecessor: 0
      }
    ));
    assert!(graph.is_empty());
  }
}
