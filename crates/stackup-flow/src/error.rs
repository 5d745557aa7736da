//! Error types for building and running flows.

use thiserror::Error;

use crate::action::ActionError;

/// A malformed graph, detected while the flow is being declared.
#[derive(Debug, Error)]
pub enum BuildError {
  /// Two steps were given the same symbolic name.
  #[error("duplicate step name: {name}")]
  DuplicateName { name: String },

  /// A join referenced a name that no earlier step carries.
  #[error("join references unknown step: {name}")]
  UnknownStep { name: String },

  /// A join was declared without any predecessor names.
  #[error("join requires at least one step name")]
  EmptyJoin,

  /// A `then_all` call received no steps.
  #[error("then requires at least one step")]
  EmptyThen,

  /// `otherwise` did not directly follow an `if_then`.
  #[error("otherwise must directly follow if_then")]
  OtherwiseWithoutIfThen,

  /// A branch predicate failed while being evaluated.
  #[error("branch predicate failed: {source}")]
  Predicate {
    #[source]
    source: ActionError,
  },

  /// A step listed a predecessor that was not created before it.
  #[error("step {step} lists invalid predecessor {predecessor}")]
  InvalidPredecessor { step: usize, predecessor: usize },
}

/// Errors returned by a flow run.
#[derive(Debug, Error)]
pub enum FlowError {
  /// The graph could not be built.
  #[error("invalid flow: {0}")]
  Build(#[from] BuildError),

  /// A step's action failed. The run stops scheduling at this point.
  #[error("step '{step}' ({action}) failed: {source}")]
  Action {
    step: String,
    action: String,
    #[source]
    source: ActionError,
  },

  /// Steps remain but none can become ready.
  #[error("flow stalled with {remaining} unexecuted steps")]
  Stalled { remaining: usize },
}

impl FlowError {
  /// The underlying action error, if this run failed inside an action.
  pub fn action_error(&self) -> Option<&ActionError> {
    match self {
      FlowError::Action { source, .. } => Some(source),
      _ => None,
    }
  }
}

/// Errors raised while reading or seeding a [`Context`](crate::Context).
#[derive(Debug, Error)]
pub enum ContextError {
  /// Seed value was not a JSON object.
  #[error("context seed must be a JSON object, got {kind}")]
  NotAnObject { kind: &'static str },

  /// A stored value did not deserialize into the requested type.
  #[error("context value '{key}' has unexpected shape: {source}")]
  Decode {
    key: String,
    #[source]
    source: serde_json::Error,
  },
}
