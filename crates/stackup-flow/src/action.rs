//! The unit of work a step runs.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;

/// Error type returned by actions.
///
/// Actions are implemented outside this crate and fail with their own
/// error types, so the engine carries them boxed.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An action shared between the graph and in-flight step futures.
pub type SharedAction = Arc<dyn Action>;

/// An independently implemented unit of work.
///
/// Any arguments an action needs besides the context (the project it
/// provisions, a path, a prompt) are fields of the implementing type and
/// are fixed when the action is constructed.
#[async_trait]
pub trait Action: Send + Sync {
  /// Name used in logs and execution events.
  fn name(&self) -> &str;

  /// Run the action against a snapshot of the flow context.
  async fn execute(&self, ctx: Context) -> Result<serde_json::Value, ActionError>;
}

#[async_trait]
impl<A: Action + ?Sized> Action for Arc<A> {
  fn name(&self) -> &str {
    (**self).name()
  }

  async fn execute(&self, ctx: Context) -> Result<serde_json::Value, ActionError> {
    (**self).execute(ctx).await
  }
}

/// An action backed by an async closure.
pub struct FnAction<F> {
  name: String,
  f: F,
}

impl<F> fmt::Debug for FnAction<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FnAction").field("name", &self.name).finish()
  }
}

#[async_trait]
impl<F, Fut> Action for FnAction<F>
where
  F: Fn(Context) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<serde_json::Value, ActionError>> + Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn execute(&self, ctx: Context) -> Result<serde_json::Value, ActionError> {
    (self.f)(ctx).await
  }
}

/// Wrap an async closure as an [`Action`].
pub fn action_fn<F, Fut>(name: impl Into<String>, f: F) -> FnAction<F>
where
  F: Fn(Context) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<serde_json::Value, ActionError>> + Send + 'static,
{
  FnAction {
    name: name.into(),
    f,
  }
}

/// An action that always yields the same value.
#[derive(Debug, Clone)]
pub struct Constant {
  name: String,
  value: serde_json::Value,
}

#[async_trait]
impl Action for Constant {
  fn name(&self) -> &str {
    &self.name
  }

  async fn execute(&self, _ctx: Context) -> Result<serde_json::Value, ActionError> {
    Ok(self.value.clone())
  }
}

/// An action that always yields `value`.
pub fn constant(name: impl Into<String>, value: serde_json::Value) -> Constant {
  Constant {
    name: name.into(),
    value,
  }
}
