//! Execution events and notifiers for observability.
//!
//! Events are emitted while a flow runs so callers can render progress,
//! record a transcript, or ignore them entirely.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  /// The run has started.
  FlowStarted {
    execution_id: String,
    flow: String,
    steps: usize,
  },

  /// A step's action has been invoked.
  StepStarted {
    execution_id: String,
    step: String,
    action: String,
  },

  /// A step's action returned a value.
  StepCompleted {
    execution_id: String,
    step: String,
    output: serde_json::Value,
  },

  /// A step's action failed.
  StepFailed {
    execution_id: String,
    step: String,
    error: String,
  },

  /// Every step completed.
  FlowCompleted { execution_id: String },

  /// The run stopped on an error.
  FlowFailed { execution_id: String, error: String },
}

/// Receives execution events.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never holds up the executor; volume is a
  // handful of events per step.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier along with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
