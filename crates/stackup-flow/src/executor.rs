//! Flow execution.
//!
//! Steps are scheduled by in-degree: every step starts with a count of
//! unfinished predecessors, steps at zero are started, and each completion
//! decrements its successors. Started steps are polled together on the
//! calling task, so sibling actions interleave at their await points but
//! never run on separate threads.

use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::action::ActionError;
use crate::context::Context;
use crate::error::FlowError;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::graph::Graph;
use crate::step::StepId;

/// A started step, resolving to its id and the action's result.
type StepFuture = BoxFuture<'static, (StepId, Result<serde_json::Value, ActionError>)>;

/// Result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResult {
  /// Unique execution ID.
  pub execution_id: String,
  /// Context after every step was merged.
  pub context: Context,
  /// Output of the terminal steps: the single step's value, an array in
  /// frontier order when there are several, or null for an empty flow.
  pub output: serde_json::Value,
}

/// A built flow, ready to run.
pub struct Flow {
  name: String,
  graph: Graph,
  context: Context,
  notifier: Arc<dyn ExecutionNotifier>,
}

impl Flow {
  pub(crate) fn new(
    name: String,
    graph: Graph,
    context: Context,
    notifier: Arc<dyn ExecutionNotifier>,
  ) -> Self {
    Self {
      name,
      graph,
      context,
      notifier,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Entries the run context starts from, before `run` adds its own.
  pub fn context(&self) -> &Context {
    &self.context
  }

  /// Run every step once, seeding the context with `entries`.
  ///
  /// Fails with the first action error; steps that were already running
  /// are left to finish and their results are discarded.
  ///
  /// Branches were resolved when the flow was built; `entries` cannot
  /// change which steps run.
  pub async fn run(&self, entries: impl Into<Context>) -> Result<FlowResult, FlowError> {
    let execution_id = uuid::Uuid::new_v4().to_string();
    let mut context = self.context.clone();
    context.extend(entries.into());

    self.execute(execution_id, context).await
  }

  #[instrument(
    name = "flow_run",
    skip(self, context),
    fields(flow = %self.name)
  )]
  async fn execute(
    &self,
    execution_id: String,
    mut context: Context,
  ) -> Result<FlowResult, FlowError> {
    info!(
      execution_id = %execution_id,
      steps = self.graph.len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::FlowStarted {
      execution_id: execution_id.clone(),
      flow: self.name.clone(),
      steps: self.graph.len(),
    });

    let result = self.run_loop(&execution_id, &mut context).await;

    match result {
      Ok(output) => {
        info!(execution_id = %execution_id, "workflow_completed");
        self.notifier.notify(ExecutionEvent::FlowCompleted {
          execution_id: execution_id.clone(),
        });
        Ok(FlowResult {
          execution_id,
          context,
          output,
        })
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "workflow_failed");
        self.notifier.notify(ExecutionEvent::FlowFailed {
          execution_id,
          error: e.to_string(),
        });
        Err(e)
      }
    }
  }

  /// Run the scheduling loop until every step completed or one failed.
  async fn run_loop(
    &self,
    execution_id: &str,
    context: &mut Context,
  ) -> Result<serde_json::Value, FlowError> {
    let mut in_degree = self.graph.in_degrees();
    let mut outputs: Vec<Option<serde_json::Value>> = vec![None; self.graph.len()];
    let mut completed = 0;
    let mut in_flight: FuturesUnordered<StepFuture> = FuturesUnordered::new();

    for id in self.graph.entry_points() {
      in_flight.push(self.start_step(id, context, execution_id));
    }

    while let Some((id, result)) = in_flight.next().await {
      let step = &self.graph.steps()[id.index()];

      let output = match result {
        Ok(output) => output,
        Err(source) => {
          error!(
            execution_id = %execution_id,
            step = %step.label(),
            error = %source,
            "step_failed"
          );
          self.notifier.notify(ExecutionEvent::StepFailed {
            execution_id: execution_id.to_string(),
            step: step.label(),
            error: source.to_string(),
          });
          discard_in_flight(in_flight, execution_id);

          return Err(FlowError::Action {
            step: step.label(),
            action: step.action().name().to_string(),
            source,
          });
        }
      };

      info!(
        execution_id = %execution_id,
        step = %step.label(),
        output = %output,
        "step_completed"
      );
      self.notifier.notify(ExecutionEvent::StepCompleted {
        execution_id: execution_id.to_string(),
        step: step.label(),
        output: output.clone(),
      });

      if let Some(name) = step.name()
        && context.merge(name, output.clone()).is_some()
      {
        debug!(
          execution_id = %execution_id,
          step = %name,
          "step result replaced a seeded context entry"
        );
      }
      outputs[id.index()] = Some(output);
      completed += 1;

      for &next in self.graph.successors(id) {
        in_degree[next.index()] -= 1;
        if in_degree[next.index()] == 0 {
          in_flight.push(self.start_step(next, context, execution_id));
        }
      }
    }

    if completed != self.graph.len() {
      return Err(FlowError::Stalled {
        remaining: self.graph.len() - completed,
      });
    }

    let mut terminal: Vec<serde_json::Value> = self
      .graph
      .terminals()
      .iter()
      .map(|t| outputs[t.index()].take().unwrap_or(serde_json::Value::Null))
      .collect();

    Ok(match terminal.len() {
      0 => serde_json::Value::Null,
      1 => terminal.remove(0),
      _ => serde_json::Value::Array(terminal),
    })
  }

  /// Invoke a ready step's action against a snapshot of the context.
  fn start_step(&self, id: StepId, context: &Context, execution_id: &str) -> StepFuture {
    let step = &self.graph.steps()[id.index()];

    info!(
      execution_id = %execution_id,
      step = %step.label(),
      action = %step.action().name(),
      "step_started"
    );
    self.notifier.notify(ExecutionEvent::StepStarted {
      execution_id: execution_id.to_string(),
      step: step.label(),
      action: step.action().name().to_string(),
    });

    let action = Arc::clone(step.action());
    let snapshot = context.clone();

    Box::pin(async move {
      let result = action.execute(snapshot).await;
      (id, result)
    })
  }
}

/// Let steps that were running when the flow failed finish on their own.
///
/// Their results are dropped. Outside a tokio runtime they are dropped
/// immediately instead.
fn discard_in_flight(in_flight: FuturesUnordered<StepFuture>, execution_id: &str) {
  if in_flight.is_empty() {
    return;
  }

  let pending = in_flight.len();
  match tokio::runtime::Handle::try_current() {
    Ok(handle) => {
      warn!(
        execution_id = %execution_id,
        pending,
        "discarding results of in-flight steps"
      );
      handle.spawn(in_flight.for_each(|_| async {}));
    }
    Err(_) => {
      warn!(
        execution_id = %execution_id,
        pending,
        "no runtime to finish in-flight steps, dropping them"
      );
    }
  }
}
