//! Configuration questions.
//!
//! An [`Ask`] step publishes one answer. Answers come from a [`Prompter`]:
//! the terminal for interactive runs, or a preset map for `--yes` and
//! scripted runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use stackup_flow::{Action, ActionError, Context};
use tracing::debug;

use crate::error::ProvisionError;

/// Source of answers to configuration questions.
///
/// Implementations may block; [`Ask`] calls them off the async executor.
pub trait Prompter: Send + Sync {
  fn ask(
    &self,
    key: &str,
    question: &str,
    default: Option<&str>,
  ) -> Result<String, ProvisionError>;
}

/// Asks on the terminal with dialoguer.
#[derive(Debug, Clone, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
  fn ask(
    &self,
    key: &str,
    question: &str,
    default: Option<&str>,
  ) -> Result<String, ProvisionError> {
    let mut input = dialoguer::Input::<String>::new().with_prompt(question);
    if let Some(default) = default {
      input = input.default(default.to_string());
    }
    input.interact_text().map_err(|e| ProvisionError::Prompt {
      key: key.to_string(),
      message: e.to_string(),
    })
  }
}

/// Answers from a fixed map, falling back to the question's default.
#[derive(Debug, Clone, Default)]
pub struct PresetPrompter {
  answers: HashMap<String, String>,
}

impl PresetPrompter {
  pub fn new(answers: HashMap<String, String>) -> Self {
    Self { answers }
  }
}

impl Prompter for PresetPrompter {
  fn ask(
    &self,
    key: &str,
    _question: &str,
    default: Option<&str>,
  ) -> Result<String, ProvisionError> {
    self
      .answers
      .get(key)
      .cloned()
      .or_else(|| default.map(str::to_string))
      .ok_or_else(|| ProvisionError::MissingAnswer {
        key: key.to_string(),
      })
  }
}

/// Asks one question and yields the answer as a string.
///
/// If the context already holds a string under `key` (seeded by the
/// caller), that value is used and the prompter is not consulted.
#[derive(Clone)]
pub struct Ask {
  prompter: Arc<dyn Prompter>,
  key: String,
  question: String,
  default: Option<String>,
}

impl Ask {
  pub fn new(
    prompter: Arc<dyn Prompter>,
    key: impl Into<String>,
    question: impl Into<String>,
  ) -> Self {
    Self {
      prompter,
      key: key.into(),
      question: question.into(),
      default: None,
    }
  }

  pub fn with_default(mut self, default: impl Into<String>) -> Self {
    self.default = Some(default.into());
    self
  }
}

impl std::fmt::Debug for Ask {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Ask")
      .field("key", &self.key)
      .field("question", &self.question)
      .field("default", &self.default)
      .finish()
  }
}

#[async_trait]
impl Action for Ask {
  fn name(&self) -> &str {
    "ask"
  }

  async fn execute(&self, ctx: Context) -> Result<serde_json::Value, ActionError> {
    if let Some(serde_json::Value::String(answer)) = ctx.get(&self.key) {
      debug!(key = %self.key, "answer taken from context");
      return Ok(serde_json::Value::String(answer.clone()));
    }

    let prompter = Arc::clone(&self.prompter);
    let key = self.key.clone();
    let question = self.question.clone();
    let default = self.default.clone();

    let answer = tokio::task::spawn_blocking(move || {
      prompter.ask(&key, &question, default.as_deref())
    })
    .await
    .map_err(|e| ProvisionError::Prompt {
      key: self.key.clone(),
      message: e.to_string(),
    })??;

    Ok(serde_json::Value::String(answer))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn preset(pairs: &[(&str, &str)]) -> Arc<dyn Prompter> {
    Arc::new(PresetPrompter::new(
      pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    ))
  }

  #[tokio::test]
  async fn test_ask_uses_preset_answer() {
    let ask = Ask::new(preset(&[("description", "My app")]), "description", "Describe it");
    let out = ask.execute(Context::new()).await.unwrap();
    assert_eq!(out, json!("My app"));
  }

  #[tokio::test]
  async fn test_ask_falls_back_to_default() {
    let ask = Ask::new(preset(&[]), "description", "Describe it").with_default("Default app");
    let out = ask.execute(Context::new()).await.unwrap();
    assert_eq!(out, json!("Default app"));
  }

  #[tokio::test]
  async fn test_ask_without_answer_or_default_fails() {
    let ask = Ask::new(preset(&[]), "description", "Describe it");
    let err = ask.execute(Context::new()).await.unwrap_err();
    assert!(matches!(
      err.downcast_ref::<ProvisionError>(),
      Some(ProvisionError::MissingAnswer { key }) if key == "description"
    ));
  }

  #[tokio::test]
  async fn test_ask_prefers_seeded_context_value() {
    let ask = Ask::new(preset(&[("description", "from prompter")]), "description", "?");
    let ctx = Context::from([("description", json!("from context"))]);
    assert_eq!(ask.execute(ctx).await.unwrap(), json!("from context"));
  }
}
