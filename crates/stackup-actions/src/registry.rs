//! Action registry.
//!
//! Flows refer to actions by identifier. Each identifier maps to a factory
//! that builds the action from its [`ActionArgs`]. Factories are registered
//! once at startup; [`ActionRegistry::with_builtins`] registers the actions
//! this crate ships.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use stackup_flow::{SharedAction, constant};

use crate::error::RegistryError;
use crate::fs::{CreateDirectory, WriteTemplate};
use crate::project::Project;
use crate::prompt::{Ask, Prompter};

/// Builds an action from its arguments.
pub type ActionFactory =
  Arc<dyn Fn(&ActionArgs) -> Result<SharedAction, RegistryError> + Send + Sync>;

/// Everything an action is constructed with.
#[derive(Clone)]
pub struct ActionArgs {
  /// Identifier being constructed; filled in by the registry.
  id: String,
  pub project: Arc<Project>,
  pub prompter: Arc<dyn Prompter>,
  /// Per-action parameters.
  pub params: serde_json::Map<String, serde_json::Value>,
}

impl ActionArgs {
  /// Create arguments. Non-object `params` are treated as empty.
  pub fn new(
    project: Arc<Project>,
    prompter: Arc<dyn Prompter>,
    params: serde_json::Value,
  ) -> Self {
    let params = match params {
      serde_json::Value::Object(map) => map,
      _ => serde_json::Map::new(),
    };
    Self {
      id: String::new(),
      project,
      prompter,
      params,
    }
  }

  /// Same dependencies, different parameters.
  pub fn with_params(&self, params: serde_json::Value) -> Self {
    Self::new(self.project.clone(), self.prompter.clone(), params)
  }

  /// A required string parameter.
  pub fn str_param(&self, key: &str) -> Result<&str, RegistryError> {
    self
      .params
      .get(key)
      .and_then(|v| v.as_str())
      .ok_or_else(|| self.invalid(format!("missing string parameter '{key}'")))
  }

  /// An optional string parameter.
  pub fn opt_str_param(&self, key: &str) -> Result<Option<&str>, RegistryError> {
    match self.params.get(key) {
      None | Some(serde_json::Value::Null) => Ok(None),
      Some(serde_json::Value::String(s)) => Ok(Some(s)),
      Some(_) => Err(self.invalid(format!("parameter '{key}' must be a string"))),
    }
  }

  /// A required parameter of any JSON type.
  pub fn value_param(&self, key: &str) -> Result<&serde_json::Value, RegistryError> {
    self
      .params
      .get(key)
      .ok_or_else(|| self.invalid(format!("missing parameter '{key}'")))
  }

  fn invalid(&self, message: String) -> RegistryError {
    RegistryError::InvalidArguments {
      id: self.id.clone(),
      message,
    }
  }
}

impl fmt::Debug for ActionArgs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ActionArgs")
      .field("id", &self.id)
      .field("project", &self.project)
      .field("params", &self.params)
      .finish()
  }
}

/// Maps action identifiers to factories.
#[derive(Clone, Default)]
pub struct ActionRegistry {
  factories: HashMap<String, ActionFactory>,
}

impl ActionRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a registry with the built-in actions registered.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    registry.register_builtins();
    registry
  }

  /// Register a factory under `id`.
  pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> Result<(), RegistryError>
  where
    F: Fn(&ActionArgs) -> Result<SharedAction, RegistryError> + Send + Sync + 'static,
  {
    let id = id.into();
    if self.factories.contains_key(&id) {
      return Err(RegistryError::AlreadyRegistered { id });
    }
    self.factories.insert(id, Arc::new(factory));
    Ok(())
  }

  /// Build the action registered under `id`.
  pub fn create(&self, id: &str, args: &ActionArgs) -> Result<SharedAction, RegistryError> {
    let factory = self
      .factories
      .get(id)
      .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;

    let mut args = args.clone();
    args.id = id.to_string();
    factory(&args)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.factories.contains_key(id)
  }

  /// Registered identifiers, sorted.
  pub fn ids(&self) -> Vec<&str> {
    let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
    ids.sort_unstable();
    ids
  }

  fn register_builtins(&mut self) {
    let builtins: [(&str, ActionFactory); 4] = [
      (
        "create_directory",
        Arc::new(|args: &ActionArgs| -> Result<SharedAction, RegistryError> {
          let path = args.str_param("path")?;
          Ok(Arc::new(CreateDirectory::new(args.project.clone(), path)) as SharedAction)
        }),
      ),
      (
        "write_template",
        Arc::new(|args: &ActionArgs| -> Result<SharedAction, RegistryError> {
          let path = args.str_param("path")?;
          let template = args.str_param("template")?;
          Ok(Arc::new(WriteTemplate::new(args.project.clone(), path, template)) as SharedAction)
        }),
      ),
      (
        "ask",
        Arc::new(|args: &ActionArgs| -> Result<SharedAction, RegistryError> {
          let mut ask = Ask::new(
            args.prompter.clone(),
            args.str_param("key")?,
            args.str_param("question")?,
          );
          if let Some(default) = args.opt_str_param("default")? {
            ask = ask.with_default(default);
          }
          Ok(Arc::new(ask) as SharedAction)
        }),
      ),
      (
        "constant",
        Arc::new(|args: &ActionArgs| -> Result<SharedAction, RegistryError> {
          let value = args.value_param("value")?.clone();
          Ok(Arc::new(constant("constant", value)) as SharedAction)
        }),
      ),
    ];

    for (id, factory) in builtins {
      self.factories.insert(id.to_string(), factory);
    }
  }
}

impl fmt::Debug for ActionRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ActionRegistry")
      .field("ids", &self.ids())
      .finish()
  }
}
