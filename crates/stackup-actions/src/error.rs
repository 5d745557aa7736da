use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while looking up or constructing actions.
#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("action '{id}' is already registered")]
  AlreadyRegistered { id: String },

  #[error("action '{id}' is not registered")]
  NotFound { id: String },

  #[error("invalid arguments for action '{id}': {message}")]
  InvalidArguments { id: String, message: String },
}

/// Errors raised by the built-in provisioning actions.
#[derive(Debug, Error)]
pub enum ProvisionError {
  #[error("i/o error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to render template '{name}': {source}")]
  Template {
    name: String,
    #[source]
    source: minijinja::Error,
  },

  #[error("no answer for '{key}' and no default")]
  MissingAnswer { key: String },

  #[error("prompt failed for '{key}': {message}")]
  Prompt { key: String, message: String },

  #[error("path '{path}' escapes the project root")]
  OutsideRoot { path: PathBuf },
}
