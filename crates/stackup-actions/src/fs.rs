//! Filesystem actions.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use stackup_flow::{Action, ActionError, Context};
use tokio::fs;
use tracing::debug;

use crate::error::ProvisionError;
use crate::project::Project;
use crate::template::render;

/// Creates a directory (and its parents) inside the project root.
///
/// Yields the absolute path of the directory.
#[derive(Debug, Clone)]
pub struct CreateDirectory {
  project: Arc<Project>,
  path: PathBuf,
}

impl CreateDirectory {
  pub fn new(project: Arc<Project>, path: impl Into<PathBuf>) -> Self {
    Self {
      project,
      path: path.into(),
    }
  }
}

#[async_trait]
impl Action for CreateDirectory {
  fn name(&self) -> &str {
    "create_directory"
  }

  async fn execute(&self, _ctx: Context) -> Result<serde_json::Value, ActionError> {
    let dir = self.project.resolve(&self.path)?;
    fs::create_dir_all(&dir)
      .await
      .map_err(|source| ProvisionError::Io {
        path: dir.clone(),
        source,
      })?;

    debug!(path = %dir.display(), "directory created");
    Ok(serde_json::Value::String(dir.display().to_string()))
  }
}

/// Renders a template against the context and writes it into the project.
///
/// Parent directories are created as needed. Yields the absolute path of
/// the written file.
#[derive(Debug, Clone)]
pub struct WriteTemplate {
  project: Arc<Project>,
  path: PathBuf,
  template: String,
}

impl WriteTemplate {
  pub fn new(project: Arc<Project>, path: impl Into<PathBuf>, template: impl Into<String>) -> Self {
    Self {
      project,
      path: path.into(),
      template: template.into(),
    }
  }
}

#[async_trait]
impl Action for WriteTemplate {
  fn name(&self) -> &str {
    "write_template"
  }

  async fn execute(&self, ctx: Context) -> Result<serde_json::Value, ActionError> {
    let file = self.project.resolve(&self.path)?;
    let contents = render(
      &self.path.display().to_string(),
      &self.template,
      &ctx,
      &self.project,
    )?;

    if let Some(parent) = file.parent() {
      fs::create_dir_all(parent)
        .await
        .map_err(|source| ProvisionError::Io {
          path: parent.to_path_buf(),
          source,
        })?;
    }
    fs::write(&file, contents)
      .await
      .map_err(|source| ProvisionError::Io {
        path: file.clone(),
        source,
      })?;

    debug!(path = %file.display(), "file written");
    Ok(serde_json::Value::String(file.display().to_string()))
  }
}
