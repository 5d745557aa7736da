use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// The project being provisioned.
///
/// Shared by every action of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  pub name: String,
  pub root: PathBuf,
  #[serde(default)]
  pub services: Vec<String>,
}

impl Project {
  pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      root: root.into(),
      services: Vec::new(),
    }
  }

  pub fn with_services<I, S>(mut self, services: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.services = services.into_iter().map(Into::into).collect();
    self
  }

  /// Resolve a project-relative path.
  ///
  /// Absolute paths and `..` components are rejected so actions never
  /// write outside the project root. `.` components are dropped, so `"."`
  /// resolves to the root itself.
  pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf, ProvisionError> {
    let relative = relative.as_ref();
    let mut resolved = self.root.clone();

    for component in relative.components() {
      match component {
        Component::Normal(part) => resolved.push(part),
        Component::CurDir => {}
        Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
          return Err(ProvisionError::OutsideRoot {
            path: relative.to_path_buf(),
          });
        }
      }
    }

    Ok(resolved)
  }
}
