//! Template rendering using minijinja.
//!
//! Templates are rendered against the flow context, with the project
//! available under `project`. The `toml` filter writes a value as a TOML
//! literal, quoting and escaping strings:
//!
//! ```text
//! [project]
//! name = {{ project.name | toml }}
//! services = {{ stack | toml }}
//! ```

use minijinja::{Environment, ErrorKind, UndefinedBehavior, Value};
use serde::Serialize;
use stackup_flow::Context;

use crate::error::ProvisionError;
use crate::project::Project;

/// Variables a template sees. `project` shadows a context entry of the
/// same name.
#[derive(Serialize)]
struct TemplateData<'a> {
  #[serde(flatten)]
  context: &'a Context,
  project: &'a Project,
}

/// Render `template` against `ctx` and `project`.
///
/// Undefined variables are errors rather than empty strings, so a missing
/// answer cannot silently produce a half-written config file.
pub fn render(
  name: &str,
  template: &str,
  ctx: &Context,
  project: &Project,
) -> Result<String, ProvisionError> {
  let mut env = Environment::new();
  env.set_undefined_behavior(UndefinedBehavior::Strict);
  env.set_keep_trailing_newline(true);
  env.add_filter("toml", toml_literal);

  let data = TemplateData {
    context: ctx,
    project,
  };

  env
    .render_str(template, Value::from_serialize(&data))
    .map_err(|e| ProvisionError::Template {
      name: name.to_string(),
      source: e,
    })
}

fn toml_literal(value: Value) -> Result<String, minijinja::Error> {
  let literal = toml::Value::try_from(&value).map_err(|e| {
    minijinja::Error::new(
      ErrorKind::InvalidOperation,
      format!("value cannot be written as TOML: {e}"),
    )
  })?;
  Ok(literal.to_string())
}
