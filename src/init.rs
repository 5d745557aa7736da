//! The `stackup init` provisioning workflow.
//!
//! ```text
//! project_dir ─┬─ services_dir ── service_<name>... ── stack ─┐
//!              │  (or, with no services: stack = [])          ├─ config
//! description ─┴──────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde_json::json;
use stackup_actions::{ActionArgs, ActionRegistry, Project, RegistryError};
use stackup_flow::{ExecutionNotifier, FlowBuilder, Step};

/// Written to `stackup.toml` once every question is answered.
const CONFIG_TEMPLATE: &str = r#"[project]
name = {{ project.name | toml }}
description = {{ description | toml }}

[stack]
services = {{ stack | toml }}
"#;

/// Build the init flow from actions in `registry`.
///
/// The service branch is chosen from the `services` entry of the build
/// context, which mirrors `project.services`.
pub fn flow(
  registry: &ActionRegistry,
  args: &ActionArgs,
  notifier: Arc<dyn ExecutionNotifier>,
) -> Result<FlowBuilder, RegistryError> {
  let project: &Project = &args.project;

  let project_dir = registry.create("create_directory", &args.with_params(json!({"path": "."})))?;
  let description = registry.create(
    "ask",
    &args.with_params(json!({
      "key": "description",
      "question": "Project description",
      "default": format!("The {} project", project.name),
    })),
  )?;

  let services_dir =
    registry.create("create_directory", &args.with_params(json!({"path": "services"})))?;
  let service_dirs = project
    .services
    .iter()
    .map(|service| -> Result<Step, RegistryError> {
      let path = format!("services/{service}");
      let action = registry.create("create_directory", &args.with_params(json!({"path": path})))?;
      Ok(Step::named(format!("service_{service}"), action))
    })
    .collect::<Result<Vec<_>, _>>()?;
  let stack = registry.create("constant", &args.with_params(json!({"value": project.services})))?;
  let empty_stack = registry.create("constant", &args.with_params(json!({"value": []})))?;

  let config = registry.create(
    "write_template",
    &args.with_params(json!({"path": "stackup.toml", "template": CONFIG_TEMPLATE})),
  )?;

  let builder = FlowBuilder::with_context("init", [("services", json!(project.services))])
    .notifier(notifier)
    .then_all([
      Step::named("project_dir", project_dir),
      Step::named("description", description),
    ])
    .if_then(
      |ctx| {
        ctx
          .get("services")
          .and_then(|s| s.as_array())
          .is_some_and(|s| !s.is_empty())
      },
      |b| {
        b.after("project_dir", Step::named("services_dir", services_dir))
          .then_all(service_dirs)
          .then(Step::named("stack", stack))
      },
    )
    .otherwise(|b| b.after("project_dir", Step::named("stack", empty_stack)))
    .after(
      ["project_dir", "description", "stack"],
      Step::named("config", config),
    );

  Ok(builder)
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;
  use std::path::Path;

  use stackup_actions::PresetPrompter;
  use stackup_flow::{Context, NoopNotifier, StepKind};

  use super::*;

  fn args(root: &Path, services: &[&str], description: &str) -> ActionArgs {
    let project = Project::new("demo", root).with_services(services.iter().copied());
    let answers = HashMap::from([("description".to_string(), description.to_string())]);
    ActionArgs::new(
      Arc::new(project),
      Arc::new(PresetPrompter::new(answers)),
      json!({}),
    )
  }

  fn read_config(root: &Path) -> toml::Table {
    let config = std::fs::read_to_string(root.join("stackup.toml")).unwrap();
    toml::from_str(&config).unwrap()
  }

  #[test]
  fn test_config_joins_on_stack_and_answers() {
    let registry = ActionRegistry::with_builtins();
    let args = args(Path::new("/work/demo"), &[], "A demo");
    let flow = flow(&registry, &args, Arc::new(NoopNotifier))
      .unwrap()
      .build()
      .unwrap();

    let config = flow.graph().lookup("config").unwrap();
    let node = flow.graph().step(config).unwrap();
    assert_eq!(node.kind(), StepKind::Join);
    assert_eq!(node.joins(), ["project_dir", "description", "stack"]);
    assert!(flow.graph().lookup("services_dir").is_none());
  }

  #[tokio::test]
  async fn test_init_writes_config_with_services() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("demo");
    let registry = ActionRegistry::with_builtins();

    let args = args(&root, &["api", "worker"], "A demo");

    let result = flow(&registry, &args, Arc::new(NoopNotifier))
      .unwrap()
      .start(Context::new())
      .await
      .unwrap();

    assert!(root.join("services/api").is_dir());
    assert!(root.join("services/worker").is_dir());
    assert_eq!(result.context.get("stack"), Some(&json!(["api", "worker"])));

    let config = read_config(&root);
    assert_eq!(config["project"]["name"].as_str(), Some("demo"));
    assert_eq!(config["project"]["description"].as_str(), Some("A demo"));
    assert_eq!(
      config["stack"]["services"],
      toml::Value::Array(vec!["api".into(), "worker".into()])
    );
  }

  #[tokio::test]
  async fn test_init_without_services_records_empty_stack() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("demo");
    let registry = ActionRegistry::with_builtins();

    let args = args(&root, &[], "A demo");

    let result = flow(&registry, &args, Arc::new(NoopNotifier))
      .unwrap()
      .start(Context::new())
      .await
      .unwrap();

    assert_eq!(result.context.get("stack"), Some(&json!([])));
    assert!(root.is_dir());
    assert!(!root.join("services").exists());

    let config = read_config(&root);
    assert_eq!(config["stack"]["services"], toml::Value::Array(vec![]));
  }

  #[tokio::test]
  async fn test_init_config_stays_valid_with_quoted_description() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("demo");
    let registry = ActionRegistry::with_builtins();

    let args = args(&root, &["api"], r#"say "hi""#);

    flow(&registry, &args, Arc::new(NoopNotifier))
      .unwrap()
      .start(Context::new())
      .await
      .unwrap();

    let config = read_config(&root);
    assert_eq!(config["project"]["description"].as_str(), Some(r#"say "hi""#));
  }
}
