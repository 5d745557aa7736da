//! Provisioning flows assembled from registry actions.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use stackup_actions::{ActionArgs, ActionRegistry, PresetPrompter, Project, ProvisionError};
use stackup_flow::{Context, FlowBuilder, FlowError, Step};

fn args(root: &std::path::Path, answers: &[(&str, &str)]) -> ActionArgs {
  let answers: HashMap<String, String> = answers
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
  ActionArgs::new(
    Arc::new(Project::new("demo", root)),
    Arc::new(PresetPrompter::new(answers)),
    json!({}),
  )
}

#[tokio::test]
async fn test_answers_flow_into_rendered_file() {
  let temp = tempfile::tempdir().unwrap();
  let registry = ActionRegistry::with_builtins();
  let args = args(temp.path(), &[("port", "5432")]);

  let create = |id: &str, params: serde_json::Value| {
    registry.create(id, &args.with_params(params)).unwrap()
  };

  let result = FlowBuilder::new("provision")
    .then_all([
      Step::named("db_dir", create("create_directory", json!({"path": "db"}))),
      Step::named(
        "port",
        create("ask", json!({"key": "port", "question": "Database port"})),
      ),
      Step::named(
        "user",
        create(
          "ask",
          json!({"key": "user", "question": "Database user", "default": "postgres"}),
        ),
      ),
    ])
    .after(
      ["db_dir", "port", "user"],
      Step::named(
        "env",
        create(
          "write_template",
          json!({
            "path": "db/.env",
            "template": "PGPORT={{ port }}\nPGUSER={{ user }}\nPGDATABASE={{ project.name }}\n",
          }),
        ),
      ),
    )
    .start(Context::new())
    .await
    .unwrap();

  let env = std::fs::read_to_string(temp.path().join("db/.env")).unwrap();
  assert_eq!(
    env.lines().collect::<Vec<_>>(),
    vec!["PGPORT=5432", "PGUSER=postgres", "PGDATABASE=demo"]
  );
  assert_eq!(result.context.get("user"), Some(&json!("postgres")));
  assert_eq!(
    result.output,
    json!(temp.path().join("db/.env").display().to_string())
  );
}

#[tokio::test]
async fn test_seeded_answer_skips_prompter() {
  let temp = tempfile::tempdir().unwrap();
  let registry = ActionRegistry::with_builtins();
  // No preset answers and no default: the prompter would fail.
  let args = args(temp.path(), &[]);

  let ask = registry
    .create(
      "ask",
      &args.with_params(json!({"key": "region", "question": "Region"})),
    )
    .unwrap();

  let result = FlowBuilder::new("seeded")
    .then(Step::named("answer", ask))
    .start([("region", json!("eu-west-1"))])
    .await
    .unwrap();

  assert_eq!(result.context.get("answer"), Some(&json!("eu-west-1")));
}

#[tokio::test]
async fn test_missing_answer_fails_flow_with_provision_error() {
  let temp = tempfile::tempdir().unwrap();
  let registry = ActionRegistry::with_builtins();
  let args = args(temp.path(), &[]);

  let ask = registry
    .create(
      "ask",
      &args.with_params(json!({"key": "token", "question": "API token"})),
    )
    .unwrap();
  let write = registry
    .create(
      "write_template",
      &args.with_params(json!({"path": "token.txt", "template": "{{ token }}"})),
    )
    .unwrap();

  let err = FlowBuilder::new("missing")
    .then(Step::named("token", ask))
    .then(write)
    .start(Context::new())
    .await
    .unwrap_err();

  assert!(matches!(&err, FlowError::Action { step, .. } if step == "token"));
  let source = err
    .action_error()
    .unwrap()
    .downcast_ref::<ProvisionError>()
    .unwrap();
  assert!(matches!(source, ProvisionError::MissingAnswer { key } if key == "token"));
  assert!(!temp.path().join("token.txt").exists());
}

#[tokio::test]
async fn test_paths_outside_project_are_rejected() {
  let temp = tempfile::tempdir().unwrap();
  let registry = ActionRegistry::with_builtins();
  let args = args(&temp.path().join("project"), &[]);

  let escape = registry
    .create(
      "create_directory",
      &args.with_params(json!({"path": "../elsewhere"})),
    )
    .unwrap();

  let err = FlowBuilder::new("escape")
    .then(escape)
    .start(Context::new())
    .await
    .unwrap_err();

  assert!(matches!(
    err.action_error().unwrap().downcast_ref::<ProvisionError>(),
    Some(ProvisionError::OutsideRoot { .. })
  ));
  assert!(!temp.path().join("elsewhere").exists());
}
