mod init;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stackup_actions::{
  ActionArgs, ActionRegistry, DialoguerPrompter, PresetPrompter, Project, Prompter,
};
use stackup_flow::{ChannelNotifier, Context, ExecutionEvent};

/// Stackup - provision local development environments
#[derive(Parser)]
#[command(name = "stackup")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Provision a new project directory
  Init {
    /// Directory to create the project in
    dir: PathBuf,

    /// Project name (default: the directory name)
    #[arg(long)]
    name: Option<String>,

    /// Service to add to the stack; may be repeated
    #[arg(long = "service")]
    services: Vec<String>,

    /// Do not prompt; use defaults for unanswered questions
    #[arg(long)]
    yes: bool,

    /// JSON file of answers, keyed by question
    #[arg(long)]
    answers: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stackup=info,warn")),
    )
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Init {
      dir,
      name,
      services,
      yes,
      answers,
    }) => {
      block_on(run_init(dir, name, services, yes, answers))?;
    }
    None => {
      println!("stackup - use --help to see available commands");
    }
  }

  Ok(())
}

/// Run `fut` to completion on a fresh runtime.
///
/// On failure the runtime is shut down without waiting for blocking tasks,
/// so a prompt that is still open does not hold back the error.
fn block_on<F>(fut: F) -> Result<()>
where
  F: Future<Output = Result<()>>,
{
  let rt = tokio::runtime::Runtime::new()?;
  let result = rt.block_on(fut);
  if result.is_err() {
    rt.shutdown_background();
  }
  result
}

async fn run_init(
  dir: PathBuf,
  name: Option<String>,
  services: Vec<String>,
  yes: bool,
  answers: Option<PathBuf>,
) -> Result<()> {
  let root = std::env::current_dir()
    .context("failed to determine current directory")?
    .join(&dir);

  let name = match name {
    Some(name) => name,
    None => project_name(&root)?,
  };
  let project = Project::new(name, root).with_services(services);

  let answers = match answers {
    Some(path) => read_answers(&path).await?,
    None => Context::new(),
  };

  let prompter: Arc<dyn Prompter> = if yes {
    Arc::new(PresetPrompter::default())
  } else {
    Arc::new(DialoguerPrompter)
  };

  eprintln!("Provisioning {} in {}", project.name, project.root.display());

  let registry = ActionRegistry::with_builtins();
  let args = ActionArgs::new(Arc::new(project), prompter, serde_json::Value::Null);

  let (notifier, mut events) = ChannelNotifier::channel();
  let progress = tokio::spawn(async move {
    while let Some(event) = events.recv().await {
      report(&event);
    }
  });

  let builder =
    init::flow(&registry, &args, Arc::new(notifier)).context("failed to build init flow")?;
  let result = builder.start(answers).await.context("init flow failed");

  // The flow owned the sender; the channel closes once it is dropped.
  progress.await?;
  let result = result?;

  eprintln!("Execution completed: {}", result.execution_id);
  println!("{}", serde_json::to_string_pretty(&result.context)?);

  Ok(())
}

/// Default project name: the last component of the project root.
fn project_name(root: &Path) -> Result<String> {
  match root.file_name().and_then(|n| n.to_str()) {
    Some(name) => Ok(name.to_string()),
    None => bail!(
      "cannot derive a project name from {}; pass --name",
      root.display()
    ),
  }
}

/// Read pre-filled answers. They seed the run context, so questions with
/// an answer are never asked.
async fn read_answers(path: &Path) -> Result<Context> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read answers file: {}", path.display()))?;

  let value: serde_json::Value = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse answers file: {}", path.display()))?;

  Context::try_from(value)
    .with_context(|| format!("answers file must hold a JSON object: {}", path.display()))
}

fn report(event: &ExecutionEvent) {
  match event {
    ExecutionEvent::StepStarted { step, .. } => eprintln!("  - {step}"),
    ExecutionEvent::StepFailed { step, error, .. } => eprintln!("  ! {step}: {error}"),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_project_name_from_root() {
    assert_eq!(project_name(Path::new("/work/demo")).unwrap(), "demo");
    assert!(project_name(Path::new("/")).is_err());
  }

  #[test]
  fn test_block_on_failure_does_not_wait_for_blocking_tasks() {
    let started = std::time::Instant::now();

    let result = block_on(async {
      let _prompt =
        tokio::task::spawn_blocking(|| std::thread::sleep(std::time::Duration::from_secs(5)));
      bail!("project_dir failed")
    });

    assert!(result.is_err());
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
  }

  #[test]
  fn test_answers_seed_context() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("answers.json");
    std::fs::write(&path, r#"{"description": "From file"}"#).unwrap();

    let answers = rt.block_on(read_answers(&path)).unwrap();
    assert_eq!(
      answers.get("description"),
      Some(&serde_json::json!("From file"))
    );

    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(rt.block_on(read_answers(&path)).is_err());
  }
}
