mod check;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stepwise_core::config::AppConfig;
use stepwise_core::{ActionId, StepId};
use stepwise_migration::{combine, MigrationResult};
use stepwise_workflow::{
    ConditionNode, Descriptor, ModuleDescriptor, ModuleKind, ModuleRegistry, ResultTarget, Workflow,
    WorkflowEditor, WorkflowError,
};

#[derive(Parser)]
#[command(name = "stepwise", version, about = "Workflow transition editor and migration tools")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "stepwise.toml")]
    config: PathBuf,

    /// Workflow document (JSON) to read and, for edits, rewrite
    #[arg(short, long, global = true)]
    workflow: Option<PathBuf>,

    /// Module registry (JSON list of module descriptors)
    #[arg(short, long, global = true)]
    modules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List steps and transitions
    Show,
    /// Run consistency checks on the workflow document
    Check,
    /// Print the condition tree of a transition
    Conditions {
        #[arg(long)]
        action: u32,
    },
    /// Add a condition to the group at a path ("" is the root group)
    AddCondition {
        #[arg(long)]
        action: u32,
        #[arg(long, default_value = "")]
        path: String,
        /// Implementation class
        #[arg(long)]
        class: String,
        #[arg(long)]
        module_key: Option<String>,
        /// Wrap the condition in a new nested group
        #[arg(long)]
        nested: bool,
        /// Extra argument, as name=value
        #[arg(long = "arg", value_parser = parse_arg)]
        args: Vec<(String, String)>,
    },
    /// Delete the condition or group at a path
    DeleteCondition {
        #[arg(long)]
        action: u32,
        #[arg(long)]
        path: String,
    },
    /// Flip AND/OR of the group at a path
    ToggleOperator {
        #[arg(long)]
        action: u32,
        #[arg(long, default_value = "")]
        path: String,
    },
    /// Append a validator
    AddValidator {
        #[arg(long)]
        action: u32,
        #[arg(long)]
        class: String,
        #[arg(long = "arg", value_parser = parse_arg)]
        args: Vec<(String, String)>,
    },
    /// Delete the validator at a 1-based position
    DeleteValidator {
        #[arg(long)]
        action: u32,
        #[arg(long)]
        position: usize,
    },
    /// Insert a post-function by weight
    AddFunction {
        #[arg(long)]
        action: u32,
        #[arg(long)]
        class: String,
        /// Declared weight; registers the class as a weighted function module
        #[arg(long)]
        weight: Option<i32>,
        #[arg(long = "arg", value_parser = parse_arg)]
        args: Vec<(String, String)>,
    },
    /// Delete the post-function at a 1-based position
    DeleteFunction {
        #[arg(long)]
        action: u32,
        #[arg(long)]
        position: usize,
    },
    /// Move the post-function at a 1-based position
    MoveFunction {
        #[arg(long)]
        action: u32,
        #[arg(long)]
        position: usize,
        /// Move towards the end instead of the start
        #[arg(long)]
        down: bool,
    },
    /// Add a step
    AddStep {
        #[arg(long)]
        name: String,
        #[arg(long)]
        status: Option<String>,
    },
    /// Remove a step no transition leads to
    RemoveStep {
        #[arg(long)]
        step: u32,
    },
    /// Add a transition from a step, or a global one without --from
    AddTransition {
        #[arg(long)]
        name: String,
        #[arg(long)]
        from: Option<u32>,
        /// Destination step; omit to stay on the same step
        #[arg(long)]
        to: Option<u32>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a transition
    RemoveTransition {
        #[arg(long)]
        action: u32,
    },
    /// Write an editable draft of the workflow
    Draft {
        #[arg(long)]
        output: PathBuf,
    },
    /// Rewrite every restriction in canonical descriptor order
    Normalize,
    /// Combine per-project migration results (JSON files)
    Combine {
        #[arg(required = true)]
        results: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Combine { results } = &cli.command {
        return run_combine(results);
    }

    let path = cli
        .workflow
        .clone()
        .context("this command needs a workflow document (--workflow)")?;
    let mut workflow = load_workflow(&path)?;
    let mut modules = load_modules(cli.modules.as_deref())?;

    match &cli.command {
        Commands::Show => {
            show(&workflow);
            return Ok(());
        }
        Commands::Check => {
            if !check::run_checks(&workflow) {
                bail!("workflow '{}' failed its checks", workflow.name);
            }
            return Ok(());
        }
        Commands::Conditions { action } => {
            print_conditions(&workflow, ActionId(*action))?;
            return Ok(());
        }
        Commands::Draft { output } => {
            let draft = workflow.create_draft();
            save_workflow(output, &draft)?;
            info!(workflow = %draft.name, output = %output.display(), "Draft written");
            return Ok(());
        }
        Commands::AddFunction { weight: Some(weight), class, .. } => {
            let key = format!("cli:{}", class);
            modules.register(ModuleDescriptor::new(key, class.clone(), ModuleKind::Function).weighted(*weight));
        }
        _ => {}
    }

    let editor = WorkflowEditor::new(&modules, config.editor.clone());
    let outcome = apply_edit(&editor, &mut workflow, cli.command);
    match outcome {
        Ok(message) => {
            save_workflow(&path, &workflow)?;
            println!("{}", message);
            Ok(())
        }
        Err(err) if !err.is_recoverable() => {
            error!(workflow = %workflow.name, error = %err, "Edit failed");
            bail!("internal error while editing '{}'", workflow.name)
        }
        Err(err) => bail!("{}", err),
    }
}

/// Apply one edit; the document is only saved when this returns `Ok`.
fn apply_edit(
    editor: &WorkflowEditor<'_, ModuleRegistry>,
    workflow: &mut Workflow,
    command: Commands,
) -> Result<String, WorkflowError> {
    let message = match command {
        Commands::AddCondition {
            action,
            path,
            class,
            module_key,
            nested,
            args,
        } => {
            let mut condition = descriptor(class, args);
            if let Some(key) = module_key {
                condition = condition.with_module_key(key);
            }
            let new_path = editor.add_condition(workflow, ActionId(action), &path, condition, nested)?;
            format!("Added condition at {}", new_path)
        }
        Commands::DeleteCondition { action, path } => {
            editor.delete_condition(workflow, ActionId(action), &path)?;
            format!("Deleted condition {}", path)
        }
        Commands::ToggleOperator { action, path } => {
            let operator = editor.change_logic_operator(workflow, ActionId(action), &path)?;
            format!("Group '{}' is now {}", path, operator)
        }
        Commands::AddValidator { action, class, args } => {
            let position = editor.add_validator(workflow, ActionId(action), descriptor(class, args))?;
            format!("Added validator at position {}", position)
        }
        Commands::DeleteValidator { action, position } => {
            editor.delete_validator(workflow, ActionId(action), position)?;
            format!("Deleted validator {}", position)
        }
        Commands::AddFunction { action, class, args, .. } => {
            let position = editor.add_post_function(workflow, ActionId(action), descriptor(class, args))?;
            format!("Added post-function at position {}", position)
        }
        Commands::DeleteFunction { action, position } => {
            editor.delete_post_function(workflow, ActionId(action), position)?;
            format!("Deleted post-function {}", position)
        }
        Commands::MoveFunction { action, position, down } => {
            if down {
                editor.move_post_function_down(workflow, ActionId(action), position)?;
            } else {
                editor.move_post_function_up(workflow, ActionId(action), position)?;
            }
            format!("Moved post-function {}", position)
        }
        Commands::AddStep { name, status } => {
            let id = workflow.add_step(&name, status.as_deref())?;
            format!("Added step {} ({})", name.trim(), id)
        }
        Commands::RemoveStep { step } => {
            let removed = workflow.remove_step(StepId(step))?;
            format!("Removed step {} ({})", removed.name, removed.id)
        }
        Commands::AddTransition {
            name,
            from,
            to,
            description,
        } => {
            let target = to.map_or(ResultTarget::SameStep, |id| ResultTarget::Step(StepId(id)));
            let id = workflow.add_transition(from.map(StepId), &name, description.as_deref(), target)?;
            format!("Added transition {} ({})", name.trim(), id)
        }
        Commands::RemoveTransition { action } => {
            let removed = workflow.remove_transition(ActionId(action))?;
            format!("Removed transition {} ({})", removed.name, removed.id)
        }
        Commands::Normalize => {
            workflow.ensure_editable()?;
            let mut count = 0;
            let actions = workflow
                .initial_actions
                .iter_mut()
                .chain(workflow.global_actions.iter_mut())
                .chain(workflow.common_actions.iter_mut())
                .chain(workflow.steps.iter_mut().flat_map(|s| s.actions.iter_mut()));
            for action in actions {
                if let Some(restriction) = action.restriction.as_mut() {
                    *restriction = restriction.normalized();
                    count += 1;
                }
            }
            format!("Normalized {} restriction(s)", count)
        }
        Commands::Show
        | Commands::Check
        | Commands::Conditions { .. }
        | Commands::Draft { .. }
        | Commands::Combine { .. } => String::new(),
    };
    Ok(message)
}

fn descriptor(class: String, args: Vec<(String, String)>) -> Descriptor {
    args.into_iter()
        .fold(Descriptor::class(class), |d, (name, value)| d.with_arg(name, value))
}

fn parse_arg(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

fn load_workflow(path: &Path) -> anyhow::Result<Workflow> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing workflow {}", path.display()))
}

fn save_workflow(path: &Path, workflow: &Workflow) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(workflow)?;
    fs::write(path, json + "\n").with_context(|| format!("writing {}", path.display()))
}

fn load_modules(path: Option<&Path>) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    let Some(path) = path else {
        return Ok(registry);
    };
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let modules: Vec<ModuleDescriptor> =
        serde_json::from_str(&content).with_context(|| format!("parsing modules {}", path.display()))?;
    for module in modules {
        registry.register(module);
    }
    info!(modules = registry.len(), "Loaded module registry");
    Ok(registry)
}

fn run_combine(paths: &[PathBuf]) -> anyhow::Result<()> {
    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let result: MigrationResult = serde_json::from_str(&content)
            .with_context(|| format!("parsing migration result {}", path.display()))?;
        results.push(result);
    }
    let combined = combine(&results).context("combining migration results")?;
    println!("{}", serde_json::to_string_pretty(&combined)?);
    Ok(())
}

fn show(workflow: &Workflow) {
    println!("Workflow: {} ({:?}{})", workflow.name, workflow.mode, if workflow.active { ", active" } else { "" });
    for action in &workflow.initial_actions {
        println!("  [initial] {} ({})", action.name, action.id);
    }
    for action in &workflow.global_actions {
        println!("  [global] {} ({}) -> {}", action.name, action.id, target_label(workflow, action.result.target));
    }
    for step in &workflow.steps {
        let status = step.status_id.as_deref().unwrap_or("-");
        println!("  {} ({}) status={}", step.name, step.id, status);
        for action in workflow.actions().filter(|a| step.has_action(a.id)) {
            let tag = if workflow.is_common_action(action.id) { " [common]" } else { "" };
            println!(
                "    {} ({}){} -> {}",
                action.name,
                action.id,
                tag,
                target_label(workflow, action.result.target)
            );
        }
    }
}

fn target_label(workflow: &Workflow, target: ResultTarget) -> String {
    match target {
        ResultTarget::SameStep => "(same step)".to_string(),
        ResultTarget::Step(id) => workflow
            .step(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("missing step {}", id)),
    }
}

fn print_conditions(workflow: &Workflow, id: ActionId) -> anyhow::Result<()> {
    let action = workflow
        .action(id)
        .with_context(|| format!("transition {} not found", id))?;
    let Some(root) = action.restriction.as_ref() else {
        println!("{} ({}): unconditional", action.name, action.id);
        return Ok(());
    };
    println!("{} ({}): {}", action.name, action.id, root.operator);
    for (path, node) in root.walk() {
        let indent = "  ".repeat(path.depth());
        match node {
            ConditionNode::Group(group) => println!("{}{} {}", indent, path, group.operator),
            ConditionNode::Leaf(leaf) => {
                println!("{}{} {}", indent, path, leaf.class_name().unwrap_or(&leaf.kind))
            }
        }
    }
    Ok(())
}
