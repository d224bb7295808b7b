//! Command line entry point.
//!
//! # Responsibility
//! - Load configuration, logging and the task store.
//! - Map subcommands onto `TaskMutator` operations and sync runs.

use bugwarrior_core::db::open_db;
use bugwarrior_core::{
    config::default_config_path, default_log_level, init_logging, setup, synchronize, AppConfig,
    Event, EventBus, MutationOptions, MutationOutcome, SqliteTaskStore, StdinPrompt, Task,
    TaskListQuery, TaskMutator, TaskStore,
};
use clap::{Parser, Subcommand};
use log::warn;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "bugwarrior", version, about = "Sync issues into a local task list")]
struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Report what would change without writing to the task store.
    #[arg(long, global = true)]
    dry_run: bool,
    /// Ask before every change.
    #[arg(long, global = true)]
    timid: bool,
    /// Send desktop notifications for changes.
    #[arg(long, global = true)]
    notify: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a task.
    Add {
        description: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Change fields of a stored task.
    Modify {
        uuid: Uuid,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Tag to add; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Mark a task done.
    Done { uuid: Uuid },
    /// List tasks.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
    },
    /// Apply issues from a JSON file (array of tasks).
    Pull {
        issues: PathBuf,
        /// `extra` attribute that identifies an issue across runs.
        #[arg(long, default_value = "url")]
        key_field: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = AppConfig::load(&config_path)?;

    let log_level = config
        .general
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    if let Err(err) = init_logging(&log_level, &config.general.log_dir_or_default()?) {
        eprintln!("warning: logging disabled: {err}");
    }

    let data_file = config.general.data_file_or_default()?;
    if let Some(parent) = data_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = open_db(&data_file)?;

    let mut bus = EventBus::new();
    if cli.notify && setup(&config, &mut bus)?.is_none() {
        warn!("event=cli module=cli status=notify_unavailable");
        eprintln!("warning: notifications requested but not configured");
    }

    let mutator = TaskMutator::new(SqliteTaskStore::new(&conn), StdinPrompt, &bus);
    let options = MutationOptions {
        dry_run: cli.dry_run,
        timid: cli.timid,
        notify: cli.notify,
    };

    match cli.command {
        Command::Add {
            description,
            project,
            priority,
            tags,
        } => {
            let issue = Task {
                project,
                priority,
                tags,
                ..Task::new(description)
            };
            let outcome = mutator.create(&issue, options, None)?;
            report("add", outcome);
        }
        Command::Modify {
            uuid,
            description,
            project,
            priority,
            tags,
        } => {
            let mut task = mutator
                .store()
                .get_task(uuid)?
                .ok_or_else(|| format!("task not found: {uuid}"))?;
            if let Some(description) = description {
                task.description = description;
            }
            if project.is_some() {
                task.project = project;
            }
            if priority.is_some() {
                task.priority = priority;
            }
            for tag in tags {
                if !task.tags.contains(&tag) {
                    task.tags.push(tag);
                }
            }
            let outcome = mutator.modify(&task, options)?;
            if options.notify && outcome != MutationOutcome::Skipped {
                bus.emit(&Event::TaskUpdated(task))?;
            }
            report("modify", outcome);
        }
        Command::Done { uuid } => {
            let outcome = mutator.close(uuid, options, None)?;
            report("done", outcome);
        }
        Command::List { all } => {
            let query = if all {
                TaskListQuery::default()
            } else {
                TaskListQuery::pending()
            };
            for task in mutator.store().list_tasks(&query)? {
                let id = task
                    .id
                    .map_or_else(|| "-".to_string(), |id| id.to_string());
                let uuid = task.uuid.map(|uuid| uuid.to_string()).unwrap_or_default();
                println!("{id:>4} {uuid} {}", task.description);
            }
        }
        Command::Pull { issues, key_field } => {
            let content = std::fs::read_to_string(&issues)?;
            let issues: Vec<Task> = serde_json::from_str(&content)?;
            let stats = synchronize(&mutator, &issues, &key_field, options)?;
            let report: Vec<String> = stats
                .iter()
                .map(|(name, count)| format!("{name}={count}"))
                .collect();
            println!("{}", report.join(" "));
        }
    }

    Ok(())
}

fn report(command: &str, outcome: MutationOutcome) {
    match outcome {
        MutationOutcome::Applied => println!("{command}: done"),
        MutationOutcome::DryRun => println!("{command}: dry run, nothing written"),
        MutationOutcome::Skipped => println!("{command}: skipped"),
    }
}
