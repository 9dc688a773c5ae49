//! Windlass CLI - task lifecycle orchestration for an external issue tracker.

use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process;

use windlass::cli::{Cli, Commands, LogCommands, ProgramCommands, TaskCommands};
use windlass::commands::{self, Output};
use windlass::config::TrackerConfig;
use windlass::models::ReviewDecision;
use windlass::tracker::http::HttpTracker;
use windlass::workflow::Workflow;
use windlass::worklog::WorkLogStore;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    let config = match TrackerConfig::resolve() {
        Ok(c) => c,
        Err(e) => fail(&e, human),
    };

    // Artifacts default to the current directory unless redirected via
    // --data-dir or WINDLASS_DATA_DIR.
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let tracker = HttpTracker::new(&config);
    let workflow = Workflow::new(&tracker, &data_dir);
    let worklogs = WorkLogStore::new(&data_dir);

    let result = run_command(cli.command, &tracker, &workflow, &worklogs, &config, human);
    if let Err(e) = result {
        fail(&e, human);
    }
}

fn fail(error: &windlass::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", error);
    } else {
        let err = serde_json::json!({ "error": error.to_string() });
        eprintln!("{}", err);
    }
    process::exit(1);
}

fn run_command(
    command: Commands,
    tracker: &HttpTracker,
    workflow: &Workflow<'_>,
    worklogs: &WorkLogStore,
    config: &TrackerConfig,
    human: bool,
) -> Result<(), windlass::Error> {
    match command {
        Commands::Task { command } => match command {
            TaskCommands::Create {
                summary,
                description,
                issue_type,
                parent,
            } => {
                let result =
                    commands::task_create(tracker, &summary, description, &issue_type, parent)?;
                output(&result, human);
            }
            TaskCommands::List { status } => {
                let result = commands::task_list(tracker, &config.project_key, status.as_deref())?;
                output(&result, human);
            }
            TaskCommands::Show { id } => {
                let result = commands::task_show(tracker, &id)?;
                output(&result, human);
            }
        },

        Commands::Comment { id, body } => {
            let result = commands::comment(tracker, &id, &body)?;
            output(&result, human);
        }

        Commands::Move { status, ids } => {
            let result = commands::move_tasks(tracker, &ids, &status)?;
            output(&result, human);
        }

        Commands::Start { id } => {
            let result = workflow.start(&id)?;
            output(&result, human);
        }

        Commands::Complete { id } => {
            let result = workflow.complete_development(&id)?;
            output(&result, human);
        }

        Commands::Review {
            id,
            approve,
            update_brief,
            return_reason,
            discard_reason,
        } => {
            let decision = if approve {
                ReviewDecision::Approve { update_brief }
            } else if let Some(reason) = return_reason {
                ReviewDecision::ReturnToDevelopment { reason }
            } else if let Some(reason) = discard_reason {
                ReviewDecision::Discard { reason }
            } else {
                return Err(windlass::Error::Precondition(
                    "review requires one of --approve, --return, or --discard".to_string(),
                ));
            };
            let result = workflow.complete_review(&id, &decision)?;
            output(&result, human);
        }

        Commands::Done { id } => {
            let result = workflow.complete_unconditional(&id)?;
            output(&result, human);
        }

        Commands::Scan => {
            let result = commands::scan(tracker, worklogs, &config.project_key)?;
            output(&result, human);
        }

        Commands::Deps { id } => {
            let result = commands::deps(tracker, &id)?;
            output(&result, human);
        }

        Commands::Subtasks { parent, file } => {
            let result = commands::subtasks_from_file(workflow, &parent, &file)?;
            output(&result, human);
        }

        Commands::Log { command } => match command {
            LogCommands::Show { id } => {
                let result = commands::log_show(worklogs, &id)?;
                output(&result, human);
            }
            LogCommands::Entry { id } => {
                let result = commands::log_entry(worklogs, &id)?;
                output(&result, human);
            }
        },

        Commands::Program { command } => match command {
            ProgramCommands::Create { ids } => {
                let result = workflow.create_program(&ids)?;
                output(&result, human);
            }
            ProgramCommands::Status => {
                let result = commands::program_status(workflow)?;
                output(&result, human);
            }
        },
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
