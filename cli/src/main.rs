mod output;

use buildsys_core::config::{discover_config, load_config};
use buildsys_core::{DuplicatePolicy, Inspector, MatchMode, Request, Response, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Inspect the tasks and builds of a YAML build description.
#[derive(Debug, Parser)]
#[command(name = "buildsys", version)]
struct Cli {
    /// Directory holding tasks.yaml and builds.yaml.
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,
    /// Config file; defaults to buildsys.toml inside --dir when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Match names by substring instead of exactly.
    #[arg(long, global = true)]
    substring: bool,
    /// List each task of a build only once.
    #[arg(long, global = true)]
    unique: bool,
    /// Print responses as JSON.
    #[arg(long, global = true)]
    json: bool,
    /// Print debug information.
    #[arg(short, long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List available builds or tasks.
    List {
        #[command(subcommand)]
        target: ListTarget,
    },
    /// Show a build with its resolved tasks, or a task with its dependencies.
    Get {
        #[command(subcommand)]
        target: GetTarget,
    },
}

#[derive(Debug, Subcommand)]
enum ListTarget {
    Builds,
    Tasks,
}

#[derive(Debug, Subcommand)]
enum GetTarget {
    Build { build_name: String },
    Task { task_name: String },
}

impl Command {
    fn request(&self) -> Request {
        match self {
            Command::List { target: ListTarget::Builds } => Request::ListBuilds,
            Command::List { target: ListTarget::Tasks } => Request::ListTasks,
            Command::Get { target: GetTarget::Build { build_name } } => {
                Request::GetBuild(build_name.clone())
            }
            Command::Get { target: GetTarget::Task { task_name } } => {
                Request::GetTask(task_name.clone())
            }
        }
    }
}

/// Gets the log level from a level string, defaulting to INFO.
fn get_log_level(level: &str) -> Level {
    match level.to_uppercase().as_ref() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARN" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(debug: bool) {
    let level = match std::env::var("BUILDSYS_LOG") {
        Ok(level) => get_log_level(&level),
        Err(_) if debug => Level::DEBUG,
        Err(_) => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {err}");
    }
}

/// Load the description and answer the requested query.
fn execute(cli: &Cli) -> Result<Response> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => discover_config(&cli.dir)?,
    };
    if cli.substring {
        config.match_mode = MatchMode::Substring;
    }
    if cli.unique {
        config.duplicates = DuplicatePolicy::FirstOccurrence;
    }

    let store = config.load_store(&cli.dir)?;
    let inspector = Inspector::new(store).with_duplicates(config.duplicates);
    inspector.handle(&cli.command.request())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match execute(&cli) {
        Ok(response) => {
            let mut out = io::stdout().lock();
            if let Err(err) = output::render(&response, cli.json, &mut out) {
                eprintln!("failed to write output: {err}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) if err.is_query_error() => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildsys_core::Error;
    use clap::CommandFactory;
    use std::path::Path;

    fn fixtures() -> String {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../core/tests/fixtures")
            .display()
            .to_string()
    }

    fn run(args: &[&str]) -> Result<String> {
        let dir = fixtures();
        let mut argv = vec!["buildsys", "--dir", dir.as_str()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("arguments parse");

        let response = execute(&cli)?;
        let mut buf = Vec::new();
        output::render(&response, cli.json, &mut buf).unwrap();
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_builds_and_tasks() {
        let out = run(&["list", "builds"]).unwrap();
        assert!(out.contains("List of available builds:"));
        assert!(out.contains("* approach_important"));
        assert!(out.contains("* audience_stand"));

        let out = run(&["list", "tasks"]).unwrap();
        assert!(out.contains("List of available tasks:"));
        assert!(out.contains("* create_green_cyclops"));
        assert!(out.contains("* design_silver_cyclops"));
    }

    #[test]
    fn get_task() {
        let out = run(&["get", "task", "design_olive_cyclops"]).unwrap();
        assert!(out.contains("Task info:"));
        assert!(out.contains("* name: design_olive_cyclops"));
        assert!(out.contains(
            "* dependencies: coloring_green_cyclops, create_green_cyclops, design_teal_cyclops"
        ));

        let err = run(&["get", "task", "nonexistent_task"]).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
        assert_eq!(err.to_string(), "task 'nonexistent_task' does not exist");
    }

    #[test]
    fn get_build() {
        let out = run(&["get", "build", "audience_stand"]).unwrap();
        assert!(out.contains("Build info:"));
        assert!(out.contains("* name: audience_stand"));
        assert!(out.contains("* tasks: enable_fuchsia_fairies, read_blue_witches, upgrade_olive_gnomes"));

        let err = run(&["get", "build", "nonexistent_build"]).unwrap_err();
        assert!(err.is_query_error());
    }

    #[test]
    fn flags_after_subcommand() {
        let out = run(&["get", "build", "audience", "--substring", "--json"]).unwrap();
        assert!(out.contains("\"kind\": \"build\""));
        assert!(out.contains("\"read_blue_witches\""));

        let out = run(&["get", "build", "approach_important", "--unique"]).unwrap();
        assert_eq!(out.matches("create_green_cyclops").count(), 1);
    }

    #[test]
    fn config_flag_redirects_data_files() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir(&data).unwrap();
        let fixtures = PathBuf::from(fixtures());
        std::fs::copy(fixtures.join("tasks.yaml"), data.join("t.yaml")).unwrap();
        std::fs::copy(fixtures.join("builds.yaml"), data.join("b.yaml")).unwrap();
        let config = dir.path().join("custom.toml");
        std::fs::write(
            &config,
            "tasks_file = \"data/t.yaml\"\nbuilds_file = \"data/b.yaml\"\nduplicates = \"first-occurrence\"\n",
        )
        .unwrap();

        let dir_arg = dir.path().display().to_string();
        let config_arg = config.display().to_string();
        let cli = Cli::try_parse_from([
            "buildsys",
            "--dir",
            dir_arg.as_str(),
            "--config",
            config_arg.as_str(),
            "get",
            "build",
            "approach_important",
        ])
        .unwrap();
        match execute(&cli).unwrap() {
            Response::Build { tasks, .. } => {
                assert_eq!(tasks.iter().filter(|t| *t == "create_green_cyclops").count(), 1);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        std::fs::write(&config, "match_mode = \"sometimes\"\n").unwrap();
        let err = execute(&cli).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(!err.is_query_error());
    }

    #[test]
    fn missing_directory_is_a_load_error() {
        let cli = Cli::try_parse_from(["buildsys", "--dir", "/definitely/not/here", "list", "tasks"])
            .unwrap();
        let err = execute(&cli).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
        assert!(!err.is_query_error());
    }

    #[test]
    fn log_levels() {
        assert_eq!(get_log_level("debug"), Level::DEBUG);
        assert_eq!(get_log_level("WARN"), Level::WARN);
        assert_eq!(get_log_level("loud"), Level::INFO);
    }
}
