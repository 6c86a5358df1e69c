use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use docflow_cli::DocflowConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file")
}

fn out_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .default_value("docflow-out")
        .value_parser(value_parser!(PathBuf))
        .help("Directory receiving generated files")
}

fn cli() -> Command {
    Command::new("docflow")
        .version(docflow_cli::VERSION)
        .about("Turn uploaded material into requirements documents, process flows and anonymization packages")
        .subcommand_required(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("run")
                .about("Mask the submitted files and generate the requested artifacts")
                .arg(config_arg())
                .arg(
                    Arg::new("file")
                        .long("file")
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(PathBuf))
                        .help("Text file to include in the submission"),
                )
                .arg(
                    Arg::new("artifact")
                        .long("artifact")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Artifact to generate: document, as-is-flow, to-be-flow, anonymization-package"),
                )
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("refine")
                .about("Answer a pending refinement request and regenerate its flow")
                .arg(config_arg())
                .arg(
                    Arg::new("request")
                        .long("request")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Refinement request written by `docflow run`"),
                )
                .arg(
                    Arg::new("detail")
                        .long("detail")
                        .required(true)
                        .help("Additional process detail"),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Base name for the regenerated diagram"),
                )
                .arg(out_arg()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::from_default_env()
        .add_directive("docflow=info".parse().expect("valid tracing directive"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn required<'a, T: Clone + Send + Sync + 'static>(args: &'a ArgMatches, id: &str) -> Result<&'a T> {
    args.get_one::<T>(id)
        .with_context(|| format!("missing --{id}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn dispatch(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("run", args)) => {
            let config = DocflowConfig::load_or_default(
                args.get_one::<PathBuf>("config").map(PathBuf::as_path),
            )?;
            let orchestrator = docflow_cli::build_orchestrator(&config)?;
            let files: Vec<PathBuf> = args
                .get_many::<PathBuf>("file")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let artifacts: Vec<String> = args
                .get_many::<String>("artifact")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let out = required::<PathBuf>(args, "out")?;

            let summary = docflow_cli::run(&orchestrator, &files, &artifacts, out).await?;
            print_json(&summary)
        }
        Some(("refine", args)) => {
            let config = DocflowConfig::load_or_default(
                args.get_one::<PathBuf>("config").map(PathBuf::as_path),
            )?;
            let orchestrator = docflow_cli::build_orchestrator(&config)?;
            let request = required::<PathBuf>(args, "request")?;
            let detail = required::<String>(args, "detail")?;
            let name = args.get_one::<String>("name").map(String::as_str);
            let out = required::<PathBuf>(args, "out")?;

            let summary = docflow_cli::refine(&orchestrator, request, detail, name, out).await?;
            print_json(&summary)
        }
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    if let Err(err) = dispatch(&matches).await {
        tracing::error!(error = %format!("{err:#}"), "Command failed");
        eprintln!("error: {}", docflow_cli::user_facing(&err));
        std::process::exit(1);
    }
}
