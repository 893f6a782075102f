//! `notegate` binary entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use notegate_cli::commands::{self, EvaluateArgs};
use notegate_cli::logging;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("notegate")
        .version(notegate_core::VERSION)
        .about("Pre-mutation authorization gates for note vaults")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: nearest .notegate.json)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(Command::new("pre-mutation").about("Evaluate a pending Write or Edit hook payload from stdin"))
        .subcommand(Command::new("record-read").about("Record a completed Read hook payload from stdin"))
        .subcommand(
            Command::new("evaluate")
                .about("Evaluate one mutation and print the verdict as JSON")
                .arg(
                    Arg::new("op")
                        .long("op")
                        .required(true)
                        .value_parser(["create", "edit"])
                        .help("Operation kind"),
                )
                .arg(
                    Arg::new("path")
                        .long("path")
                        .required(true)
                        .help("Target path"),
                )
                .arg(Arg::new("session").long("session").help("Session identifier"))
                .arg(
                    Arg::new("history")
                        .long("history")
                        .value_parser(value_parser!(PathBuf))
                        .help("Session history (JSON lines)"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as JSON"))
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"));
    let config = matches.get_one::<PathBuf>("config").cloned();

    let result = match matches.subcommand() {
        Some(("pre-mutation", _)) => run_pre_mutation(config.as_deref()),
        Some(("record-read", _)) => run_record_read(config.as_deref()),
        Some(("evaluate", args)) => run_evaluate(args, config.as_deref()),
        Some(("config", _)) => run_config(config.as_deref()),
        _ => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "notegate failed");
            eprintln!("notegate: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut payload = Vec::new();
    std::io::stdin()
        .read_to_end(&mut payload)
        .context("reading hook payload from stdin")?;
    Ok(payload)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, value).context("encoding output")?;
    writeln!(stdout).context("writing output")?;
    Ok(())
}

/// Hook commands exit 0 whatever happens; failures only reach the log.
fn run_pre_mutation(config: Option<&Path>) -> anyhow::Result<()> {
    let payload = match read_stdin() {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "no verdict");
            return Ok(());
        }
    };
    if let Some(output) = commands::pre_mutation(&payload, config) {
        if let Err(err) = print_json(&output) {
            tracing::warn!(error = %format!("{err:#}"), "verdict not delivered");
        }
    }
    Ok(())
}

fn run_record_read(config: Option<&Path>) -> anyhow::Result<()> {
    match read_stdin() {
        Ok(payload) => {
            commands::record_read(&payload, config);
        }
        Err(err) => tracing::warn!(error = %format!("{err:#}"), "read not recorded"),
    }
    Ok(())
}

fn run_evaluate(args: &ArgMatches, config: Option<&Path>) -> anyhow::Result<()> {
    let op = args.get_one::<String>("op").context("missing --op")?;
    let operation = commands::parse_operation(op).with_context(|| format!("unknown operation {op}"))?;
    let path = args.get_one::<String>("path").context("missing --path")?.clone();

    let verdict = commands::evaluate(
        EvaluateArgs {
            operation,
            path,
            session: args.get_one::<String>("session").cloned(),
            history: args.get_one::<PathBuf>("history").cloned(),
        },
        config,
    );
    print_json(&verdict)
}

fn run_config(config: Option<&Path>) -> anyhow::Result<()> {
    print_json(&commands::load_config(config, None))
}
