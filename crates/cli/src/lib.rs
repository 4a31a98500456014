pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "concierge",
    about = "Dining concierge operator CLI",
    long_about = "Inspect configuration, check readiness, apply migrations, load restaurant data and queue requests.",
    after_help = "Examples:\n  concierge doctor --json\n  concierge seed restaurants.json\n  concierge enqueue request.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load restaurant records from a JSON array into the local detail store")]
    Seed {
        #[arg(help = "Path to a JSON array of restaurant records")]
        file: PathBuf,
    },
    #[command(about = "Submit a completed dining request from a JSON file to the request queue")]
    Enqueue {
        #[arg(help = "Path to a JSON object with the five request fields")]
        file: PathBuf,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity and queue schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed { file } => commands::seed::run(&file),
        Command::Enqueue { file } => commands::enqueue::run(&file),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
