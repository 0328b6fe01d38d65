use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use std::sync::Arc;

use mob::cli::{commands, Cli};
use mob::output::{Say, StdoutSink};
use mob::telemetry::init_telemetry;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_telemetry(cli.debug) {
        eprintln!("Warning: {e:#}");
    }

    let Some(command) = cli.command else {
        // bare `mob` shows the available commands
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    };

    let say = Say::new(Arc::new(StdoutSink));
    match commands::run(command, say.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(error = ?error, "Command failed");
            say.report(&error);
            ExitCode::from(error.exit_code())
        }
    }
}
