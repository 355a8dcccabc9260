use std::process::ExitCode;

use strava_to_movember::cli::{build_options, parse_args, usage};
use strava_to_movember::logging::init_logging;
use strava_to_movember::run;

fn main() -> ExitCode {
    // takes the command line, runs a single command and exits
    let args: Vec<String> = std::env::args().skip(1).collect();

    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprint!("{}", usage(&build_options()));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(invocation.config_file.parent(), invocation.verbose) {
        eprintln!("Unable to set up logging: {:#}", e);
    }

    match run(invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
