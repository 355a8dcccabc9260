
use std::io::{stdin, stdout, BufRead, Write};
use std::path::PathBuf;

use getopts::{Matches, Options};
use thiserror::Error;

use crate::profile::default_config_file;
use crate::APP_NAME;

pub const STRAVA_TOKEN_ENV: &str = "STRAVA_AUTH_TOKEN";
pub const MOVEMBER_EMAIL_ENV: &str = "MOVEMBER_EMAIL";

const SYNC_ONLY: [&str; 2] = ["strava-token", "since"];
const CONFIGURE_ONLY: [&str; 2] = ["movember-email", "movember-password"];

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Options(#[from] getopts::Fail),
    #[error("{0}")]
    Usage(String),
    #[error("Unable to read {0} from the terminal: {1}")]
    Prompt(&'static str, std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Sync {
        profile: Option<String>,
        strava_token: Option<String>,
        since: Option<i64>,
    },
    Configure {
        movember_email: Option<String>,
        movember_password: Option<String>,
    },
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub config_file: PathBuf,
    pub verbose: bool,
    pub command: Command,
}

pub fn build_options() -> Options {
    let mut opts = Options::new();
    opts.optopt("c", "config-file", "Use alternative configuration file", "PATH");
    opts.optflag("V", "version", "Print the current version number and exit.");
    opts.optflag("h", "help", "Show this message and exit.");
    opts.optflag("v", "verbose", "Log debug output to stderr.");
    opts.optopt("", "strava-token", "[sync] authentication token for accessing strava", "TOKEN");
    opts.optopt("", "since", "[sync] only sync activities after this unix timestamp", "EPOCH");
    opts.optopt("", "movember-email", "[configure] email for accessing Movember", "EMAIL");
    opts.optopt("", "movember-password", "[configure] password for accessing Movember", "PASSWORD");
    opts
}

pub fn usage(opts: &Options) -> String {
    let brief = format!(
        "Usage: {app} [options] sync [PROFILE]\n       {app} [options] configure\n\n\
         Commands:\n    sync          Publish Strava activities as Movember moves\n    \
         configure     Store Movember credentials in the default profile",
        app = APP_NAME
    );
    opts.usage(&brief)
}

/// Parses everything after the program name. `--version` and `--help`
/// win over any command, like eager flags do.
pub fn parse_args(args: &[String]) -> Result<Invocation, CliError> {
    let opts = build_options();
    let matches = opts.parse(args)?;

    let config_file = matches
        .opt_str("c")
        .map(PathBuf::from)
        .unwrap_or_else(default_config_file);
    let verbose = matches.opt_present("v");

    let command = if matches.opt_present("V") {
        Command::Version
    } else if matches.opt_present("h") {
        Command::Help
    } else {
        parse_command(&matches)?
    };

    Ok(Invocation {
        config_file,
        verbose,
        command,
    })
}

fn parse_command(matches: &Matches) -> Result<Command, CliError> {
    let mut free = matches.free.iter();
    let command = match free.next() {
        Some(command) => command.as_str(),
        None => return Err(CliError::Usage(String::from("Missing command, expected 'sync' or 'configure'"))),
    };

    match command {
        "sync" => {
            reject(matches, &CONFIGURE_ONLY, "sync")?;
            let profile = free.next().cloned();
            if let Some(extra) = free.next() {
                return Err(CliError::Usage(format!("Unexpected argument '{}'", extra)));
            }
            let since = match matches.opt_str("since") {
                Some(value) => Some(value.trim().parse::<i64>().map_err(|_| {
                    CliError::Usage(format!("--since expects a unix timestamp, got '{}'", value))
                })?),
                None => None,
            };
            Ok(Command::Sync {
                profile,
                strava_token: matches.opt_str("strava-token"),
                since,
            })
        }
        "configure" => {
            reject(matches, &SYNC_ONLY, "configure")?;
            if let Some(extra) = free.next() {
                return Err(CliError::Usage(format!("Unexpected argument '{}'", extra)));
            }
            Ok(Command::Configure {
                movember_email: matches.opt_str("movember-email"),
                movember_password: matches.opt_str("movember-password"),
            })
        }
        other => Err(CliError::Usage(format!("Unknown command '{}'", other))),
    }
}

fn reject(matches: &Matches, names: &[&str], command: &str) -> Result<(), CliError> {
    match names.iter().find(|name| matches.opt_present(name)) {
        Some(name) => Err(CliError::Usage(format!(
            "--{} can't be used with '{}'",
            name, command
        ))),
        None => Ok(()),
    }
}

/// Flag, then environment variable, then `prompt`.
pub fn value_or_else<P>(
    flag: Option<String>,
    env_var: &str,
    lookup: impl Fn(&str) -> Option<String>,
    prompt: P,
) -> Result<String, CliError>
where
    P: FnOnce() -> Result<String, CliError>,
{
    match flag.or_else(|| lookup(env_var).filter(|value| !value.is_empty())) {
        Some(value) => Ok(value),
        None => prompt(),
    }
}

/// Asks for a value on stdin, echoing what is typed.
pub fn prompt_line(label: &'static str) -> Result<String, CliError> {
    read_answer(label, &mut stdin().lock(), &mut stdout())
}

fn read_answer<R, W>(label: &'static str, input: &mut R, output: &mut W) -> Result<String, CliError>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}: ", label).map_err(|e| CliError::Prompt(label, e))?;
    output.flush().map_err(|e| CliError::Prompt(label, e))?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| CliError::Prompt(label, e))?;
    non_empty(label, line.trim())
}

/// Asks for a value without echoing it.
pub fn prompt_hidden(label: &'static str) -> Result<String, CliError> {
    let value = rpassword::prompt_password(format!("{}: ", label))
        .map_err(|e| CliError::Prompt(label, e))?;
    non_empty(label, &value)
}

fn non_empty(label: &str, value: &str) -> Result<String, CliError> {
    if value.is_empty() {
        return Err(CliError::Usage(format!("{} must not be empty", label)));
    }
    Ok(String::from(value))
}
