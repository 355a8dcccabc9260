//! Publishes Strava activities as moves on a Movember member's feed.
//!
//! `configure` stores the Movember login for the `default` profile,
//! `sync` logs in, pulls every Strava activity since the start of
//! Movember 2019 and posts each one as a move.

pub mod cli;
pub mod error;
pub mod logging;
pub mod profile;
pub mod secrets;
pub mod sync;

use anyhow::Result;
use log::info;

use movember_upload::MovePublisher;
use strava_download::ActivityFetcher;

use crate::cli::{
    prompt_hidden, prompt_line, usage, build_options, value_or_else, Command, Invocation,
    MOVEMBER_EMAIL_ENV, STRAVA_TOKEN_ENV,
};
use crate::profile::{configure, ProfileConfig};
use crate::secrets::{secret_store_from_env, MOVEMBER_PASSWORD_ENV};
use crate::sync::sync_profile;

pub const APP_NAME: &str = "strava_to_movember";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Runs one parsed command line to completion.
pub fn run(invocation: Invocation) -> Result<()> {
    let path = invocation.config_file.as_path();

    match invocation.command {
        Command::Help => {
            print!("{}", usage(&build_options()));
        }
        Command::Version => {
            println!("{} {}", APP_NAME, VERSION);
        }
        Command::Configure {
            movember_email,
            movember_password,
        } => {
            let email = value_or_else(movember_email, MOVEMBER_EMAIL_ENV, env_lookup, || {
                prompt_line("email for accessing Movember")
            })?;
            let password = value_or_else(movember_password, MOVEMBER_PASSWORD_ENV, env_lookup, || {
                prompt_hidden("Password for accessing Movember")
            })?;
            let store = secret_store_from_env()?;
            println!("Storing configuration in {}", path.display());
            configure(path, store.as_ref(), &email, &password)?;
        }
        Command::Sync {
            profile,
            strava_token,
            since,
        } => {
            let profiles = ProfileConfig::load(path)?;
            let store = secret_store_from_env()?;
            // fail on an incomplete profile before asking for a token
            profiles.resolve(profile.as_deref(), store.as_ref())?;

            let token = value_or_else(strava_token, STRAVA_TOKEN_ENV, env_lookup, || {
                prompt_line("authentication token for accessing strava")
            })?;

            let fetcher = ActivityFetcher::strava()?;
            let publisher = MovePublisher::new()?;
            let report = sync_profile(
                &profiles,
                profile.as_deref(),
                store.as_ref(),
                &fetcher,
                &publisher,
                &token,
                since,
            )?;
            info!("Sync finished: {:?}", report);
            println!("Published {} moves to Movember", report.published);
        }
    }
    Ok(())
}
