//! watcher — log every change to the working directory.
//!
//! # Usage
//!
//! ```text
//! watcher            watch ./ in the foreground
//! watcher -d         re-launch in the background, pid recorded in watcher.lock
//! watcher -s         kill the instance recorded in watcher.lock
//! watcher -h         print usage
//! ```

use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, CommandFactory, Parser};

use watcher_core::{config, LogSink};
use watcher_daemon::paths::WATCH_PATH;
use watcher_daemon::{
    logging, start_blocking, Decision, Lifecycle, LifecycleError, LoopExit, Outcome, TracingSink,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "watcher",
    about = "Watch the working directory and log every change",
    disable_help_flag = true,
    help_template = "{name} usage:\n  {usage}\n\n{all-args}\n"
)]
struct Cli {
    /// usage
    #[arg(short = 'h', action = ArgAction::SetTrue)]
    help: bool,

    /// run watcher as a daemon with -d=true
    #[arg(
        short = 'd',
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
    )]
    daemon: bool,

    /// shutdown watcher
    #[arg(
        short = 's',
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
    )]
    shutdown: bool,

    /// Arguments handed on to the background instance started by -d.
    #[arg(trailing_var_arg = true)]
    args: Vec<OsString>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("watcher: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// The single place where outcomes and failures become exit codes.
fn run(cli: Cli) -> Result<ExitCode> {
    let dir = Path::new(".");
    let settings = config::load_at(dir).context("failed to load watcher.yaml")?;
    logging::init(settings.log.as_ref(), Path::new(WATCH_PATH))
        .context("failed to initialize logging")?;

    let sink: Arc<dyn LogSink> = Arc::new(TracingSink);
    let decision = Decision::from_flags(cli.daemon, cli.help, cli.shutdown);

    match Lifecycle::system(sink.clone(), dir).execute(decision, &cli.args) {
        Ok(Outcome::Proceed) => {}
        Ok(Outcome::Help) => {
            Cli::command()
                .print_help()
                .context("failed to print usage")?;
            return Ok(ExitCode::SUCCESS);
        }
        Ok(Outcome::Daemonized { .. } | Outcome::ShutdownSent { .. }) => {
            return Ok(ExitCode::SUCCESS);
        }
        Err(err @ (LifecycleError::Spawn { .. } | LifecycleError::CurrentExe(_))) => {
            println!("{err}");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => {
            sink.error(&err.to_string());
            return Ok(ExitCode::FAILURE);
        }
    }

    match start_blocking(Path::new(WATCH_PATH), sink.clone()) {
        Ok(LoopExit::SourceClosed) => {
            sink.info("notification source closed");
            Ok(ExitCode::SUCCESS)
        }
        Ok(LoopExit::Cancelled) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            sink.error(&err.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("watcher").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_flags_mean_true() {
        let cli = parse(&["-d", "-s", "-h"]);
        assert!(cli.daemon && cli.shutdown && cli.help);
    }

    #[test]
    fn explicit_boolean_values_are_accepted() {
        let cli = parse(&["-d=true", "-s=false"]);
        assert!(cli.daemon);
        assert!(!cli.shutdown);
    }

    #[test]
    fn no_flags_run_in_foreground() {
        let cli = parse(&[]);
        assert_eq!(
            Decision::from_flags(cli.daemon, cli.help, cli.shutdown),
            Decision::Foreground
        );
        assert!(cli.args.is_empty());
    }

    #[test]
    fn trailing_arguments_are_collected_for_the_child() {
        let cli = parse(&["-d", "extra", "-x"]);
        assert!(cli.daemon);
        assert_eq!(cli.args, vec![OsString::from("extra"), OsString::from("-x")]);
    }

    #[test]
    fn only_the_documented_flags_exist() {
        assert!(Cli::try_parse_from(["watcher", "-V"]).is_err());
        assert!(Cli::try_parse_from(["watcher", "--version"]).is_err());
    }

    #[test]
    fn non_boolean_value_is_rejected() {
        assert!(Cli::try_parse_from(["watcher", "-d=maybe"]).is_err());
    }
}
