//! CLI interface for ae5.
//!
//! Every command names its target with an identifier:
//!
//! - `name` or `id`, visible across owners;
//! - `owner/name`, narrowed to one owner;
//! - `owner/name:revision` for projects (`latest` when omitted);
//! - `*` and `?` globs in owner or name, e.g. `u1/train*`.
//!
//! An identifier must resolve to exactly one record before anything is
//! changed. Results go to stdout; progress and prompts go to stderr.

mod deployment;
mod format;
mod job;
mod project;
mod run;
mod secret;
mod session;
mod user;

use std::collections::BTreeMap;

use clap::{Args, Parser, Subcommand};

use crate::api::Api;
use crate::config::{Config, OutputFormat};
use crate::dispatch::{AssumeYes, Dispatcher, Prompt, TerminalPrompt};
use crate::error::Result;
use crate::remote::HttpRemote;
use crate::session::Session;
use crate::vars;

use deployment::DeploymentCommand;
use format::Printer;
use job::JobCommand;
use project::ProjectCommand;
use run::RunCommand;
use secret::SecretCommand;
use session::SessionCommand;
use user::UserCommand;

/// ae5: manage projects, jobs, runs, sessions, and deployments.
#[derive(Debug, Parser)]
#[command(name = "ae5", version, after_long_help = EXAMPLES_HELP)]
pub struct Cli {
    /// Platform hostname. Falls back to `AE5_HOSTNAME`, then the config file.
    #[arg(long, global = true)]
    hostname: Option<String>,

    /// Output format. Defaults to the config file's, else `table`.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Answer yes to every confirmation prompt.
    #[arg(long, short, global = true)]
    yes: bool,

    /// Log progress (info level).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log HTTP traffic (debug level).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    command: Command,
}

const EXAMPLES_HELP: &str = r"Examples:
  ae5 project list 'u1/*'
  ae5 project upload ./proj.tar.gz --tag 0.1.0
  ae5 job create u1/proj:0.1.0 --command train --variable EPOCHS=10 --wait
  ae5 job create proj --cleanup --show-run
  ae5 job patch nightly --schedule '30 3 * * *' --clear-variables
  ae5 run list --filter state=failed --format json
  ae5 deployment stop 'api-*' --yes";

#[derive(Debug, Subcommand)]
enum Command {
    /// Scheduled and run-once jobs.
    Job {
        #[command(subcommand)]
        command: JobCommand,
    },

    /// Projects and their revisions.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Job runs.
    Run {
        #[command(subcommand)]
        command: RunCommand,
    },

    /// Interactive editor sessions.
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Deployed project endpoints.
    Deployment {
        #[command(subcommand)]
        command: DeploymentCommand,
    },

    /// User secrets.
    Secret {
        #[command(subcommand)]
        command: SecretCommand,
    },

    /// Platform users.
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

/// Arguments shared by every `list` command.
#[derive(Debug, Args)]
struct ListArgs {
    /// Only records matching this identifier pattern (e.g. `u1/*`). Revisions are not accepted.
    pattern: Option<String>,

    /// Only records whose FIELD matches VALUE (globs allowed). Repeatable; all must match.
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,
}

impl ListArgs {
    fn filters(&self) -> Result<BTreeMap<String, String>> {
        Ok(vars::normalize(&self.filters, false)?.unwrap_or_default())
    }
}

/// Run the CLI.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let printer = Printer::new(cli.format.unwrap_or(config.format));

    let session = Session::resolve(cli.hostname.as_deref(), &config)?;
    let remote = HttpRemote::new(session, config.timeout())?;
    let prompt: &dyn Prompt = if cli.yes { &AssumeYes } else { &TerminalPrompt };
    let api = Api::new(Dispatcher::new(&remote, prompt, config.wait_policy()));

    match cli.command {
        Command::Job { command } => job::run(&api, &printer, command),
        Command::Project { command } => project::run(&api, &printer, command),
        Command::Run { command } => run::run(&api, &printer, command),
        Command::Session { command } => session::run(&api, &printer, command),
        Command::Deployment { command } => deployment::run(&api, &printer, command),
        Command::Secret { command } => secret::run(&api, &printer, command),
        Command::User { command } => user::run(&api, &printer, command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ae5").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = parse(&["job", "list", "--format", "json", "--yes", "--hostname", "ae.example.com"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.yes);
        assert_eq!(cli.hostname.as_deref(), Some("ae.example.com"));
    }

    #[test]
    fn list_filters_repeat() {
        let cli = parse(&["run", "list", "u1/*", "--filter", "state=failed", "--filter", "name=train*"]);
        let Command::Run {
            command: RunCommand::List(args),
        } = cli.command
        else {
            panic!("expected run list");
        };
        assert_eq!(args.pattern.as_deref(), Some("u1/*"));
        let filters = args.filters().unwrap();
        assert_eq!(filters["state"], "failed");
        assert_eq!(filters["name"], "train*");
    }

    #[test]
    fn malformed_filter_is_rejected() {
        let args = ListArgs {
            pattern: None,
            filters: vec!["state".to_string()],
        };
        assert!(args.filters().is_err());
    }

    #[test]
    fn project_upload_takes_an_archive_path() {
        let cli = parse(&["project", "upload", "proj.tar.gz", "--tag", "0.1.0"]);
        assert!(matches!(
            cli.command,
            Command::Project {
                command: ProjectCommand::Upload(_)
            }
        ));
    }

    #[test]
    fn unknown_group_is_a_parse_error() {
        assert!(Cli::try_parse_from(["ae5", "workspace", "list"]).is_err());
    }
}
