//! Run commands: list, info, stop, delete, wait.

use clap::Subcommand;

use crate::api::Api;
use crate::error::Result;
use crate::model::ResourceKind;

use super::ListArgs;
use super::format::Printer;

#[derive(Debug, Subcommand)]
pub enum RunCommand {
    /// List runs across all jobs.
    List(ListArgs),

    /// Show one run.
    Info { run: String },

    /// Stop a run in progress.
    Stop { run: String },

    /// Delete a run and its logs.
    Delete { run: String },

    /// Wait for a run to finish, then print it.
    Wait { run: String },
}

pub(super) fn run(api: &Api, printer: &Printer, command: RunCommand) -> Result<()> {
    match command {
        RunCommand::List(args) => {
            let runs = api.list(ResourceKind::Run, args.pattern.as_deref(), &args.filters()?)?;
            printer.records(ResourceKind::Run, &runs)
        }
        RunCommand::Info { run } => printer.record(&api.info(ResourceKind::Run, &run)?),
        RunCommand::Stop { run } => printer.record(&api.stop(ResourceKind::Run, &run)?),
        RunCommand::Delete { run } => printer.record(&api.delete(ResourceKind::Run, &run)?),
        RunCommand::Wait { run } => printer.record(&api.run_wait(&run)?),
    }
}
