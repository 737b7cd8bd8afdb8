//! Session commands: list, info, stop.

use clap::Subcommand;

use crate::api::Api;
use crate::error::Result;
use crate::model::ResourceKind;

use super::ListArgs;
use super::format::Printer;

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// List editor sessions.
    List(ListArgs),

    /// Show one session.
    Info { session: String },

    /// Stop a session.
    Stop { session: String },
}

pub(super) fn run(api: &Api, printer: &Printer, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::List(args) => {
            let sessions =
                api.list(ResourceKind::Session, args.pattern.as_deref(), &args.filters()?)?;
            printer.records(ResourceKind::Session, &sessions)
        }
        SessionCommand::Info { session } => {
            printer.record(&api.info(ResourceKind::Session, &session)?)
        }
        SessionCommand::Stop { session } => {
            printer.record(&api.stop(ResourceKind::Session, &session)?)
        }
    }
}
