//! User commands: list, info.

use clap::Subcommand;

use crate::api::Api;
use crate::error::Result;
use crate::model::ResourceKind;

use super::ListArgs;
use super::format::Printer;

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List platform users. Requires admin rights on the identity realm.
    List(ListArgs),

    /// Show one user by username or id.
    Info { user: String },
}

pub(super) fn run(api: &Api, printer: &Printer, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::List(args) => {
            let users = api.list(ResourceKind::User, args.pattern.as_deref(), &args.filters()?)?;
            printer.records(ResourceKind::User, &users)
        }
        UserCommand::Info { user } => printer.record(&api.info(ResourceKind::User, &user)?),
    }
}
