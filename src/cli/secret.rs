//! Secret commands: list, add, delete.

use clap::Subcommand;

use crate::api::Api;
use crate::error::Result;
use crate::model::ResourceKind;

use super::ListArgs;
use super::format::Printer;

#[derive(Debug, Subcommand)]
pub enum SecretCommand {
    /// List secret names. Values are never shown.
    List(ListArgs),

    /// Store a secret, replacing any existing value.
    Add {
        /// Secret name.
        key: String,

        /// Secret value.
        value: String,
    },

    /// Delete a secret by exact name.
    Delete { key: String },
}

pub(super) fn run(api: &Api, printer: &Printer, command: SecretCommand) -> Result<()> {
    match command {
        SecretCommand::List(args) => {
            let secrets =
                api.list(ResourceKind::Secret, args.pattern.as_deref(), &args.filters()?)?;
            printer.records(ResourceKind::Secret, &secrets)
        }
        SecretCommand::Add { key, value } => {
            let secret = api.secret_add(&key, &value)?;
            eprintln!("Secret {key} stored.");
            printer.record(&secret)
        }
        SecretCommand::Delete { key } => printer.record(&api.secret_delete(&key)?),
    }
}
