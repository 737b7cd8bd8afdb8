//! Deployment commands: list, info, stop, token.

use clap::Subcommand;

use crate::api::Api;
use crate::error::Result;
use crate::model::ResourceKind;

use super::ListArgs;
use super::format::Printer;

#[derive(Debug, Subcommand)]
pub enum DeploymentCommand {
    /// List deployments.
    List(ListArgs),

    /// Show one deployment.
    Info { deployment: String },

    /// Stop a deployment and release its endpoint.
    Stop { deployment: String },

    /// Mint an access token for a private deployment.
    Token { deployment: String },
}

pub(super) fn run(api: &Api, printer: &Printer, command: DeploymentCommand) -> Result<()> {
    match command {
        DeploymentCommand::List(args) => {
            let deployments =
                api.list(ResourceKind::Deployment, args.pattern.as_deref(), &args.filters()?)?;
            printer.records(ResourceKind::Deployment, &deployments)
        }
        DeploymentCommand::Info { deployment } => {
            printer.record(&api.info(ResourceKind::Deployment, &deployment)?)
        }
        DeploymentCommand::Stop { deployment } => {
            printer.record(&api.stop(ResourceKind::Deployment, &deployment)?)
        }
        DeploymentCommand::Token { deployment } => {
            printer.record(&api.deployment_token(&deployment)?)
        }
    }
}
