//! Project commands: list, info, revisions, upload, delete, deploy.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::api::Api;
use crate::dispatch::DeploySpec;
use crate::error::Result;
use crate::model::ResourceKind;

use super::ListArgs;
use super::format::{Printer, REVISION_COLUMNS};

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// List projects.
    List(ListArgs),

    /// Show a project, or one of its revisions with `name:revision`.
    Info { project: String },

    /// List the revisions of a project.
    Revisions { project: String },

    /// Create a project from an archive.
    Upload(UploadArgs),

    /// Delete a project and all of its revisions.
    Delete { project: String },

    /// Deploy a project revision as an endpoint.
    Deploy(DeployArgs),
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Project archive (`.tar.gz`, `.tar.bz2`, or `.zip`).
    archive: PathBuf,

    /// Project name. Defaults to the archive's file name without extensions.
    #[arg(long)]
    name: Option<String>,

    /// Tag for the first revision.
    #[arg(long)]
    tag: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Project revision: `owner/name:revision`; the revision defaults to `latest`.
    project: String,

    /// Deployment name. Defaults to the project name.
    #[arg(long)]
    name: Option<String>,

    /// Command to serve; must be one the revision defines. Defaults to its first.
    #[arg(long)]
    command: Option<String>,

    /// Resource profile. Defaults to the project's, else `default`.
    #[arg(long)]
    resource_profile: Option<String>,

    /// Make the endpoint reachable without a token.
    #[arg(long)]
    public: bool,

    /// Fixed endpoint prefix instead of a generated one.
    #[arg(long)]
    static_endpoint: Option<String>,
}

impl From<DeployArgs> for DeploySpec {
    fn from(args: DeployArgs) -> Self {
        Self {
            name: args.name,
            command: args.command,
            resource_profile: args.resource_profile,
            public: args.public,
            static_endpoint: args.static_endpoint,
        }
    }
}

pub(super) fn run(api: &Api, printer: &Printer, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::List(args) => {
            let projects =
                api.list(ResourceKind::Project, args.pattern.as_deref(), &args.filters()?)?;
            printer.records(ResourceKind::Project, &projects)
        }
        ProjectCommand::Info { project } => {
            printer.record(&api.info(ResourceKind::Project, &project)?)
        }
        ProjectCommand::Revisions { project } => printer.records_with(
            ResourceKind::Project,
            REVISION_COLUMNS,
            &api.project_revisions(&project)?,
        ),
        ProjectCommand::Upload(args) => printer.record(&api.project_upload(
            &args.archive,
            args.name.as_deref(),
            args.tag.as_deref(),
        )?),
        ProjectCommand::Delete { project } => {
            printer.record(&api.delete(ResourceKind::Project, &project)?)
        }
        ProjectCommand::Deploy(args) => {
            let project = args.project.clone();
            printer.record(&api.project_deploy(&project, args.into())?)
        }
    }
}
