//! Job commands: list, info, create, run, pause, unpause, patch, delete, runs.

use clap::{Args, Subcommand};

use crate::api::Api;
use crate::dispatch::{JobPatch, JobSpec};
use crate::error::Result;
use crate::model::ResourceKind;
use crate::vars;

use super::ListArgs;
use super::format::Printer;

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// List jobs.
    List(ListArgs),

    /// Show one job.
    Info {
        /// Job: `name`, `owner/name`, id, or glob.
        job: String,
    },

    /// Create a job from a project revision.
    ///
    /// Run-once jobs start immediately unless `--no-run` is given; scheduled
    /// jobs only start on schedule unless `--run` is given.
    Create(CreateArgs),

    /// Start a run of a job now.
    Run {
        job: String,

        /// Wait for the run to finish and print it.
        #[arg(long)]
        wait: bool,
    },

    /// Stop scheduling new runs of a job.
    Pause { job: String },

    /// Resume scheduling a paused job.
    Unpause { job: String },

    /// Change job parameters. Only fields that differ are sent.
    Patch(PatchArgs),

    /// Delete a job.
    Delete { job: String },

    /// List the runs of a job.
    Runs { job: String },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Project revision: `owner/name:revision`; the revision defaults to `latest`.
    project: String,

    /// Job name. Defaults to `<project>-<command>`.
    #[arg(long)]
    name: Option<String>,

    /// Append `-1`, `-2`, ... if the name is already taken by a job or run.
    #[arg(long)]
    make_unique: bool,

    /// Project command to run. Defaults to the revision's first command.
    #[arg(long)]
    command: Option<String>,

    /// Cron schedule. Omit for a run-once job.
    #[arg(long)]
    schedule: Option<String>,

    /// Resource profile. Defaults to the project's, else `default`.
    #[arg(long)]
    resource_profile: Option<String>,

    /// Environment variable for the job, as KEY=VALUE. Repeatable.
    #[arg(long = "variable", value_name = "KEY=VALUE")]
    variables: Vec<String>,

    /// Start a run right away, even for a scheduled job.
    #[arg(long, conflicts_with = "no_run")]
    run: bool,

    /// Do not start a run.
    #[arg(long)]
    no_run: bool,

    /// Wait for the first run to finish.
    #[arg(long)]
    wait: bool,

    /// Print the run instead of the job.
    #[arg(long)]
    show_run: bool,

    /// Run once, wait, print the run, then delete the job.
    #[arg(long)]
    cleanup: bool,
}

impl CreateArgs {
    fn spec(&self) -> Result<JobSpec> {
        let run = match (self.run, self.no_run) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Ok(JobSpec {
            name: self.name.clone(),
            make_unique: self.make_unique,
            command: self.command.clone(),
            schedule: self.schedule.clone(),
            resource_profile: self.resource_profile.clone(),
            variables: vars::normalize(&self.variables, false)?,
            run,
            show_run: self.show_run,
            cleanup: self.cleanup,
        })
    }
}

#[derive(Debug, Args)]
pub struct PatchArgs {
    job: String,

    /// New job name.
    #[arg(long)]
    name: Option<String>,

    /// New project command.
    #[arg(long)]
    command: Option<String>,

    /// New cron schedule.
    #[arg(long)]
    schedule: Option<String>,

    /// New resource profile.
    #[arg(long)]
    resource_profile: Option<String>,

    /// Replace the job's variables with these KEY=VALUE pairs. Repeatable.
    #[arg(long = "variable", value_name = "KEY=VALUE")]
    variables: Vec<String>,

    /// Remove every variable from the job.
    #[arg(long)]
    clear_variables: bool,
}

impl PatchArgs {
    fn patch(&self) -> Result<JobPatch> {
        Ok(JobPatch {
            name: self.name.clone(),
            command: self.command.clone(),
            schedule: self.schedule.clone(),
            resource_profile: self.resource_profile.clone(),
            variables: vars::normalize(&self.variables, self.clear_variables)?,
        })
    }
}

pub(super) fn run(api: &Api, printer: &Printer, command: JobCommand) -> Result<()> {
    match command {
        JobCommand::List(args) => {
            let jobs = api.list(ResourceKind::Job, args.pattern.as_deref(), &args.filters()?)?;
            printer.records(ResourceKind::Job, &jobs)
        }
        JobCommand::Info { job } => printer.record(&api.info(ResourceKind::Job, &job)?),
        JobCommand::Create(args) => {
            let spec = args.spec()?;
            printer.record(&api.job_create(&args.project, spec, args.wait)?)
        }
        JobCommand::Run { job, wait } => printer.record(&api.job_run(&job, wait)?),
        JobCommand::Pause { job } => printer.record(&api.job_pause(&job)?),
        JobCommand::Unpause { job } => printer.record(&api.job_unpause(&job)?),
        JobCommand::Patch(args) => {
            let patch = args.patch()?;
            printer.record(&api.job_patch(&args.job, patch)?)
        }
        JobCommand::Delete { job } => printer.record(&api.delete(ResourceKind::Job, &job)?),
        JobCommand::Runs { job } => printer.records(ResourceKind::Run, &api.job_runs(&job)?),
    }
}
