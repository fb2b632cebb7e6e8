//! `survey` multitool CLI.
//!
//! One binary covering both sides of the protocol: `serve` runs the
//! collection endpoint, while `submit`, `fill`, `plan`, `export`, and
//! `health` drive the client against it.

pub mod fill_cmd;
pub mod serve_cmd;
pub mod submit_cmd;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use survey_client::ClientConfig;
use survey_client::ConfigLoader;

/// Collect, buffer, and reconcile survey submissions.
#[derive(Debug, Parser)]
#[command(name = "survey", version)]
pub struct SurveyCli {
    #[command(subcommand)]
    pub command: SurveyCommand,
}

#[derive(Debug, Subcommand)]
pub enum SurveyCommand {
    /// Run the collection endpoint.
    Serve(serve_cmd::ServeArgs),
    /// Submit one page of field values and exit.
    Submit(submit_cmd::SubmitArgs),
    /// Drive a form from stdin through the live submission scheduler.
    Fill(fill_cmd::FillArgs),
    /// Record a plan selection.
    Plan(submit_cmd::PlanArgs),
    /// Append the buffered record to the local CSV export.
    Export(submit_cmd::ExportArgs),
    /// Probe the configured endpoint's health check.
    Health(submit_cmd::HealthArgs),
}

impl SurveyCli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            SurveyCommand::Serve(args) => serve_cmd::run_serve(args).await,
            SurveyCommand::Submit(args) => submit_cmd::run_submit(args).await,
            SurveyCommand::Fill(args) => fill_cmd::run_fill(args).await,
            SurveyCommand::Plan(args) => submit_cmd::run_plan(args).await,
            SurveyCommand::Export(args) => submit_cmd::run_export(args).await,
            SurveyCommand::Health(args) => submit_cmd::run_health(args).await,
        }
    }
}

/// Configuration flags shared by the client-side subcommands.
#[derive(Debug, Parser)]
pub struct ConfigOverrides {
    /// Survey home directory (default: $SURVEY_HOME, then ~/.survey).
    #[arg(long = "survey-home", value_name = "DIR")]
    pub survey_home: Option<PathBuf>,

    /// Collection endpoint URL; overrides the config file and environment.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

impl ConfigOverrides {
    /// Load layered configuration, then apply the command-line overrides
    /// on top.
    pub fn load(&self) -> anyhow::Result<ClientConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(home) = &self.survey_home {
            loader = loader.with_survey_home(home.clone());
        }
        let mut config = loader.load().context("failed to load configuration")?;
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        Ok(config)
    }
}
