//! One-shot client subcommands: `submit`, `plan`, `export`, `health`.

use anyhow::Context;
use clap::Parser;
use survey_client::Delivery;
use survey_client::FallbackExporter;
use survey_client::FormState;
use survey_client::HttpTransport;
use survey_client::LocalBuffer;
use survey_client::SubmissionClient;
use survey_client::SubmitOutcome;
use survey_client::client::EXPORT_DIR;
use survey_protocol::SubmitAction;
use survey_protocol::SurveyField;

use crate::ConfigOverrides;

#[derive(Debug, Parser)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub config: ConfigOverrides,

    /// Page name recorded with the submission.
    #[arg(long, value_name = "NAME", default_value = "page1")]
    pub page: String,

    /// Field assignment, `name=value`; repeatable. `services` accepts
    /// comma-separated values.
    #[arg(long = "field", short = 'f', value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigOverrides,

    /// Plan label, e.g. "Basic" or "Family Care".
    #[arg(value_name = "PLAN")]
    pub plan: String,
}

#[derive(Debug, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub config: ConfigOverrides,
}

#[derive(Debug, Parser)]
pub struct HealthArgs {
    #[command(flatten)]
    pub config: ConfigOverrides,
}

/// Merge the given fields into the buffer and submit the full record.
pub async fn run_submit(args: SubmitArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let client = SubmissionClient::from_config(&config)?;

    let mut form = FormState::new(&args.page);
    for raw in &args.fields {
        apply_assignment(&mut form, raw)?;
    }
    anyhow::ensure!(
        form.has_data(),
        "no field values given; pass --field name=value"
    );

    let outcome = client.submit_form(&form, Delivery::normal()).await?;
    println!("{}", describe(&outcome));
    Ok(())
}

pub async fn run_plan(args: PlanArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let client = SubmissionClient::from_config(&config)?;
    let outcome = client.submit_plan(&args.plan).await?;
    println!("{}", describe(&outcome));
    Ok(())
}

/// Append the buffered record to the cumulative local export.
pub async fn run_export(args: ExportArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let buffer = LocalBuffer::open(config.survey_home.clone())?;
    let record = buffer.load_record()?;
    anyhow::ensure!(
        SurveyField::ALL.iter().any(|field| record.has_value(*field)),
        "nothing buffered under {}",
        config.survey_home.display()
    );

    let exporter = FallbackExporter::new(buffer, config.survey_home.join(EXPORT_DIR));
    let receipt = exporter.export(&record)?;
    println!("wrote {} ({} rows)", receipt.path.display(), receipt.rows);
    Ok(())
}

pub async fn run_health(args: HealthArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let endpoint = config
        .endpoint()
        .context("no endpoint configured; set one in config.toml or $SURVEY_ENDPOINT")?;
    let health = HttpTransport::new(endpoint).health().await?;
    println!("{}: {}", health.status, health.message);
    Ok(())
}

/// Parse one `name=value` assignment into the form. Field names are the
/// wire keys; `services` splits on commas into a list.
pub(crate) fn apply_assignment(form: &mut FormState, raw: &str) -> anyhow::Result<()> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let field = SurveyField::from_wire_key(name.trim())
        .with_context(|| format!("unknown field '{}'", name.trim()))?;
    if field == SurveyField::Services {
        let items = value
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        form.set_list(field, items);
    } else {
        form.set_text(field, value.trim());
    }
    Ok(())
}

pub(crate) fn describe(outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::Delivered {
            action: SubmitAction::Created,
            row,
        } => format!("created row {row}"),
        SubmitOutcome::Delivered {
            action: SubmitAction::Updated,
            row,
        } => format!("updated row {row}"),
        SubmitOutcome::HandedOff => "handed off to the background sender".to_string(),
        SubmitOutcome::ExportedLocally { receipt, reason } => {
            format!("saved locally to {} ({reason})", receipt.path.display())
        }
        SubmitOutcome::Skipped => "skipped (nothing sent)".to_string(),
    }
}
