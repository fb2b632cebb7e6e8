//! `survey fill` subcommand: a stdin-driven stand-in for the survey pages.
//!
//! Routes every edit through the same scheduler the form pages use, so
//! debounce, the heartbeat, and the exit flush all behave exactly as they
//! do in a live session.
//!
//! ## Commands
//!
//! - `name=value` sets a field and counts as an interaction
//! - `next [page]` submits and advances (default increments `pageN`)
//! - `show` prints the buffered record
//! - `quit`, EOF, or ctrl-c flushes and exits

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use survey_client::FormState;
use survey_client::SchedulerHandle;
use survey_client::SubmissionClient;
use survey_client::SubmissionScheduler;
use survey_client::SubmitError;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::Mutex;

use crate::ConfigOverrides;
use crate::submit_cmd::apply_assignment;
use crate::submit_cmd::describe;

#[derive(Debug, Parser)]
pub struct FillArgs {
    #[command(flatten)]
    pub config: ConfigOverrides,

    /// Page to start on.
    #[arg(long, value_name = "NAME", default_value = "page1")]
    pub page: String,
}

pub async fn run_fill(args: FillArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let client = Arc::new(SubmissionClient::from_config(&config)?);
    let form = Arc::new(Mutex::new(FormState::new(&args.page)));
    let handle = SubmissionScheduler::new(Arc::clone(&client), Arc::clone(&form), &config).spawn();

    println!("session {} on {}", client.session_id()?, args.page);
    println!("commands: name=value, next [page], show, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        if line == "show" {
            let record = client.buffered_record()?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            continue;
        }
        if line == "next" || line.starts_with("next ") {
            let target = line.strip_prefix("next").unwrap_or_default().trim();
            advance(&client, &form, &handle, target).await?;
            continue;
        }
        match apply_assignment(&mut *form.lock().await, line) {
            Ok(()) => handle.interaction(),
            Err(err) => eprintln!("{err}"),
        }
    }

    handle.exit();
    handle.shutdown().await;
    Ok(())
}

/// Fire the page-specific submission where one exists, then advance. An
/// email that fails validation blocks the advance, like the live form.
async fn advance(
    client: &SubmissionClient,
    form: &Mutex<FormState>,
    handle: &SchedulerHandle,
    target: &str,
) -> anyhow::Result<()> {
    let snapshot = form.lock().await.clone();

    match snapshot.page() {
        "page1" => println!("{}", describe(&client.submit_page1(&snapshot).await?)),
        "page7" => match client.submit_page7(&snapshot).await {
            Ok(outcome) => println!("{}", describe(&outcome)),
            Err(SubmitError::InvalidEmail(message)) => {
                eprintln!("{message}");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        },
        _ => {}
    }

    let next = if target.is_empty() {
        next_page_name(snapshot.page())
            .with_context(|| format!("cannot infer the page after '{}'", snapshot.page()))?
    } else {
        target.to_string()
    };
    println!("-> {next}");
    handle.advance(Some(next));
    Ok(())
}

fn next_page_name(current: &str) -> Option<String> {
    let n: u32 = current.strip_prefix("page")?.parse().ok()?;
    Some(format!("page{}", n + 1))
}
