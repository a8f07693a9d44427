//! Confirms the final status of a checkout trade from the command line.
//!
//! Polls the backend's `/api/query-transaction/{trade_no}` route with the
//! same policy the checkout page uses. Accepts either a trade number or the
//! return URL the gateway redirected the buyer to after 3DS.

use anyhow::{anyhow, Context, Result};
use clap::{ArgGroup, Parser};
use pagsmile_checkout::config::{LoggingConfig, ReconcileConfig};
use pagsmile_checkout::logging::init_tracing;
use pagsmile_checkout::reconcile::{
    CheckoutApiClient, CheckoutOutcome, PollPolicy, Reconciler, ReturnParams,
};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "checkout-reconcile", version, about = "Poll a checkout trade until its status is final")]
#[command(group(ArgGroup::new("target").required(true).args(["trade_no", "return_url"])))]
struct Cli {
    /// Base URL of the checkout backend
    #[arg(long, env = "CHECKOUT_BACKEND_URL", default_value = "http://localhost:3000")]
    backend: String,

    /// Gateway trade number to confirm
    #[arg(long)]
    trade_no: Option<String>,

    /// Return URL carrying `trade_no` and `status` query parameters
    #[arg(long)]
    return_url: Option<String>,

    /// Per-request timeout against the backend, in seconds
    #[arg(long, default_value_t = 10)]
    request_timeout_secs: u64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    trade_no: &'a str,
    status: &'a str,
    attempts: u32,
    outcome: &'a CheckoutOutcome,
}

fn resolve_trade_no(cli: &Cli) -> Result<String> {
    if let Some(trade_no) = cli.trade_no.as_deref() {
        return Ok(trade_no.trim().to_string());
    }

    let url = cli
        .return_url
        .as_deref()
        .ok_or_else(|| anyhow!("either --trade-no or --return-url is required"))?;
    let params = ReturnParams::parse(url)?;
    if let Some(status) = params.status.as_deref() {
        info!(status = %status, "return URL carries a gateway status hint");
    }
    info!(cleaned_url = %params.cleaned_url, "callback parameters stripped");
    params
        .trade_no
        .ok_or_else(|| anyhow!("return URL has no trade_no parameter"))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let trade_no = resolve_trade_no(&cli)?;
    let reconcile_config = ReconcileConfig::from_env()?;
    reconcile_config.validate()?;
    let policy = PollPolicy::from(&reconcile_config);

    let source = CheckoutApiClient::new(&cli.backend, Duration::from_secs(cli.request_timeout_secs))
        .context("failed to build backend client")?;
    let reconciler = Reconciler::with_tokio_clock(Arc::new(source), policy);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, abandoning reconciliation");
            let _ = cancel_tx.send(true);
        } else {
            // dropping cancel_tx here would end the session
            std::future::pending::<()>().await;
        }
    });

    info!(
        trade_no = %trade_no,
        backend = %cli.backend,
        max_attempts = reconciler.policy().max_attempts,
        "confirming trade status"
    );
    let reconciliation = reconciler.resume(&trade_no, cancel_rx).await?;
    let outcome = reconciliation.outcome();

    if cli.json {
        let report = Report {
            trade_no: &trade_no,
            status: reconciliation.status.as_str(),
            attempts: reconciliation.attempts,
            outcome: &outcome,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} [{}] after {} attempt(s): {}",
            trade_no, reconciliation.status, reconciliation.attempts, outcome.message
        );
    }

    Ok(if outcome.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&LoggingConfig::from_env().unwrap_or_default());

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
