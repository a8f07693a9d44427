use super::clock::{Clock, TokioClock};
use super::source::{StatusSource, StatusSourceError};
use crate::config::ReconcileConfig;
use crate::payments::types::TradeStatus;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Label for an attempt that saw a non-terminal status. Local only; the
/// gateway never sends or receives it.
pub const PENDING: &str = "PENDING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub sdk_timeout: Duration,
    pub settle_delay: Duration,
    pub max_attempts: u32,
    pub interval: Duration,
}

impl From<&ReconcileConfig> for PollPolicy {
    fn from(config: &ReconcileConfig) -> Self {
        PollPolicy {
            sdk_timeout: Duration::from_secs(config.sdk_timeout_secs),
            settle_delay: Duration::from_secs(config.settle_delay_secs),
            max_attempts: config.max_attempts,
            interval: Duration::from_secs(config.interval_secs),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy::from(&ReconcileConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    Success,
    Failed,
    Cancelled,
    /// Attempts ran out before a terminal status appeared.
    Timeout,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::Success => "SUCCESS",
            FinalStatus::Failed => "FAILED",
            FinalStatus::Cancelled => "CANCELLED",
            FinalStatus::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    Submitting,
    Settling,
    Polling { attempt: u32 },
    Terminal(FinalStatus),
    Rejected,
    /// The session signal fired before a terminal status was reached.
    Abandoned,
}

/// What a single poll attempt saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Terminal(FinalStatus),
    Pending(String),
    QueryFailed(String),
}

impl Observation {
    pub fn from_query(result: Result<String, StatusSourceError>) -> Self {
        match result {
            Ok(raw) => match raw.parse::<TradeStatus>() {
                Ok(TradeStatus::Success) => Observation::Terminal(FinalStatus::Success),
                Ok(TradeStatus::Failed) => Observation::Terminal(FinalStatus::Failed),
                Ok(TradeStatus::Cancelled) => Observation::Terminal(FinalStatus::Cancelled),
                _ => Observation::Pending(raw),
            },
            Err(e) => Observation::QueryFailed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkStatus {
    Success,
    Error,
    Other(String),
}

/// What the browser tokenization SDK reported for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkResult {
    pub status: SdkStatus,
    /// Set when the gateway wants the merchant to confirm through a query.
    pub query: bool,
    pub message: Option<String>,
}

impl SdkResult {
    pub fn success() -> Self {
        SdkResult {
            status: SdkStatus::Success,
            query: false,
            message: None,
        }
    }

    /// A failed or timed-out submission. The payment may still have gone
    /// through behind a 3DS challenge, so a query is always requested.
    pub fn error(message: impl Into<String>) -> Self {
        SdkResult {
            status: SdkStatus::Error,
            query: true,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("reconciliation cancelled")]
    Cancelled,
    #[error("{0}")]
    Rejected(String),
    #[error("invalid return URL: {0}")]
    InvalidReturnUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub status: FinalStatus,
    /// Number of status queries issued.
    pub attempts: u32,
    pub sdk_message: Option<String>,
}

impl Reconciliation {
    pub fn outcome(&self) -> CheckoutOutcome {
        CheckoutOutcome::from_final_status(self.status, self.sdk_message.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Processing,
    Error,
}

/// User-facing summary of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutOutcome {
    pub kind: OutcomeKind,
    pub message: String,
}

impl CheckoutOutcome {
    pub fn from_final_status(status: FinalStatus, sdk_message: Option<&str>) -> Self {
        let with_detail = |base: &str| match sdk_message.map(str::trim).filter(|m| !m.is_empty()) {
            Some(detail) => format!("{} {}", base, detail),
            None => base.to_string(),
        };

        match status {
            FinalStatus::Success => CheckoutOutcome {
                kind: OutcomeKind::Success,
                message: "Payment completed successfully!".to_string(),
            },
            FinalStatus::Timeout => CheckoutOutcome {
                kind: OutcomeKind::Processing,
                message: "Payment is being processed. Check your e-mail for confirmation."
                    .to_string(),
            },
            FinalStatus::Failed => CheckoutOutcome {
                kind: OutcomeKind::Error,
                message: with_detail("Payment failed."),
            },
            FinalStatus::Cancelled => CheckoutOutcome {
                kind: OutcomeKind::Error,
                message: with_detail("Payment cancelled."),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == OutcomeKind::Error
    }
}

async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

/// Confirms the outcome of a card submission by polling the trade status.
///
/// Progress is published on a `watch` channel (see [`Reconciler::subscribe`]).
/// Every wait and every query is abandoned as soon as the session signal
/// passed to the public methods turns `true` or its sender is dropped.
pub struct Reconciler {
    source: Arc<dyn StatusSource>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
    state: watch::Sender<ReconcileState>,
}

impl Reconciler {
    pub fn new(source: Arc<dyn StatusSource>, clock: Arc<dyn Clock>, policy: PollPolicy) -> Self {
        let (state, _) = watch::channel(ReconcileState::Idle);
        Self {
            source,
            clock,
            policy,
            state,
        }
    }

    pub fn with_tokio_clock(source: Arc<dyn StatusSource>, policy: PollPolicy) -> Self {
        Self::new(source, Arc::new(TokioClock), policy)
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn subscribe(&self) -> watch::Receiver<ReconcileState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ReconcileState {
        self.state.borrow().clone()
    }

    fn publish(&self, next: ReconcileState) {
        debug!(state = ?next, "reconcile state changed");
        self.state.send_replace(next);
    }

    async fn until_cancelled<T>(
        &self,
        cancel: &mut watch::Receiver<bool>,
        work: impl Future<Output = T>,
    ) -> Result<T, ReconcileError> {
        tokio::select! {
            biased;
            _ = wait_for_cancel(cancel) => {
                info!("reconciliation abandoned by session signal");
                self.publish(ReconcileState::Abandoned);
                Err(ReconcileError::Cancelled)
            }
            out = work => Ok(out),
        }
    }

    /// Races `submission` against the SDK timeout, then settles and polls
    /// when the result calls for server-side confirmation.
    pub async fn reconcile_submission<F>(
        &self,
        trade_no: Option<&str>,
        submission: F,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Reconciliation, ReconcileError>
    where
        F: Future<Output = Result<SdkResult, String>>,
    {
        self.publish(ReconcileState::Submitting);

        let sdk_timeout = self.policy.sdk_timeout;
        let raced = async {
            tokio::select! {
                biased;
                result = submission => match result {
                    Ok(sdk) => sdk,
                    Err(message) => SdkResult::error(message),
                },
                _ = self.clock.sleep(sdk_timeout) => SdkResult::error(format!(
                    "Payment submission timed out ({}s)",
                    sdk_timeout.as_secs()
                )),
            }
        };
        let sdk = self.until_cancelled(&mut cancel, raced).await?;
        info!(
            status = ?sdk.status,
            query = sdk.query,
            message = ?sdk.message,
            "sdk submission finished"
        );

        let trade_no = trade_no.map(str::trim).filter(|t| !t.is_empty());
        let needs_query = sdk.query || sdk.status == SdkStatus::Error;

        match trade_no {
            Some(trade_no) if needs_query => {
                self.publish(ReconcileState::Settling);
                self.until_cancelled(&mut cancel, self.clock.sleep(self.policy.settle_delay))
                    .await?;
                let mut reconciliation = self.poll_attempts(trade_no, &mut cancel).await?;
                reconciliation.sdk_message = sdk.message;
                Ok(reconciliation)
            }
            _ if sdk.status == SdkStatus::Success => {
                self.publish(ReconcileState::Terminal(FinalStatus::Success));
                Ok(Reconciliation {
                    status: FinalStatus::Success,
                    attempts: 0,
                    sdk_message: sdk.message,
                })
            }
            _ => {
                self.publish(ReconcileState::Rejected);
                let message = sdk
                    .message
                    .unwrap_or_else(|| "Payment failed".to_string());
                warn!(message = %message, "payment rejected without a trade to confirm");
                Err(ReconcileError::Rejected(message))
            }
        }
    }

    /// Polls without settling first.
    pub async fn poll(
        &self,
        trade_no: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Reconciliation, ReconcileError> {
        self.poll_attempts(trade_no, &mut cancel).await
    }

    /// Re-enters polling for a trade named on a 3DS return URL.
    pub async fn resume(
        &self,
        trade_no: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<Reconciliation, ReconcileError> {
        let trade_no = trade_no.trim();
        if trade_no.is_empty() {
            return Err(ReconcileError::Rejected(
                "Trade number is required".to_string(),
            ));
        }
        info!(trade_no = %trade_no, "resuming status reconciliation");
        self.poll(trade_no, cancel).await
    }

    async fn poll_attempts(
        &self,
        trade_no: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Reconciliation, ReconcileError> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                self.until_cancelled(cancel, self.clock.sleep(self.policy.interval))
                    .await?;
            }
            self.publish(ReconcileState::Polling { attempt });

            let result = self
                .until_cancelled(cancel, self.source.fetch_status(trade_no))
                .await?;

            match Observation::from_query(result) {
                Observation::Terminal(status) => {
                    info!(trade_no = %trade_no, attempt, status = %status, "trade reached a final status");
                    self.publish(ReconcileState::Terminal(status));
                    return Ok(Reconciliation {
                        status,
                        attempts: attempt,
                        sdk_message: None,
                    });
                }
                Observation::Pending(raw) => {
                    debug!(
                        trade_no = %trade_no,
                        attempt,
                        max_attempts,
                        trade_status = %raw,
                        observation = PENDING,
                        "trade still pending"
                    );
                }
                Observation::QueryFailed(error) => {
                    warn!(
                        trade_no = %trade_no,
                        attempt,
                        max_attempts,
                        error = %error,
                        "status query failed, will retry"
                    );
                }
            }
        }

        info!(trade_no = %trade_no, max_attempts, "polling exhausted without a final status");
        self.publish(ReconcileState::Terminal(FinalStatus::Timeout));
        Ok(Reconciliation {
            status: FinalStatus::Timeout,
            attempts: max_attempts,
            sdk_message: None,
        })
    }
}
