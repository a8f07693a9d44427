//! Post-submission status reconciliation.
//!
//! The tokenization SDK's answer is not authoritative: a submission can
//! fail on the client while the gateway approves the payment behind a 3DS
//! challenge. The [`Reconciler`] settles that by polling the trade status
//! until it is final or the attempt budget runs out.

pub mod callback;
pub mod clock;
pub mod poller;
pub mod source;

pub use callback::ReturnParams;
pub use clock::{Clock, TokioClock};
pub use poller::{
    CheckoutOutcome, FinalStatus, OutcomeKind, PollPolicy, ReconcileError, ReconcileState,
    Reconciler, Reconciliation, SdkResult, SdkStatus,
};
pub use source::{CheckoutApiClient, StatusSource, StatusSourceError};
