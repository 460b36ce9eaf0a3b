//! Transaction submission and lifecycle tracking
//!
//! Flow:
//! 1. The call is wrapped in `Utility.batch([call])` so that a failing call is
//!    reported through `BatchInterrupted` as well as `ExtrinsicFailed`.
//! 2. The batch is signed and submitted, with an automatic nonce unless the
//!    request fixes one.
//! 3. A spawned tracker consumes the status stream (`Submitted → InBlock* →
//!    Finalized`), decoding dispatch errors from the emitted events.
//! 4. The outcome is delivered through an [`OutcomeLatch`]: the first
//!    resolution wins, so an in-block failure reaches the caller before
//!    finalization and a later `Finalized` cannot flip it to success.

use crate::connection::{
    ChainConnection, DispatchError, DispatchFailure, EventData, EventRecord, Nonce, StatusStream,
    StatusUpdate, SubmitOptions, TxSigner, TxStatus,
};
use crate::error::{Error, Result};
use crate::session::{ChainSession, UnsignedCall};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use subxt_core::ext::scale_value::Value;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Legacy governance pallet whose events are skipped when scanning for failures
const IGNORED_EVENT_SECTION: &str = "democracy";

const UTILITY_PALLET: &str = "Utility";
const BATCH_METHOD: &str = "batch";

/// Invoked once when the submitted batch is finalized
pub type FinalizedCallback = Box<dyn FnOnce() + Send>;

/// Sees every status update; never influences the outcome
pub type StatusObserver = Box<dyn Fn(&StatusUpdate) + Send + Sync>;

/// Everything needed to submit one call
pub struct SubmitRequest {
    /// Signing account (SS58)
    pub account: String,
    pub signer: Arc<dyn TxSigner>,
    pub call: UnsignedCall,
    pub on_finalized: Option<FinalizedCallback>,
    pub on_status: Option<StatusObserver>,
    /// Optional tip (in planck)
    pub tip: Option<u128>,
    pub nonce: Nonce,
}

impl SubmitRequest {
    pub fn new(account: impl Into<String>, signer: Arc<dyn TxSigner>, call: UnsignedCall) -> Self {
        Self {
            account: account.into(),
            signer,
            call,
            on_finalized: None,
            on_status: None,
            tip: None,
            nonce: Nonce::Auto,
        }
    }

    pub fn with_tip(mut self, tip: u128) -> Self {
        self.tip = Some(tip);
        self
    }

    /// Sign with an explicit nonce instead of the next account nonce
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Nonce::Fixed(nonce);
        self
    }

    pub fn on_finalized(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_finalized = Some(Box::new(callback));
        self
    }

    pub fn on_status(mut self, observer: impl Fn(&StatusUpdate) + Send + Sync + 'static) -> Self {
        self.on_status = Some(Box::new(observer));
        self
    }
}

/// Single-assignment outcome cell shared by every resolution path
#[derive(Clone)]
pub struct OutcomeLatch {
    sender: Arc<Mutex<Option<oneshot::Sender<bool>>>>,
}

impl OutcomeLatch {
    pub fn new() -> (Self, oneshot::Receiver<bool>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Arc::new(Mutex::new(Some(sender))),
            },
            receiver,
        )
    }

    /// Resolve the outcome; returns false if it was already resolved
    pub fn resolve(&self, outcome: bool) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match sender {
            Some(sender) => {
                // The caller may have stopped waiting; the outcome is still latched
                let _ = sender.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }
}

/// Signs, submits and tracks calls built by a [`ChainSession`]
pub struct SubmissionEngine {
    session: Arc<ChainSession>,
}

impl SubmissionEngine {
    pub fn new(session: Arc<ChainSession>) -> Self {
        Self { session }
    }

    /// Submit `request.call` and wait for its outcome
    ///
    /// Returns true only when the batch finalized without any failure event.
    /// Errors are logged, never returned.
    ///
    /// Tracking runs on a spawned Tokio task. Without a Tokio runtime nothing
    /// is submitted and the outcome is false.
    pub async fn sign_and_send(&self, request: SubmitRequest) -> bool {
        let SubmitRequest {
            account,
            signer,
            call,
            on_finalized,
            on_status,
            tip,
            nonce,
        } = request;

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(target: "dot-xcm", error = %e, "no tokio runtime to track the submission");
                return false;
            }
        };

        let batch = match self.session.build_tx_call(
            UTILITY_PALLET,
            BATCH_METHOD,
            vec![Value::unnamed_composite([call.to_value()])],
        ) {
            Ok(batch) => batch,
            Err(e) => {
                error!(target: "dot-xcm", error = %e, "failed to wrap call in batch");
                return false;
            }
        };

        let options = SubmitOptions { nonce, tip };
        let connection = self.session.connection().clone();
        let stream = match connection
            .sign_and_submit(&account, signer, batch, options)
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                error!(
                    target: "dot-xcm",
                    account = %account,
                    call = %format!("{}.{}", call.pallet(), call.method()),
                    error = %e,
                    "submission failed"
                );
                return false;
            }
        };
        debug!(target: "dot-xcm", account = %account, "submitted {}.{}", call.pallet(), call.method());

        let (latch, outcome) = OutcomeLatch::new();
        let tracker = Tracker {
            connection,
            latch,
            on_finalized,
            on_status,
            failed: false,
        };
        runtime.spawn(tracker.run(stream));

        // A dropped sender means the tracker died without resolving
        outcome.await.unwrap_or(false)
    }
}

/// Decode a dispatch error into its `{section, name}` identity
///
/// Module errors go through the runtime error metadata, token errors become
/// `Token.<reason>`. Other kinds carry no further identity and yield `None`.
pub async fn decode_dispatch_error(
    connection: &dyn ChainConnection,
    error: &DispatchError,
) -> Result<Option<DispatchFailure>> {
    match error {
        DispatchError::Module(module) => connection
            .find_module_error(module)
            .await
            .map(Some)
            .map_err(|e| Error::Metadata(format!("module error {:?}: {}", module, e))),
        DispatchError::Token(token) => Ok(Some(DispatchFailure {
            section: error.kind().to_string(),
            name: token.to_string(),
        })),
        _ => Ok(None),
    }
}

/// State machine driven by the status stream of one submission
struct Tracker {
    connection: Arc<dyn ChainConnection>,
    latch: OutcomeLatch,
    on_finalized: Option<FinalizedCallback>,
    on_status: Option<StatusObserver>,
    failed: bool,
}

impl Tracker {
    async fn run(mut self, mut stream: StatusStream) {
        while let Some(update) = stream.next().await {
            if let Some(observer) = &self.on_status {
                observer(&update);
            }
            debug!(target: "dot-xcm", status = ?update.status, events = update.events.len(), "status update");

            for event in update
                .events
                .iter()
                .filter(|event| event.section != IGNORED_EVENT_SECTION)
            {
                self.inspect(event).await;
            }

            match update.status {
                TxStatus::Finalized(block) => {
                    if let Some(callback) = self.on_finalized.take() {
                        callback();
                    }
                    if !self.failed && self.latch.resolve(true) {
                        info!(target: "dot-xcm", block = %hex::encode(block), "transaction finalized");
                    }
                    return;
                }
                ref status if status.is_terminal() => {
                    warn!(target: "dot-xcm", status = ?status, "transaction not finalized");
                    self.latch.resolve(false);
                    return;
                }
                _ => {}
            }
        }

        warn!(target: "dot-xcm", "status stream closed before finalization");
        self.latch.resolve(false);
    }

    async fn inspect(&mut self, event: &EventRecord) {
        let (dispatch_error, batch_index) = match &event.data {
            EventData::ExtrinsicFailed { dispatch_error } => (dispatch_error, None),
            EventData::BatchInterrupted { index, error } => (error, Some(*index)),
            EventData::Other => return,
        };

        match decode_dispatch_error(self.connection.as_ref(), dispatch_error).await {
            Ok(Some(failure)) => error!(
                target: "dot-xcm",
                event = %format!("{}.{}", event.section, event.method),
                batch_index = ?batch_index,
                "{}", failure
            ),
            Ok(None) => error!(
                target: "dot-xcm",
                event = %format!("{}.{}", event.section, event.method),
                batch_index = ?batch_index,
                kind = dispatch_error.kind(),
                "dispatch failed"
            ),
            Err(e) => error!(target: "dot-xcm", error = %e, "could not decode dispatch error"),
        }

        self.failed = true;
        self.latch.resolve(false);
    }
}
