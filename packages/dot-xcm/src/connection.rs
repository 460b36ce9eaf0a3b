//! Node client collaborator
//!
//! The core never talks RPC itself. Everything chain-facing (readiness,
//! metadata, storage, signing and the submission subscription) goes through
//! [`ChainConnection`], so any node client can back a session.

use crate::error::Result;
use crate::session::UnsignedCall;
use async_trait::async_trait;
use futures::stream::BoxStream;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use subxt_core::ext::scale_value::Value;

/// Default auto-reconnect interval of the node connection
pub const DEFAULT_AUTO_RECONNECT_MS: u64 = 10_000;

/// Node connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Websocket endpoint (e.g., "wss://rpc.polkadot.io")
    pub endpoint: String,
    /// Reconnect interval in milliseconds, bounds only the initial connection
    #[serde(default = "default_auto_reconnect_ms")]
    pub auto_reconnect_ms: u64,
}

fn default_auto_reconnect_ms() -> u64 {
    DEFAULT_AUTO_RECONNECT_MS
}

impl ConnectionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auto_reconnect_ms: DEFAULT_AUTO_RECONNECT_MS,
        }
    }
}

/// `system_properties` RPC result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemProperties {
    #[serde(default)]
    pub token_symbol: Vec<String>,
    #[serde(default)]
    pub token_decimals: Vec<u32>,
    #[serde(default)]
    pub ss58_format: Option<u16>,
}

/// Nonce policy for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nonce {
    /// Let the node compute the next account nonce (pending pool included)
    #[default]
    Auto,
    Fixed(u64),
}

/// Per-submission signing options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmitOptions {
    pub nonce: Nonce,
    pub tip: Option<u128>,
}

/// Opaque signing capability (keystore, extension, hardware device)
#[async_trait]
pub trait TxSigner: Send + Sync {
    /// Sign an already-prepared signer payload
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// Transaction pool / block status of a submitted extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Future,
    Ready,
    Broadcast,
    InBlock([u8; 32]),
    Retracted([u8; 32]),
    FinalityTimeout([u8; 32]),
    Finalized([u8; 32]),
    Usurped,
    Dropped,
    Invalid,
}

impl TxStatus {
    /// Terminal statuses after which no further update is expected
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TxStatus::FinalityTimeout(_)
                | TxStatus::Finalized(_)
                | TxStatus::Usurped
                | TxStatus::Dropped
                | TxStatus::Invalid
        )
    }
}

/// Token-handling dispatch failure (`sp_runtime::TokenError`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum TokenError {
    FundsUnavailable,
    OnlyProvider,
    BelowMinimum,
    CannotCreate,
    UnknownAsset,
    Frozen,
    Unsupported,
    CannotCreateHold,
    NotExpendable,
    Blocked,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum ArithmeticError {
    Underflow,
    Overflow,
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum TransactionalError {
    LimitReached,
    NoLayer,
}

/// Pallet-scoped error: pallet index plus the encoded error variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ModuleError {
    pub index: u8,
    pub error: [u8; 4],
}

impl ModuleError {
    /// Variant index of the pallet's `Error` enum
    pub fn error_index(&self) -> u8 {
        self.error[0]
    }
}

/// Reason a dispatched call failed (`sp_runtime::DispatchError`)
///
/// Variant order follows the runtime definition so that raw event bytes decode
/// directly with [`Decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum DispatchError {
    Other,
    CannotLookup,
    BadOrigin,
    Module(ModuleError),
    ConsumerRemaining,
    NoProviders,
    TooManyConsumers,
    Token(TokenError),
    Arithmetic(ArithmeticError),
    Transactional(TransactionalError),
    Exhausted,
    Corruption,
    Unavailable,
    RootNotAllowed,
}

impl DispatchError {
    /// Top-level variant name, the `type` of a dispatch error
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Other => "Other",
            DispatchError::CannotLookup => "CannotLookup",
            DispatchError::BadOrigin => "BadOrigin",
            DispatchError::Module(_) => "Module",
            DispatchError::ConsumerRemaining => "ConsumerRemaining",
            DispatchError::NoProviders => "NoProviders",
            DispatchError::TooManyConsumers => "TooManyConsumers",
            DispatchError::Token(_) => "Token",
            DispatchError::Arithmetic(_) => "Arithmetic",
            DispatchError::Transactional(_) => "Transactional",
            DispatchError::Exhausted => "Exhausted",
            DispatchError::Corruption => "Corruption",
            DispatchError::Unavailable => "Unavailable",
            DispatchError::RootNotAllowed => "RootNotAllowed",
        }
    }
}

/// Decoded identity of a chain-level error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchFailure {
    pub section: String,
    pub name: String,
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.name)
    }
}

/// Typed payload of the events the submission engine inspects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventData {
    /// `system.ExtrinsicFailed`
    ExtrinsicFailed { dispatch_error: DispatchError },
    /// `utility.BatchInterrupted`
    BatchInterrupted { index: u32, error: DispatchError },
    Other,
}

/// One event emitted by the extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Lower camel-case pallet name (e.g., "system")
    pub section: String,
    /// Event name (e.g., "ExtrinsicFailed")
    pub method: String,
    pub data: EventData,
}

impl EventRecord {
    pub fn new(section: impl Into<String>, method: impl Into<String>, data: EventData) -> Self {
        Self {
            section: section.into(),
            method: method.into(),
            data,
        }
    }

    pub fn extrinsic_failed(dispatch_error: DispatchError) -> Self {
        Self::new(
            "system",
            "ExtrinsicFailed",
            EventData::ExtrinsicFailed { dispatch_error },
        )
    }

    pub fn batch_interrupted(index: u32, error: DispatchError) -> Self {
        Self::new(
            "utility",
            "BatchInterrupted",
            EventData::BatchInterrupted { index, error },
        )
    }
}

/// A status change together with the events known at that point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: TxStatus,
    pub events: Vec<EventRecord>,
}

impl StatusUpdate {
    pub fn new(status: TxStatus) -> Self {
        Self {
            status,
            events: Vec::new(),
        }
    }

    pub fn with_events(status: TxStatus, events: Vec<EventRecord>) -> Self {
        Self { status, events }
    }
}

/// Subscription yielded by [`ChainConnection::sign_and_submit`]
pub type StatusStream = BoxStream<'static, StatusUpdate>;

/// Live RPC connection to a node
#[async_trait]
pub trait ChainConnection: Send + Sync {
    /// Resolve once the connection is up and metadata is loaded
    async fn wait_ready(&self) -> Result<()>;

    async fn system_properties(&self) -> Result<SystemProperties>;

    /// `system.ss58Prefix` constant, if the runtime exposes it
    async fn address_prefix_constant(&self) -> Result<Option<u16>>;

    /// `system_chain` display name
    async fn chain_name(&self) -> Result<String>;

    /// Pallet and call index of `pallet.method` in the runtime-call namespace
    fn call_index(&self, pallet: &str, method: &str) -> Option<(u8, u8)>;

    /// Read a storage map entry; `None` when the key has no value
    async fn storage(&self, pallet: &str, entry: &str, keys: Vec<Value<()>>)
        -> Result<Option<Value<()>>>;

    /// Sign `call` for `account` and submit it, watching its status
    async fn sign_and_submit(
        &self,
        account: &str,
        signer: Arc<dyn TxSigner>,
        call: UnsignedCall,
        options: SubmitOptions,
    ) -> Result<StatusStream>;

    /// Resolve a module error through the runtime error metadata
    async fn find_module_error(&self, error: &ModuleError) -> Result<DispatchFailure>;
}
