//! Error types for dot-xcm

use thiserror::Error;

/// Main error type for dot-xcm operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Invalid SS58 or hex address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// SCALE codec decode error
    #[error("SCALE decode error: {0}")]
    ScaleDecodeError(String),
    /// Node connection failure (readiness, RPC query)
    #[error("Connection error: {0}")]
    Connection(String),
    /// Pallet or method missing from the runtime-call namespace
    #[error("Undefined extrinsic call `{pallet}` with method `{method}`")]
    UndefinedCall { pallet: String, method: String },
    /// Asset registry holds no location for the asset id
    #[error("Asset {0} not found in asset registry")]
    AssetNotFound(u128),
    /// Session used before `start()` completed
    #[error("Chain session not started")]
    NotStarted,
    /// Signing or submission rejected by the node
    #[error("Submission error: {0}")]
    Submission(String),
    /// Error metadata lookup failed
    #[error("Metadata error: {0}")]
    Metadata(String),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

impl From<parity_scale_codec::Error> for Error {
    fn from(err: parity_scale_codec::Error) -> Self {
        Error::ScaleDecodeError(err.to_string())
    }
}
