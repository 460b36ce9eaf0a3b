//! dot-xcm: cross-chain asset transfers for Substrate relay chains and parachains
//!
//! This crate provides:
//! - A chain session caching chain properties and building pallet calls
//! - Transfer builders for relay → parachain and parachain → relay/sibling
//! - A submission engine tracking a transaction to finality
//!
//! # Architecture
//!
//! Node access is abstracted behind [`ChainConnection`]:
//! - **Builders** (`src/builder/*.rs`): assemble XCM arguments
//! - **Session** (`src/session.rs`): call lookup and cached chain properties
//! - **Submission** (`src/submit.rs`): sign, submit and resolve the outcome

pub mod address;
pub mod builder;
pub mod connection;
pub mod error;
pub mod session;
pub mod submit;
pub mod xcm;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use address::{decode_address, decode_ss58, encode_ss58};
pub use builder::{ParachainBuilder, RelayChainBuilder};
pub use connection::{ChainConnection, ConnectionConfig, StatusUpdate, TxSigner, TxStatus};
pub use error::{Error, Result};
pub use session::{ChainProperty, ChainSession, UnsignedCall};
pub use submit::{SubmissionEngine, SubmitRequest};
pub use xcm::{AssetLocation, Beneficiary, MultiAsset};
