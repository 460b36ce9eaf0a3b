//! Chain-specific transfer builders
//!
//! Each builder holds a shared [`ChainSession`](crate::session::ChainSession),
//! assembles the XCM arguments for its chain kind and hands them to
//! `build_tx_call`. The returned [`UnsignedCall`](crate::session::UnsignedCall)
//! is ready for [`SubmissionEngine`](crate::submit::SubmissionEngine).

pub mod calls;
pub mod parachain;
pub mod relay;
pub mod types;

pub use calls::TransferArgs;
pub use parachain::ParachainBuilder;
pub use relay::RelayChainBuilder;
pub use types::{
    AssetRegistryConfig, ParachainConfig, ParachainTransferRequest, RelayTransferRequest,
};
