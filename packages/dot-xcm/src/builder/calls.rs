//! XCM call arguments
//!
//! Pallet and method names of the transfer extrinsics, and the positional
//! argument layout shared by `reserve_transfer_assets` and
//! `reserve_withdraw_assets`.

use crate::error::Result;
use crate::session::{ChainSession, UnsignedCall};
use crate::xcm::{versioned_assets, AssetLocation, Beneficiary, MultiAsset};
use subxt_core::ext::scale_value::Value;

/// XCM pallet on relay chains
pub const RELAY_XCM_PALLET: &str = "XcmPallet";
/// XCM pallet on parachains
pub const PARACHAIN_XCM_PALLET: &str = "PolkadotXcm";

pub const RESERVE_TRANSFER_ASSETS: &str = "reserve_transfer_assets";
pub const RESERVE_WITHDRAW_ASSETS: &str = "reserve_withdraw_assets";
pub const EXECUTE: &str = "execute";
pub const SEND: &str = "send";

/// Arguments of a reserve-based asset transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    pub dest: AssetLocation,
    pub beneficiary: Beneficiary,
    pub assets: Vec<MultiAsset>,
    /// Index into `assets` of the asset paying execution fees
    pub fee_asset_item: u32,
}

impl TransferArgs {
    /// Single-asset transfer paying fees with that same asset
    pub fn single(dest: AssetLocation, beneficiary: Beneficiary, asset: MultiAsset) -> Self {
        Self {
            dest,
            beneficiary,
            assets: vec![asset],
            fee_asset_item: 0,
        }
    }

    /// `(dest, beneficiary, assets, fee_asset_item)` as versioned values
    pub fn into_values(self) -> Vec<Value<()>> {
        vec![
            self.dest.to_versioned_value(),
            AssetLocation::from(self.beneficiary).to_versioned_value(),
            versioned_assets(&self.assets),
            Value::u128(self.fee_asset_item as u128),
        ]
    }

    /// Build `pallet.method(dest, beneficiary, assets, fee_asset_item)`
    pub fn into_call(self, session: &ChainSession, pallet: &str, method: &str) -> Result<UnsignedCall> {
        session.build_tx_call(pallet, method, self.into_values())
    }
}
