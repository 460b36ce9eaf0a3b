//! Relay chain transfer builder

use super::calls::{TransferArgs, EXECUTE, RELAY_XCM_PALLET, RESERVE_TRANSFER_ASSETS, SEND};
use super::types::RelayTransferRequest;
use crate::error::Result;
use crate::session::{ChainSession, UnsignedCall};
use crate::xcm::{AssetLocation, Beneficiary, MultiAsset};
use std::sync::Arc;
use subxt_core::ext::scale_value::Value;
use tracing::debug;

/// Builds `xcmPallet` calls on a relay chain
#[derive(Clone)]
pub struct RelayChainBuilder {
    session: Arc<ChainSession>,
}

impl RelayChainBuilder {
    pub fn new(session: Arc<ChainSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<ChainSession> {
        &self.session
    }

    /// Reserve-transfer the relay token to an account on a parachain
    ///
    /// The relay chain is the reserve, so the asset is `Here` and the
    /// destination is a direct child (`parents: 0`).
    pub fn transfer_to_parachain(&self, request: &RelayTransferRequest) -> Result<UnsignedCall> {
        let beneficiary = Beneficiary::from_address(&request.recipient)?;

        debug!(
            target: "dot-xcm",
            to_para = request.to_para,
            amount = %request.amount,
            "building relay to parachain transfer"
        );

        TransferArgs::single(
            AssetLocation::parachain(0, request.to_para),
            beneficiary,
            MultiAsset::new(AssetLocation::here(0), request.amount),
        )
        .into_call(&self.session, RELAY_XCM_PALLET, RESERVE_TRANSFER_ASSETS)
    }

    /// `xcmPallet.reserve_transfer_assets` with pre-built versioned values
    pub fn reserve_transfer_assets(
        &self,
        dest: Value<()>,
        beneficiary: Value<()>,
        assets: Value<()>,
        fee_asset_item: u32,
    ) -> Result<UnsignedCall> {
        self.session.build_tx_call(
            RELAY_XCM_PALLET,
            RESERVE_TRANSFER_ASSETS,
            vec![dest, beneficiary, assets, Value::u128(fee_asset_item as u128)],
        )
    }

    /// `xcmPallet.execute(message, max_weight)`
    pub fn execute(&self, message: Value<()>, max_weight: Value<()>) -> Result<UnsignedCall> {
        self.session
            .build_tx_call(RELAY_XCM_PALLET, EXECUTE, vec![message, max_weight])
    }

    /// `xcmPallet.send(dest, message)`
    pub fn send(&self, dest: Value<()>, message: Value<()>) -> Result<UnsignedCall> {
        self.session
            .build_tx_call(RELAY_XCM_PALLET, SEND, vec![dest, message])
    }
}
