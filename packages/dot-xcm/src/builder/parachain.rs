//! Parachain transfer builder
//!
//! Sends assets back to the relay chain (`para_id == 0`) or on to a sibling
//! parachain. Tokens the parachain does not hold the reserve for are
//! withdrawn from their reserve, and registered foreign assets sent to a
//! sibling are identified by the location stored in the asset registry.

use super::calls::{
    TransferArgs, PARACHAIN_XCM_PALLET, RESERVE_TRANSFER_ASSETS, RESERVE_WITHDRAW_ASSETS,
};
use super::types::{ParachainConfig, ParachainTransferRequest};
use crate::error::{Error, Result};
use crate::session::{ChainSession, UnsignedCall};
use crate::xcm::{AssetLocation, Beneficiary, MultiAsset};
use std::sync::Arc;
use subxt_core::ext::scale_value::Value;
use tracing::debug;

/// Builds `polkadotXcm` calls on a parachain
#[derive(Clone)]
pub struct ParachainBuilder {
    session: Arc<ChainSession>,
    config: ParachainConfig,
}

impl ParachainBuilder {
    pub fn new(session: Arc<ChainSession>) -> Self {
        Self::with_config(session, ParachainConfig::default())
    }

    pub fn with_config(session: Arc<ChainSession>, config: ParachainConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &Arc<ChainSession> {
        &self.session
    }

    pub fn config(&self) -> &ParachainConfig {
        &self.config
    }

    /// Build the transfer described by `request`
    ///
    /// Queries the asset registry when a non-native token goes to a sibling.
    pub async fn transfer(&self, request: &ParachainTransferRequest) -> Result<UnsignedCall> {
        let beneficiary = Beneficiary::from_address(&request.recipient)?;
        let to_sibling = request.to_sibling();

        let method = if request.asset_id != self.config.native_asset_id {
            RESERVE_WITHDRAW_ASSETS
        } else {
            RESERVE_TRANSFER_ASSETS
        };

        let dest = if to_sibling {
            AssetLocation::parachain(1, request.para_id)
        } else {
            AssetLocation::here(1)
        };

        let asset_location = if to_sibling && !request.is_native_token {
            self.fetch_asset_config(request.asset_id).await?
        } else {
            AssetLocation::here(if to_sibling { 0 } else { 1 })
        };

        debug!(
            target: "dot-xcm",
            method,
            asset_id = %request.asset_id,
            para_id = request.para_id,
            "building parachain transfer"
        );

        TransferArgs::single(
            dest,
            beneficiary,
            MultiAsset::new(asset_location, request.amount),
        )
        .into_call(&self.session, PARACHAIN_XCM_PALLET, method)
    }

    /// Canonical location of a registered asset
    ///
    /// Fails with [`Error::AssetNotFound`] when the registry has no entry.
    pub async fn fetch_asset_config(&self, asset_id: u128) -> Result<AssetLocation> {
        let registry = &self.config.asset_registry;
        let record = self
            .session
            .connection()
            .storage(&registry.pallet, &registry.entry, vec![Value::u128(asset_id)])
            .await?
            .ok_or(Error::AssetNotFound(asset_id))?;

        AssetLocation::from_value(&record)
    }
}
