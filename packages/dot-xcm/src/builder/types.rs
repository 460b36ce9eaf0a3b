//! Request types for transfer building
//!
//! Requests arrive as JSON from callers, so amounts and asset ids are accepted
//! either as numbers or as decimal strings (u128 does not fit a JS number).

use serde::{de, Deserialize, Deserializer, Serialize};

/// Deserialize u128 from either a number or string
fn deserialize_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    struct U128Visitor;

    impl<'de> de::Visitor<'de> for U128Visitor {
        type Value = u128;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a u128 as number or string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<u128, E>
        where
            E: de::Error,
        {
            Ok(value as u128)
        }

        fn visit_i64<E>(self, value: i64) -> Result<u128, E>
        where
            E: de::Error,
        {
            if value >= 0 {
                Ok(value as u128)
            } else {
                Err(E::custom("negative values not allowed"))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<u128, E>
        where
            E: de::Error,
        {
            value.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U128Visitor)
}

/// Relay chain → parachain reserve transfer of the relay token
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayTransferRequest {
    /// Destination parachain id
    pub to_para: u32,
    /// Recipient address on the parachain (SS58 or 0x hex)
    #[serde(alias = "recipientAccountId")]
    pub recipient: String,
    /// Amount in planck
    #[serde(deserialize_with = "deserialize_u128")]
    pub amount: u128,
}

/// Parachain → relay chain or sibling parachain transfer
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParachainTransferRequest {
    /// Asset id in the parachain's asset registry
    #[serde(deserialize_with = "deserialize_u128")]
    pub asset_id: u128,
    /// Recipient address (SS58 or 0x hex)
    #[serde(alias = "recipientAccountId")]
    pub recipient: String,
    /// Amount in the asset's smallest unit
    #[serde(deserialize_with = "deserialize_u128")]
    pub amount: u128,
    /// Whether the asset is the parachain's own token
    #[serde(default)]
    pub is_native_token: bool,
    /// Sibling parachain id; 0 sends to the relay chain
    #[serde(default)]
    pub para_id: u32,
}

impl ParachainTransferRequest {
    pub fn to_sibling(&self) -> bool {
        self.para_id > 0
    }
}

/// Storage map holding the versioned location of registered assets
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRegistryConfig {
    #[serde(default = "default_registry_pallet")]
    pub pallet: String,
    #[serde(default = "default_registry_entry")]
    pub entry: String,
}

fn default_registry_pallet() -> String {
    "AssetRegistry".to_string()
}

fn default_registry_entry() -> String {
    "AssetLocations".to_string()
}

impl Default for AssetRegistryConfig {
    fn default() -> Self {
        Self {
            pallet: default_registry_pallet(),
            entry: default_registry_entry(),
        }
    }
}

/// Per-network settings of the parachain builder
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParachainConfig {
    /// Asset id of the network's designated native token
    #[serde(default, deserialize_with = "deserialize_u128")]
    pub native_asset_id: u128,
    #[serde(default)]
    pub asset_registry: AssetRegistryConfig,
}
