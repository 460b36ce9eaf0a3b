//! Chain session: cached chain properties and generic call construction

use crate::address::encode_ss58;
use crate::connection::ChainConnection;
use crate::error::{Error, Result};
use std::sync::Arc;
use subxt_core::{
    ext::scale_value::{Composite, Value},
    metadata::Metadata,
    tx::payload::{dynamic, DynamicPayload, Payload},
};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Generic Substrate SS58 prefix, used when the chain advertises none
pub const DEFAULT_ADDRESS_PREFIX: u16 = 42;

/// Chain properties read once at session start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainProperty {
    /// Token symbols, index-aligned with `token_decimals`
    pub token_symbols: Vec<String>,
    pub token_decimals: Vec<u32>,
    /// Chain display name (e.g., "Polkadot", "Rococo Local Testnet")
    pub chain_name: String,
    pub address_prefix: u16,
}

/// A pallet call with its arguments bound positionally
///
/// Built by [`ChainSession::build_tx_call`] only, never mutated afterwards and
/// consumed by value on submission.
#[derive(Debug, Clone)]
pub struct UnsignedCall {
    pallet: String,
    method: String,
    call_index: (u8, u8),
    args: Vec<Value<()>>,
}

impl UnsignedCall {
    pub fn pallet(&self) -> &str {
        &self.pallet
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// (pallet index, call index) in the runtime metadata
    pub fn call_index(&self) -> (u8, u8) {
        self.call_index
    }

    pub fn args(&self) -> &[Value<()>] {
        &self.args
    }

    /// The call as a `RuntimeCall` value, for nesting inside `Utility.batch`
    pub fn to_value(&self) -> Value<()> {
        Value::unnamed_variant(
            self.pallet.clone(),
            [Value::unnamed_variant(
                self.method.clone(),
                self.args.iter().cloned(),
            )],
        )
    }

    /// Dynamic subxt payload for this call
    pub fn payload(&self) -> DynamicPayload {
        dynamic(
            self.pallet.clone(),
            self.method.clone(),
            Composite::Unnamed(self.args.clone()),
        )
    }

    /// SCALE encoded call data, `[pallet][call][args...]`
    pub fn encode_call_data(&self, metadata: &Metadata) -> Result<Vec<u8>> {
        self.payload()
            .encode_call_data(metadata)
            .map_err(|e| Error::InvalidInput(format!("Failed to encode call: {}", e)))
    }
}

/// Owns the node connection and the chain properties derived from it
pub struct ChainSession {
    connection: Arc<dyn ChainConnection>,
    property: OnceCell<ChainProperty>,
}

impl ChainSession {
    pub fn new(connection: Arc<dyn ChainConnection>) -> Self {
        Self {
            connection,
            property: OnceCell::new(),
        }
    }

    pub fn connection(&self) -> &Arc<dyn ChainConnection> {
        &self.connection
    }

    /// Wait for the connection and load the chain properties
    ///
    /// Only the first successful call queries the node; later calls return the
    /// cached properties.
    pub async fn start(&self) -> Result<&ChainProperty> {
        self.property
            .get_or_try_init(|| async {
                self.connection.wait_ready().await?;

                let properties = self.connection.system_properties().await?;
                let prefix_constant = self.connection.address_prefix_constant().await?;
                let chain_name = self.connection.chain_name().await?;

                let address_prefix = prefix_constant
                    .or(properties.ss58_format)
                    .unwrap_or(DEFAULT_ADDRESS_PREFIX);

                debug!(
                    target: "dot-xcm",
                    chain = %chain_name,
                    address_prefix,
                    symbols = ?properties.token_symbol,
                    "chain session started"
                );

                Ok::<_, Error>(ChainProperty {
                    token_symbols: properties.token_symbol,
                    token_decimals: properties.token_decimals,
                    chain_name,
                    address_prefix,
                })
            })
            .await
    }

    /// Best-effort health probe; failures are logged, never propagated
    pub async fn is_ready(&self) -> bool {
        match self.connection.wait_ready().await {
            Ok(()) => true,
            Err(e) => {
                warn!(target: "dot-xcm", error = %e, "connection not ready");
                false
            }
        }
    }

    /// `None` until [`Self::start`] completes
    pub fn property(&self) -> Option<&ChainProperty> {
        self.property.get()
    }

    pub fn chain_property(&self) -> Result<&ChainProperty> {
        self.property().ok_or(Error::NotStarted)
    }

    /// Decimals of a token symbol advertised by the chain
    pub fn decimals_of(&self, symbol: &str) -> Option<u32> {
        let property = self.property()?;
        property
            .token_symbols
            .iter()
            .position(|s| s.eq_ignore_ascii_case(symbol))
            .and_then(|i| property.token_decimals.get(i).copied())
    }

    /// First advertised token symbol
    pub fn native_symbol(&self) -> Option<&str> {
        self.property()?.token_symbols.first().map(String::as_str)
    }

    /// SS58 address of a public key on this chain
    pub fn encode_address(&self, public_key: &[u8]) -> Result<String> {
        encode_ss58(public_key, self.chain_property()?.address_prefix)
    }

    /// Build `pallet.method(args...)` against the runtime-call namespace
    pub fn build_tx_call(
        &self,
        pallet: &str,
        method: &str,
        args: Vec<Value<()>>,
    ) -> Result<UnsignedCall> {
        let call_index =
            self.connection
                .call_index(pallet, method)
                .ok_or_else(|| Error::UndefinedCall {
                    pallet: pallet.to_string(),
                    method: method.to_string(),
                })?;

        Ok(UnsignedCall {
            pallet: pallet.to_string(),
            method: method.to_string(),
            call_index,
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SystemProperties;
    use crate::testing::MockConnection;
    use subxt_core::ext::scale_value::ValueDef;

    #[tokio::test]
    async fn test_start_populates_properties_once() {
        let mock = Arc::new(MockConnection::new());
        let session = ChainSession::new(mock.clone());
        assert!(session.property().is_none());
        assert_eq!(session.chain_property().unwrap_err(), Error::NotStarted);

        let property = session.start().await.unwrap().clone();
        assert_eq!(property.chain_name, "Rococo Local Testnet");
        assert_eq!(property.token_symbols, vec!["ROC".to_string()]);
        assert_eq!(property.address_prefix, 42);

        session.start().await.unwrap();
        assert_eq!(mock.property_queries(), 1);
        assert_eq!(session.property(), Some(&property));
    }

    #[tokio::test]
    async fn test_prefix_falls_back_to_ss58_format() {
        let mock = MockConnection::new()
            .with_prefix_constant(None)
            .with_properties(SystemProperties {
                token_symbol: vec!["KAR".into(), "KUSD".into()],
                token_decimals: vec![12, 12],
                ss58_format: Some(8),
            });
        let session = ChainSession::new(Arc::new(mock));
        session.start().await.unwrap();

        assert_eq!(session.chain_property().unwrap().address_prefix, 8);
        assert_eq!(session.decimals_of("kusd"), Some(12));
        assert_eq!(session.native_symbol(), Some("KAR"));
        assert_eq!(session.decimals_of("DOT"), None);
    }

    #[tokio::test]
    async fn test_start_propagates_connection_failure() {
        let session = ChainSession::new(Arc::new(MockConnection::new().unreachable()));
        assert!(matches!(session.start().await, Err(Error::Connection(_))));
        assert!(session.property().is_none());
    }

    #[tokio::test]
    async fn test_is_ready_swallows_errors() {
        let down = ChainSession::new(Arc::new(MockConnection::new().unreachable()));
        assert!(!down.is_ready().await);

        let up = ChainSession::new(Arc::new(MockConnection::new()));
        assert!(up.is_ready().await);
    }

    #[test]
    fn test_build_tx_call() {
        let session = ChainSession::new(Arc::new(MockConnection::new()));
        let call = session
            .build_tx_call("XcmPallet", "send", vec![Value::u128(1), Value::u128(2)])
            .unwrap();
        assert_eq!(call.pallet(), "XcmPallet");
        assert_eq!(call.method(), "send");
        assert_eq!(call.args().len(), 2);
        assert_eq!(call.call_index(), (99, 0));
    }

    #[test]
    fn test_build_tx_call_unknown_method() {
        let session = ChainSession::new(Arc::new(MockConnection::new()));
        let err = session
            .build_tx_call("XcmPallet", "teleport_everything", vec![])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Undefined extrinsic call `XcmPallet` with method `teleport_everything`"
        );

        assert!(session.build_tx_call("Nope", "send", vec![]).is_err());
    }

    #[test]
    fn test_call_value_nests_method_in_pallet() {
        let session = ChainSession::new(Arc::new(MockConnection::new()));
        let args = vec![Value::u128(1), Value::bool(true)];
        let call = session
            .build_tx_call("XcmPallet", "send", args.clone())
            .unwrap();

        let ValueDef::Variant(pallet) = call.to_value().value else {
            panic!("expected pallet variant");
        };
        assert_eq!(pallet.name, "XcmPallet");
        let method = pallet.values.values().next().unwrap().clone();
        assert_eq!(pallet.values.values().count(), 1);
        assert_eq!(method, Value::unnamed_variant("send", args));
    }

    #[test]
    fn test_payload_carries_call_and_args() {
        let session = ChainSession::new(Arc::new(MockConnection::new()));
        let args = vec![Value::u128(7), Value::string("x")];
        let call = session
            .build_tx_call("PolkadotXcm", "send", args.clone())
            .unwrap();

        let payload = call.payload();
        assert_eq!(payload.pallet_name(), "PolkadotXcm");
        assert_eq!(payload.call_name(), "send");
        assert_eq!(payload.call_data(), &Composite::Unnamed(args));
    }

    #[tokio::test]
    async fn test_encode_address_uses_chain_prefix() {
        let session = ChainSession::new(Arc::new(MockConnection::new()));
        let pubkey =
            hex::decode("61b18c6dc02ddcabdeac56cb4f21a971cc41cc97640f6f85b073480008c53a0d")
                .unwrap();
        assert!(session.encode_address(&pubkey).is_err());

        session.start().await.unwrap();
        assert_eq!(
            session.encode_address(&pubkey).unwrap(),
            "5EGoFA95omzemRssELLDjVenNZ68aXyUeqtKQScXSEBvVJkr"
        );
    }
}
