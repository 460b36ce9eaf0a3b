//! In-memory node connection for unit tests

use crate::connection::{
    ChainConnection, DispatchFailure, ModuleError, StatusStream, StatusUpdate, SubmitOptions,
    SystemProperties, TxSigner,
};
use crate::error::{Error, Result};
use crate::session::UnsignedCall;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use subxt_core::ext::scale_value::Value;

/// //Alice dev account
pub const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
pub const ALICE_HEX: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
/// //Bob dev account
pub const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub struct MockSigner;

#[async_trait]
impl TxSigner for MockSigner {
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(payload.to_vec())
    }
}

type Submission = (String, UnsignedCall, SubmitOptions);

pub struct MockConnection {
    reachable: bool,
    properties: SystemProperties,
    prefix_constant: Option<u16>,
    calls: HashMap<(String, String), (u8, u8)>,
    storage: HashMap<(String, String, u128), Value<()>>,
    module_errors: HashMap<(u8, u8), DispatchFailure>,
    updates: Vec<StatusUpdate>,
    reject_submissions: bool,
    submitted: Mutex<Vec<Submission>>,
    property_queries: AtomicUsize,
    storage_queries: AtomicUsize,
}

impl MockConnection {
    pub fn new() -> Self {
        let calls = [
            ("XcmPallet", "send", (99, 0)),
            ("XcmPallet", "reserve_transfer_assets", (99, 2)),
            ("XcmPallet", "execute", (99, 3)),
            ("PolkadotXcm", "send", (31, 0)),
            ("PolkadotXcm", "reserve_transfer_assets", (31, 2)),
            ("PolkadotXcm", "reserve_withdraw_assets", (31, 11)),
            ("Utility", "batch", (40, 0)),
        ]
        .into_iter()
        .map(|(p, m, idx)| ((p.to_string(), m.to_string()), idx))
        .collect();

        let module_errors = [(
            (99, 2),
            DispatchFailure {
                section: "xcmPallet".to_string(),
                name: "Filtered".to_string(),
            },
        )]
        .into_iter()
        .collect();

        Self {
            reachable: true,
            properties: SystemProperties {
                token_symbol: vec!["ROC".to_string()],
                token_decimals: vec![12],
                ss58_format: Some(42),
            },
            prefix_constant: Some(42),
            calls,
            storage: HashMap::new(),
            module_errors,
            updates: Vec::new(),
            reject_submissions: false,
            submitted: Mutex::new(Vec::new()),
            property_queries: AtomicUsize::new(0),
            storage_queries: AtomicUsize::new(0),
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn with_properties(mut self, properties: SystemProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_prefix_constant(mut self, prefix: Option<u16>) -> Self {
        self.prefix_constant = prefix;
        self
    }

    pub fn without_call(mut self, pallet: &str, method: &str) -> Self {
        self.calls.remove(&(pallet.to_string(), method.to_string()));
        self
    }

    pub fn with_storage(mut self, pallet: &str, entry: &str, key: u128, value: Value<()>) -> Self {
        self.storage
            .insert((pallet.to_string(), entry.to_string(), key), value);
        self
    }

    pub fn with_updates(mut self, updates: Vec<StatusUpdate>) -> Self {
        self.updates = updates;
        self
    }

    pub fn rejecting_submissions(mut self) -> Self {
        self.reject_submissions = true;
        self
    }

    pub fn submitted(&self) -> Vec<Submission> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn property_queries(&self) -> usize {
        self.property_queries.load(Ordering::SeqCst)
    }

    pub fn storage_queries(&self) -> usize {
        self.storage_queries.load(Ordering::SeqCst)
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(Error::Connection("connection refused".to_string()))
        }
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainConnection for MockConnection {
    async fn wait_ready(&self) -> Result<()> {
        self.ensure_reachable()
    }

    async fn system_properties(&self) -> Result<SystemProperties> {
        self.ensure_reachable()?;
        self.property_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.properties.clone())
    }

    async fn address_prefix_constant(&self) -> Result<Option<u16>> {
        Ok(self.prefix_constant)
    }

    async fn chain_name(&self) -> Result<String> {
        Ok("Rococo Local Testnet".to_string())
    }

    fn call_index(&self, pallet: &str, method: &str) -> Option<(u8, u8)> {
        self.calls
            .get(&(pallet.to_string(), method.to_string()))
            .copied()
    }

    async fn storage(
        &self,
        pallet: &str,
        entry: &str,
        keys: Vec<Value<()>>,
    ) -> Result<Option<Value<()>>> {
        self.ensure_reachable()?;
        self.storage_queries.fetch_add(1, Ordering::SeqCst);
        let key = keys
            .first()
            .and_then(|k| k.as_u128())
            .ok_or_else(|| Error::InvalidInput("expected a u128 key".to_string()))?;
        Ok(self
            .storage
            .get(&(pallet.to_string(), entry.to_string(), key))
            .cloned())
    }

    async fn sign_and_submit(
        &self,
        account: &str,
        signer: Arc<dyn TxSigner>,
        call: UnsignedCall,
        options: SubmitOptions,
    ) -> Result<StatusStream> {
        if self.reject_submissions {
            return Err(Error::Submission("1010: Invalid Transaction".to_string()));
        }
        signer.sign(&[call.call_index().0, call.call_index().1]).await?;
        self.submitted
            .lock()
            .unwrap()
            .push((account.to_string(), call, options));
        Ok(futures::stream::iter(self.updates.clone()).boxed())
    }

    async fn find_module_error(&self, error: &ModuleError) -> Result<DispatchFailure> {
        self.module_errors
            .get(&(error.index, error.error_index()))
            .cloned()
            .ok_or_else(|| Error::Metadata(format!("no error {:?} in metadata", error)))
    }
}
