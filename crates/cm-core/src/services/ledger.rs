use std::collections::HashMap;
use std::sync::Mutex;

use crate::services::backend::{Backend, BackendError, DeployOutcome};

/// Funds the default ledger account starts with.
pub const DEFAULT_BALANCE: u128 = 1_000_000_000;

const BASE_TX_COST: u128 = 21_000;
const COST_PER_BYTE: u128 = 200;
const DEPLOYER: &str = "90f8bf6a479f320ead074411a4b0e7944ea8c9c1";

struct LedgerState {
    balance: u128,
    nonce: u64,
    block_number: u64,
    /// Deployed code by address, exactly as submitted.
    contracts: HashMap<String, String>,
}

/// An in-process ledger implementing [`Backend`] for development runs and
/// tests: one funded account, a per-byte gas charge, and synthetic
/// address/tx-hash derivation from the account nonce. Each creation
/// transaction consumes a fresh nonce, so re-deploying identical bytecode
/// yields a new address.
pub struct DevLedger {
    revert_marker: Option<String>,
    state: Mutex<LedgerState>,
}

impl DevLedger {
    pub fn new() -> Self {
        Self::with_balance(DEFAULT_BALANCE)
    }

    pub fn with_balance(balance: u128) -> Self {
        Self {
            revert_marker: None,
            state: Mutex::new(LedgerState {
                balance,
                nonce: 0,
                block_number: 0,
                contracts: HashMap::new(),
            }),
        }
    }

    /// Any submitted bytecode containing `marker` fails with a constructor
    /// revert. Test hook.
    pub fn with_revert_marker(mut self, marker: impl Into<String>) -> Self {
        self.revert_marker = Some(marker.into());
        self
    }

    pub fn balance(&self) -> u128 {
        self.state.lock().unwrap().balance
    }

    pub fn nonce(&self) -> u64 {
        self.state.lock().unwrap().nonce
    }

    /// The code stored at `address`, as submitted at creation.
    pub fn code_at(&self, address: &str) -> Option<String> {
        self.state.lock().unwrap().contracts.get(address).cloned()
    }

    pub fn deployed_count(&self) -> usize {
        self.state.lock().unwrap().contracts.len()
    }
}

impl Default for DevLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for DevLedger {
    async fn deploy_contract(
        &self,
        bytecode: &str,
        _constructor_args: &[serde_json::Value],
    ) -> Result<DeployOutcome, BackendError> {
        let hex = bytecode.strip_prefix("0x").unwrap_or(bytecode);
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BackendError(
                "invalid creation bytecode: not a hex string".into(),
            ));
        }

        if let Some(marker) = &self.revert_marker {
            if hex.contains(marker.as_str()) {
                return Err(BackendError("constructor reverted".into()));
            }
        }

        let mut state = self.state.lock().unwrap();

        let cost = BASE_TX_COST + (hex.len() as u128 / 2) * COST_PER_BYTE;
        if cost > state.balance {
            return Err(BackendError(format!(
                "insufficient funds: transaction costs {cost}, account holds {}",
                state.balance
            )));
        }

        state.balance -= cost;
        state.nonce += 1;
        state.block_number += 1;

        let seed = account_seed(DEPLOYER) ^ mix(state.nonce);
        let address = derive_address(seed);
        let tx_hash = derive_tx_hash(seed);

        state.contracts.insert(address.clone(), bytecode.to_string());

        tracing::debug!(
            address = %address,
            nonce = state.nonce,
            block = state.block_number,
            "contract_created"
        );

        Ok(DeployOutcome {
            address,
            tx_hash,
            block_number: state.block_number,
        })
    }
}

fn account_seed(account: &str) -> u64 {
    account
        .bytes()
        .fold(0u64, |acc, b| mix(acc ^ u64::from(b)))
}

/// splitmix64 finalizer.
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

fn derive_address(seed: u64) -> String {
    format!(
        "0x{:016x}{:016x}{:08x}",
        mix(seed ^ 1),
        mix(seed ^ 2),
        mix(seed ^ 3) as u32
    )
}

fn derive_tx_hash(seed: u64) -> String {
    format!(
        "0x{:016x}{:016x}{:016x}{:016x}",
        mix(seed ^ 4),
        mix(seed ^ 5),
        mix(seed ^ 6),
        mix(seed ^ 7)
    )
}
