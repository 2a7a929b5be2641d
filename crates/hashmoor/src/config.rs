//! Ledger configuration.
//!
//! No module-level singletons: callers build a [`LedgerConfig`] once,
//! usually with [`LedgerConfig::from_env`], and inject it where needed.

use std::time::Duration;

use hashmoor_core::Address;
use hashmoor_ledger::{Signer, SqliteLedger};

use crate::error::{HashmoorError, Result};

/// Environment variable naming the ledger database location.
pub const ENV_ENDPOINT: &str = "HASHMOOR_LEDGER_ENDPOINT";
/// Environment variable naming the on-ledger registry address.
pub const ENV_CONTRACT_ADDRESS: &str = "HASHMOOR_CONTRACT_ADDRESS";
/// Environment variable holding the hex Ed25519 seed of the signing identity.
pub const ENV_SIGNER_KEY: &str = "HASHMOOR_SIGNER_KEY";
/// Environment variable bounding write confirmation, in milliseconds.
pub const ENV_CONFIRM_TIMEOUT_MS: &str = "HASHMOOR_CONFIRM_TIMEOUT_MS";

/// Default ledger database location.
pub const DEFAULT_ENDPOINT: &str = "hashmoor.db";
/// Default write confirmation bound in milliseconds.
pub const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 30_000;

/// Configuration for connecting to the anchoring ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Where the ledger lives: a database path, or `":memory:"`.
    pub endpoint: String,
    /// Registry address for deployments fronting a remote ledger.
    /// Local backends ignore it.
    pub contract_address: Option<Address>,
    /// Signing identity for writes. Without one the handle is read-only.
    pub signer: Option<Signer>,
    /// How long to wait for write confirmation before giving up.
    pub confirm_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            contract_address: None,
            signer: None,
            confirm_timeout: Duration::from_millis(DEFAULT_CONFIRM_TIMEOUT_MS),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from `HASHMOOR_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `from_env` is this over `std::env::var`; tests inject a map.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = get(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let contract_address = match get(ENV_CONTRACT_ADDRESS) {
            None => None,
            Some(raw) => Some(Address::from_hex(&raw).map_err(|e| {
                HashmoorError::Config(format!("{}: {}", ENV_CONTRACT_ADDRESS, e))
            })?),
        };

        // The seed itself must never reach an error message.
        let signer = match get(ENV_SIGNER_KEY) {
            None => None,
            Some(raw) => Some(Signer::from_hex(&raw).map_err(|_| {
                HashmoorError::Config(format!("{}: not a valid signing key", ENV_SIGNER_KEY))
            })?),
        };

        let confirm_timeout = match get(ENV_CONFIRM_TIMEOUT_MS) {
            None => Duration::from_millis(DEFAULT_CONFIRM_TIMEOUT_MS),
            Some(raw) => {
                let ms: u64 = raw.parse().map_err(|_| {
                    HashmoorError::Config(format!(
                        "{}: expected milliseconds, got {:?}",
                        ENV_CONFIRM_TIMEOUT_MS, raw
                    ))
                })?;
                Duration::from_millis(ms)
            }
        };

        Ok(Self {
            endpoint,
            contract_address,
            signer,
            confirm_timeout,
        })
    }

    /// Set the ledger location.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the signing identity.
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Set the write confirmation bound.
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Open the configured SQLite ledger, binding the signer when present.
    pub fn open_ledger(&self) -> Result<SqliteLedger> {
        let ledger = if self.endpoint == ":memory:" {
            SqliteLedger::open_memory()?
        } else {
            SqliteLedger::open(&self.endpoint)?
        };
        Ok(match &self.signer {
            Some(signer) => ledger.with_signer(signer.clone()),
            None => ledger,
        })
    }
}
