//! Ledger configuration.

use serde::{Deserialize, Serialize};

use crate::protocol::CURRENT_LEDGER_PROTOCOL_VERSION;

/// Ledger-level parameters for the apply engine.
///
/// Loaded from TOML; every field has a default so an empty document is a
/// valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Reserve charged per ledger entry; an account must keep
    /// `(2 + num_sub_entries) * base_reserve` of native balance.
    #[serde(default = "default_base_reserve")]
    pub base_reserve: i64,

    /// Ledger protocol version the engine applies operations under.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_reserve: default_base_reserve(),
            protocol_version: default_protocol_version(),
        }
    }
}

impl LedgerConfig {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

fn default_base_reserve() -> i64 {
    10
}

fn default_protocol_version() -> u32 {
    CURRENT_LEDGER_PROTOCOL_VERSION
}
