//! Ledger context for operation execution.

use hayashi_common::config::LedgerConfig;
use hayashi_common::protocol::CURRENT_LEDGER_PROTOCOL_VERSION;

/// Ledger-level context an apply runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerContext {
    /// Current ledger sequence.
    pub sequence: u32,
    /// Ledger protocol version; gates the rule changes in
    /// `hayashi_common::protocol`.
    pub protocol_version: u32,
}

impl LedgerContext {
    pub fn new(sequence: u32, protocol_version: u32) -> Self {
        Self {
            sequence,
            protocol_version,
        }
    }

    /// Context derived from a ledger configuration.
    pub fn from_config(config: &LedgerConfig, sequence: u32) -> Self {
        Self {
            sequence,
            protocol_version: config.protocol_version,
        }
    }

    /// Context at the newest supported protocol version.
    pub fn latest(sequence: u32) -> Self {
        Self {
            sequence,
            protocol_version: CURRENT_LEDGER_PROTOCOL_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = LedgerConfig {
            base_reserve: 5,
            protocol_version: 8,
        };
        let context = LedgerContext::from_config(&config, 12);
        assert_eq!(context.sequence, 12);
        assert_eq!(context.protocol_version, 8);
    }

    #[test]
    fn test_latest() {
        let context = LedgerContext::latest(1);
        assert_eq!(context.protocol_version, CURRENT_LEDGER_PROTOCOL_VERSION);
    }
}
