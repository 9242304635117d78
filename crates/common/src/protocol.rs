//! Ledger protocol version gates.
//!
//! Rule changes ship behind the ledger protocol version, a monotonic
//! integer agreed by consensus. Every gate the apply engine consults lives
//! here as a named predicate so the version matrix stays testable in one
//! place.

/// The current maximum supported ledger protocol version.
pub const CURRENT_LEDGER_PROTOCOL_VERSION: u32 = 10;

/// Since version 3, an account may not open a trustline to an asset it
/// issues itself.
pub const fn self_trust_forbidden(protocol_version: u32) -> bool {
    protocol_version > 2
}

/// Since version 10, a trust change naming the native asset is rejected
/// outright as malformed.
pub const fn native_trust_forbidden(protocol_version: u32) -> bool {
    protocol_version > 9
}

/// Since version 8, a path payment re-reads its source account before the
/// native-asset debit instead of trusting the frame loaded at operation
/// start.
pub const fn reload_source_on_native_debit(protocol_version: u32) -> bool {
    protocol_version > 7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_trust_gate() {
        assert!(!self_trust_forbidden(2));
        assert!(self_trust_forbidden(3));
        assert!(self_trust_forbidden(CURRENT_LEDGER_PROTOCOL_VERSION));
    }

    #[test]
    fn test_native_trust_gate() {
        assert!(!native_trust_forbidden(9));
        assert!(native_trust_forbidden(10));
    }

    #[test]
    fn test_source_reload_gate() {
        assert!(!reload_source_on_native_debit(7));
        assert!(reload_source_on_native_debit(8));
    }
}
