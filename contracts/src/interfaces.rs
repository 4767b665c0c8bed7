//! Shared interfaces for the oracle and collateral token integrations.
//!
//! Entry point names used with `CallDef`, and the proposition encodings
//! submitted to the oracle as claim bytes.

use odra::prelude::*;
use odra::casper_types::bytesrepr::Bytes;

/// Oracle entry points consumed by the assertion bridge
pub const ORACLE_ASSERT_TRUTH: &str = "assert_truth";
pub const ORACLE_GET_MINIMUM_BOND: &str = "get_minimum_bond";

/// Callback entry points the oracle invokes on the callback recipient
pub const ASSERTION_RESOLVED_CALLBACK: &str = "assertion_resolved_callback";
pub const ASSERTION_DISPUTED_CALLBACK: &str = "assertion_disputed_callback";

/// CEP-18 entry points consumed by the collateral ledger
pub const TOKEN_TRANSFER: &str = "transfer";
pub const TOKEN_TRANSFER_FROM: &str = "transfer_from";
pub const TOKEN_ALLOWANCE: &str = "allowance";

/// Proposition for a market outcome assertion.
pub fn market_claim(timestamp: u64, outcome: &str, description: &str) -> Bytes {
    let text = format!(
        "As of assertion timestamp {}, the described prediction market outcome is: {}. The market description is: {}",
        timestamp, outcome, description
    );
    Bytes::from(text.into_bytes())
}

/// Proposition for an insurance payout claim.
pub fn insurance_claim(policy_text: &str, timestamp: u64) -> Bytes {
    let text = format!(
        "Insurance contract is claiming that insurance event {} had occurred as of {}.",
        policy_text, timestamp
    );
    Bytes::from(text.into_bytes())
}
