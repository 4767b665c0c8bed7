//! Settlement error definitions.

use odra::prelude::*;

/// Settlement protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SettlementError {
    // Validation errors (1xx)
    ZeroAmount = 100,
    InvalidOutcomeNames = 101,
    InvalidOutcome = 102,
    DuplicateMarket = 103,
    DuplicatePolicy = 104,
    BondBelowMinimum = 105,

    // Resource errors (2xx)
    InsufficientAllowance = 200,
    InsufficientBalance = 201,
    InsufficientTokenBalance = 202,

    // State errors (3xx)
    MarketNotFound = 300,
    MarketNotInitialized = 301,
    MarketAlreadyResolved = 302,
    MarketNotResolved = 303,
    PayoutAlreadySettled = 304,
    AssertionAlreadyPending = 305,
    AlreadyFinalized = 306,
    PolicyNotFound = 307,
    InvalidPolicyState = 308,
    AssertionNotExpired = 309,
    AssertionAlreadyDisputed = 310,
    DisputeNotResolved = 311,
    RewardLocked = 312,
    NothingToReclaim = 313,
    AssertionExpired = 314,
    AssertionNotDisputed = 315,

    // Integration errors (4xx)
    UnknownAssertion = 400,

    // Access control errors (5xx)
    Unauthorized = 500,
    UnauthorizedOracle = 501,

    // Configuration errors (9xx)
    InvalidConfig = 900,
}

impl SettlementError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Validation
            SettlementError::ZeroAmount => "Amount must be greater than zero",
            SettlementError::InvalidOutcomeNames => "Outcome names must be non-empty and distinct",
            SettlementError::InvalidOutcome => "Outcome does not match the market outcomes",
            SettlementError::DuplicateMarket => "Market already exists",
            SettlementError::DuplicatePolicy => "Policy already exists",
            SettlementError::BondBelowMinimum => "Bond below oracle minimum",

            // Resource
            SettlementError::InsufficientAllowance => "Insufficient collateral allowance",
            SettlementError::InsufficientBalance => "Insufficient locked balance",
            SettlementError::InsufficientTokenBalance => "Insufficient token balance",

            // State
            SettlementError::MarketNotFound => "Market not found",
            SettlementError::MarketNotInitialized => "Market has no outcome token pair",
            SettlementError::MarketAlreadyResolved => "Market already resolved",
            SettlementError::MarketNotResolved => "Market not resolved",
            SettlementError::PayoutAlreadySettled => "Payout already settled",
            SettlementError::AssertionAlreadyPending => "Assertion already pending",
            SettlementError::AlreadyFinalized => "Assertion already finalized",
            SettlementError::PolicyNotFound => "Policy not found",
            SettlementError::InvalidPolicyState => "Invalid policy state",
            SettlementError::AssertionNotExpired => "Assertion liveness not elapsed",
            SettlementError::AssertionAlreadyDisputed => "Assertion already disputed",
            SettlementError::DisputeNotResolved => "Dispute not resolved",
            SettlementError::RewardLocked => "Reward reclaim delay not elapsed",
            SettlementError::NothingToReclaim => "Nothing to reclaim",
            SettlementError::AssertionExpired => "Assertion liveness has elapsed",
            SettlementError::AssertionNotDisputed => "Assertion is not disputed",

            // Integration
            SettlementError::UnknownAssertion => "Unknown assertion",

            // Access control
            SettlementError::Unauthorized => "Unauthorized: caller is not admin",
            SettlementError::UnauthorizedOracle => "Unauthorized: caller is not the oracle",

            // Config
            SettlementError::InvalidConfig => "Invalid configuration parameter",
        }
    }
}

impl core::fmt::Display for SettlementError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<SettlementError> for OdraError {
    fn from(error: SettlementError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}
