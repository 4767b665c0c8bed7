//! CSPR Oracle Settlement Contracts
//!
//! Binary prediction markets and parametric insurance settled by an
//! optimistic-assertion oracle.
//!
//! ## Architecture
//!
//! - **SettlementEngine**: Deployed contract; composes the components below
//!   and receives the oracle callbacks
//! - **CollateralLedger**: Locked collateral per market, policy and bond
//! - **OutcomeTokenPairMinter**: 1:1 collateral-backed outcome token pairs
//! - **AssertionBridge**: Bonded assertions and callback routing
//! - **MarketManager**: Market lifecycle (initialize, mint/redeem, assert, settle)
//! - **InsuranceManager**: Policy lifecycle (issue, claim, pay/reject)
//! - **CollateralToken**: CEP-18 collateral currency
//! - **OptimisticOracle**: Reference oracle with liveness and admin-resolved disputes
//!
//! ## Settlement
//!
//! An assertion is opened against a market or policy, the oracle runs its
//! liveness window, then calls `assertion_resolved_callback` exactly once:
//! - Market, true: resolved, winning side redeemable 1:1, reward to asserter
//! - Market, false: market may be asserted again
//! - Policy, true: coverage paid to the beneficiary
//! - Policy, false: coverage returned to the issuer
//!
//! The asserter's bond is refunded in every case.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod interfaces;

// Components
pub mod collateral_ledger;
pub mod outcome_tokens;
pub mod assertion_bridge;
pub mod market_manager;
pub mod insurance_manager;

// Contract modules
pub mod settlement_engine;
pub mod collateral_token;
pub mod optimistic_oracle;
