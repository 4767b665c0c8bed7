//! Common types used across the settlement protocol.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::SettlementError;

/// Market identifier (hash of creator, outcomes, description and salt)
pub type MarketId = [u8; 32];
/// Policy identifier (hash of issuer, payout address, amount and sequence)
pub type PolicyId = [u8; 32];
/// Oracle assertion identifier
pub type AssertionId = [u8; 32];

/// Default assertion liveness in milliseconds (2 hours)
pub const DEFAULT_LIVENESS_MS: u64 = 7_200_000;
/// Default delay before a creator may reclaim an unused reward (30 days)
pub const DEFAULT_REWARD_RECLAIM_DELAY_MS: u64 = 30 * 24 * 60 * 60 * 1000;
/// Default oracle price identifier for truth assertions
pub const DEFAULT_IDENTIFIER: &str = "ASSERT_TRUTH";

/// One side of a binary market
#[odra::odra_type]
#[derive(Copy, PartialOrd, Ord)]
pub enum Outcome {
    /// First registered outcome
    First,
    /// Second registered outcome
    Second,
}

impl Outcome {
    pub fn other(self) -> Outcome {
        match self {
            Outcome::First => Outcome::Second,
            Outcome::Second => Outcome::First,
        }
    }
}

/// Kind of claim an assertion is backing
#[odra::odra_type]
#[derive(Copy)]
pub enum ClaimKind {
    /// Prediction market outcome
    Market,
    /// Insurance payout claim
    InsurancePolicy,
}

/// Routing key from an assertion back to its owning claim
#[odra::odra_type]
#[derive(Copy)]
pub struct ClaimRef {
    /// Claim kind
    pub kind: ClaimKind,
    /// Market id or policy id
    pub owner_id: [u8; 32],
}

impl ClaimRef {
    pub fn market(market_id: MarketId) -> Self {
        Self { kind: ClaimKind::Market, owner_id: market_id }
    }

    pub fn policy(policy_id: PolicyId) -> Self {
        Self { kind: ClaimKind::InsurancePolicy, owner_id: policy_id }
    }
}

/// Purpose of a collateral ledger account
#[odra::odra_type]
#[derive(Copy)]
pub enum AccountKind {
    /// Reward escrowed at market initialization
    MarketReward,
    /// Collateral backing minted outcome token pairs
    MarketCollateral,
    /// Asserter bond escrowed for a live market assertion
    MarketBond,
    /// Insured amount locked by a policy
    PolicyCoverage,
    /// Asserter bond escrowed for a live insurance claim
    PolicyBond,
}

/// Owner of a locked collateral balance
#[odra::odra_type]
#[derive(Copy)]
pub struct LedgerAccount {
    /// Account purpose
    pub kind: AccountKind,
    /// Market, policy or claim id the balance belongs to
    pub id: [u8; 32],
}

impl LedgerAccount {
    pub fn market_reward(market_id: MarketId) -> Self {
        Self { kind: AccountKind::MarketReward, id: market_id }
    }

    pub fn market_collateral(market_id: MarketId) -> Self {
        Self { kind: AccountKind::MarketCollateral, id: market_id }
    }

    pub fn policy_coverage(policy_id: PolicyId) -> Self {
        Self { kind: AccountKind::PolicyCoverage, id: policy_id }
    }

    /// Bond escrow is keyed by claim, which holds at most one live assertion.
    pub fn assertion_bond(claim: &ClaimRef) -> Self {
        let kind = match claim.kind {
            ClaimKind::Market => AccountKind::MarketBond,
            ClaimKind::InsurancePolicy => AccountKind::PolicyBond,
        };
        Self { kind, id: claim.owner_id }
    }
}

/// Per-assertion lifecycle
#[odra::odra_type]
#[derive(Copy)]
pub enum AssertionStatus {
    /// Waiting for the oracle callback
    Pending,
    /// Oracle confirmed the claim
    Confirmed,
    /// Oracle rejected the claim
    Rejected,
}

/// Insurance policy lifecycle
#[odra::odra_type]
#[derive(Copy)]
pub enum PolicyStatus {
    /// Coverage locked, no claim yet
    Issued,
    /// Payout claim pending with the oracle
    ClaimAsserted,
    /// Coverage paid to the beneficiary
    Paid,
    /// Claim rejected, coverage returned to the issuer
    Rejected,
}

/// Prediction market record
#[odra::odra_type]
pub struct Market {
    /// Market identifier
    pub market_id: MarketId,
    /// Market creator (funded the reward)
    pub creator: Address,
    /// First outcome label
    pub outcome1: String,
    /// Second outcome label
    pub outcome2: String,
    /// Human-readable description included in every assertion
    pub description: String,
    /// Reward paid to the asserter of a confirmed outcome
    pub reward: U256,
    /// Bond required from an asserter
    pub required_bond: U256,
    /// Whether the outcome is final
    pub resolved: bool,
    /// Outcome claimed by the live or confirmed assertion
    pub asserted_outcome: Option<Outcome>,
    /// Live or confirmed assertion id
    pub assertion_id: Option<AssertionId>,
    /// Initialization timestamp
    pub created_at: u64,
}

impl Market {
    /// Resolve an outcome label to its side.
    pub fn outcome_by_name(&self, name: &str) -> Option<Outcome> {
        if name == self.outcome1 {
            Some(Outcome::First)
        } else if name == self.outcome2 {
            Some(Outcome::Second)
        } else {
            None
        }
    }

    pub fn outcome_name(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::First => &self.outcome1,
            Outcome::Second => &self.outcome2,
        }
    }

    pub fn has_pending_assertion(&self) -> bool {
        !self.resolved && self.assertion_id.is_some()
    }

    /// Check the market accepts a new assertion.
    pub fn check_assertable(&self) -> Result<(), SettlementError> {
        if self.resolved {
            return Err(SettlementError::MarketAlreadyResolved);
        }
        if self.assertion_id.is_some() {
            return Err(SettlementError::AssertionAlreadyPending);
        }
        Ok(())
    }

    /// Validate a pair of outcome labels.
    pub fn validate_outcome_names(outcome1: &str, outcome2: &str) -> Result<(), SettlementError> {
        if outcome1.is_empty() || outcome2.is_empty() || outcome1 == outcome2 {
            return Err(SettlementError::InvalidOutcomeNames);
        }
        Ok(())
    }
}

/// Insurance policy record
#[odra::odra_type]
pub struct InsurancePolicy {
    /// Policy identifier
    pub policy_id: PolicyId,
    /// Account that locked the coverage
    pub issuer: Address,
    /// Beneficiary of a successful claim
    pub payout_address: Address,
    /// Locked coverage amount
    pub insurance_amount: U256,
    /// Insured event description
    pub policy_text: String,
    /// Current status
    pub status: PolicyStatus,
    /// Claim assertion id (None while Issued)
    pub assertion_id: Option<AssertionId>,
    /// Issuance timestamp
    pub issued_at: u64,
}

impl InsurancePolicy {
    /// Move Issued -> ClaimAsserted.
    pub fn begin_claim(&mut self, assertion_id: AssertionId) -> Result<(), SettlementError> {
        if self.status != PolicyStatus::Issued {
            return Err(SettlementError::InvalidPolicyState);
        }
        self.status = PolicyStatus::ClaimAsserted;
        self.assertion_id = Some(assertion_id);
        Ok(())
    }

    /// Move ClaimAsserted -> Paid | Rejected.
    pub fn finalize(&mut self, asserted_truthfully: bool) -> Result<PolicyStatus, SettlementError> {
        if self.status != PolicyStatus::ClaimAsserted {
            return Err(SettlementError::InvalidPolicyState);
        }
        self.status = if asserted_truthfully {
            PolicyStatus::Paid
        } else {
            PolicyStatus::Rejected
        };
        Ok(self.status)
    }
}

/// Bridge-side record of an assertion opened with the oracle
#[odra::odra_type]
pub struct AssertionRecord {
    /// Oracle assertion id
    pub assertion_id: AssertionId,
    /// Claim the assertion backs
    pub claim: ClaimRef,
    /// Bonded asserter
    pub asserter: Address,
    /// Escrowed bond
    pub bond: U256,
    /// Lifecycle status
    pub status: AssertionStatus,
    /// Whether the oracle reported a dispute
    pub disputed: bool,
    /// Opening timestamp
    pub opened_at: u64,
}

impl AssertionRecord {
    /// Apply the oracle's final truth value exactly once.
    pub fn finalize(&mut self, asserted_truthfully: bool) -> Result<AssertionStatus, SettlementError> {
        if self.status != AssertionStatus::Pending {
            return Err(SettlementError::AlreadyFinalized);
        }
        self.status = if asserted_truthfully {
            AssertionStatus::Confirmed
        } else {
            AssertionStatus::Rejected
        };
        Ok(self.status)
    }
}

/// Engine configuration
#[odra::odra_type]
pub struct EngineConfig {
    /// Assertion liveness passed to the oracle (ms)
    pub liveness: u64,
    /// Oracle identifier for truth assertions
    pub identifier: String,
    /// Delay after initialization before an unused reward is reclaimable (ms)
    pub reward_reclaim_delay: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            liveness: DEFAULT_LIVENESS_MS,
            identifier: String::from(DEFAULT_IDENTIFIER),
            reward_reclaim_delay: DEFAULT_REWARD_RECLAIM_DELAY_MS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), SettlementError> {
        if self.liveness == 0 || self.identifier.is_empty() {
            return Err(SettlementError::InvalidConfig);
        }
        Ok(())
    }

    /// Time at which an unused reward of a market created at `created_at` unlocks.
    pub fn reward_unlock_at(&self, created_at: u64) -> Result<u64, SettlementError> {
        created_at
            .checked_add(self.reward_reclaim_delay)
            .ok_or(SettlementError::InvalidConfig)
    }
}
