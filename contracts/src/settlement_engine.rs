//! Settlement Engine Contract
//!
//! The deployed contract. Composes the collateral ledger, outcome token pair
//! minter, assertion bridge, market manager and insurance manager, and is the
//! callback recipient registered with the optimistic oracle.
//!
//! Oracle callbacks are authenticated against the configured oracle and
//! dispatched on `ClaimKind` to the owning manager's finalize hook.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::assertion_bridge::AssertionBridge;
use crate::collateral_ledger::{CollateralLedger, LedgerTotals};
use crate::errors::SettlementError;
use crate::insurance_manager::{
    InsuranceIssued, InsuranceManager, InsurancePaid, InsurancePayoutRequested, InsuranceRejected,
};
use crate::market_manager::{
    MarketAsserted, MarketAssertionRejected, MarketInitialized, MarketManager, MarketResolved,
    RewardReclaimed, TokensCreated, TokensRedeemed, TokensSettled,
};
use crate::outcome_tokens::{OutcomeTokenPairMinter, TokenPairState};
use crate::types::{
    AssertionId, AssertionRecord, ClaimKind, ClaimRef, EngineConfig, InsurancePolicy, LedgerAccount,
    Market, MarketId, Outcome, PolicyId,
};

/// The oracle reported a dispute on a live assertion
#[odra::event]
pub struct AssertionDisputed {
    pub assertion_id: AssertionId,
}

/// Settlement Engine Contract
#[odra::module(events = [
    MarketInitialized,
    TokensCreated,
    TokensRedeemed,
    MarketAsserted,
    MarketResolved,
    MarketAssertionRejected,
    TokensSettled,
    RewardReclaimed,
    InsuranceIssued,
    InsurancePayoutRequested,
    InsurancePaid,
    InsuranceRejected,
    AssertionDisputed
])]
pub struct SettlementEngine {
    /// Collateral balances of markets, policies and bonds
    ledger: SubModule<CollateralLedger>,
    /// Outcome token pairs
    outcome_tokens: SubModule<OutcomeTokenPairMinter>,
    /// Oracle integration
    bridge: SubModule<AssertionBridge>,
    /// Prediction markets
    markets: SubModule<MarketManager>,
    /// Insurance policies
    policies: SubModule<InsuranceManager>,
    /// Admin address
    admin: Var<Address>,
    /// Engine configuration
    config: Var<EngineConfig>,
}

#[odra::module]
impl SettlementEngine {
    /// Initialize with the collateral token, the oracle and an admin
    pub fn init(&mut self, currency: Address, oracle: Address, admin: Address) {
        self.ledger.set_currency(currency);
        self.bridge.set_oracle(oracle);
        self.admin.set(admin);
        self.config.set(EngineConfig::default());
    }

    // ========== Markets ==========

    /// Create a binary market; the caller funds `reward`
    pub fn initialize_market(
        &mut self,
        outcome1: String,
        outcome2: String,
        description: String,
        reward: U256,
        required_bond: U256,
    ) -> MarketId {
        let creator = self.env().caller();
        self.markets.initialize_market(
            &mut self.ledger,
            &mut self.outcome_tokens,
            creator,
            outcome1,
            outcome2,
            description,
            reward,
            required_bond,
        )
    }

    /// Lock `amount` collateral and receive `amount` of both outcome tokens
    pub fn create_outcome_tokens(&mut self, market_id: MarketId, amount: U256) {
        let holder = self.env().caller();
        self.markets
            .create_outcome_tokens(&mut self.ledger, &mut self.outcome_tokens, market_id, holder, amount);
    }

    /// Burn `amount` of both outcome tokens and receive `amount` collateral
    pub fn redeem_outcome_tokens(&mut self, market_id: MarketId, amount: U256) {
        let holder = self.env().caller();
        self.markets
            .redeem_outcome_tokens(&mut self.ledger, &mut self.outcome_tokens, market_id, holder, amount);
    }

    /// Move outcome tokens to another holder
    pub fn transfer_outcome_tokens(
        &mut self,
        market_id: MarketId,
        outcome: Outcome,
        recipient: Address,
        amount: U256,
    ) {
        let sender = self.env().caller();
        self.outcome_tokens.transfer(market_id, outcome, sender, recipient, amount);
    }

    /// Assert the market outcome; the caller posts the bond
    pub fn assert_market(&mut self, market_id: MarketId, outcome: String) -> AssertionId {
        let asserter = self.env().caller();
        let config = self.get_config();
        self.markets.assert_market(
            &mut self.ledger,
            &mut self.bridge,
            &config,
            market_id,
            asserter,
            outcome,
        )
    }

    /// Redeem the caller's outcome tokens after resolution; returns the payout
    pub fn settle_outcome_tokens(&mut self, market_id: MarketId) -> U256 {
        let holder = self.env().caller();
        self.markets
            .settle_outcome_tokens(&mut self.ledger, &mut self.outcome_tokens, market_id, holder)
            .payout
    }

    /// Return an unused reward to the market creator
    pub fn reclaim_reward(&mut self, market_id: MarketId) -> U256 {
        let caller = self.env().caller();
        let config = self.get_config();
        self.markets.reclaim_reward(&mut self.ledger, &config, market_id, caller)
    }

    // ========== Insurance ==========

    /// Lock `insurance_amount` from the caller as coverage
    pub fn issue_insurance(
        &mut self,
        insurance_amount: U256,
        payout_address: Address,
        policy_text: String,
    ) -> PolicyId {
        let issuer = self.env().caller();
        self.policies
            .issue_insurance(&mut self.ledger, issuer, insurance_amount, payout_address, policy_text)
    }

    /// Claim the insured event happened; the caller posts the bond
    pub fn request_payout(&mut self, policy_id: PolicyId) -> AssertionId {
        let asserter = self.env().caller();
        let config = self.get_config();
        self.policies
            .request_payout(&mut self.ledger, &mut self.bridge, &config, policy_id, asserter)
    }

    // ========== Oracle Callbacks ==========

    /// Final truth value of an assertion (oracle only)
    pub fn assertion_resolved_callback(&mut self, assertion_id: AssertionId, asserted_truthfully: bool) {
        self.bridge.require_oracle_caller();

        let record = self.bridge.finalize(&mut self.ledger, assertion_id, asserted_truthfully);
        match record.claim.kind {
            ClaimKind::Market => self.markets.on_assertion_resolved(
                &mut self.ledger,
                &mut self.outcome_tokens,
                &record,
                asserted_truthfully,
            ),
            ClaimKind::InsurancePolicy => {
                self.policies
                    .on_assertion_resolved(&mut self.ledger, &record, asserted_truthfully)
            }
        }
    }

    /// Dispute notification for a live assertion (oracle only)
    pub fn assertion_disputed_callback(&mut self, assertion_id: AssertionId) {
        self.bridge.require_oracle_caller();
        self.bridge.mark_disputed(assertion_id);
        self.env().emit_event(AssertionDisputed { assertion_id });
    }

    // ========== Admin ==========

    /// Replace the engine configuration (admin only)
    pub fn set_config(&mut self, config: EngineConfig) {
        self.require_admin();
        if let Err(err) = config.validate() {
            self.env().revert(err);
        }
        self.config.set(config);
    }

    // ========== Views ==========

    pub fn get_market(&self, market_id: MarketId) -> Option<Market> {
        self.markets.get_market(market_id)
    }

    pub fn get_market_count(&self) -> u64 {
        self.markets.market_count()
    }

    pub fn get_market_id_at(&self, index: u64) -> Option<MarketId> {
        self.markets.market_id_at(index)
    }

    pub fn get_policy(&self, policy_id: PolicyId) -> Option<InsurancePolicy> {
        self.policies.get_policy(policy_id)
    }

    pub fn get_policy_count(&self) -> u64 {
        self.policies.policy_count()
    }

    pub fn get_policy_id_at(&self, index: u64) -> Option<PolicyId> {
        self.policies.policy_id_at(index)
    }

    pub fn get_assertion_record(&self, assertion_id: AssertionId) -> Option<AssertionRecord> {
        self.bridge.get_assertion_record(assertion_id)
    }

    /// Pending assertion of a market or policy
    pub fn get_live_assertion(&self, claim: ClaimRef) -> Option<AssertionId> {
        self.bridge.live_assertion(claim)
    }

    pub fn get_assertion_count(&self) -> u64 {
        self.bridge.assertion_count()
    }

    pub fn outcome_balance_of(&self, market_id: MarketId, outcome: Outcome, holder: Address) -> U256 {
        self.outcome_tokens.balance_of(market_id, outcome, holder)
    }

    pub fn outcome_total_supply(&self, market_id: MarketId, outcome: Outcome) -> U256 {
        self.outcome_tokens.total_supply(market_id, outcome)
    }

    pub fn get_token_pair(&self, market_id: MarketId) -> Option<TokenPairState> {
        self.outcome_tokens.pair_state(market_id)
    }

    pub fn locked_balance(&self, account: LedgerAccount) -> U256 {
        self.ledger.locked_balance(account)
    }

    pub fn ledger_totals(&self) -> LedgerTotals {
        self.ledger.totals()
    }

    pub fn get_config(&self) -> EngineConfig {
        self.config.get().unwrap_or_default()
    }

    pub fn get_admin(&self) -> Option<Address> {
        self.admin.get()
    }

    pub fn get_currency(&self) -> Option<Address> {
        self.ledger.currency()
    }

    pub fn get_oracle(&self) -> Option<Address> {
        self.bridge.oracle()
    }

    // ========== Internal Functions ==========

    fn require_admin(&self) {
        if Some(self.env().caller()) != self.admin.get() {
            self.env().revert(SettlementError::Unauthorized);
        }
    }
}
