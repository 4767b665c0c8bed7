//! Market Lifecycle Manager
//!
//! Owns prediction market records and sequences
//! initialize -> mint/redeem -> assert -> settle, using the outcome token
//! pair minter for collateral-backed claims and the assertion bridge for
//! resolution.
//!
//! ## Reward
//!
//! The reward locked at initialization goes to the asserter of the confirmed
//! outcome. If nobody gets an outcome confirmed, the creator may reclaim it
//! once `reward_reclaim_delay` has passed and no assertion is pending.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::casper_types::bytesrepr::ToBytes;
use crate::assertion_bridge::AssertionBridge;
use crate::collateral_ledger::CollateralLedger;
use crate::errors::SettlementError;
use crate::interfaces::market_claim;
use crate::outcome_tokens::{OutcomeTokenPairMinter, SettlementClaim};
use crate::types::{
    AssertionId, AssertionRecord, ClaimRef, EngineConfig, LedgerAccount, Market, MarketId,
};

#[odra::event]
pub struct MarketInitialized {
    pub market_id: MarketId,
    pub outcome1: String,
    pub outcome2: String,
    pub required_bond: U256,
}

#[odra::event]
pub struct TokensCreated {
    pub market_id: MarketId,
    pub amount: U256,
}

#[odra::event]
pub struct TokensRedeemed {
    pub market_id: MarketId,
    pub amount: U256,
}

#[odra::event]
pub struct MarketAsserted {
    pub market_id: MarketId,
    pub assertion_id: AssertionId,
    pub outcome: String,
}

#[odra::event]
pub struct MarketResolved {
    pub market_id: MarketId,
    pub outcome: String,
}

/// A rejected assertion returned the market to an assertable state
#[odra::event]
pub struct MarketAssertionRejected {
    pub market_id: MarketId,
    pub assertion_id: AssertionId,
}

#[odra::event]
pub struct TokensSettled {
    pub market_id: MarketId,
    pub holder: Address,
    pub payout: U256,
    pub outcome1_balance: U256,
    pub outcome2_balance: U256,
}

#[odra::event]
pub struct RewardReclaimed {
    pub market_id: MarketId,
    pub amount: U256,
}

/// Market lifecycle manager submodule
#[odra::module]
pub struct MarketManager {
    /// Market records
    markets: Mapping<MarketId, Market>,
    /// Creation-order index: position -> market id
    market_ids: Mapping<u64, MarketId>,
    /// Number of markets
    market_count: Var<u64>,
}

#[odra::module]
impl MarketManager {
    /// Market record
    pub fn get_market(&self, market_id: MarketId) -> Option<Market> {
        self.markets.get(&market_id)
    }

    /// Number of markets ever initialized
    pub fn market_count(&self) -> u64 {
        self.market_count.get().unwrap_or(0)
    }

    /// Market id at a creation-order position
    pub fn market_id_at(&self, index: u64) -> Option<MarketId> {
        self.market_ids.get(&index)
    }
}

impl MarketManager {
    /// Register a market, its token pair and its reward escrow.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize_market(
        &mut self,
        ledger: &mut CollateralLedger,
        tokens: &mut OutcomeTokenPairMinter,
        creator: Address,
        outcome1: String,
        outcome2: String,
        description: String,
        reward: U256,
        required_bond: U256,
    ) -> MarketId {
        if let Err(err) = Market::validate_outcome_names(&outcome1, &outcome2) {
            self.env().revert(err);
        }

        let created_at = self.env().get_block_time();
        let market_id = self.derive_market_id(creator, &outcome1, &outcome2, &description, created_at);
        if self.markets.get(&market_id).is_some() {
            self.env().revert(SettlementError::DuplicateMarket);
        }

        tokens.register_pair(market_id);
        ledger.lock(LedgerAccount::market_reward(market_id), creator, reward);

        let market = Market {
            market_id,
            creator,
            outcome1: outcome1.clone(),
            outcome2: outcome2.clone(),
            description,
            reward,
            required_bond,
            resolved: false,
            asserted_outcome: None,
            assertion_id: None,
            created_at,
        };
        self.markets.set(&market_id, market);

        let index = self.market_count();
        self.market_ids.set(&index, market_id);
        self.market_count.set(index + 1);

        self.env().emit_event(MarketInitialized {
            market_id,
            outcome1,
            outcome2,
            required_bond,
        });

        market_id
    }

    pub fn create_outcome_tokens(
        &mut self,
        ledger: &mut CollateralLedger,
        tokens: &mut OutcomeTokenPairMinter,
        market_id: MarketId,
        holder: Address,
        amount: U256,
    ) {
        tokens.mint(ledger, market_id, holder, amount);
        self.env().emit_event(TokensCreated { market_id, amount });
    }

    pub fn redeem_outcome_tokens(
        &mut self,
        ledger: &mut CollateralLedger,
        tokens: &mut OutcomeTokenPairMinter,
        market_id: MarketId,
        holder: Address,
        amount: U256,
    ) {
        tokens.redeem(ledger, market_id, holder, amount);
        self.env().emit_event(TokensRedeemed { market_id, amount });
    }

    /// Open an assertion that `outcome_name` is the market's outcome.
    ///
    /// Bond is the larger of the market's required bond and the oracle minimum.
    pub fn assert_market(
        &mut self,
        ledger: &mut CollateralLedger,
        bridge: &mut AssertionBridge,
        config: &EngineConfig,
        market_id: MarketId,
        asserter: Address,
        outcome_name: String,
    ) -> AssertionId {
        let mut market = self.require_market(market_id);

        let outcome = match market.outcome_by_name(&outcome_name) {
            Some(outcome) => outcome,
            None => self.env().revert(SettlementError::InvalidOutcome),
        };
        if let Err(err) = market.check_assertable() {
            self.env().revert(err);
        }

        let currency = match ledger.currency() {
            Some(currency) => currency,
            None => self.env().revert(SettlementError::InvalidConfig),
        };
        let minimum_bond = bridge.minimum_bond(currency);
        let bond = market.required_bond.max(minimum_bond);

        let claim_text = market_claim(self.env().get_block_time(), &outcome_name, &market.description);
        let assertion_id = bridge.open_assertion(
            ledger,
            config,
            ClaimRef::market(market_id),
            claim_text,
            asserter,
            bond,
        );

        market.assertion_id = Some(assertion_id);
        market.asserted_outcome = Some(outcome);
        self.markets.set(&market_id, market);

        self.env().emit_event(MarketAsserted {
            market_id,
            assertion_id,
            outcome: outcome_name,
        });

        assertion_id
    }

    /// Finalize hook for market assertions.
    pub fn on_assertion_resolved(
        &mut self,
        ledger: &mut CollateralLedger,
        tokens: &mut OutcomeTokenPairMinter,
        record: &AssertionRecord,
        asserted_truthfully: bool,
    ) {
        let market_id = record.claim.owner_id;
        let mut market = self.require_market(market_id);
        if market.assertion_id != Some(record.assertion_id) {
            self.env().revert(SettlementError::UnknownAssertion);
        }

        if !asserted_truthfully {
            market.assertion_id = None;
            market.asserted_outcome = None;
            self.markets.set(&market_id, market);
            self.env().emit_event(MarketAssertionRejected {
                market_id,
                assertion_id: record.assertion_id,
            });
            return;
        }

        let outcome = match market.asserted_outcome {
            Some(outcome) => outcome,
            None => self.env().revert(SettlementError::UnknownAssertion),
        };
        market.resolved = true;
        let outcome_name = String::from(market.outcome_name(outcome));
        self.markets.set(&market_id, market);

        tokens.settle_payout(market_id, outcome);
        ledger.release_all(LedgerAccount::market_reward(market_id), record.asserter);

        self.env().emit_event(MarketResolved {
            market_id,
            outcome: outcome_name,
        });
    }

    /// Redeem the holder's winning tokens after resolution.
    ///
    /// Holding no tokens is not an error; the payout is zero.
    pub fn settle_outcome_tokens(
        &mut self,
        ledger: &mut CollateralLedger,
        tokens: &mut OutcomeTokenPairMinter,
        market_id: MarketId,
        holder: Address,
    ) -> SettlementClaim {
        let market = self.require_market(market_id);
        if !market.resolved {
            self.env().revert(SettlementError::MarketNotResolved);
        }

        let claim = tokens.redeem_winning(ledger, market_id, holder);
        if !claim.outcome1_balance.is_zero() || !claim.outcome2_balance.is_zero() {
            self.env().emit_event(TokensSettled {
                market_id,
                holder,
                payout: claim.payout,
                outcome1_balance: claim.outcome1_balance,
                outcome2_balance: claim.outcome2_balance,
            });
        }
        claim
    }

    /// Return an unused reward to the market creator.
    pub fn reclaim_reward(
        &mut self,
        ledger: &mut CollateralLedger,
        config: &EngineConfig,
        market_id: MarketId,
        caller: Address,
    ) -> U256 {
        let mut market = self.require_market(market_id);
        if caller != market.creator {
            self.env().revert(SettlementError::Unauthorized);
        }
        if market.resolved {
            self.env().revert(SettlementError::MarketAlreadyResolved);
        }
        if market.has_pending_assertion() {
            self.env().revert(SettlementError::AssertionAlreadyPending);
        }
        let unlock_at = match config.reward_unlock_at(market.created_at) {
            Ok(unlock_at) => unlock_at,
            Err(err) => self.env().revert(err),
        };
        if self.env().get_block_time() < unlock_at {
            self.env().revert(SettlementError::RewardLocked);
        }

        let amount = ledger.release_all(LedgerAccount::market_reward(market_id), market.creator);
        if amount.is_zero() {
            self.env().revert(SettlementError::NothingToReclaim);
        }
        market.reward = U256::zero();
        self.markets.set(&market_id, market);

        self.env().emit_event(RewardReclaimed { market_id, amount });
        amount
    }

    fn require_market(&self, market_id: MarketId) -> Market {
        match self.markets.get(&market_id) {
            Some(market) => market,
            None => self.env().revert(SettlementError::MarketNotFound),
        }
    }

    fn derive_market_id(
        &self,
        creator: Address,
        outcome1: &str,
        outcome2: &str,
        description: &str,
        salt: u64,
    ) -> MarketId {
        let mut preimage = creator.to_bytes().unwrap_or_default();
        for part in [outcome1, outcome2, description] {
            preimage.extend_from_slice(&String::from(part).to_bytes().unwrap_or_default());
        }
        preimage.extend_from_slice(&salt.to_le_bytes());
        self.env().hash(preimage)
    }
}
