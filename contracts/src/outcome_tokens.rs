//! Outcome Token Pair Minter
//!
//! Per-market pair of complementary claim tokens, minted and burned 1:1
//! against collateral held in the market's `MarketCollateral` ledger account.
//!
//! ## Design
//!
//! - A pair has a single `supply`: minting and pair redemption move both
//!   sides together, so `total_supply(First) == total_supply(Second)` always.
//! - After `settle_payout`, a holder's balances are *retired* (moved out of
//!   circulation) when they claim, and only the winning side pays out.
//!   Supply is left untouched, so the pair invariant survives settlement and
//!   `locked collateral == supply - retired(winner)`.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::collateral_ledger::CollateralLedger;
use crate::errors::SettlementError;
use crate::types::{LedgerAccount, MarketId, Outcome};

/// Supply and settlement state of a market's token pair
#[odra::odra_type]
#[derive(Default)]
pub struct TokenPairState {
    /// Minted pairs minus pair-redeemed pairs (same for both sides)
    pub supply: U256,
    /// First-side tokens retired by settlement claims
    pub retired_first: U256,
    /// Second-side tokens retired by settlement claims
    pub retired_second: U256,
    /// Winning side once settled
    pub winning_outcome: Option<Outcome>,
}

impl TokenPairState {
    pub fn is_settled(&self) -> bool {
        self.winning_outcome.is_some()
    }

    pub fn retired(&self, outcome: Outcome) -> U256 {
        match outcome {
            Outcome::First => self.retired_first,
            Outcome::Second => self.retired_second,
        }
    }

    /// Fix the winning side; one-time.
    pub fn settle(&mut self, winner: Outcome) -> Result<(), SettlementError> {
        if self.is_settled() {
            return Err(SettlementError::PayoutAlreadySettled);
        }
        self.winning_outcome = Some(winner);
        Ok(())
    }

    /// Retire a holder's balances; returns the collateral owed.
    pub fn retire(&mut self, first: U256, second: U256) -> Result<U256, SettlementError> {
        let winner = match self.winning_outcome {
            Some(winner) => winner,
            None => return Err(SettlementError::MarketNotResolved),
        };
        self.retired_first = self.retired_first + first;
        self.retired_second = self.retired_second + second;
        Ok(match winner {
            Outcome::First => first,
            Outcome::Second => second,
        })
    }

    /// Collateral that must still be backing the pair.
    pub fn backing_required(&self) -> U256 {
        match self.winning_outcome {
            Some(winner) => self.supply - self.retired(winner),
            None => self.supply,
        }
    }
}

/// Result of a post-resolution settlement claim
#[odra::odra_type]
#[derive(Default)]
pub struct SettlementClaim {
    /// Collateral paid to the holder
    pub payout: U256,
    /// First-side balance retired
    pub outcome1_balance: U256,
    /// Second-side balance retired
    pub outcome2_balance: U256,
}

/// Outcome token pair minter submodule
#[odra::module]
pub struct OutcomeTokenPairMinter {
    /// Pair state per market (absent = not initialized)
    pairs: Mapping<MarketId, TokenPairState>,
    /// Balances: (market, side, holder) -> amount
    balances: Mapping<(MarketId, Outcome, Address), U256>,
}

#[odra::module]
impl OutcomeTokenPairMinter {
    /// Outcome token balance of a holder
    pub fn balance_of(&self, market_id: MarketId, outcome: Outcome, holder: Address) -> U256 {
        self.balances.get(&(market_id, outcome, holder)).unwrap_or(U256::zero())
    }

    /// Total supply of one side.
    ///
    /// Both sides of a pair share a single `supply` counter, moved only by
    /// mint and pair redemption, so `_outcome` is ignored and both sides
    /// always report the same value. Winning tokens redeemed after settlement
    /// are counted as retired and not subtracted here.
    pub fn total_supply(&self, market_id: MarketId, _outcome: Outcome) -> U256 {
        self.pairs.get(&market_id).map(|pair| pair.supply).unwrap_or(U256::zero())
    }

    /// Pair state, if the market has a pair
    pub fn pair_state(&self, market_id: MarketId) -> Option<TokenPairState> {
        self.pairs.get(&market_id)
    }
}

impl OutcomeTokenPairMinter {
    /// Create an empty pair for a new market.
    pub fn register_pair(&mut self, market_id: MarketId) {
        self.pairs.set(&market_id, TokenPairState::default());
    }

    /// Lock `amount` collateral from `holder` and credit `amount` of each side.
    pub fn mint(&mut self, ledger: &mut CollateralLedger, market_id: MarketId, holder: Address, amount: U256) {
        if amount.is_zero() {
            self.env().revert(SettlementError::ZeroAmount);
        }
        let mut pair = self.require_pair(market_id);

        ledger.lock(LedgerAccount::market_collateral(market_id), holder, amount);

        self.credit(market_id, Outcome::First, holder, amount);
        self.credit(market_id, Outcome::Second, holder, amount);
        pair.supply = pair.supply + amount;
        self.pairs.set(&market_id, pair);
    }

    /// Burn `amount` of both sides from `holder` and return the collateral.
    pub fn redeem(&mut self, ledger: &mut CollateralLedger, market_id: MarketId, holder: Address, amount: U256) {
        if amount.is_zero() {
            self.env().revert(SettlementError::ZeroAmount);
        }
        let mut pair = self.require_pair(market_id);
        if pair.is_settled() {
            self.env().revert(SettlementError::MarketAlreadyResolved);
        }

        self.debit(market_id, Outcome::First, holder, amount);
        self.debit(market_id, Outcome::Second, holder, amount);
        pair.supply = pair.supply - amount;
        self.pairs.set(&market_id, pair);

        ledger.release(LedgerAccount::market_collateral(market_id), holder, amount);
    }

    /// Move outcome tokens between holders.
    pub fn transfer(&mut self, market_id: MarketId, outcome: Outcome, from: Address, to: Address, amount: U256) {
        self.require_pair(market_id);
        self.debit(market_id, outcome, from, amount);
        self.credit(market_id, outcome, to, amount);
    }

    /// Switch the pair to winner-only redemption.
    pub fn settle_payout(&mut self, market_id: MarketId, winner: Outcome) {
        let mut pair = self.require_pair(market_id);
        if let Err(err) = pair.settle(winner) {
            self.env().revert(err);
        }
        self.pairs.set(&market_id, pair);
    }

    /// Retire all of `holder`'s tokens and pay the winning balance 1:1.
    ///
    /// Holding nothing is a no-op with a zero payout.
    pub fn redeem_winning(
        &mut self,
        ledger: &mut CollateralLedger,
        market_id: MarketId,
        holder: Address,
    ) -> SettlementClaim {
        let mut pair = self.require_pair(market_id);

        let outcome1_balance = self.balance_of(market_id, Outcome::First, holder);
        let outcome2_balance = self.balance_of(market_id, Outcome::Second, holder);

        let payout = match pair.retire(outcome1_balance, outcome2_balance) {
            Ok(payout) => payout,
            Err(err) => self.env().revert(err),
        };
        self.pairs.set(&market_id, pair);

        if !outcome1_balance.is_zero() {
            self.balances.set(&(market_id, Outcome::First, holder), U256::zero());
        }
        if !outcome2_balance.is_zero() {
            self.balances.set(&(market_id, Outcome::Second, holder), U256::zero());
        }

        ledger.release(LedgerAccount::market_collateral(market_id), holder, payout);

        SettlementClaim {
            payout,
            outcome1_balance,
            outcome2_balance,
        }
    }

    fn require_pair(&self, market_id: MarketId) -> TokenPairState {
        match self.pairs.get(&market_id) {
            Some(pair) => pair,
            None => self.env().revert(SettlementError::MarketNotInitialized),
        }
    }

    fn credit(&mut self, market_id: MarketId, outcome: Outcome, holder: Address, amount: U256) {
        let balance = self.balance_of(market_id, outcome, holder);
        self.balances.set(&(market_id, outcome, holder), balance + amount);
    }

    fn debit(&mut self, market_id: MarketId, outcome: Outcome, holder: Address, amount: U256) {
        let balance = self.balance_of(market_id, outcome, holder);
        if balance < amount {
            self.env().revert(SettlementError::InsufficientTokenBalance);
        }
        self.balances.set(&(market_id, outcome, holder), balance - amount);
    }
}
