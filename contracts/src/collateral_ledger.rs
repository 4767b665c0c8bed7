//! Collateral Ledger
//!
//! Holds the collateral currency on behalf of markets, policies and asserter
//! bonds, keyed by [`LedgerAccount`]. It is the only component that moves
//! collateral: `lock` pulls from a payer through the CEP-18 allowance,
//! `release` pays a recipient out of an account's locked balance.
//!
//! Invariant: `total_locked == lifetime_locked - lifetime_released`, and no
//! account balance goes negative.

use odra::prelude::*;
use odra::casper_types::{U256, runtime_args, RuntimeArgs};
use odra::CallDef;
use crate::errors::SettlementError;
use crate::interfaces::{TOKEN_ALLOWANCE, TOKEN_TRANSFER, TOKEN_TRANSFER_FROM};
use crate::types::LedgerAccount;

/// Aggregate ledger accounting
#[odra::odra_type]
#[derive(Default)]
pub struct LedgerTotals {
    /// Collateral currently locked across all accounts
    pub total_locked: U256,
    /// Collateral ever locked
    pub lifetime_locked: U256,
    /// Collateral ever released
    pub lifetime_released: U256,
}

impl LedgerTotals {
    pub fn record_lock(&mut self, amount: U256) {
        self.total_locked = self.total_locked + amount;
        self.lifetime_locked = self.lifetime_locked + amount;
    }

    pub fn record_release(&mut self, amount: U256) -> Result<(), SettlementError> {
        if amount > self.total_locked {
            return Err(SettlementError::InsufficientBalance);
        }
        self.total_locked = self.total_locked - amount;
        self.lifetime_released = self.lifetime_released + amount;
        Ok(())
    }

    pub fn is_consistent(&self) -> bool {
        self.lifetime_locked >= self.lifetime_released
            && self.total_locked == self.lifetime_locked - self.lifetime_released
    }
}

/// Collateral ledger submodule
#[odra::module]
pub struct CollateralLedger {
    /// Collateral token contract
    currency: Var<Address>,
    /// Locked balance per account
    locked: Mapping<LedgerAccount, U256>,
    /// Aggregate accounting
    totals: Var<LedgerTotals>,
}

#[odra::module]
impl CollateralLedger {
    /// Collateral token address
    pub fn currency(&self) -> Option<Address> {
        self.currency.get()
    }

    /// Locked balance of an account
    pub fn locked_balance(&self, account: LedgerAccount) -> U256 {
        self.locked.get(&account).unwrap_or(U256::zero())
    }

    /// Aggregate accounting snapshot
    pub fn totals(&self) -> LedgerTotals {
        self.totals.get().unwrap_or_default()
    }
}

impl CollateralLedger {
    pub fn set_currency(&mut self, currency: Address) {
        self.currency.set(currency);
        self.totals.set(LedgerTotals::default());
    }

    /// Pull `amount` from `payer` into `owner`'s locked balance.
    ///
    /// The payer must have approved this contract for at least `amount`.
    pub fn lock(&mut self, owner: LedgerAccount, payer: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }

        let currency = self.currency_address();
        let this = self.env().self_address();

        let allowance_args = runtime_args! {
            "owner" => payer,
            "spender" => this
        };
        let allowance_call = CallDef::new(TOKEN_ALLOWANCE, false, allowance_args);
        let allowance: U256 = self.env().call_contract(currency, allowance_call);
        if allowance < amount {
            self.env().revert(SettlementError::InsufficientAllowance);
        }

        let transfer_args = runtime_args! {
            "owner" => payer,
            "recipient" => this,
            "amount" => amount
        };
        let transfer_call = CallDef::new(TOKEN_TRANSFER_FROM, true, transfer_args);
        let success: bool = self.env().call_contract(currency, transfer_call);
        if !success {
            self.env().revert(SettlementError::InsufficientAllowance);
        }

        let balance = self.locked_balance(owner);
        self.locked.set(&owner, balance + amount);

        let mut totals = self.totals();
        totals.record_lock(amount);
        self.totals.set(totals);
    }

    /// Pay `amount` out of `owner`'s locked balance to `recipient`.
    pub fn release(&mut self, owner: LedgerAccount, recipient: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }

        let balance = self.locked_balance(owner);
        if amount > balance {
            self.env().revert(SettlementError::InsufficientBalance);
        }
        self.locked.set(&owner, balance - amount);

        let mut totals = self.totals();
        if let Err(err) = totals.record_release(amount) {
            self.env().revert(err);
        }
        self.totals.set(totals);

        let currency = self.currency_address();
        let args = runtime_args! {
            "recipient" => recipient,
            "amount" => amount
        };
        let call_def = CallDef::new(TOKEN_TRANSFER, true, args);
        let success: bool = self.env().call_contract(currency, call_def);
        if !success {
            self.env().revert(SettlementError::InsufficientBalance);
        }
    }

    /// Release an account's entire balance to `recipient`, returning the amount.
    pub fn release_all(&mut self, owner: LedgerAccount, recipient: Address) -> U256 {
        let amount = self.locked_balance(owner);
        self.release(owner, recipient, amount);
        amount
    }

    fn currency_address(&self) -> Address {
        match self.currency.get() {
            Some(currency) => currency,
            None => self.env().revert(SettlementError::InvalidConfig),
        }
    }
}
