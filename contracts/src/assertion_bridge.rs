//! Assertion Bridge
//!
//! Single integration point with the optimistic oracle. Opens bonded
//! assertions on behalf of markets and policies and routes the oracle's
//! final truth value back to the owning claim.
//!
//! ## Flow
//!
//! 1. `open_assertion` escrows the asserter's bond in the collateral ledger,
//!    registers the proposition with the oracle and records
//!    `assertion_id -> ClaimRef`
//! 2. The oracle runs its liveness window and any dispute
//! 3. The oracle calls the engine's resolved callback, which calls
//!    `finalize` here exactly once per assertion; the bond is refunded to
//!    the asserter and the record is returned for dispatch by `ClaimKind`
//!
//! Per assertion: `Pending -> {Confirmed, Rejected}`. Terminal records are
//! kept so a repeated callback fails with `AlreadyFinalized`.

use odra::prelude::*;
use odra::casper_types::{U256, runtime_args, RuntimeArgs};
use odra::casper_types::bytesrepr::Bytes;
use odra::CallDef;
use crate::collateral_ledger::CollateralLedger;
use crate::errors::SettlementError;
use crate::interfaces::{ORACLE_ASSERT_TRUTH, ORACLE_GET_MINIMUM_BOND};
use crate::types::{
    AssertionId, AssertionRecord, AssertionStatus, ClaimRef, EngineConfig, LedgerAccount,
};

/// Assertion bridge submodule
#[odra::module]
pub struct AssertionBridge {
    /// Optimistic oracle contract
    oracle: Var<Address>,
    /// Records of every assertion ever opened
    records: Mapping<AssertionId, AssertionRecord>,
    /// Live (pending) assertion per claim
    live: Mapping<ClaimRef, Option<AssertionId>>,
    /// Number of assertions opened
    assertion_count: Var<u64>,
}

#[odra::module]
impl AssertionBridge {
    /// Oracle contract address
    pub fn oracle(&self) -> Option<Address> {
        self.oracle.get()
    }

    /// Bridge record of an assertion
    pub fn get_assertion_record(&self, assertion_id: AssertionId) -> Option<AssertionRecord> {
        self.records.get(&assertion_id)
    }

    /// Pending assertion for a claim, if any
    pub fn live_assertion(&self, claim: ClaimRef) -> Option<AssertionId> {
        self.live.get(&claim).flatten()
    }

    /// Number of assertions opened
    pub fn assertion_count(&self) -> u64 {
        self.assertion_count.get().unwrap_or(0)
    }
}

impl AssertionBridge {
    pub fn set_oracle(&mut self, oracle: Address) {
        self.oracle.set(oracle);
        self.assertion_count.set(0);
    }

    /// Oracle's minimum bond for the collateral currency.
    pub fn minimum_bond(&self, currency: Address) -> U256 {
        let args = runtime_args! { "currency" => currency };
        let call_def = CallDef::new(ORACLE_GET_MINIMUM_BOND, false, args);
        self.env().call_contract(self.oracle_address(), call_def)
    }

    /// Escrow the bond and register `claim_text` with the oracle.
    pub fn open_assertion(
        &mut self,
        ledger: &mut CollateralLedger,
        config: &EngineConfig,
        claim: ClaimRef,
        claim_text: Bytes,
        asserter: Address,
        bond: U256,
    ) -> AssertionId {
        if self.live_assertion(claim).is_some() {
            self.env().revert(SettlementError::AssertionAlreadyPending);
        }

        let currency = match ledger.currency() {
            Some(currency) => currency,
            None => self.env().revert(SettlementError::InvalidConfig),
        };

        ledger.lock(LedgerAccount::assertion_bond(&claim), asserter, bond);

        let args = runtime_args! {
            "claim" => claim_text,
            "asserter" => asserter,
            "callback_recipient" => self.env().self_address(),
            "currency" => currency,
            "bond" => bond,
            "liveness" => config.liveness,
            "identifier" => config.identifier.clone()
        };
        let call_def = CallDef::new(ORACLE_ASSERT_TRUTH, true, args);
        let assertion_id: AssertionId = self.env().call_contract(self.oracle_address(), call_def);

        let record = AssertionRecord {
            assertion_id,
            claim,
            asserter,
            bond,
            status: AssertionStatus::Pending,
            disputed: false,
            opened_at: self.env().get_block_time(),
        };
        self.records.set(&assertion_id, record);
        self.live.set(&claim, Some(assertion_id));
        self.assertion_count.set(self.assertion_count() + 1);

        assertion_id
    }

    /// Apply the oracle's truth value; refunds the bond to the asserter.
    ///
    /// Fails with `UnknownAssertion` for ids never opened here and with
    /// `AlreadyFinalized` on a repeated callback.
    pub fn finalize(
        &mut self,
        ledger: &mut CollateralLedger,
        assertion_id: AssertionId,
        asserted_truthfully: bool,
    ) -> AssertionRecord {
        let mut record = self.require_record(assertion_id);
        if let Err(err) = record.finalize(asserted_truthfully) {
            self.env().revert(err);
        }
        self.records.set(&assertion_id, record.clone());
        self.live.set(&record.claim, None);

        ledger.release(LedgerAccount::assertion_bond(&record.claim), record.asserter, record.bond);

        record
    }

    /// Note an oracle dispute on a pending assertion.
    pub fn mark_disputed(&mut self, assertion_id: AssertionId) -> AssertionRecord {
        let mut record = self.require_record(assertion_id);
        if record.status != AssertionStatus::Pending {
            self.env().revert(SettlementError::AlreadyFinalized);
        }
        if record.disputed {
            self.env().revert(SettlementError::AssertionAlreadyDisputed);
        }
        record.disputed = true;
        self.records.set(&assertion_id, record.clone());
        record
    }

    /// Revert unless the caller is the configured oracle.
    pub fn require_oracle_caller(&self) {
        if self.env().caller() != self.oracle_address() {
            self.env().revert(SettlementError::UnauthorizedOracle);
        }
    }

    fn require_record(&self, assertion_id: AssertionId) -> AssertionRecord {
        match self.records.get(&assertion_id) {
            Some(record) => record,
            None => self.env().revert(SettlementError::UnknownAssertion),
        }
    }

    fn oracle_address(&self) -> Address {
        match self.oracle.get() {
            Some(oracle) => oracle,
            None => self.env().revert(SettlementError::InvalidConfig),
        }
    }
}
