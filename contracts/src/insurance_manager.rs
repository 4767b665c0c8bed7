//! Insurance Policy Manager
//!
//! Parametric insurance on top of the assertion bridge. An issuer locks the
//! insured amount; anyone may later claim that the insured event happened by
//! posting the oracle's minimum bond. The oracle's verdict either pays the
//! beneficiary or returns the coverage to the issuer.
//!
//! Policy status moves forward only:
//! `Issued -> ClaimAsserted -> {Paid, Rejected}`

use odra::prelude::*;
use odra::casper_types::U256;
use odra::casper_types::bytesrepr::ToBytes;
use crate::assertion_bridge::AssertionBridge;
use crate::collateral_ledger::CollateralLedger;
use crate::errors::SettlementError;
use crate::interfaces::insurance_claim;
use crate::types::{
    AssertionId, AssertionRecord, ClaimRef, EngineConfig, InsurancePolicy, LedgerAccount, PolicyId,
    PolicyStatus,
};

#[odra::event]
pub struct InsuranceIssued {
    pub policy_id: PolicyId,
    pub insurance_amount: U256,
    pub payout_address: Address,
}

#[odra::event]
pub struct InsurancePayoutRequested {
    pub policy_id: PolicyId,
    pub assertion_id: AssertionId,
}

#[odra::event]
pub struct InsurancePaid {
    pub policy_id: PolicyId,
}

#[odra::event]
pub struct InsuranceRejected {
    pub policy_id: PolicyId,
}

/// Insurance policy manager submodule
#[odra::module]
pub struct InsuranceManager {
    policies: Mapping<PolicyId, InsurancePolicy>,
    policy_ids: Mapping<u64, PolicyId>,
    policy_count: Var<u64>,
}

#[odra::module]
impl InsuranceManager {
    pub fn get_policy(&self, policy_id: PolicyId) -> Option<InsurancePolicy> {
        self.policies.get(&policy_id)
    }

    pub fn policy_count(&self) -> u64 {
        self.policy_count.get().unwrap_or(0)
    }

    pub fn policy_id_at(&self, index: u64) -> Option<PolicyId> {
        self.policy_ids.get(&index)
    }
}

impl InsuranceManager {
    /// Lock `amount` from `issuer` as coverage for `payout_address`.
    pub fn issue_insurance(
        &mut self,
        ledger: &mut CollateralLedger,
        issuer: Address,
        amount: U256,
        payout_address: Address,
        policy_text: String,
    ) -> PolicyId {
        if amount.is_zero() {
            self.env().revert(SettlementError::ZeroAmount);
        }

        let sequence = self.policy_count();
        let policy_id = self.derive_policy_id(issuer, payout_address, amount, sequence);
        if self.policies.get(&policy_id).is_some() {
            self.env().revert(SettlementError::DuplicatePolicy);
        }

        ledger.lock(LedgerAccount::policy_coverage(policy_id), issuer, amount);

        let policy = InsurancePolicy {
            policy_id,
            issuer,
            payout_address,
            insurance_amount: amount,
            policy_text,
            status: PolicyStatus::Issued,
            assertion_id: None,
            issued_at: self.env().get_block_time(),
        };
        self.policies.set(&policy_id, policy);
        self.policy_ids.set(&sequence, policy_id);
        self.policy_count.set(sequence + 1);

        self.env().emit_event(InsuranceIssued {
            policy_id,
            insurance_amount: amount,
            payout_address,
        });

        policy_id
    }

    /// Assert that the insured event occurred; `asserter` posts the bond.
    pub fn request_payout(
        &mut self,
        ledger: &mut CollateralLedger,
        bridge: &mut AssertionBridge,
        config: &EngineConfig,
        policy_id: PolicyId,
        asserter: Address,
    ) -> AssertionId {
        let mut policy = self.require_policy(policy_id);
        if policy.status != PolicyStatus::Issued {
            self.env().revert(SettlementError::InvalidPolicyState);
        }

        let currency = match ledger.currency() {
            Some(currency) => currency,
            None => self.env().revert(SettlementError::InvalidConfig),
        };
        let bond = bridge.minimum_bond(currency);
        let claim_text = insurance_claim(&policy.policy_text, self.env().get_block_time());

        let assertion_id = bridge.open_assertion(
            ledger,
            config,
            ClaimRef::policy(policy_id),
            claim_text,
            asserter,
            bond,
        );

        if let Err(err) = policy.begin_claim(assertion_id) {
            self.env().revert(err);
        }
        self.policies.set(&policy_id, policy);

        self.env().emit_event(InsurancePayoutRequested {
            policy_id,
            assertion_id,
        });

        assertion_id
    }

    /// Finalize hook for insurance claim assertions.
    pub fn on_assertion_resolved(
        &mut self,
        ledger: &mut CollateralLedger,
        record: &AssertionRecord,
        asserted_truthfully: bool,
    ) {
        let policy_id = record.claim.owner_id;
        let mut policy = self.require_policy(policy_id);
        if policy.assertion_id != Some(record.assertion_id) {
            self.env().revert(SettlementError::UnknownAssertion);
        }

        let status = match policy.finalize(asserted_truthfully) {
            Ok(status) => status,
            Err(err) => self.env().revert(err),
        };
        let recipient = match status {
            PolicyStatus::Paid => policy.payout_address,
            _ => policy.issuer,
        };
        self.policies.set(&policy_id, policy);

        ledger.release_all(LedgerAccount::policy_coverage(policy_id), recipient);

        match status {
            PolicyStatus::Paid => self.env().emit_event(InsurancePaid { policy_id }),
            _ => self.env().emit_event(InsuranceRejected { policy_id }),
        }
    }

    fn require_policy(&self, policy_id: PolicyId) -> InsurancePolicy {
        match self.policies.get(&policy_id) {
            Some(policy) => policy,
            None => self.env().revert(SettlementError::PolicyNotFound),
        }
    }

    fn derive_policy_id(
        &self,
        issuer: Address,
        payout_address: Address,
        amount: U256,
        sequence: u64,
    ) -> PolicyId {
        let mut preimage = issuer.to_bytes().unwrap_or_default();
        preimage.extend_from_slice(&payout_address.to_bytes().unwrap_or_default());
        preimage.extend_from_slice(&amount.to_bytes().unwrap_or_default());
        preimage.extend_from_slice(&sequence.to_le_bytes());
        self.env().hash(preimage)
    }
}
