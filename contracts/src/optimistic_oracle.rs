//! Optimistic Oracle Contract
//!
//! Reference optimistic-assertion oracle for devnets and tests. Accepts
//! bonded assertions, runs a liveness window, lets anyone dispute while it
//! is open and reports the final truth value to the assertion's callback
//! recipient.
//!
//! ## Resolution
//!
//! - Undisputed: settles `true` once `expiration_time` has passed
//! - Disputed: settles with the admin's `resolve_dispute` verdict, which
//!   stands in for an escalation/voting game
//!
//! Bonds are escrowed by the caller of `assert_truth`; this contract only
//! checks them against the configured minimum.

use odra::prelude::*;
use odra::casper_types::{U256, runtime_args, RuntimeArgs};
use odra::casper_types::bytesrepr::{Bytes, ToBytes};
use odra::CallDef;
use crate::errors::SettlementError;
use crate::interfaces::{ASSERTION_DISPUTED_CALLBACK, ASSERTION_RESOLVED_CALLBACK};
use crate::types::{AssertionId, DEFAULT_LIVENESS_MS};

/// Oracle configuration
#[odra::odra_type]
pub struct OracleConfig {
    /// Minimum bond accepted for any currency
    pub minimum_bond: U256,
    /// Liveness used when an assertion requests zero (ms)
    pub default_liveness: u64,
}

impl OracleConfig {
    /// End of the liveness window for an assertion made at `now`.
    ///
    /// A requested liveness of zero uses `default_liveness`.
    pub fn expiration_time(&self, now: u64, liveness: u64) -> Result<u64, SettlementError> {
        let liveness = if liveness == 0 { self.default_liveness } else { liveness };
        now.checked_add(liveness).ok_or(SettlementError::InvalidConfig)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            minimum_bond: U256::zero(),
            default_liveness: DEFAULT_LIVENESS_MS,
        }
    }
}

/// Assertion as tracked by the oracle
#[odra::odra_type]
pub struct OracleAssertion {
    pub assertion_id: AssertionId,
    /// Proposition bytes
    pub claim: Bytes,
    pub asserter: Address,
    /// Contract notified on dispute and settlement
    pub callback_recipient: Address,
    pub currency: Address,
    pub bond: U256,
    pub identifier: String,
    /// End of the liveness window (ms)
    pub expiration_time: u64,
    pub disputer: Option<Address>,
    /// Admin verdict on a dispute
    pub dispute_resolution: Option<bool>,
    pub settled: bool,
    /// Final truth value, meaningful once settled
    pub settlement_resolution: bool,
}

impl OracleAssertion {
    pub fn is_disputed(&self) -> bool {
        self.disputer.is_some()
    }

    /// Truth value if the assertion can settle at `now`.
    pub fn resolution_at(&self, now: u64) -> Result<bool, SettlementError> {
        if self.settled {
            return Err(SettlementError::AlreadyFinalized);
        }
        if self.is_disputed() {
            return self.dispute_resolution.ok_or(SettlementError::DisputeNotResolved);
        }
        if now < self.expiration_time {
            return Err(SettlementError::AssertionNotExpired);
        }
        Ok(true)
    }

    /// Check a dispute is allowed at `now`.
    pub fn check_disputable(&self, now: u64) -> Result<(), SettlementError> {
        if self.settled {
            return Err(SettlementError::AlreadyFinalized);
        }
        if self.is_disputed() {
            return Err(SettlementError::AssertionAlreadyDisputed);
        }
        if now >= self.expiration_time {
            return Err(SettlementError::AssertionExpired);
        }
        Ok(())
    }
}

#[odra::event]
pub struct AssertionMade {
    pub assertion_id: AssertionId,
    pub asserter: Address,
    pub callback_recipient: Address,
    pub bond: U256,
    pub expiration_time: u64,
}

#[odra::event]
pub struct AssertionDisputedByOracle {
    pub assertion_id: AssertionId,
    pub disputer: Address,
}

#[odra::event]
pub struct AssertionSettled {
    pub assertion_id: AssertionId,
    pub asserted_truthfully: bool,
}

/// Optimistic Oracle Contract
#[odra::module(events = [AssertionMade, AssertionDisputedByOracle, AssertionSettled])]
pub struct OptimisticOracle {
    admin: Var<Address>,
    config: Var<OracleConfig>,
    assertions: Mapping<AssertionId, OracleAssertion>,
    /// Salt for assertion ids
    nonce: Var<u64>,
}

#[odra::module]
impl OptimisticOracle {
    pub fn init(&mut self, admin: Address, minimum_bond: U256) {
        self.admin.set(admin);
        self.config.set(OracleConfig {
            minimum_bond,
            ..OracleConfig::default()
        });
        self.nonce.set(0);
    }

    /// Register a bonded assertion; `liveness` of zero uses the default
    #[allow(clippy::too_many_arguments)]
    pub fn assert_truth(
        &mut self,
        claim: Bytes,
        asserter: Address,
        callback_recipient: Address,
        currency: Address,
        bond: U256,
        liveness: u64,
        identifier: String,
    ) -> AssertionId {
        let config = self.get_config();
        if bond < config.minimum_bond {
            self.env().revert(SettlementError::BondBelowMinimum);
        }
        let now = self.env().get_block_time();
        let expiration_time = match config.expiration_time(now, liveness) {
            Ok(expiration_time) => expiration_time,
            Err(err) => self.env().revert(err),
        };

        let nonce = self.nonce.get().unwrap_or(0);
        let assertion_id = self.derive_assertion_id(&claim, asserter, now, nonce);
        self.nonce.set(nonce + 1);

        self.assertions.set(
            &assertion_id,
            OracleAssertion {
                assertion_id,
                claim,
                asserter,
                callback_recipient,
                currency,
                bond,
                identifier,
                expiration_time,
                disputer: None,
                dispute_resolution: None,
                settled: false,
                settlement_resolution: false,
            },
        );

        self.env().emit_event(AssertionMade {
            assertion_id,
            asserter,
            callback_recipient,
            bond,
            expiration_time,
        });

        assertion_id
    }

    pub fn get_minimum_bond(&self, currency: Address) -> U256 {
        let _ = currency;
        self.get_config().minimum_bond
    }

    /// Dispute a live assertion and notify its callback recipient
    pub fn dispute_assertion(&mut self, assertion_id: AssertionId) {
        let mut assertion = self.require_assertion(assertion_id);
        if let Err(err) = assertion.check_disputable(self.env().get_block_time()) {
            self.env().revert(err);
        }

        let disputer = self.env().caller();
        assertion.disputer = Some(disputer);
        let recipient = assertion.callback_recipient;
        self.assertions.set(&assertion_id, assertion);

        let args = runtime_args! { "assertion_id" => assertion_id };
        let call_def = CallDef::new(ASSERTION_DISPUTED_CALLBACK, true, args);
        self.env().call_contract::<()>(recipient, call_def);

        self.env().emit_event(AssertionDisputedByOracle {
            assertion_id,
            disputer,
        });
    }

    /// Record the verdict on a disputed assertion (admin only)
    pub fn resolve_dispute(&mut self, assertion_id: AssertionId, asserted_truthfully: bool) {
        self.require_admin();
        let mut assertion = self.require_assertion(assertion_id);
        if assertion.settled {
            self.env().revert(SettlementError::AlreadyFinalized);
        }
        if !assertion.is_disputed() {
            self.env().revert(SettlementError::AssertionNotDisputed);
        }
        assertion.dispute_resolution = Some(asserted_truthfully);
        self.assertions.set(&assertion_id, assertion);
    }

    /// Settle and report the truth value to the callback recipient
    pub fn settle_assertion(&mut self, assertion_id: AssertionId) -> bool {
        let mut assertion = self.require_assertion(assertion_id);
        let asserted_truthfully = match assertion.resolution_at(self.env().get_block_time()) {
            Ok(truth) => truth,
            Err(err) => self.env().revert(err),
        };

        assertion.settled = true;
        assertion.settlement_resolution = asserted_truthfully;
        let recipient = assertion.callback_recipient;
        self.assertions.set(&assertion_id, assertion);

        let args = runtime_args! {
            "assertion_id" => assertion_id,
            "asserted_truthfully" => asserted_truthfully
        };
        let call_def = CallDef::new(ASSERTION_RESOLVED_CALLBACK, true, args);
        self.env().call_contract::<()>(recipient, call_def);

        self.env().emit_event(AssertionSettled {
            assertion_id,
            asserted_truthfully,
        });

        asserted_truthfully
    }

    pub fn get_assertion(&self, assertion_id: AssertionId) -> Option<OracleAssertion> {
        self.assertions.get(&assertion_id)
    }

    /// Update the oracle configuration (admin only)
    pub fn set_config(&mut self, config: OracleConfig) {
        self.require_admin();
        if config.default_liveness == 0 {
            self.env().revert(SettlementError::InvalidConfig);
        }
        self.config.set(config);
    }

    pub fn get_config(&self) -> OracleConfig {
        self.config.get().unwrap_or_default()
    }

    // ========== Internal Functions ==========

    fn require_admin(&self) {
        if Some(self.env().caller()) != self.admin.get() {
            self.env().revert(SettlementError::Unauthorized);
        }
    }

    fn require_assertion(&self, assertion_id: AssertionId) -> OracleAssertion {
        match self.assertions.get(&assertion_id) {
            Some(assertion) => assertion,
            None => self.env().revert(SettlementError::UnknownAssertion),
        }
    }

    fn derive_assertion_id(&self, claim: &Bytes, asserter: Address, now: u64, nonce: u64) -> AssertionId {
        let mut preimage = claim.to_bytes().unwrap_or_default();
        preimage.extend_from_slice(&asserter.to_bytes().unwrap_or_default());
        preimage.extend_from_slice(&now.to_le_bytes());
        preimage.extend_from_slice(&nonce.to_le_bytes());
        self.env().hash(preimage)
    }
}
