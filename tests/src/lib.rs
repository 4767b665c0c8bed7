//! Oracle Settlement Integration Tests
//!
//! Scenario tests on the Odra VM: collateral token, optimistic oracle and
//! settlement engine deployed together, driven through their entry points.

#[cfg(test)]
mod tests {
    use cspr_oracle_settlement_contracts::collateral_token::{
        Approval, CollateralToken, CollateralTokenHostRef, CollateralTokenInitArgs, Transfer,
    };
    use cspr_oracle_settlement_contracts::errors::SettlementError;
    use cspr_oracle_settlement_contracts::interfaces::ASSERTION_RESOLVED_CALLBACK;
    use cspr_oracle_settlement_contracts::insurance_manager::{InsuranceIssued, InsurancePaid, InsuranceRejected};
    use cspr_oracle_settlement_contracts::market_manager::{
        MarketAsserted, MarketAssertionRejected, MarketInitialized, MarketResolved, RewardReclaimed,
        TokensCreated, TokensRedeemed,
    };
    use cspr_oracle_settlement_contracts::optimistic_oracle::{
        OptimisticOracle, OptimisticOracleHostRef, OptimisticOracleInitArgs,
    };
    use cspr_oracle_settlement_contracts::settlement_engine::{
        AssertionDisputed, SettlementEngine, SettlementEngineHostRef, SettlementEngineInitArgs,
    };
    use cspr_oracle_settlement_contracts::types::*;
    use odra::casper_types::bytesrepr::Bytes;
    use odra::casper_types::{runtime_args, RuntimeArgs, U256};
    use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
    use odra::prelude::*;
    use odra::CallDef;
    use pretty_assertions::{assert_eq, assert_ne};

    const LIVENESS_MS: u64 = 7_200_000;
    const MINIMUM_BOND: u64 = 1_000;
    const FUNDING: u64 = 1_000_000;
    const REWARD: u64 = 100;
    const REQUIRED_BOND: u64 = 5_000;

    struct Setup {
        env: HostEnv,
        token: CollateralTokenHostRef,
        oracle: OptimisticOracleHostRef,
        engine: SettlementEngineHostRef,
        admin: Address,
        asserter: Address,
        alice: Address,
        bob: Address,
        disputer: Address,
    }

    fn setup() -> Setup {
        let env = odra_test::env();
        let admin = env.get_account(0);
        let asserter = env.get_account(1);
        let alice = env.get_account(2);
        let bob = env.get_account(3);
        let disputer = env.get_account(4);

        env.set_caller(admin);
        let mut token = CollateralToken::deploy(
            &env,
            CollateralTokenInitArgs {
                name: String::from("Settlement USD"),
                symbol: String::from("sUSD"),
                decimals: 9,
            },
        );
        let oracle = OptimisticOracle::deploy(
            &env,
            OptimisticOracleInitArgs {
                admin,
                minimum_bond: U256::from(MINIMUM_BOND),
            },
        );
        let engine = SettlementEngine::deploy(
            &env,
            SettlementEngineInitArgs {
                currency: token.address().clone(),
                oracle: oracle.address().clone(),
                admin,
            },
        );

        let engine_addr = engine.address().clone();
        for account in [admin, asserter, alice, bob, disputer] {
            env.set_caller(admin);
            token.allocate_to(account, U256::from(FUNDING));
            env.set_caller(account);
            token.approve(engine_addr, U256::from(FUNDING));
        }
        env.set_caller(admin);

        Setup {
            env,
            token,
            oracle,
            engine,
            admin,
            asserter,
            alice,
            bob,
            disputer,
        }
    }

    /// "yes"/"no" market created by the admin with reward 100 and bond 5000
    fn yes_no_market(s: &mut Setup) -> MarketId {
        s.env.set_caller(s.admin);
        s.engine.initialize_market(
            String::from("yes"),
            String::from("no"),
            String::from("Storms beat Titans"),
            U256::from(REWARD),
            U256::from(REQUIRED_BOND),
        )
    }

    fn assert_outcome(s: &mut Setup, market_id: MarketId, outcome: &str) -> AssertionId {
        s.env.set_caller(s.asserter);
        s.engine.assert_market(market_id, String::from(outcome))
    }

    fn balance(s: &Setup, account: Address) -> U256 {
        s.token.balance_of(account)
    }

    /// Oracle stand-in that accepts every assertion and delivers resolution
    /// callbacks on demand, any number of times.
    #[odra::module]
    pub struct ReplayingOracle {
        count: Var<u64>,
    }

    #[odra::module]
    impl ReplayingOracle {
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
            let _ = (claim, asserter, callback_recipient, currency, bond, liveness, identifier);
            let n = self.count.get().unwrap_or(0) + 1;
            self.count.set(n);
            [n as u8; 32]
        }

        pub fn get_minimum_bond(&self, currency: Address) -> U256 {
            let _ = currency;
            U256::zero()
        }

        pub fn deliver(&mut self, recipient: Address, assertion_id: AssertionId, asserted_truthfully: bool) {
            let args = runtime_args! {
                "assertion_id" => assertion_id,
                "asserted_truthfully" => asserted_truthfully
            };
            let call_def = CallDef::new(ASSERTION_RESOLVED_CALLBACK, true, args);
            self.env().call_contract::<()>(recipient, call_def);
        }
    }

    // ===== Markets =====

    #[test]
    fn test_market_initialization() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);

        let market = s.engine.get_market(market_id).unwrap();
        assert_eq!(market.outcome1, "yes");
        assert_eq!(market.outcome2, "no");
        assert_eq!(market.reward, U256::from(REWARD));
        assert!(!market.resolved);
        assert_eq!(market.assertion_id, None);

        assert_eq!(s.engine.get_market_count(), 1);
        assert_eq!(s.engine.get_market_id_at(0), Some(market_id));
        assert_eq!(
            s.engine.locked_balance(LedgerAccount::market_reward(market_id)),
            U256::from(REWARD)
        );
        assert_eq!(balance(&s, s.admin), U256::from(FUNDING - REWARD));
        assert!(s.env.emitted_event(
            &s.engine,
            MarketInitialized {
                market_id,
                outcome1: String::from("yes"),
                outcome2: String::from("no"),
                required_bond: U256::from(REQUIRED_BOND),
            }
        ));
    }

    #[test]
    fn test_market_rejects_invalid_outcome_names() {
        let mut s = setup();
        let result = s.engine.try_initialize_market(
            String::from("yes"),
            String::from("yes"),
            String::from("Storms beat Titans"),
            U256::from(REWARD),
            U256::from(REQUIRED_BOND),
        );
        assert_eq!(result, Err(SettlementError::InvalidOutcomeNames.into()));
        assert_eq!(s.engine.get_market_count(), 0);
    }

    #[test]
    fn test_duplicate_market_in_same_block() {
        let mut s = setup();
        yes_no_market(&mut s);
        let result = s.engine.try_initialize_market(
            String::from("yes"),
            String::from("no"),
            String::from("Storms beat Titans"),
            U256::from(REWARD),
            U256::from(REQUIRED_BOND),
        );
        assert_eq!(result, Err(SettlementError::DuplicateMarket.into()));

        // A later block yields a fresh id
        s.env.advance_block_time(1_000);
        yes_no_market(&mut s);
        assert_eq!(s.engine.get_market_count(), 2);
    }

    #[test]
    fn test_yes_wins_scenario() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);

        // Mint 10000, redeem 5000
        s.env.set_caller(s.alice);
        s.engine.create_outcome_tokens(market_id, U256::from(10_000u64));
        s.engine.redeem_outcome_tokens(market_id, U256::from(5_000u64));
        assert_eq!(s.engine.outcome_balance_of(market_id, Outcome::First, s.alice), U256::from(5_000u64));
        assert_eq!(s.engine.outcome_balance_of(market_id, Outcome::Second, s.alice), U256::from(5_000u64));
        assert_eq!(balance(&s, s.alice), U256::from(FUNDING - 5_000));
        assert!(s.env.emitted_event(&s.engine, TokensCreated { market_id, amount: U256::from(10_000u64) }));
        assert!(s.env.emitted_event(&s.engine, TokensRedeemed { market_id, amount: U256::from(5_000u64) }));

        // Bob takes the "no" side
        s.engine.transfer_outcome_tokens(market_id, Outcome::Second, s.bob, U256::from(5_000u64));

        // Assert "yes"; bond is max(5000, oracle minimum 1000)
        let assertion_id = assert_outcome(&mut s, market_id, "yes");
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING - REQUIRED_BOND));
        assert!(s.env.emitted_event(
            &s.engine,
            MarketAsserted {
                market_id,
                assertion_id,
                outcome: String::from("yes"),
            }
        ));

        // Liveness elapses; anyone may settle
        s.env.advance_block_time(LIVENESS_MS);
        s.env.set_caller(s.disputer);
        assert!(s.oracle.settle_assertion(assertion_id));

        let market = s.engine.get_market(market_id).unwrap();
        assert!(market.resolved);
        assert_eq!(market.asserted_outcome, Some(Outcome::First));
        assert!(s.env.emitted_event(&s.engine, MarketResolved { market_id, outcome: String::from("yes") }));

        // Asserter gets the bond back plus the reward
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING + REWARD));

        // "yes" pays 1:1, "no" pays nothing
        s.env.set_caller(s.alice);
        assert_eq!(s.engine.settle_outcome_tokens(market_id), U256::from(5_000u64));
        assert_eq!(balance(&s, s.alice), U256::from(FUNDING));

        s.env.set_caller(s.bob);
        assert_eq!(s.engine.settle_outcome_tokens(market_id), U256::zero());
        assert_eq!(balance(&s, s.bob), U256::from(FUNDING));
        assert_eq!(s.engine.outcome_balance_of(market_id, Outcome::Second, s.bob), U256::zero());

        // All market collateral has been paid out
        assert_eq!(s.engine.locked_balance(LedgerAccount::market_collateral(market_id)), U256::zero());
        let totals = s.engine.ledger_totals();
        assert_eq!(totals.total_locked, U256::zero());
        assert!(totals.is_consistent());
    }

    #[test]
    fn test_supplies_stay_equal_through_lifecycle() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);

        let check = |s: &Setup| {
            assert_eq!(
                s.engine.outcome_total_supply(market_id, Outcome::First),
                s.engine.outcome_total_supply(market_id, Outcome::Second)
            );
        };

        s.env.set_caller(s.alice);
        s.engine.create_outcome_tokens(market_id, U256::from(7_000u64));
        check(&s);
        s.engine.redeem_outcome_tokens(market_id, U256::from(2_000u64));
        check(&s);

        let assertion_id = assert_outcome(&mut s, market_id, "no");
        s.env.advance_block_time(LIVENESS_MS);
        s.oracle.settle_assertion(assertion_id);
        check(&s);

        s.env.set_caller(s.alice);
        assert_eq!(s.engine.settle_outcome_tokens(market_id), U256::from(5_000u64));
        check(&s);

        let pair = s.engine.get_token_pair(market_id).unwrap();
        assert_eq!(pair.backing_required(), U256::zero());
    }

    #[test]
    fn test_mint_redeem_round_trip() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);

        s.env.set_caller(s.alice);
        for amount in [1u64, 42, 10_000] {
            let before = balance(&s, s.alice);
            s.engine.create_outcome_tokens(market_id, U256::from(amount));
            s.engine.redeem_outcome_tokens(market_id, U256::from(amount));
            assert_eq!(balance(&s, s.alice), before);
        }
        assert_eq!(s.engine.outcome_total_supply(market_id, Outcome::First), U256::zero());
    }

    #[test]
    fn test_mint_errors() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);

        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_create_outcome_tokens(market_id, U256::zero()),
            Err(SettlementError::ZeroAmount.into())
        );
        assert_eq!(
            s.engine.try_create_outcome_tokens([9u8; 32], U256::from(10u64)),
            Err(SettlementError::MarketNotInitialized.into())
        );
        assert_eq!(
            s.engine.try_create_outcome_tokens(market_id, U256::from(FUNDING + 1)),
            Err(SettlementError::InsufficientAllowance.into())
        );
    }

    #[test]
    fn test_mint_without_approval() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        let carol = s.env.get_account(5);
        s.token.allocate_to(carol, U256::from(FUNDING));

        s.env.set_caller(carol);
        assert_eq!(
            s.engine.try_create_outcome_tokens(market_id, U256::from(10u64)),
            Err(SettlementError::InsufficientAllowance.into())
        );
        assert_eq!(balance(&s, carol), U256::from(FUNDING));
    }

    #[test]
    fn test_redeem_requires_both_sides() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);

        s.env.set_caller(s.alice);
        s.engine.create_outcome_tokens(market_id, U256::from(1_000u64));
        s.engine.transfer_outcome_tokens(market_id, Outcome::First, s.bob, U256::from(400u64));

        assert_eq!(
            s.engine.try_redeem_outcome_tokens(market_id, U256::from(1_000u64)),
            Err(SettlementError::InsufficientTokenBalance.into())
        );
        s.engine.redeem_outcome_tokens(market_id, U256::from(600u64));
        assert_eq!(s.engine.outcome_balance_of(market_id, Outcome::Second, s.alice), U256::from(400u64));
    }

    #[test]
    fn test_redeem_refused_after_resolution() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        s.env.set_caller(s.alice);
        s.engine.create_outcome_tokens(market_id, U256::from(1_000u64));

        let assertion_id = assert_outcome(&mut s, market_id, "yes");
        s.env.advance_block_time(LIVENESS_MS);
        s.oracle.settle_assertion(assertion_id);

        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_redeem_outcome_tokens(market_id, U256::from(1_000u64)),
            Err(SettlementError::MarketAlreadyResolved.into())
        );
    }

    #[test]
    fn test_assert_errors() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);

        s.env.set_caller(s.asserter);
        assert_eq!(
            s.engine.try_assert_market(market_id, String::from("maybe")),
            Err(SettlementError::InvalidOutcome.into())
        );
        assert_eq!(
            s.engine.try_assert_market([7u8; 32], String::from("yes")),
            Err(SettlementError::MarketNotFound.into())
        );

        s.engine.assert_market(market_id, String::from("yes"));
        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_assert_market(market_id, String::from("no")),
            Err(SettlementError::AssertionAlreadyPending.into())
        );
    }

    #[test]
    fn test_bond_is_at_least_oracle_minimum() {
        let mut s = setup();
        s.env.set_caller(s.admin);
        let market_id = s.engine.initialize_market(
            String::from("up"),
            String::from("down"),
            String::from("Price closes higher"),
            U256::zero(),
            U256::zero(),
        );

        let assertion_id = assert_outcome(&mut s, market_id, "up");
        let record = s.engine.get_assertion_record(assertion_id).unwrap();
        assert_eq!(record.bond, U256::from(MINIMUM_BOND));
        assert_eq!(record.status, AssertionStatus::Pending);
        assert_eq!(
            s.engine.get_live_assertion(ClaimRef::market(market_id)),
            Some(assertion_id)
        );
    }

    #[test]
    fn test_settle_before_resolution_fails() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_settle_outcome_tokens(market_id),
            Err(SettlementError::MarketNotResolved.into())
        );
    }

    #[test]
    fn test_rejected_assertion_reopens_market() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        let assertion_id = assert_outcome(&mut s, market_id, "yes");

        s.env.set_caller(s.disputer);
        s.oracle.dispute_assertion(assertion_id);
        assert!(s.env.emitted_event(&s.engine, AssertionDisputed { assertion_id }));
        assert!(s.engine.get_assertion_record(assertion_id).unwrap().disputed);

        // Still pending until the final callback
        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_assert_market(market_id, String::from("no")),
            Err(SettlementError::AssertionAlreadyPending.into())
        );

        s.env.set_caller(s.admin);
        s.oracle.resolve_dispute(assertion_id, false);
        assert!(!s.oracle.settle_assertion(assertion_id));

        let market = s.engine.get_market(market_id).unwrap();
        assert!(!market.resolved);
        assert_eq!(market.assertion_id, None);
        assert_eq!(market.asserted_outcome, None);
        assert!(s.env.emitted_event(&s.engine, MarketAssertionRejected { market_id, assertion_id }));
        assert_eq!(
            s.engine.get_assertion_record(assertion_id).unwrap().status,
            AssertionStatus::Rejected
        );

        // Bond refunded, no reward
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING));
        assert_eq!(
            s.engine.locked_balance(LedgerAccount::market_reward(market_id)),
            U256::from(REWARD)
        );

        // A different asserter may try again
        s.env.set_caller(s.alice);
        let retry = s.engine.assert_market(market_id, String::from("no"));
        assert_ne!(retry, assertion_id);
        assert_eq!(s.engine.get_assertion_count(), 2);
    }

    #[test]
    fn test_callbacks_only_from_oracle() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        let assertion_id = assert_outcome(&mut s, market_id, "yes");

        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_assertion_resolved_callback(assertion_id, true),
            Err(SettlementError::UnauthorizedOracle.into())
        );
        assert_eq!(
            s.engine.try_assertion_disputed_callback(assertion_id),
            Err(SettlementError::UnauthorizedOracle.into())
        );
        assert!(!s.engine.get_market(market_id).unwrap().resolved);
    }

    #[test]
    fn test_second_settlement_rejected() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        let assertion_id = assert_outcome(&mut s, market_id, "yes");

        s.env.advance_block_time(LIVENESS_MS);
        s.oracle.settle_assertion(assertion_id);
        let asserter_balance = balance(&s, s.asserter);
        let totals = s.engine.ledger_totals();

        assert_eq!(
            s.oracle.try_settle_assertion(assertion_id),
            Err(SettlementError::AlreadyFinalized.into())
        );
        assert_eq!(balance(&s, s.asserter), asserter_balance);
        assert_eq!(s.engine.ledger_totals(), totals);
    }

    #[test]
    fn test_replayed_callback_is_ignored() {
        let mut s = setup();
        let mut oracle = ReplayingOracle::deploy(&s.env, NoArgs);
        let mut engine = SettlementEngine::deploy(
            &s.env,
            SettlementEngineInitArgs {
                currency: s.token.address().clone(),
                oracle: oracle.address().clone(),
                admin: s.admin,
            },
        );
        let engine_addr = engine.address().clone();
        for account in [s.admin, s.asserter] {
            s.env.set_caller(account);
            s.token.approve(engine_addr, U256::from(FUNDING));
        }

        s.env.set_caller(s.admin);
        let market_id = engine.initialize_market(
            String::from("yes"),
            String::from("no"),
            String::from("Storms beat Titans"),
            U256::from(REWARD),
            U256::from(REQUIRED_BOND),
        );
        s.env.set_caller(s.asserter);
        let assertion_id = engine.assert_market(market_id, String::from("yes"));
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING - REQUIRED_BOND));

        oracle.deliver(engine_addr, assertion_id, true);
        let market = engine.get_market(market_id).unwrap();
        assert!(market.resolved);
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING + REWARD));

        let totals = engine.ledger_totals();
        let asserter_balance = balance(&s, s.asserter);
        let record = engine.get_assertion_record(assertion_id);

        // Same id again, with the opposite verdict
        assert_eq!(
            oracle.try_deliver(engine_addr, assertion_id, false),
            Err(SettlementError::AlreadyFinalized.into())
        );
        assert_eq!(
            oracle.try_deliver(engine_addr, assertion_id, true),
            Err(SettlementError::AlreadyFinalized.into())
        );
        assert_eq!(engine.ledger_totals(), totals);
        assert_eq!(balance(&s, s.asserter), asserter_balance);
        assert_eq!(engine.get_market(market_id), Some(market));
        assert_eq!(engine.get_assertion_record(assertion_id), record);

        // An id the engine never opened
        assert_eq!(
            oracle.try_deliver(engine_addr, [0xAB; 32], true),
            Err(SettlementError::UnknownAssertion.into())
        );
        assert_eq!(engine.ledger_totals(), totals);
    }

    #[test]
    fn test_liveness_overflow_rejected() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);

        s.env.set_caller(s.admin);
        s.engine.set_config(EngineConfig {
            liveness: u64::MAX,
            ..EngineConfig::default()
        });

        s.env.advance_block_time(1);
        s.env.set_caller(s.asserter);
        assert_eq!(
            s.engine.try_assert_market(market_id, String::from("yes")),
            Err(SettlementError::InvalidConfig.into())
        );
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING));
        assert_eq!(s.engine.get_market(market_id).unwrap().assertion_id, None);
    }

    #[test]
    fn test_settle_waits_for_liveness() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        let assertion_id = assert_outcome(&mut s, market_id, "yes");

        s.env.advance_block_time(LIVENESS_MS - 1);
        assert_eq!(
            s.oracle.try_settle_assertion(assertion_id),
            Err(SettlementError::AssertionNotExpired.into())
        );
    }

    // ===== Reward =====

    #[test]
    fn test_reclaim_reward() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        let delay = s.engine.get_config().reward_reclaim_delay;

        assert_eq!(
            s.engine.try_reclaim_reward(market_id),
            Err(SettlementError::RewardLocked.into())
        );

        s.env.advance_block_time(delay);
        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_reclaim_reward(market_id),
            Err(SettlementError::Unauthorized.into())
        );

        s.env.set_caller(s.admin);
        assert_eq!(s.engine.reclaim_reward(market_id), U256::from(REWARD));
        assert_eq!(balance(&s, s.admin), U256::from(FUNDING));
        assert!(s.env.emitted_event(&s.engine, RewardReclaimed { market_id, amount: U256::from(REWARD) }));
        assert_eq!(
            s.engine.try_reclaim_reward(market_id),
            Err(SettlementError::NothingToReclaim.into())
        );

        // A later confirmed assertion pays no reward
        let assertion_id = assert_outcome(&mut s, market_id, "no");
        s.env.advance_block_time(LIVENESS_MS);
        s.oracle.settle_assertion(assertion_id);
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING));
    }

    #[test]
    fn test_reclaim_blocked_while_pending() {
        let mut s = setup();
        let market_id = yes_no_market(&mut s);
        let delay = s.engine.get_config().reward_reclaim_delay;
        assert_outcome(&mut s, market_id, "yes");

        s.env.advance_block_time(delay);
        s.env.set_caller(s.admin);
        assert_eq!(
            s.engine.try_reclaim_reward(market_id),
            Err(SettlementError::AssertionAlreadyPending.into())
        );
    }

    #[test]
    fn test_reclaim_delay_overflow_rejected() {
        let mut s = setup();
        s.env.advance_block_time(1);
        let market_id = yes_no_market(&mut s);

        s.env.set_caller(s.admin);
        s.engine.set_config(EngineConfig {
            reward_reclaim_delay: u64::MAX,
            ..EngineConfig::default()
        });
        assert_eq!(
            s.engine.try_reclaim_reward(market_id),
            Err(SettlementError::InvalidConfig.into())
        );
        assert_eq!(
            s.engine.locked_balance(LedgerAccount::market_reward(market_id)),
            U256::from(REWARD)
        );
    }

    // ===== Insurance =====

    fn issue_policy(s: &mut Setup) -> PolicyId {
        s.env.set_caller(s.alice);
        s.engine.issue_insurance(
            U256::from(5_000u64),
            s.bob,
            String::from("Bad things have happened"),
        )
    }

    #[test]
    fn test_insurance_paid() {
        let mut s = setup();
        let policy_id = issue_policy(&mut s);
        assert_eq!(balance(&s, s.alice), U256::from(FUNDING - 5_000));
        assert!(s.env.emitted_event(
            &s.engine,
            InsuranceIssued {
                policy_id,
                insurance_amount: U256::from(5_000u64),
                payout_address: s.bob,
            }
        ));

        s.env.set_caller(s.asserter);
        let assertion_id = s.engine.request_payout(policy_id);
        let policy = s.engine.get_policy(policy_id).unwrap();
        assert_eq!(policy.status, PolicyStatus::ClaimAsserted);
        assert_eq!(policy.assertion_id, Some(assertion_id));
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING - MINIMUM_BOND));

        s.env.advance_block_time(LIVENESS_MS);
        s.oracle.settle_assertion(assertion_id);

        assert_eq!(s.engine.get_policy(policy_id).unwrap().status, PolicyStatus::Paid);
        assert_eq!(balance(&s, s.bob), U256::from(FUNDING + 5_000));
        assert_eq!(balance(&s, s.asserter), U256::from(FUNDING));
        assert!(s.env.emitted_event(&s.engine, InsurancePaid { policy_id }));
        assert_eq!(s.engine.ledger_totals().total_locked, U256::zero());
    }

    #[test]
    fn test_insurance_rejected_refunds_issuer() {
        let mut s = setup();
        let policy_id = issue_policy(&mut s);

        s.env.set_caller(s.asserter);
        let assertion_id = s.engine.request_payout(policy_id);

        s.env.set_caller(s.disputer);
        s.oracle.dispute_assertion(assertion_id);
        s.env.set_caller(s.admin);
        s.oracle.resolve_dispute(assertion_id, false);
        s.oracle.settle_assertion(assertion_id);

        assert_eq!(s.engine.get_policy(policy_id).unwrap().status, PolicyStatus::Rejected);
        assert_eq!(balance(&s, s.alice), U256::from(FUNDING));
        assert_eq!(balance(&s, s.bob), U256::from(FUNDING));
        assert!(s.env.emitted_event(&s.engine, InsuranceRejected { policy_id }));

        // Rejected is terminal
        s.env.set_caller(s.asserter);
        assert_eq!(
            s.engine.try_request_payout(policy_id),
            Err(SettlementError::InvalidPolicyState.into())
        );
    }

    #[test]
    fn test_insurance_errors() {
        let mut s = setup();
        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_issue_insurance(U256::zero(), s.bob, String::from("Flood")),
            Err(SettlementError::ZeroAmount.into())
        );
        assert_eq!(
            s.engine.try_request_payout([3u8; 32]),
            Err(SettlementError::PolicyNotFound.into())
        );

        let policy_id = issue_policy(&mut s);
        s.env.set_caller(s.asserter);
        s.engine.request_payout(policy_id);
        assert_eq!(
            s.engine.try_request_payout(policy_id),
            Err(SettlementError::InvalidPolicyState.into())
        );
        assert_eq!(s.engine.get_policy_count(), 1);
        assert_eq!(s.engine.get_policy_id_at(0), Some(policy_id));
    }

    // ===== Admin =====

    #[test]
    fn test_set_config_admin_only() {
        let mut s = setup();
        let config = EngineConfig {
            liveness: 60_000,
            ..EngineConfig::default()
        };

        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_set_config(config.clone()),
            Err(SettlementError::Unauthorized.into())
        );

        s.env.set_caller(s.admin);
        assert_eq!(
            s.engine.try_set_config(EngineConfig { liveness: 0, ..EngineConfig::default() }),
            Err(SettlementError::InvalidConfig.into())
        );
        s.engine.set_config(config.clone());
        assert_eq!(s.engine.get_config(), config);

        // New liveness is passed to the oracle
        let market_id = yes_no_market(&mut s);
        let assertion_id = assert_outcome(&mut s, market_id, "yes");
        s.env.advance_block_time(60_000);
        assert!(s.oracle.settle_assertion(assertion_id));
    }

    // ===== Collateral token =====

    #[test]
    fn test_collateral_allowance_adjustments() {
        let mut s = setup();
        let engine_addr = s.engine.address().clone();

        s.env.set_caller(s.alice);
        s.token.decrease_allowance(engine_addr, U256::from(FUNDING - 10));
        assert_eq!(s.token.allowance(s.alice, engine_addr), U256::from(10u64));
        assert!(s.env.emitted_event(
            &s.token,
            Approval {
                owner: s.alice,
                spender: engine_addr,
                amount: U256::from(10u64),
            }
        ));

        let market_id = yes_no_market(&mut s);
        s.env.set_caller(s.alice);
        assert_eq!(
            s.engine.try_create_outcome_tokens(market_id, U256::from(11u64)),
            Err(SettlementError::InsufficientAllowance.into())
        );

        s.token.increase_allowance(engine_addr, U256::from(90u64));
        s.engine.create_outcome_tokens(market_id, U256::from(100u64));
        assert!(s.token.allowance(s.alice, engine_addr).is_zero());
        assert!(s.env.emitted_event(
            &s.token,
            Transfer {
                sender: s.alice,
                recipient: engine_addr,
                amount: U256::from(100u64),
            }
        ));

        // Decreasing below zero saturates
        s.token.decrease_allowance(engine_addr, U256::from(1u64));
        assert!(s.token.allowance(s.alice, engine_addr).is_zero());
    }
}
