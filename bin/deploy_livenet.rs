//! Deploy contracts to Casper livenet/testnet using Odra livenet environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000
//!
//! Optional overrides:
//!   SETTLEMENT_TOKEN_NAME / SETTLEMENT_TOKEN_SYMBOL / SETTLEMENT_TOKEN_DECIMALS
//!   SETTLEMENT_MINIMUM_BOND     oracle minimum bond (token units)
//!   SETTLEMENT_LIVENESS_MS      assertion liveness
//!   SETTLEMENT_DEPLOY_OUTPUT    deployment summary path (default deployment.json)

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use odra::prelude::*;
use serde::Serialize;

use cspr_oracle_settlement_contracts::collateral_token::{CollateralToken, CollateralTokenInitArgs};
use cspr_oracle_settlement_contracts::optimistic_oracle::{OptimisticOracle, OptimisticOracleInitArgs};
use cspr_oracle_settlement_contracts::settlement_engine::{SettlementEngine, SettlementEngineInitArgs};
use cspr_oracle_settlement_contracts::types::EngineConfig;

/// Written to SETTLEMENT_DEPLOY_OUTPUT after a successful run
#[derive(Serialize)]
struct DeploymentSummary {
    deployer: String,
    collateral_token: String,
    optimistic_oracle: String,
    settlement_engine: String,
    minimum_bond: String,
    liveness_ms: u64,
    identifier: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() {
    // Load environment from .env file
    dotenv::dotenv().ok();

    println!("=== Oracle Settlement Livenet Deployment ===");
    println!();

    // Initialize Odra livenet environment
    let env = odra_casper_livenet_env::env();

    // Configure payment amount for deployments/calls (required for Casper 2.0 txs)
    let payment_amount: u64 = env_or("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT", 200_000_000_000);
    env.set_gas(payment_amount);

    let deployer = env.caller();
    println!("Deployer: {:?}", deployer);
    println!();

    // Protocol parameters
    let token_name: String = env_or("SETTLEMENT_TOKEN_NAME", String::from("Settlement USD"));
    let token_symbol: String = env_or("SETTLEMENT_TOKEN_SYMBOL", String::from("sUSD"));
    let token_decimals: u8 = env_or("SETTLEMENT_TOKEN_DECIMALS", 9);
    let minimum_bond = U256::from(env_or::<u64>("SETTLEMENT_MINIMUM_BOND", 0));
    let config = EngineConfig {
        liveness: env_or("SETTLEMENT_LIVENESS_MS", EngineConfig::default().liveness),
        ..EngineConfig::default()
    };

    // ==================== Phase 1: External Collaborators ====================
    println!("=== Phase 1: Deploying Collateral Token and Oracle ===");
    println!();

    println!("Deploying CollateralToken...");
    let token = CollateralToken::deploy(
        &env,
        CollateralTokenInitArgs {
            name: token_name,
            symbol: token_symbol,
            decimals: token_decimals,
        },
    );
    let token_addr = token.address().clone();
    println!("CollateralToken deployed at: {:?}", token_addr);

    println!("Deploying OptimisticOracle...");
    let oracle = OptimisticOracle::deploy(
        &env,
        OptimisticOracleInitArgs {
            admin: deployer,
            minimum_bond,
        },
    );
    let oracle_addr = oracle.address().clone();
    println!("OptimisticOracle deployed at: {:?}", oracle_addr);

    println!();

    // ==================== Phase 2: Settlement Engine ====================
    println!("=== Phase 2: Deploying SettlementEngine ===");
    println!();

    println!("Deploying SettlementEngine...");
    let mut engine = SettlementEngine::deploy(
        &env,
        SettlementEngineInitArgs {
            currency: token_addr,
            oracle: oracle_addr,
            admin: deployer,
        },
    );
    let engine_addr = engine.address().clone();
    println!("SettlementEngine deployed at: {:?}", engine_addr);

    if config != EngineConfig::default() {
        println!("Configuring SettlementEngine (liveness {} ms)...", config.liveness);
        engine.set_config(config.clone());
        println!("Done.");
    }

    println!();
    println!("=== Deployment Complete ===");
    println!();
    println!("Contract Addresses:");
    println!("  CollateralToken:    {:?}", token_addr);
    println!("  OptimisticOracle:   {:?}", oracle_addr);
    println!("  SettlementEngine:   {:?}", engine_addr);

    let summary = DeploymentSummary {
        deployer: format!("{:?}", deployer),
        collateral_token: format!("{:?}", token_addr),
        optimistic_oracle: format!("{:?}", oracle_addr),
        settlement_engine: format!("{:?}", engine_addr),
        minimum_bond: minimum_bond.to_string(),
        liveness_ms: config.liveness,
        identifier: config.identifier,
    };
    let output: String = env_or("SETTLEMENT_DEPLOY_OUTPUT", String::from("deployment.json"));
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => match std::fs::write(&output, json) {
            Ok(()) => println!("Summary written to {}", output),
            Err(err) => println!("Could not write {}: {}", output, err),
        },
        Err(err) => println!("Could not encode summary: {}", err),
    }
}
