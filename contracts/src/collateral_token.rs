//! Collateral Token Contract
//!
//! CEP-18 fungible token used as the collateral, bond and reward currency.
//! The settlement engine relies only on `allowance`, `transfer_from` and
//! `transfer`; it never mints. `allocate_to` is an open faucet for devnets
//! and tests.
//!
//! Balances and allowances live in Odra mappings and are mirrored into the
//! CEP-18 `balances` / `allowances` dictionaries so wallets can read them.

use odra::prelude::*;
use odra::casper_types::{U256, Key};
use odra::casper_types::bytesrepr::ToBytes;
use crate::errors::SettlementError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

const NAMED_KEY_NAME: &str = "name";
const NAMED_KEY_SYMBOL: &str = "symbol";
const NAMED_KEY_DECIMALS: &str = "decimals";
const NAMED_KEY_TOTAL_SUPPLY: &str = "total_supply";
const DICT_BALANCES: &str = "balances";
const DICT_ALLOWANCES: &str = "allowances";

/// Token metadata fixed at deployment
#[odra::odra_type]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[odra::event]
pub struct Transfer {
    pub sender: Address,
    pub recipient: Address,
    pub amount: U256,
}

#[odra::event]
pub struct Approval {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Faucet allocation (devnet only)
#[odra::event]
pub struct Allocated {
    pub recipient: Address,
    pub amount: U256,
}

/// Collateral Token Contract
#[odra::module(events = [Transfer, Approval, Allocated])]
pub struct CollateralToken {
    metadata: Var<TokenMetadata>,
    supply: Var<U256>,
    holdings: Mapping<Address, U256>,
    /// (owner, spender) -> remaining allowance
    approvals: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl CollateralToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.env().init_dictionary(DICT_BALANCES);
        self.env().init_dictionary(DICT_ALLOWANCES);
        self.env().set_named_value(NAMED_KEY_NAME, name.clone());
        self.env().set_named_value(NAMED_KEY_SYMBOL, symbol.clone());
        self.env().set_named_value(NAMED_KEY_DECIMALS, decimals);

        self.metadata.set(TokenMetadata { name, symbol, decimals });
        self.write_supply(U256::zero());
    }

    pub fn name(&self) -> String {
        self.metadata().name
    }

    pub fn symbol(&self) -> String {
        self.metadata().symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata().decimals
    }

    pub fn total_supply(&self) -> U256 {
        self.supply.get().unwrap_or_default()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.holdings.get(&account).unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.approvals.get(&(owner, spender)).unwrap_or_default()
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.move_tokens(sender, recipient, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.write_allowance(owner, spender, amount);
        true
    }

    pub fn increase_allowance(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        let current = self.allowance(owner, spender);
        self.write_allowance(owner, spender, current.saturating_add(amount));
        true
    }

    pub fn decrease_allowance(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        let current = self.allowance(owner, spender);
        self.write_allowance(owner, spender, current.saturating_sub(amount));
        true
    }

    /// Spend the caller's allowance from `owner` to pay `recipient`
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let remaining = match self.allowance(owner, spender).checked_sub(amount) {
            Some(remaining) => remaining,
            None => self.env().revert(SettlementError::InsufficientAllowance),
        };
        self.move_tokens(owner, recipient, amount);
        self.write_allowance(owner, spender, remaining);
        true
    }

    /// Create `amount` new tokens for `recipient` (devnet faucet)
    pub fn allocate_to(&mut self, recipient: Address, amount: U256) {
        let balance = self.balance_of(recipient);
        self.write_balance(recipient, balance + amount);
        self.write_supply(self.total_supply() + amount);
        self.env().emit_event(Allocated { recipient, amount });
    }
}

impl CollateralToken {
    fn metadata(&self) -> TokenMetadata {
        match self.metadata.get() {
            Some(metadata) => metadata,
            None => self.env().revert(SettlementError::InvalidConfig),
        }
    }

    fn move_tokens(&mut self, sender: Address, recipient: Address, amount: U256) {
        let sender_balance = self.balance_of(sender);
        if sender_balance < amount {
            self.env().revert(SettlementError::InsufficientTokenBalance);
        }
        self.write_balance(sender, sender_balance - amount);
        let recipient_balance = self.balance_of(recipient);
        self.write_balance(recipient, recipient_balance + amount);

        self.env().emit_event(Transfer { sender, recipient, amount });
    }

    fn write_balance(&mut self, account: Address, amount: U256) {
        self.holdings.set(&account, amount);
        let key = dictionary_key(&[account]);
        self.env().set_dictionary_value(DICT_BALANCES, key.as_bytes(), amount);
    }

    fn write_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        self.approvals.set(&(owner, spender), amount);
        let key = dictionary_key(&[owner, spender]);
        self.env().set_dictionary_value(DICT_ALLOWANCES, key.as_bytes(), amount);
        self.env().emit_event(Approval { owner, spender, amount });
    }

    fn write_supply(&mut self, supply: U256) {
        self.supply.set(supply);
        self.env().set_named_value(NAMED_KEY_TOTAL_SUPPLY, supply);
    }
}

/// Base64 of the concatenated `Key` encodings, as CEP-18 dictionaries expect.
fn dictionary_key(accounts: &[Address]) -> String {
    let mut bytes = Vec::new();
    for account in accounts {
        bytes.extend_from_slice(&Key::from(*account).to_bytes().unwrap_or_default());
    }
    BASE64_STANDARD.encode(bytes)
}
