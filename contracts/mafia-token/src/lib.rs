#![no_std]

//! # Mafia Reward Token
//!
//! Minimal fungible token credited to the winning faction of a Mafia game.
//! Minting is restricted to the `owner`; at deployment the owner hands that
//! right to the game contract with `transfer_ownership`.
//!
//! ## Features
//! - Owner-only `mint`
//! - Holder-authorized `transfer`
//! - Balance and total-supply queries
//! - Event emission for indexing

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, Address, Env, String,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Owner,
    TotalSupply,
    /// Balance: DataKey::Balance(address) → i128
    Balance(Address),
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum TokenError {
    OwnerNotSet = 1,
    InvalidAmount = 2,
    InsufficientBalance = 3,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvMinted {
    pub to: Address,
    pub amount: i128,
}

#[contractevent]
pub struct EvTransferred {
    pub from: Address,
    pub to: Address,
    pub amount: i128,
}

#[contractevent]
pub struct EvOwnershipTransferred {
    pub previous_owner: Address,
    pub new_owner: Address,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

const TOKEN_NAME: &str = "Mafia Reward Token";
const TOKEN_SYMBOL: &str = "MAFIA";
const TOKEN_DECIMALS: u32 = 7;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// TTL expressed in human-readable time units (120 days)
const TTL_SECONDS: u32 = 120 * 24 * 60 * 60; // 10,368,000 seconds

/// TTL for balances in ledgers: 120 * 24 * 60 * 60 / 5 = 2,073,600 ledgers
const TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct MafiaToken;

#[contractimpl]
impl MafiaToken {
    /// Initialize with the minting owner
    pub fn __constructor(env: Env, owner: Address) {
        env.storage().instance().set(&DataKey::Owner, &owner);
        env.storage().instance().set(&DataKey::TotalSupply, &0i128);
    }

    pub fn name(env: Env) -> String {
        String::from_str(&env, TOKEN_NAME)
    }

    pub fn symbol(env: Env) -> String {
        String::from_str(&env, TOKEN_SYMBOL)
    }

    pub fn decimals(_env: Env) -> u32 {
        TOKEN_DECIMALS
    }

    pub fn owner(env: Env) -> Result<Address, TokenError> {
        Self::load_owner(&env)
    }

    /// Hand minting rights to `new_owner`. Requires the current owner's auth.
    pub fn transfer_ownership(env: Env, new_owner: Address) -> Result<(), TokenError> {
        let owner = Self::load_owner(&env)?;
        owner.require_auth();
        env.storage().instance().set(&DataKey::Owner, &new_owner);

        EvOwnershipTransferred {
            previous_owner: owner,
            new_owner,
        }.publish(&env);
        Ok(())
    }

    /// Credit `amount` fresh tokens to `to`. Owner only.
    pub fn mint(env: Env, to: Address, amount: i128) -> Result<(), TokenError> {
        let owner = Self::load_owner(&env)?;
        owner.require_auth();
        if amount <= 0 {
            return Err(TokenError::InvalidAmount);
        }

        let balance = Self::read_balance(&env, &to);
        Self::write_balance(&env, &to, balance + amount);

        let supply: i128 = env
            .storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0);
        env.storage()
            .instance()
            .set(&DataKey::TotalSupply, &(supply + amount));

        EvMinted { to, amount }.publish(&env);
        Ok(())
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), TokenError> {
        from.require_auth();
        if amount <= 0 {
            return Err(TokenError::InvalidAmount);
        }

        let from_balance = Self::read_balance(&env, &from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance);
        }
        Self::write_balance(&env, &from, from_balance - amount);
        let to_balance = Self::read_balance(&env, &to);
        Self::write_balance(&env, &to, to_balance + amount);

        EvTransferred { from, to, amount }.publish(&env);
        Ok(())
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        Self::read_balance(&env, &id)
    }

    pub fn total_supply(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    // ─── Internal helpers ──────────────────────────────────────────────────

    fn load_owner(env: &Env) -> Result<Address, TokenError> {
        env.storage()
            .instance()
            .get(&DataKey::Owner)
            .ok_or(TokenError::OwnerNotSet)
    }

    fn read_balance(env: &Env, id: &Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(id.clone()))
            .unwrap_or(0)
    }

    fn write_balance(env: &Env, id: &Address, amount: i128) {
        let key = DataKey::Balance(id.clone());
        env.storage().persistent().set(&key, &amount);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);
    }
}
