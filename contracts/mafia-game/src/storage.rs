//! Storage layout and typed accessors.
//!
//! Contract settings live in instance storage. Games and per-game player
//! records live in persistent storage so finished games stay queryable.

use soroban_sdk::{contracttype, Address, Env};

use crate::{EntryFee, Game, GameConfig, MafiaError, PlayerInfo};

#[contracttype]
#[derive(Clone)]
pub(crate) enum StorageKey {
    Admin,
    Config,
    RewardToken,
    EntryFee,
    RandomnessSource,
    GameCounter,
    Game(u32),
    /// Player record for (game_id, player).
    Player(u32, Address),
}

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// TTL expressed in human-readable time units (120 days)
const TTL_SECONDS: u32 = 120 * 24 * 60 * 60; // 10,368,000 seconds

/// TTL for game storage in ledgers: 120 * 24 * 60 * 60 / 5 = 2,073,600 ledgers
const GAME_TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS;

// ───────────────────────────────────────────────────────────────────────────
//  Settings
// ───────────────────────────────────────────────────────────────────────────

pub(crate) fn load_admin(env: &Env) -> Result<Address, MafiaError> {
    env.storage()
        .instance()
        .get(&StorageKey::Admin)
        .ok_or(MafiaError::AdminNotSet)
}

pub(crate) fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&StorageKey::Admin, admin);
}

pub(crate) fn load_reward_token(env: &Env) -> Result<Address, MafiaError> {
    env.storage()
        .instance()
        .get(&StorageKey::RewardToken)
        .ok_or(MafiaError::RewardTokenNotSet)
}

pub(crate) fn set_reward_token(env: &Env, token: &Address) {
    env.storage().instance().set(&StorageKey::RewardToken, token);
}

pub(crate) fn read_config(env: &Env) -> GameConfig {
    env.storage()
        .instance()
        .get(&StorageKey::Config)
        .unwrap_or_else(GameConfig::standard)
}

pub(crate) fn write_config(env: &Env, config: &GameConfig) {
    env.storage().instance().set(&StorageKey::Config, config);
}

pub(crate) fn read_entry_fee(env: &Env) -> Option<EntryFee> {
    env.storage().instance().get(&StorageKey::EntryFee)
}

pub(crate) fn write_entry_fee(env: &Env, fee: Option<&EntryFee>) {
    match fee {
        Some(fee) => env.storage().instance().set(&StorageKey::EntryFee, fee),
        None => env.storage().instance().remove(&StorageKey::EntryFee),
    }
}

pub(crate) fn read_randomness_source(env: &Env) -> Option<Address> {
    env.storage().instance().get(&StorageKey::RandomnessSource)
}

pub(crate) fn write_randomness_source(env: &Env, source: Option<&Address>) {
    match source {
        Some(source) => env
            .storage()
            .instance()
            .set(&StorageKey::RandomnessSource, source),
        None => env.storage().instance().remove(&StorageKey::RandomnessSource),
    }
}

// ───────────────────────────────────────────────────────────────────────────
//  Game registry
// ───────────────────────────────────────────────────────────────────────────

pub(crate) fn game_counter(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&StorageKey::GameCounter)
        .unwrap_or(0)
}

/// Allocate the next game id. Ids start at 1; 0 is never assigned.
pub(crate) fn next_game_id(env: &Env) -> u32 {
    let id = game_counter(env) + 1;
    env.storage().instance().set(&StorageKey::GameCounter, &id);
    id
}

pub(crate) fn read_game(env: &Env, game_id: u32) -> Result<Game, MafiaError> {
    env.storage()
        .persistent()
        .get(&StorageKey::Game(game_id))
        .ok_or(MafiaError::NotFound)
}

pub(crate) fn write_game(env: &Env, game_id: u32, game: &Game) {
    let key = StorageKey::Game(game_id);
    env.storage().persistent().set(&key, game);
    env.storage()
        .persistent()
        .extend_ttl(&key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
    // Keep instance storage (admin, config, counter) alive
    env.storage()
        .instance()
        .extend_ttl(GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
}

pub(crate) fn read_player(env: &Env, game_id: u32, player: &Address) -> Option<PlayerInfo> {
    env.storage()
        .persistent()
        .get(&StorageKey::Player(game_id, player.clone()))
}

pub(crate) fn write_player(env: &Env, game_id: u32, player: &Address, info: &PlayerInfo) {
    let key = StorageKey::Player(game_id, player.clone());
    env.storage().persistent().set(&key, info);
    env.storage()
        .persistent()
        .extend_ttl(&key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
}
