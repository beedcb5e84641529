#![no_std]

//! # Mafia
//!
//! A social-deduction game whose whole state machine lives on-chain. Any
//! address may create a game; players join while it is `Waiting`, and the
//! creator starts it once the minimum roster is reached.
//!
//! ## Game flow
//! 1. `create_game` allocates the next game id (1-based).
//! 2. Players `join_game`, optionally paying the entry fee into the pot.
//! 3. The creator calls `start_game`: roles are dealt as a random permutation
//!    and the first Night begins.
//! 4. **Night**: the Mafia records a kill, the Doctor records a heal. At
//!    `end_night` the kill lands unless the heal named the same player.
//! 5. **Day**: discussion happens off-chain; `start_voting` opens the ballot.
//! 6. **Voting**: each living player casts one `vote_to_eject`. At
//!    `end_voting` the player with strictly the most votes is ejected; a tie
//!    ejects nobody. The next Night follows.
//! 7. After every elimination the faction counts are checked. Villagers win
//!    when no Mafia is alive; Mafia wins at parity. The winning faction is
//!    paid from the reward token and the pot.
//!
//! ## Phase clock
//! Every phase has a deadline (`ledger timestamp + phase duration`). The
//! advancing calls are permissionless but fail with `PhaseNotEnded` before
//! the deadline.
//!
//! ## Role secrecy
//! `get_player_info` returns any player's role to any caller. Hiding roles
//! from other players is left to the client; the contract does not encrypt
//! or commit roles.

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, log,
    token, Address, BytesN, Env, Vec,
};

mod roles;
mod rules;
mod storage;

pub use roles::{deal_roles, role_counts, HostPrng, RandomSource};
pub use rules::{is_on_side, night_victim, Headcount, VoteTally};

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvGameCreated {
    pub game_id: u32,
    pub creator: Address,
}

#[contractevent]
pub struct EvPlayerJoined {
    pub game_id: u32,
    pub player: Address,
}

#[contractevent]
pub struct EvGameStarted {
    pub game_id: u32,
    pub player_count: u32,
}

#[contractevent]
pub struct EvPhaseChanged {
    pub game_id: u32,
    pub state: Phase,
}

/// Emitted when a night action is stored. The target is not published.
#[contractevent]
pub struct EvNightActionRecorded {
    pub game_id: u32,
    pub player: Address,
}

#[contractevent]
pub struct EvVoteCast {
    pub game_id: u32,
    pub voter: Address,
    pub target: Address,
}

/// Emitted for both night kills and ejections.
#[contractevent]
pub struct EvPlayerKilled {
    pub game_id: u32,
    pub player: Address,
}

/// Emitted when the Doctor healed the Mafia's target.
#[contractevent]
pub struct EvKillPrevented {
    pub game_id: u32,
}

/// Emitted when a vote ends without a strict leader.
#[contractevent]
pub struct EvNoElimination {
    pub game_id: u32,
}

#[contractevent]
pub struct EvGameFinished {
    pub game_id: u32,
    pub winner: Winner,
}

#[contractevent]
pub struct EvRewardPaid {
    pub game_id: u32,
    pub player: Address,
    pub amount: i128,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  External trait interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// Reward token. This contract must own it to mint.
#[contractclient(name = "RewardTokenClient")]
pub trait RewardToken {
    fn mint(env: Env, to: Address, amount: i128);
}

/// Optional external randomness (VRF, commit-reveal beacon, ...).
///
/// When registered, its seed replaces the host PRNG seed for role dealing.
#[contractclient(name = "RandomnessOracleClient")]
pub trait RandomnessOracle {
    fn seed(env: Env, game_id: u32) -> BytesN<32>;
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum MafiaError {
    NotFound = 1,
    InvalidState = 2,
    Unauthorized = 3,
    AlreadyJoined = 4,
    AlreadyVoted = 5,
    AlreadyActed = 6,
    InvalidTarget = 7,
    InsufficientPayment = 8,
    PhaseNotEnded = 9,
    NotEnoughPlayers = 10,
    GameFull = 11,
    AdminNotSet = 12,
    RewardTokenNotSet = 13,
    InvalidConfig = 14,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Game state
// ═══════════════════════════════════════════════════════════════════════════════

/// Phases only move Waiting → Night → Day → Voting → Night, with Finished
/// reachable after any elimination. Finished is terminal.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Phase {
    Waiting = 0,
    Night = 1,
    Day = 2,
    Voting = 3,
    Finished = 4,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Role {
    None = 0,
    Mafia = 1,
    Villager = 2,
    Doctor = 3,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Winner {
    None = 0,
    Mafia = 1,
    Villagers = 2,
}

/// Tunables. Each game copies the config in force when it was created.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameConfig {
    /// Seconds
    pub night_duration: u64,
    pub day_duration: u64,
    pub voting_duration: u64,
    pub min_players: u32,
    pub max_players: u32,
    /// Reward-token base units minted to each member of the winning faction.
    pub reward_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntryFee {
    pub token: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Game {
    pub creator: Address,
    pub state: Phase,
    /// Join order; no duplicates.
    pub players: Vec<Address>,
    pub created_at: u64,
    pub phase_deadline: u64,
    /// Night counter, 1 for the first night.
    pub round: u32,
    pub winner: Winner,
    // Night actions, resolved at end_night
    pub kill_target: Option<Address>,
    pub heal_target: Option<Address>,
    pub config: GameConfig,
    /// Fee snapshot; `None` means joining is free.
    pub fee_token: Option<Address>,
    pub fee_amount: i128,
    pub pot: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameInfo {
    pub state: Phase,
    pub player_count: u32,
    pub created_at: u64,
    pub phase_deadline: u64,
    pub winner: Winner,
    pub round: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerInfo {
    pub role: Role,
    pub is_alive: bool,
    pub has_voted: bool,
    pub has_acted: bool,
    pub votes_received: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

const MINUTE_SECS: u64 = 60;

/// Default length of each of Night, Day and Voting: 5 minutes.
pub const DEFAULT_PHASE_SECS: u64 = 5 * MINUTE_SECS;

/// Smallest roster that supports one Mafia against two others.
pub const MIN_PLAYERS: u32 = 3;
pub const DEFAULT_MAX_PLAYERS: u32 = 16;

/// 100 MAFIA at 7 decimals.
pub const DEFAULT_REWARD: i128 = 100_0000000;

impl GameConfig {
    pub fn standard() -> Self {
        GameConfig {
            night_duration: DEFAULT_PHASE_SECS,
            day_duration: DEFAULT_PHASE_SECS,
            voting_duration: DEFAULT_PHASE_SECS,
            min_players: MIN_PLAYERS,
            max_players: DEFAULT_MAX_PLAYERS,
            reward_amount: DEFAULT_REWARD,
        }
    }

    fn is_valid(&self) -> bool {
        self.night_duration > 0
            && self.day_duration > 0
            && self.voting_duration > 0
            && self.min_players >= MIN_PLAYERS
            && self.max_players >= self.min_players
            && self.reward_amount >= 0
    }

    fn duration_of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Night => self.night_duration,
            Phase::Day => self.day_duration,
            Phase::Voting => self.voting_duration,
            Phase::Waiting | Phase::Finished => 0,
        }
    }
}

impl PlayerInfo {
    fn joined() -> Self {
        PlayerInfo {
            role: Role::None,
            is_alive: true,
            has_voted: false,
            has_acted: false,
            votes_received: 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct MafiaGameContract;

#[contractimpl]
impl MafiaGameContract {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor & Registry
    // ───────────────────────────────────────────────────────────────────────────

    pub fn __constructor(env: Env, admin: Address, reward_token: Address) {
        storage::set_admin(&env, &admin);
        storage::set_reward_token(&env, &reward_token);
        storage::write_config(&env, &GameConfig::standard());
    }

    /// Open a new game in `Waiting` with `creator` as the only address
    /// allowed to start it. The creator is not joined automatically.
    pub fn create_game(env: Env, creator: Address) -> u32 {
        creator.require_auth();

        let game_id = storage::next_game_id(&env);
        let entry_fee = storage::read_entry_fee(&env);
        let game = Game {
            creator: creator.clone(),
            state: Phase::Waiting,
            players: Vec::new(&env),
            created_at: env.ledger().timestamp(),
            phase_deadline: 0,
            round: 0,
            winner: Winner::None,
            kill_target: None,
            heal_target: None,
            config: storage::read_config(&env),
            fee_token: entry_fee.as_ref().map(|fee| fee.token.clone()),
            fee_amount: entry_fee.map_or(0, |fee| fee.amount),
            pot: 0,
        };
        storage::write_game(&env, game_id, &game);

        EvGameCreated { game_id, creator }.publish(&env);
        game_id
    }

    /// Join a waiting game. When the game charges an entry fee, the whole
    /// `payment` (at least the fee) moves from the player into the pot.
    pub fn join_game(
        env: Env,
        game_id: u32,
        player: Address,
        payment: i128,
    ) -> Result<(), MafiaError> {
        player.require_auth();

        let mut game = storage::read_game(&env, game_id)?;
        Self::require_phase(&game, Phase::Waiting)?;
        if game.players.contains(&player) {
            return Err(MafiaError::AlreadyJoined);
        }
        if game.players.len() >= game.config.max_players {
            return Err(MafiaError::GameFull);
        }

        if let Some(fee_token) = game.fee_token.clone() {
            if payment < game.fee_amount {
                return Err(MafiaError::InsufficientPayment);
            }
            let fee_token = token::Client::new(&env, &fee_token);
            fee_token.transfer(&player, &env.current_contract_address(), &payment);
            game.pot += payment;
        }

        game.players.push_back(player.clone());
        storage::write_player(&env, game_id, &player, &PlayerInfo::joined());
        storage::write_game(&env, game_id, &game);

        EvPlayerJoined { game_id, player }.publish(&env);
        Ok(())
    }

    /// Deal roles and enter the first Night. Creator only.
    pub fn start_game(env: Env, game_id: u32, caller: Address) -> Result<(), MafiaError> {
        caller.require_auth();

        let mut game = storage::read_game(&env, game_id)?;
        if caller != game.creator {
            return Err(MafiaError::Unauthorized);
        }
        Self::require_phase(&game, Phase::Waiting)?;

        let player_count = game.players.len();
        if player_count < game.config.min_players {
            return Err(MafiaError::NotEnoughPlayers);
        }

        if let Some(oracle) = storage::read_randomness_source(&env) {
            let seed = RandomnessOracleClient::new(&env, &oracle).seed(&game_id);
            env.prng().seed(seed.into());
        }
        let roles = deal_roles(&env, player_count, &mut HostPrng::new(&env));
        for (player, role) in game.players.iter().zip(roles.iter()) {
            let info = PlayerInfo {
                role,
                ..PlayerInfo::joined()
            };
            storage::write_player(&env, game_id, &player, &info);
        }

        game.state = Phase::Night;
        game.round = 1;
        game.phase_deadline = Self::deadline_for(&env, &game.config, Phase::Night);
        storage::write_game(&env, game_id, &game);

        log!(&env, "game started", game_id, player_count);
        EvGameStarted {
            game_id,
            player_count,
        }.publish(&env);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Phase transitions (permissionless, deadline-gated)
    // ───────────────────────────────────────────────────────────────────────────

    /// Resolve the night's kill and heal, then enter Day (or finish).
    pub fn end_night(env: Env, game_id: u32) -> Result<(), MafiaError> {
        let mut game = storage::read_game(&env, game_id)?;
        Self::require_phase(&game, Phase::Night)?;
        Self::require_phase_ended(&env, &game)?;

        let victim = night_victim(game.kill_target.as_ref(), game.heal_target.as_ref());
        let prevented = victim.is_none() && game.kill_target.is_some();
        game.kill_target = None;
        game.heal_target = None;

        if prevented {
            EvKillPrevented { game_id }.publish(&env);
        }
        if let Some(victim) = victim {
            if Self::eliminate(&env, game_id, &mut game, &victim)? {
                storage::write_game(&env, game_id, &game);
                return Ok(());
            }
        }

        Self::enter_phase(&env, game_id, &mut game, Phase::Day);
        storage::write_game(&env, game_id, &game);
        Ok(())
    }

    pub fn start_voting(env: Env, game_id: u32) -> Result<(), MafiaError> {
        let mut game = storage::read_game(&env, game_id)?;
        Self::require_phase(&game, Phase::Day)?;
        Self::require_phase_ended(&env, &game)?;

        Self::enter_phase(&env, game_id, &mut game, Phase::Voting);
        storage::write_game(&env, game_id, &game);
        Ok(())
    }

    /// Eject the strict vote leader, then enter the next Night (or finish).
    pub fn end_voting(env: Env, game_id: u32) -> Result<(), MafiaError> {
        let mut game = storage::read_game(&env, game_id)?;
        Self::require_phase(&game, Phase::Voting)?;
        Self::require_phase_ended(&env, &game)?;

        let mut tally = VoteTally::new();
        for player in game.players.iter() {
            if let Some(info) = storage::read_player(&env, game_id, &player) {
                if info.is_alive {
                    tally.record(&player, info.votes_received);
                }
            }
        }

        match tally.ejected() {
            Some(ejected) => {
                if Self::eliminate(&env, game_id, &mut game, &ejected)? {
                    storage::write_game(&env, game_id, &game);
                    return Ok(());
                }
            }
            None => EvNoElimination { game_id }.publish(&env),
        }

        Self::enter_phase(&env, game_id, &mut game, Phase::Night);
        storage::write_game(&env, game_id, &game);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Night actions & voting
    // ───────────────────────────────────────────────────────────────────────────

    /// Mark `target` for death at the end of the night. A later Mafia kill in
    /// the same night replaces the earlier target. Fellow Mafia members are
    /// not valid targets.
    pub fn mafia_kill(
        env: Env,
        game_id: u32,
        caller: Address,
        target: Address,
    ) -> Result<(), MafiaError> {
        caller.require_auth();

        let mut game = storage::read_game(&env, game_id)?;
        let mut actor = Self::require_night_actor(&env, game_id, &game, &caller, Role::Mafia)?;
        if target == caller {
            return Err(MafiaError::InvalidTarget);
        }
        if Self::require_living_target(&env, game_id, &target)?.role == Role::Mafia {
            return Err(MafiaError::InvalidTarget);
        }

        game.kill_target = Some(target);
        actor.has_acted = true;
        storage::write_player(&env, game_id, &caller, &actor);
        storage::write_game(&env, game_id, &game);

        EvNightActionRecorded {
            game_id,
            player: caller,
        }.publish(&env);
        Ok(())
    }

    /// Protect `target` for this night. The Doctor may heal themself.
    pub fn doctor_heal(
        env: Env,
        game_id: u32,
        caller: Address,
        target: Address,
    ) -> Result<(), MafiaError> {
        caller.require_auth();

        let mut game = storage::read_game(&env, game_id)?;
        let mut actor = Self::require_night_actor(&env, game_id, &game, &caller, Role::Doctor)?;
        Self::require_living_target(&env, game_id, &target)?;

        game.heal_target = Some(target);
        actor.has_acted = true;
        storage::write_player(&env, game_id, &caller, &actor);
        storage::write_game(&env, game_id, &game);

        EvNightActionRecorded {
            game_id,
            player: caller,
        }.publish(&env);
        Ok(())
    }

    /// One vote per living player per round. Self-votes are rejected.
    pub fn vote_to_eject(
        env: Env,
        game_id: u32,
        voter: Address,
        target: Address,
    ) -> Result<(), MafiaError> {
        voter.require_auth();

        let game = storage::read_game(&env, game_id)?;
        Self::require_phase(&game, Phase::Voting)?;
        let mut ballot = Self::require_living_player(&env, game_id, &voter)?;
        if ballot.has_voted {
            return Err(MafiaError::AlreadyVoted);
        }
        if target == voter {
            return Err(MafiaError::InvalidTarget);
        }
        let mut candidate = Self::require_living_target(&env, game_id, &target)?;

        ballot.has_voted = true;
        candidate.votes_received += 1;
        storage::write_player(&env, game_id, &voter, &ballot);
        storage::write_player(&env, game_id, &target, &candidate);

        EvVoteCast {
            game_id,
            voter,
            target,
        }.publish(&env);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Read
    // ───────────────────────────────────────────────────────────────────────────

    /// Total games ever created. Ids run from 1 to this value.
    pub fn game_counter(env: Env) -> u32 {
        storage::game_counter(&env)
    }

    /// Full game record. While Night is in progress the recorded kill and
    /// heal targets are hidden.
    pub fn get_game(env: Env, game_id: u32) -> Result<Game, MafiaError> {
        let mut game = storage::read_game(&env, game_id)?;
        if game.state == Phase::Night {
            game.kill_target = None;
            game.heal_target = None;
        }
        Ok(game)
    }

    pub fn get_game_info(env: Env, game_id: u32) -> Result<GameInfo, MafiaError> {
        let game = storage::read_game(&env, game_id)?;
        Ok(GameInfo {
            state: game.state,
            player_count: game.players.len(),
            created_at: game.created_at,
            phase_deadline: game.phase_deadline,
            winner: game.winner,
            round: game.round,
        })
    }

    pub fn get_players(env: Env, game_id: u32) -> Result<Vec<Address>, MafiaError> {
        Ok(storage::read_game(&env, game_id)?.players)
    }

    pub fn get_alive_players(env: Env, game_id: u32) -> Result<Vec<Address>, MafiaError> {
        let game = storage::read_game(&env, game_id)?;
        let mut alive = Vec::new(&env);
        for player in game.players.iter() {
            if let Some(info) = storage::read_player(&env, game_id, &player) {
                if info.is_alive {
                    alive.push_back(player);
                }
            }
        }
        Ok(alive)
    }

    /// Any player's record, role included. Role secrecy is the client's job.
    pub fn get_player_info(
        env: Env,
        game_id: u32,
        player: Address,
    ) -> Result<PlayerInfo, MafiaError> {
        storage::read_game(&env, game_id)?;
        storage::read_player(&env, game_id, &player).ok_or(MafiaError::NotFound)
    }

    pub fn is_player_in_game(env: Env, game_id: u32, player: Address) -> bool {
        storage::read_player(&env, game_id, &player).is_some()
    }

    /// Whether the current phase's deadline has passed.
    pub fn has_phase_ended(env: Env, game_id: u32) -> Result<bool, MafiaError> {
        let game = storage::read_game(&env, game_id)?;
        Ok(env.ledger().timestamp() >= game.phase_deadline)
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Admin
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, MafiaError> {
        storage::load_admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), MafiaError> {
        Self::require_admin(&env)?;
        storage::set_admin(&env, &new_admin);
        Ok(())
    }

    pub fn get_config(env: Env) -> GameConfig {
        storage::read_config(&env)
    }

    /// Applies to games created afterwards.
    pub fn set_config(env: Env, config: GameConfig) -> Result<(), MafiaError> {
        Self::require_admin(&env)?;
        if !config.is_valid() {
            return Err(MafiaError::InvalidConfig);
        }
        storage::write_config(&env, &config);
        Ok(())
    }

    pub fn get_entry_fee(env: Env) -> Option<EntryFee> {
        storage::read_entry_fee(&env)
    }

    pub fn set_entry_fee(env: Env, token: Address, amount: i128) -> Result<(), MafiaError> {
        Self::require_admin(&env)?;
        if amount <= 0 {
            return Err(MafiaError::InvalidConfig);
        }
        storage::write_entry_fee(&env, Some(&EntryFee { token, amount }));
        Ok(())
    }

    pub fn clear_entry_fee(env: Env) -> Result<(), MafiaError> {
        Self::require_admin(&env)?;
        storage::write_entry_fee(&env, None);
        Ok(())
    }

    pub fn get_reward_token(env: Env) -> Result<Address, MafiaError> {
        storage::load_reward_token(&env)
    }

    pub fn set_reward_token(env: Env, new_token: Address) -> Result<(), MafiaError> {
        Self::require_admin(&env)?;
        storage::set_reward_token(&env, &new_token);
        Ok(())
    }

    pub fn get_randomness_source(env: Env) -> Option<Address> {
        storage::read_randomness_source(&env)
    }

    pub fn set_randomness_source(env: Env, oracle: Address) -> Result<(), MafiaError> {
        Self::require_admin(&env)?;
        storage::write_randomness_source(&env, Some(&oracle));
        Ok(())
    }

    pub fn clear_randomness_source(env: Env) -> Result<(), MafiaError> {
        Self::require_admin(&env)?;
        storage::write_randomness_source(&env, None);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), MafiaError> {
        Self::require_admin(&env)?;
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Elimination & finalization
    // ═══════════════════════════════════════════════════════════════════════════

    /// Kill `player` and run the win check. Returns `true` once the game is
    /// finished; the caller still has to persist `game`.
    fn eliminate(
        env: &Env,
        game_id: u32,
        game: &mut Game,
        player: &Address,
    ) -> Result<bool, MafiaError> {
        let mut info = storage::read_player(env, game_id, player).ok_or(MafiaError::InvalidTarget)?;
        if !info.is_alive {
            return Err(MafiaError::InvalidTarget);
        }
        info.is_alive = false;
        storage::write_player(env, game_id, player, &info);

        EvPlayerKilled {
            game_id,
            player: player.clone(),
        }.publish(env);

        let winner = Self::headcount(env, game_id, game).winner();
        if winner == Winner::None {
            return Ok(false);
        }
        Self::finalize_game(env, game_id, game, winner)?;
        Ok(true)
    }

    fn headcount(env: &Env, game_id: u32, game: &Game) -> Headcount {
        let mut count = Headcount::default();
        for player in game.players.iter() {
            if let Some(info) = storage::read_player(env, game_id, &player) {
                if info.is_alive {
                    count.add(info.role);
                }
            }
        }
        count
    }

    /// Single payout call-site: mint the reward, then split the pot.
    fn finalize_game(
        env: &Env,
        game_id: u32,
        game: &mut Game,
        winner: Winner,
    ) -> Result<(), MafiaError> {
        let mut winners: Vec<Address> = Vec::new(env);
        for player in game.players.iter() {
            if let Some(info) = storage::read_player(env, game_id, &player) {
                if is_on_side(info.role, winner) {
                    winners.push_back(player);
                }
            }
        }

        let reward = game.config.reward_amount;
        if reward > 0 {
            let token_addr = storage::load_reward_token(env)?;
            let reward_token = RewardTokenClient::new(env, &token_addr);
            for member in winners.iter() {
                reward_token.mint(&member, &reward);
                EvRewardPaid {
                    game_id,
                    player: member,
                    amount: reward,
                }.publish(env);
            }
        }

        if let Some(fee_token) = game.fee_token.clone() {
            let share = if winners.is_empty() {
                0
            } else {
                game.pot / i128::from(winners.len())
            };
            if share > 0 {
                let fee_token = token::Client::new(env, &fee_token);
                for member in winners.iter() {
                    fee_token.transfer(&env.current_contract_address(), &member, &share);
                }
                // Remainder of the integer split stays with the contract
                game.pot -= share * i128::from(winners.len());
            }
        }

        game.state = Phase::Finished;
        game.winner = winner;
        game.phase_deadline = env.ledger().timestamp();

        log!(env, "game finished", game_id, winners.len());
        EvPhaseChanged {
            game_id,
            state: Phase::Finished,
        }.publish(env);
        EvGameFinished { game_id, winner }.publish(env);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Phase clock
    // ═══════════════════════════════════════════════════════════════════════════

    fn deadline_for(env: &Env, config: &GameConfig, phase: Phase) -> u64 {
        env.ledger()
            .timestamp()
            .saturating_add(config.duration_of(phase))
    }

    /// Switch to `phase`, start its clock and reset the per-phase flags.
    fn enter_phase(env: &Env, game_id: u32, game: &mut Game, phase: Phase) {
        game.state = phase;
        game.phase_deadline = Self::deadline_for(env, &game.config, phase);
        if phase == Phase::Night {
            game.round += 1;
        }

        for player in game.players.iter() {
            let Some(mut info) = storage::read_player(env, game_id, &player) else {
                continue;
            };
            if !info.is_alive {
                continue;
            }
            match phase {
                Phase::Night => info.has_acted = false,
                Phase::Voting => {
                    info.has_voted = false;
                    info.votes_received = 0;
                }
                _ => continue,
            }
            storage::write_player(env, game_id, &player, &info);
        }

        EvPhaseChanged {
            game_id,
            state: phase,
        }.publish(env);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Guards
    // ═══════════════════════════════════════════════════════════════════════════

    fn require_admin(env: &Env) -> Result<(), MafiaError> {
        let admin = storage::load_admin(env)?;
        admin.require_auth();
        Ok(())
    }

    fn require_phase(game: &Game, phase: Phase) -> Result<(), MafiaError> {
        if game.state != phase {
            return Err(MafiaError::InvalidState);
        }
        Ok(())
    }

    fn require_phase_ended(env: &Env, game: &Game) -> Result<(), MafiaError> {
        if env.ledger().timestamp() < game.phase_deadline {
            return Err(MafiaError::PhaseNotEnded);
        }
        Ok(())
    }

    fn require_living_player(
        env: &Env,
        game_id: u32,
        player: &Address,
    ) -> Result<PlayerInfo, MafiaError> {
        match storage::read_player(env, game_id, player) {
            Some(info) if info.is_alive => Ok(info),
            _ => Err(MafiaError::Unauthorized),
        }
    }

    fn require_living_target(
        env: &Env,
        game_id: u32,
        target: &Address,
    ) -> Result<PlayerInfo, MafiaError> {
        match storage::read_player(env, game_id, target) {
            Some(info) if info.is_alive => Ok(info),
            _ => Err(MafiaError::InvalidTarget),
        }
    }

    /// Night, caller alive with `role`, no action yet this night.
    fn require_night_actor(
        env: &Env,
        game_id: u32,
        game: &Game,
        caller: &Address,
        role: Role,
    ) -> Result<PlayerInfo, MafiaError> {
        Self::require_phase(game, Phase::Night)?;
        let actor = Self::require_living_player(env, game_id, caller)?;
        if actor.role != role {
            return Err(MafiaError::Unauthorized);
        }
        if actor.has_acted {
            return Err(MafiaError::AlreadyActed);
        }
        Ok(actor)
    }
}
