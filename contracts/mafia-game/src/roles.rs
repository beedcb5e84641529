//! Role assignment.
//!
//! Roles are dealt as a Fisher-Yates permutation of a fixed multiset over the
//! join order. The shuffle only sees a [`RandomSource`], so the host PRNG can be
//! swapped for a VRF or commit-reveal feed without touching the game logic.

use soroban_sdk::{Env, Vec};

use crate::Role;

/// Players per Mafia member (rounded down, never below one Mafia).
pub const PLAYERS_PER_MAFIA: u32 = 4;

/// Smallest roster that gets a Doctor.
pub const DOCTOR_MIN_PLAYERS: u32 = 4;

/// Source of uniform draws for the shuffle.
pub trait RandomSource {
    /// Uniform value in `0..bound`. `bound` is never zero.
    fn below(&mut self, bound: u32) -> u32;
}

/// The ledger host PRNG. Seeded per invocation by the host, or explicitly by
/// a registered randomness oracle before the shuffle runs.
pub struct HostPrng<'a> {
    env: &'a Env,
}

impl<'a> HostPrng<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self { env }
    }
}

impl RandomSource for HostPrng<'_> {
    fn below(&mut self, bound: u32) -> u32 {
        let max = u64::from(bound.saturating_sub(1));
        self.env.prng().gen_range::<u64>(0..=max) as u32
    }
}

/// `(mafia, doctors, villagers)` for a roster of `player_count`.
pub fn role_counts(player_count: u32) -> (u32, u32, u32) {
    let mafia = (player_count / PLAYERS_PER_MAFIA).max(1).min(player_count);
    let doctors = if player_count >= DOCTOR_MIN_PLAYERS { 1 } else { 0 };
    let villagers = player_count.saturating_sub(mafia + doctors);
    (mafia, doctors, villagers)
}

/// Deal one role per seat. Entry `i` belongs to the `i`-th player to join.
pub fn deal_roles<R: RandomSource>(env: &Env, player_count: u32, rng: &mut R) -> Vec<Role> {
    let (mafia, doctors, villagers) = role_counts(player_count);

    let mut roles = Vec::new(env);
    for _ in 0..mafia {
        roles.push_back(Role::Mafia);
    }
    for _ in 0..doctors {
        roles.push_back(Role::Doctor);
    }
    for _ in 0..villagers {
        roles.push_back(Role::Villager);
    }

    let mut idx = roles.len();
    while idx > 1 {
        idx -= 1;
        let j = rng.below(idx + 1);
        if j != idx {
            let a = roles.get_unchecked(idx);
            let b = roles.get_unchecked(j);
            roles.set(idx, b);
            roles.set(j, a);
        }
    }
    roles
}
