//! Pure resolution rules: night outcome, vote tally and win condition.
//! Nothing here touches storage.

use soroban_sdk::Address;

use crate::{Role, Winner};

/// The player who dies at the end of the night, if any.
///
/// A heal cancels the kill only when it names the same address.
pub fn night_victim(
    kill_target: Option<&Address>,
    heal_target: Option<&Address>,
) -> Option<Address> {
    match (kill_target, heal_target) {
        (Some(kill), Some(heal)) if kill == heal => None,
        (Some(kill), _) => Some(kill.clone()),
        (None, _) => None,
    }
}

/// Running tally of ejection votes. Only a strict, non-zero maximum ejects.
#[derive(Clone, Debug, Default)]
pub struct VoteTally {
    leader: Option<Address>,
    top: u32,
    tied: bool,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, player: &Address, votes: u32) {
        if votes == 0 {
            return;
        }
        if votes > self.top {
            self.leader = Some(player.clone());
            self.top = votes;
            self.tied = false;
        } else if votes == self.top {
            self.tied = true;
        }
    }

    pub fn ejected(self) -> Option<Address> {
        if self.tied {
            None
        } else {
            self.leader
        }
    }
}

/// Living players split by faction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Headcount {
    pub mafia: u32,
    pub town: u32,
}

impl Headcount {
    pub fn add(&mut self, role: Role) {
        match role {
            Role::Mafia => self.mafia += 1,
            Role::Villager | Role::Doctor => self.town += 1,
            Role::None => {}
        }
    }

    /// Villagers win with no Mafia left; Mafia wins at parity or better.
    pub fn winner(&self) -> Winner {
        if self.mafia == 0 {
            Winner::Villagers
        } else if self.mafia >= self.town {
            Winner::Mafia
        } else {
            Winner::None
        }
    }
}

/// Whether `role` belongs to the winning faction.
pub fn is_on_side(role: Role, winner: Winner) -> bool {
    match winner {
        Winner::Mafia => role == Role::Mafia,
        Winner::Villagers => matches!(role, Role::Villager | Role::Doctor),
        Winner::None => false,
    }
}
