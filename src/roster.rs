use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::types::{Player, PlayerState, TeamSetup, TeamSide};

pub const MIN_ROSTER: usize = 1;
pub const MAX_ROSTER: usize = 20;
pub const MAX_JERSEY: u16 = 999;

/// A team and its ordered roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub side: TeamSide,
    pub name: String,
    pub color: String,
    pub roster: Vec<Player>,
}

impl Team {
    pub fn new(side: TeamSide, name: &str, color: &str, size: usize) -> Self {
        Self {
            side,
            name: name.to_string(),
            color: color.to_string(),
            roster: (1..=size as u16).map(Player::new).collect(),
        }
    }

    pub fn player(&self, number: u16) -> Result<&Player, TransitionError> {
        self.roster
            .iter()
            .find(|p| p.number == number)
            .ok_or(TransitionError::PlayerNotFound { side: self.side, number })
    }

    pub fn player_mut(&mut self, number: u16) -> Result<&mut Player, TransitionError> {
        let side = self.side;
        self.roster
            .iter_mut()
            .find(|p| p.number == number)
            .ok_or(TransitionError::PlayerNotFound { side, number })
    }

    /// Sorted jersey numbers of eligible players in `state`.
    pub fn numbers_in(&self, state: PlayerState) -> Vec<u16> {
        let mut numbers: Vec<u16> = self
            .roster
            .iter()
            .filter(|p| p.state == state && p.eligible)
            .map(|p| p.number)
            .collect();
        numbers.sort_unstable();
        numbers
    }

    /// Sorted jersey numbers of every player in `state`, eligible or not.
    pub fn all_in(&self, state: PlayerState) -> Vec<u16> {
        let mut numbers: Vec<u16> = self.roster.iter().filter(|p| p.state == state).map(|p| p.number).collect();
        numbers.sort_unstable();
        numbers
    }

    /// Apply a setup. Players keep state, eligibility and exclusions by
    /// position; added positions start on the bench.
    pub fn configure(&mut self, setup: &TeamSetup) -> Result<(), TransitionError> {
        if !(MIN_ROSTER..=MAX_ROSTER).contains(&setup.size) {
            return Err(TransitionError::RosterSize {
                size: setup.size,
                min: MIN_ROSTER,
                max: MAX_ROSTER,
            });
        }
        let numbers = match &setup.numbers {
            Some(numbers) => {
                validate_numbers(numbers, setup.size)?;
                numbers.clone()
            }
            None => self.resized_numbers(setup.size),
        };

        let roster = numbers
            .iter()
            .enumerate()
            .map(|(i, &number)| match self.roster.get(i) {
                Some(existing) => Player {
                    number,
                    ..existing.clone()
                },
                None => Player::new(number),
            })
            .collect();

        self.name = setup.name.clone();
        self.color = setup.color.clone();
        self.roster = roster;
        Ok(())
    }

    /// Keep current numbers for surviving positions and fill the rest with the
    /// lowest unused numbers.
    fn resized_numbers(&self, size: usize) -> Vec<u16> {
        let mut numbers: Vec<u16> = self.roster.iter().take(size).map(|p| p.number).collect();
        let mut candidate = 1u16;
        while numbers.len() < size {
            if !numbers.contains(&candidate) {
                numbers.push(candidate);
            }
            candidate += 1;
        }
        numbers
    }

    /// Listed players go on court, everyone else still available goes to the
    /// bench. Excluded and expelled players are left alone. Returns the
    /// numbers whose state changed together with their previous state.
    pub fn designate_starters(
        &mut self,
        starters: &[u16],
        max_on_court: usize,
    ) -> Result<Vec<(u16, PlayerState, PlayerState)>, TransitionError> {
        for &number in starters {
            self.player(number)?;
        }
        let mut unique = starters.to_vec();
        unique.sort_unstable();
        unique.dedup();
        let placed = unique
            .iter()
            .filter(|&&n| {
                self.player(n)
                    .map(|p| p.eligible && matches!(p.state, PlayerState::Bench | PlayerState::Playing))
                    .unwrap_or(false)
            })
            .count();
        // Excluded players keep their place on court.
        let held = self.roster.iter().filter(|p| p.state == PlayerState::Excluded).count();
        if placed + held > max_on_court {
            return Err(TransitionError::TooManyStarters {
                got: placed + held,
                max: max_on_court,
            });
        }

        let mut changes = Vec::new();
        for player in &mut self.roster {
            if !matches!(player.state, PlayerState::Bench | PlayerState::Playing) {
                continue;
            }
            let next = if player.eligible && unique.contains(&player.number) {
                PlayerState::Playing
            } else {
                PlayerState::Bench
            };
            if next != player.state {
                changes.push((player.number, player.state, next));
                player.state = next;
            }
        }
        Ok(changes)
    }

    /// Everyone back on the bench with a clean record.
    pub fn reset(&mut self) {
        for player in &mut self.roster {
            *player = Player::new(player.number);
        }
    }
}

fn validate_numbers(numbers: &[u16], size: usize) -> Result<(), TransitionError> {
    if numbers.len() != size {
        return Err(TransitionError::NumberCount {
            expected: size,
            got: numbers.len(),
        });
    }
    for (i, &number) in numbers.iter().enumerate() {
        if number > MAX_JERSEY {
            return Err(TransitionError::NumberOutOfRange { number, max: MAX_JERSEY });
        }
        if numbers[..i].contains(&number) {
            return Err(TransitionError::DuplicateNumber { number });
        }
    }
    Ok(())
}
