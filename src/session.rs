//! The per-session aggregate: clock, both rosters, penalty ledger and the
//! time ledger. Every operation validates first and mutates only on success,
//! so a refused action leaves the session exactly as it was.

use crate::clock::{ClockSnapshot, GameClock, format_clock};
use crate::error::TransitionError;
use crate::penalty::{PenaltyLedger, TopPenalty};
use crate::roster::Team;
use crate::timeline::{PlayerTimes, Timeline};
use crate::types::{GameConfig, PenaltyKind, PlayerState, Rules, TeamSetup, TeamSide};

/// What an accepted operation did, worded for the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    ClockStarted,
    ClockPaused,
    ClockUnchanged { running: bool },
    ClockReset,
    GameZeroed,
    TeamConfigured { side: TeamSide },
    StartersSet { side: TeamSide, on_court: usize },
    Substituted { player_out: u16, player_in: u16 },
    Excluded { number: u16, count: u8, until: f64 },
    ExcludedOut { number: u16 },
    Expelled { number: u16 },
    Returned { number: u16 },
    SlotFilled { number: u16, slot_of: u16 },
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClockStarted => write!(f, "Clock started"),
            Self::ClockPaused => write!(f, "Clock paused"),
            Self::ClockUnchanged { running: true } => write!(f, "Clock already running"),
            Self::ClockUnchanged { running: false } => write!(f, "Clock already paused"),
            Self::ClockReset => write!(f, "Clock reset"),
            Self::GameZeroed => write!(f, "Game reset"),
            Self::TeamConfigured { side } => write!(f, "Team {side} saved"),
            Self::StartersSet { side, on_court } => write!(f, "Team {side}: {on_court} starters on court"),
            Self::Substituted { player_out, player_in } => {
                write!(f, "Substitution: out #{player_out} / in #{player_in}")
            }
            Self::Excluded { number, count, until } => {
                write!(f, "#{number} excluded for 2 minutes (exclusion {count}, until {})", format_clock(*until))
            }
            Self::ExcludedOut { number } => write!(f, "#{number} received the third exclusion and is out of the game"),
            Self::Expelled { number } => write!(f, "#{number} expelled"),
            Self::Returned { number } => write!(f, "#{number} returned"),
            Self::SlotFilled { number, slot_of } => write!(f, "#{number} entered for #{slot_of}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    rules: Rules,
    clock: GameClock,
    teams: [Team; 2],
    penalties: PenaltyLedger,
    timeline: Timeline,
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        let size = config.rules.default_roster_size;
        let teams = TeamSide::ALL.map(|side| {
            let defaults = &config.teams[side.index()];
            Team::new(side, &defaults.name, &defaults.color, size)
        });
        Self {
            rules: config.rules.clone(),
            clock: GameClock::new(),
            teams,
            penalties: PenaltyLedger::new(),
            timeline: Timeline::new(),
        }
    }

    pub fn team(&self, side: TeamSide) -> &Team {
        &self.teams[side.index()]
    }

    pub fn penalties(&self) -> &PenaltyLedger {
        &self.penalties
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    // ─── Clock ────────────────────────────────────────────────────

    pub fn elapsed(&self, now: f64) -> f64 {
        self.clock.elapsed(now)
    }

    pub fn clock_snapshot(&self) -> ClockSnapshot {
        self.clock.snapshot()
    }

    pub fn start_clock(&mut self, now: f64) -> Outcome {
        if self.clock.start(now) {
            Outcome::ClockStarted
        } else {
            Outcome::ClockUnchanged { running: true }
        }
    }

    pub fn pause_clock(&mut self, now: f64) -> Outcome {
        if self.clock.pause(now) {
            Outcome::ClockPaused
        } else {
            Outcome::ClockUnchanged { running: false }
        }
    }

    pub fn toggle_clock(&mut self, now: f64) -> Outcome {
        if self.clock.toggle(now) {
            Outcome::ClockStarted
        } else {
            Outcome::ClockPaused
        }
    }

    /// Clock back to zero. Rosters stay as they are; the time ledger starts a
    /// new epoch from the current states.
    pub fn reset_clock(&mut self) -> Outcome {
        self.clock.reset();
        let holding: Vec<(TeamSide, u16, PlayerState)> = self
            .teams
            .iter()
            .flat_map(|team| team.roster.iter().map(move |p| (team.side, p.number, p.state)))
            .collect();
        self.timeline.restart(holding);
        Outcome::ClockReset
    }

    /// Clock to zero, everyone back on the bench, ledgers emptied.
    pub fn zero(&mut self) -> Outcome {
        self.clock.reset();
        for team in &mut self.teams {
            team.reset();
        }
        self.penalties.clear();
        self.timeline.clear();
        Outcome::GameZeroed
    }

    // ─── Roster ───────────────────────────────────────────────────

    pub fn configure_team(&mut self, side: TeamSide, setup: &TeamSetup) -> Result<Outcome, TransitionError> {
        self.teams[side.index()].configure(setup)?;
        Ok(Outcome::TeamConfigured { side })
    }

    pub fn designate_starters(
        &mut self,
        side: TeamSide,
        numbers: &[u16],
        retroactive: bool,
        now: f64,
    ) -> Result<Outcome, TransitionError> {
        let at = self.clock.elapsed(now);
        let changes = self.teams[side.index()].designate_starters(numbers, self.rules.max_on_court)?;
        for (number, from, to) in changes {
            if retroactive && !self.timeline.has_entries(side, number) {
                self.timeline.push_retroactive(side, number, from, to);
            } else {
                self.timeline.push(side, number, from, to, at);
            }
        }
        Ok(Outcome::StartersSet {
            side,
            on_court: self.team(side).all_in(PlayerState::Playing).len(),
        })
    }

    /// Eligible players of `side` in `state`, sorted.
    pub fn players_in(&self, side: TeamSide, state: PlayerState) -> Vec<u16> {
        self.team(side).numbers_in(state)
    }

    // ─── Transitions ──────────────────────────────────────────────

    pub fn substitute(
        &mut self,
        side: TeamSide,
        player_out: u16,
        player_in: u16,
        now: f64,
    ) -> Result<Outcome, TransitionError> {
        if player_out == player_in {
            return Err(TransitionError::SamePlayer);
        }
        let team = self.team(side);
        let leaving = team.player(player_out)?;
        let entering = team.player(player_in)?;
        if leaving.state != PlayerState::Playing {
            return Err(TransitionError::NotPlaying { number: player_out });
        }
        if entering.state != PlayerState::Bench {
            return Err(TransitionError::NotOnBench { number: player_in });
        }
        if !entering.eligible {
            return Err(TransitionError::Ineligible { number: player_in });
        }

        let at = self.clock.elapsed(now);
        self.set_state(side, player_out, PlayerState::Bench, at)?;
        self.set_state(side, player_in, PlayerState::Playing, at)?;
        Ok(Outcome::Substituted { player_out, player_in })
    }

    /// Two-minute exclusion. Reaching the exclusion limit takes the player out
    /// of the game for good; the team still serves the two minutes.
    pub fn exclude_two_minutes(&mut self, side: TeamSide, number: u16, now: f64) -> Result<Outcome, TransitionError> {
        let player = self.team(side).player(number)?;
        if !player.eligible {
            return Err(TransitionError::Ineligible { number });
        }
        if player.state != PlayerState::Playing {
            return Err(TransitionError::NotPlaying { number });
        }

        let at = self.clock.elapsed(now);
        let max_exclusions = self.rules.max_exclusions;
        let player = self.teams[side.index()].player_mut(number)?;
        player.exclusions = player.exclusions.saturating_add(1);
        let count = player.exclusions;
        let out_of_game = count >= max_exclusions;
        if out_of_game {
            player.eligible = false;
        }
        let next = if out_of_game { PlayerState::Expelled } else { PlayerState::Excluded };
        self.set_state(side, number, next, at)?;
        let until = self
            .penalties
            .record(side, number, PenaltyKind::TwoMinutes, at, self.rules.exclusion_seconds)
            .end;

        if out_of_game {
            Ok(Outcome::ExcludedOut { number })
        } else {
            Ok(Outcome::Excluded { number, count, until })
        }
    }

    pub fn expel(&mut self, side: TeamSide, number: u16, now: f64) -> Result<Outcome, TransitionError> {
        let player = self.team(side).player(number)?;
        if !player.eligible {
            return Err(TransitionError::Ineligible { number });
        }
        // An excluded player's running penalty already stands for the empty place.
        let holds_record = player.state == PlayerState::Excluded && self.penalties.earliest_for(side, number).is_some();

        let at = self.clock.elapsed(now);
        self.teams[side.index()].player_mut(number)?.eligible = false;
        self.set_state(side, number, PlayerState::Expelled, at)?;
        if !holds_record {
            self.penalties
                .record(side, number, PenaltyKind::Expulsion, at, self.rules.expulsion_penalty_seconds);
        }
        Ok(Outcome::Expelled { number })
    }

    /// Let a player back on court once a penalty has run out on the game
    /// clock. An excluded player needs their own completed penalty; a bench
    /// player may take a completed slot left by someone who cannot return,
    /// as long as the court is not already full.
    pub fn complete_return(&mut self, side: TeamSide, number: u16, now: f64) -> Result<Outcome, TransitionError> {
        let elapsed = self.clock.elapsed(now);
        let team = self.team(side);
        let player = team.player(number)?;
        if !player.eligible {
            return Err(TransitionError::Ineligible { number });
        }

        let (index, outcome) = match player.state {
            PlayerState::Playing => return Err(TransitionError::AlreadyPlaying { number }),
            PlayerState::Expelled => {
                return Err(TransitionError::CannotReturn {
                    number,
                    state: PlayerState::Expelled,
                });
            }
            PlayerState::Excluded => {
                let index = self
                    .penalties
                    .earliest_for(side, number)
                    .ok_or(TransitionError::NoPenalty { number })?;
                let end = self.penalties.get(index).map(|r| r.end).unwrap_or(f64::INFINITY);
                if end > elapsed {
                    let remaining = (end - elapsed).ceil();
                    return Err(TransitionError::PenaltyNotCompleted {
                        number,
                        remaining: if remaining.is_finite() { remaining as u64 } else { u64::MAX },
                    });
                }
                (index, Outcome::Returned { number })
            }
            PlayerState::Bench => {
                let held = team.all_in(PlayerState::Playing).len() + team.all_in(PlayerState::Excluded).len();
                if held >= self.rules.max_on_court {
                    return Err(TransitionError::CourtFull {
                        side,
                        max: self.rules.max_on_court,
                    });
                }
                let index = self
                    .penalties
                    .earliest_completed(side, elapsed, |r| {
                        team.player(r.number)
                            .map(|p| p.state != PlayerState::Excluded)
                            .unwrap_or(true)
                    })
                    .ok_or(TransitionError::NoOpenSlot { side })?;
                let slot_of = self.penalties.get(index).map(|r| r.number).unwrap_or(number);
                (index, Outcome::SlotFilled { number, slot_of })
            }
        };

        self.penalties.consume(index);
        self.set_state(side, number, PlayerState::Playing, elapsed)?;
        Ok(outcome)
    }

    fn set_state(&mut self, side: TeamSide, number: u16, to: PlayerState, at: f64) -> Result<(), TransitionError> {
        let player = self.teams[side.index()].player_mut(number)?;
        let from = player.state;
        if from == to {
            return Ok(());
        }
        player.state = to;
        self.timeline.push(side, number, from, to, at);
        Ok(())
    }

    // ─── Queries ──────────────────────────────────────────────────

    pub fn top_penalty(&self, side: TeamSide, now: f64) -> Option<TopPenalty> {
        self.penalties.top(side, self.clock.elapsed(now))
    }

    pub fn penalty_active(&self, side: TeamSide, number: u16, now: f64) -> bool {
        self.penalties.is_active(side, number, self.clock.elapsed(now))
    }

    pub fn player_times(&self, side: TeamSide, number: u16, now: f64) -> PlayerTimes {
        self.timeline.player_times(side, number, self.clock.elapsed(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PenaltyRecord;

    const T0: f64 = 1_000.0;

    fn session() -> Session {
        Session::new(&GameConfig::default())
    }

    fn state_of(session: &Session, side: TeamSide, number: u16) -> PlayerState {
        session.team(side).player(number).unwrap().state
    }

    /// Team A with players 1..=7 and #4 on court, clock running from T0.
    fn live_session() -> Session {
        let mut s = session();
        s.designate_starters(TeamSide::A, &[4], false, T0).unwrap();
        s.start_clock(T0);
        s
    }

    #[test]
    fn example_exclusion_and_return() {
        let mut s = live_session();

        let outcome = s.exclude_two_minutes(TeamSide::A, 4, T0 + 10.0).unwrap();
        assert_eq!(outcome, Outcome::Excluded { number: 4, count: 1, until: 130.0 });
        assert_eq!(state_of(&s, TeamSide::A, 4), PlayerState::Excluded);
        assert_eq!(
            s.penalties().records(),
            &[PenaltyRecord {
                side: TeamSide::A,
                number: 4,
                kind: PenaltyKind::TwoMinutes,
                start: 10.0,
                end: 130.0,
                consumed: false,
            }]
        );

        assert_eq!(
            s.complete_return(TeamSide::A, 4, T0 + 100.0),
            Err(TransitionError::PenaltyNotCompleted { number: 4, remaining: 30 })
        );
        assert_eq!(state_of(&s, TeamSide::A, 4), PlayerState::Excluded);

        assert_eq!(s.complete_return(TeamSide::A, 4, T0 + 140.0), Ok(Outcome::Returned { number: 4 }));
        assert_eq!(state_of(&s, TeamSide::A, 4), PlayerState::Playing);
        assert!(s.penalties().records()[0].consumed);
    }

    #[test]
    fn return_follows_game_clock_not_wall_clock() {
        let mut s = live_session();
        s.exclude_two_minutes(TeamSide::A, 4, T0 + 10.0).unwrap();
        s.pause_clock(T0 + 60.0);
        // Wall clock moves on, game clock does not.
        assert!(matches!(
            s.complete_return(TeamSide::A, 4, T0 + 1_000.0),
            Err(TransitionError::PenaltyNotCompleted { remaining: 70, .. })
        ));
        s.start_clock(T0 + 2_000.0);
        assert!(s.complete_return(TeamSide::A, 4, T0 + 2_070.0).is_ok());
    }

    #[test]
    fn third_exclusion_is_terminal() {
        let mut s = live_session();
        let mut t = T0;
        for round in 1..=3u8 {
            t += 10.0;
            let outcome = s.exclude_two_minutes(TeamSide::A, 4, t).unwrap();
            if round < 3 {
                assert_eq!(outcome, Outcome::Excluded { number: 4, count: round, until: t - T0 + 120.0 });
                t += 120.0;
                s.complete_return(TeamSide::A, 4, t).unwrap();
            } else {
                assert_eq!(outcome, Outcome::ExcludedOut { number: 4 });
            }
        }

        let player = s.team(TeamSide::A).player(4).unwrap();
        assert_eq!(player.state, PlayerState::Expelled);
        assert!(!player.eligible);
        assert_eq!(player.exclusions, 3);

        t += 500.0;
        assert_eq!(
            s.complete_return(TeamSide::A, 4, t),
            Err(TransitionError::Ineligible { number: 4 })
        );
        s.designate_starters(TeamSide::A, &[1], false, t).unwrap();
        assert_eq!(
            s.substitute(TeamSide::A, 1, 4, t),
            Err(TransitionError::NotOnBench { number: 4 })
        );
        assert_eq!(
            s.exclude_two_minutes(TeamSide::A, 4, t),
            Err(TransitionError::Ineligible { number: 4 })
        );
        assert_eq!(state_of(&s, TeamSide::A, 4), PlayerState::Expelled);
    }

    #[test]
    fn substitution_rules() {
        let mut s = live_session();
        let t = T0 + 5.0;
        assert_eq!(s.substitute(TeamSide::A, 4, 4, t), Err(TransitionError::SamePlayer));
        assert_eq!(s.substitute(TeamSide::A, 2, 3, t), Err(TransitionError::NotPlaying { number: 2 }));
        assert_eq!(
            s.substitute(TeamSide::A, 4, 99, t),
            Err(TransitionError::PlayerNotFound { side: TeamSide::A, number: 99 })
        );

        assert_eq!(
            s.substitute(TeamSide::A, 4, 5, t),
            Ok(Outcome::Substituted { player_out: 4, player_in: 5 })
        );
        assert_eq!(state_of(&s, TeamSide::A, 4), PlayerState::Bench);
        assert_eq!(state_of(&s, TeamSide::A, 5), PlayerState::Playing);

        s.designate_starters(TeamSide::A, &[5, 6], false, t).unwrap();
        assert_eq!(s.substitute(TeamSide::A, 5, 6, t), Err(TransitionError::NotOnBench { number: 6 }));
    }

    #[test]
    fn failed_operations_do_not_mutate() {
        let mut s = live_session();
        s.exclude_two_minutes(TeamSide::A, 4, T0 + 1.0).unwrap();
        let before_team = s.team(TeamSide::A).clone();
        let before_ledger = s.penalties().clone();
        let before_timeline = s.timeline().clone();

        assert!(s.substitute(TeamSide::A, 4, 5, T0 + 2.0).is_err());
        assert!(s.exclude_two_minutes(TeamSide::A, 4, T0 + 3.0).is_err());
        assert!(s.complete_return(TeamSide::A, 4, T0 + 4.0).is_err());
        assert!(s.complete_return(TeamSide::A, 5, T0 + 4.0).is_err());

        assert_eq!(s.team(TeamSide::A), &before_team);
        assert_eq!(s.penalties(), &before_ledger);
        assert_eq!(s.timeline(), &before_timeline);
    }

    #[test]
    fn exclusion_requires_playing() {
        let mut s = live_session();
        assert_eq!(
            s.exclude_two_minutes(TeamSide::A, 2, T0 + 1.0),
            Err(TransitionError::NotPlaying { number: 2 })
        );
    }

    #[test]
    fn expulsion_opens_a_slot_for_the_bench() {
        let mut s = live_session();
        assert_eq!(s.expel(TeamSide::A, 4, T0 + 20.0), Ok(Outcome::Expelled { number: 4 }));
        let player = s.team(TeamSide::A).player(4).unwrap();
        assert_eq!(player.state, PlayerState::Expelled);
        assert!(!player.eligible);
        assert_eq!(s.penalties().records()[0].kind, PenaltyKind::Expulsion);
        assert_eq!(s.expel(TeamSide::A, 4, T0 + 21.0), Err(TransitionError::Ineligible { number: 4 }));

        assert_eq!(
            s.complete_return(TeamSide::A, 6, T0 + 100.0),
            Err(TransitionError::NoOpenSlot { side: TeamSide::A })
        );
        assert_eq!(
            s.complete_return(TeamSide::A, 6, T0 + 140.0),
            Ok(Outcome::SlotFilled { number: 6, slot_of: 4 })
        );
        assert_eq!(state_of(&s, TeamSide::A, 6), PlayerState::Playing);
        assert_eq!(
            s.complete_return(TeamSide::A, 7, T0 + 150.0),
            Err(TransitionError::NoOpenSlot { side: TeamSide::A })
        );
    }

    #[test]
    fn bench_player_cannot_take_a_returning_players_slot() {
        let mut s = live_session();
        s.exclude_two_minutes(TeamSide::A, 4, T0 + 10.0).unwrap();
        assert_eq!(
            s.complete_return(TeamSide::A, 5, T0 + 200.0),
            Err(TransitionError::NoOpenSlot { side: TeamSide::A })
        );
        assert!(s.complete_return(TeamSide::A, 4, T0 + 200.0).is_ok());
        assert_eq!(
            s.complete_return(TeamSide::A, 4, T0 + 201.0),
            Err(TransitionError::AlreadyPlaying { number: 4 })
        );
    }

    #[test]
    fn slots_never_put_more_than_the_cap_on_court() {
        let mut s = session();
        s.configure_team(TeamSide::A, &TeamSetup {
            name: "Equipe A".to_string(),
            color: "#16c1f3".to_string(),
            size: 11,
            numbers: None,
        })
        .unwrap();
        s.designate_starters(TeamSide::A, &[1, 2, 3, 4, 5, 6, 7], false, T0).unwrap();
        s.start_clock(T0);

        s.expel(TeamSide::A, 8, T0 + 5.0).unwrap();
        s.exclude_two_minutes(TeamSide::A, 7, T0 + 10.0).unwrap();
        s.expel(TeamSide::A, 7, T0 + 20.0).unwrap();
        // #7 keeps the two-minute record it was already serving.
        assert_eq!(s.penalties().records().len(), 2);
        assert_eq!(s.penalties().records()[1].kind, PenaltyKind::TwoMinutes);

        assert_eq!(
            s.complete_return(TeamSide::A, 9, T0 + 200.0),
            Ok(Outcome::SlotFilled { number: 9, slot_of: 8 })
        );
        assert_eq!(
            s.complete_return(TeamSide::A, 10, T0 + 200.0),
            Err(TransitionError::CourtFull { side: TeamSide::A, max: 7 })
        );
        assert_eq!(
            s.complete_return(TeamSide::A, 11, T0 + 200.0),
            Err(TransitionError::CourtFull { side: TeamSide::A, max: 7 })
        );
        assert_eq!(s.team(TeamSide::A).all_in(PlayerState::Playing), vec![1, 2, 3, 4, 5, 6, 9]);
    }

    #[test]
    fn excluded_player_keeps_their_place() {
        let mut s = session();
        s.configure_team(TeamSide::A, &TeamSetup {
            name: "Equipe A".to_string(),
            color: "#16c1f3".to_string(),
            size: 9,
            numbers: None,
        })
        .unwrap();
        s.designate_starters(TeamSide::A, &[1, 2, 3, 4, 5, 6, 7], false, T0).unwrap();
        s.start_clock(T0);
        s.expel(TeamSide::A, 8, T0 + 1.0).unwrap();
        s.exclude_two_minutes(TeamSide::A, 7, T0 + 2.0).unwrap();

        // Six on court, but #7 comes back.
        assert_eq!(
            s.complete_return(TeamSide::A, 9, T0 + 200.0),
            Err(TransitionError::CourtFull { side: TeamSide::A, max: 7 })
        );
        assert!(matches!(
            s.designate_starters(TeamSide::A, &[1, 2, 3, 4, 5, 6, 9], false, T0 + 200.0),
            Err(TransitionError::TooManyStarters { got: 8, max: 7 })
        ));
        assert_eq!(s.complete_return(TeamSide::A, 7, T0 + 200.0), Ok(Outcome::Returned { number: 7 }));
    }

    #[test]
    fn clock_reset_restarts_time_ledger_from_current_states() {
        let mut s = session();
        s.designate_starters(TeamSide::A, &[1, 2], false, T0).unwrap();
        s.start_clock(T0);
        s.substitute(TeamSide::A, 2, 3, T0 + 300.0).unwrap();
        s.pause_clock(T0 + 400.0);
        s.reset_clock();
        s.start_clock(T0 + 1_000.0);

        let two = s.player_times(TeamSide::A, 2, T0 + 1_050.0);
        assert_eq!(two, PlayerTimes { played: 0.0, bench: 50.0, excluded: 0.0 });
        let three = s.player_times(TeamSide::A, 3, T0 + 1_050.0);
        assert_eq!(three, PlayerTimes { played: 50.0, bench: 0.0, excluded: 0.0 });
        assert_eq!(state_of(&s, TeamSide::A, 3), PlayerState::Playing);
    }

    #[test]
    fn teams_are_independent() {
        let mut s = live_session();
        s.designate_starters(TeamSide::B, &[4], false, T0).unwrap();
        s.exclude_two_minutes(TeamSide::A, 4, T0 + 10.0).unwrap();
        assert_eq!(state_of(&s, TeamSide::B, 4), PlayerState::Playing);
        assert_eq!(s.top_penalty(TeamSide::B, T0 + 11.0), None);
        assert_eq!(
            s.top_penalty(TeamSide::A, T0 + 11.0),
            Some(TopPenalty { number: 4, remaining: 119 })
        );
        assert!(s.penalty_active(TeamSide::A, 4, T0 + 11.0));
        assert!(!s.penalty_active(TeamSide::A, 4, T0 + 131.0));
    }

    #[test]
    fn zero_resets_everything() {
        let mut s = live_session();
        s.exclude_two_minutes(TeamSide::A, 4, T0 + 10.0).unwrap();
        assert_eq!(s.zero(), Outcome::GameZeroed);
        assert!(!s.clock_snapshot().running);
        assert_eq!(s.elapsed(T0 + 500.0), 0.0);
        assert!(s.penalties().records().is_empty());
        assert!(s.timeline().changes().is_empty());
        let player = s.team(TeamSide::A).player(4).unwrap();
        assert_eq!((player.state, player.exclusions, player.eligible), (PlayerState::Bench, 0, true));
    }

    #[test]
    fn clock_outcomes() {
        let mut s = session();
        assert_eq!(s.pause_clock(0.0), Outcome::ClockUnchanged { running: false });
        assert_eq!(s.start_clock(0.0), Outcome::ClockStarted);
        assert_eq!(s.start_clock(1.0), Outcome::ClockUnchanged { running: true });
        assert_eq!(s.toggle_clock(5.0), Outcome::ClockPaused);
        assert_eq!(s.elapsed(50.0), 5.0);
        assert_eq!(s.reset_clock(), Outcome::ClockReset);
        assert_eq!(s.elapsed(50.0), 0.0);
    }

    #[test]
    fn time_ledger_tracks_play_and_retroactive_starters() {
        let mut s = session();
        s.start_clock(T0);
        s.designate_starters(TeamSide::A, &[1, 2], true, T0 + 30.0).unwrap();
        s.substitute(TeamSide::A, 2, 3, T0 + 60.0).unwrap();

        let one = s.player_times(TeamSide::A, 1, T0 + 90.0);
        assert_eq!(one, PlayerTimes { played: 90.0, bench: 0.0, excluded: 0.0 });
        let two = s.player_times(TeamSide::A, 2, T0 + 90.0);
        assert_eq!(two, PlayerTimes { played: 60.0, bench: 30.0, excluded: 0.0 });
        let three = s.player_times(TeamSide::A, 3, T0 + 90.0);
        assert_eq!(three, PlayerTimes { played: 30.0, bench: 60.0, excluded: 0.0 });

        // Live designation counts from the moment it happens.
        s.designate_starters(TeamSide::B, &[5], false, T0 + 30.0).unwrap();
        let five = s.player_times(TeamSide::B, 5, T0 + 90.0);
        assert_eq!(five, PlayerTimes { played: 60.0, bench: 30.0, excluded: 0.0 });
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            Outcome::Excluded { number: 4, count: 1, until: 130.0 }.to_string(),
            "#4 excluded for 2 minutes (exclusion 1, until 02:10)"
        );
        assert_eq!(
            Outcome::Substituted { player_out: 4, player_in: 5 }.to_string(),
            "Substitution: out #4 / in #5"
        );
        assert_eq!(
            TransitionError::PenaltyNotCompleted { number: 4, remaining: 30 }.to_string(),
            "2 minutes for #4 not completed yet (30s left)"
        );
    }
}
