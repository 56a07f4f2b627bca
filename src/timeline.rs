use serde::{Deserialize, Serialize};

use crate::types::{PlayerState, TeamSide};

/// One player state change, stamped with clock-elapsed seconds. `epoch`
/// counts clock resets; `at` is only comparable within one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub seq: u64,
    pub epoch: u32,
    pub side: TeamSide,
    pub number: u16,
    pub from: PlayerState,
    pub to: PlayerState,
    pub at: f64,
    pub retroactive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerTimes {
    pub played: f64,
    pub bench: f64,
    pub excluded: f64,
}

impl PlayerTimes {
    fn add(&mut self, state: PlayerState, seconds: f64) {
        match state {
            PlayerState::Playing => self.played += seconds,
            PlayerState::Bench => self.bench += seconds,
            PlayerState::Excluded => self.excluded += seconds,
            PlayerState::Expelled => {}
        }
    }
}

/// Append-only log of player state changes. Totals are always derived from
/// it; corrections are new entries, never edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    changes: Vec<StateChange>,
    next_seq: u64,
    epoch: u32,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> &[StateChange] {
        &self.changes
    }

    pub fn has_entries(&self, side: TeamSide, number: u16) -> bool {
        self.current().any(|c| c.side == side && c.number == number)
    }

    pub fn push(&mut self, side: TeamSide, number: u16, from: PlayerState, to: PlayerState, at: f64) {
        self.append(side, number, from, to, at, false);
    }

    /// Record a change as if it had happened at kick-off.
    pub fn push_retroactive(&mut self, side: TeamSide, number: u16, from: PlayerState, to: PlayerState) {
        self.append(side, number, from, to, 0.0, true);
    }

    fn append(&mut self, side: TeamSide, number: u16, from: PlayerState, to: PlayerState, at: f64, retroactive: bool) {
        self.changes.push(StateChange {
            seq: self.next_seq,
            epoch: self.epoch,
            side,
            number,
            from,
            to,
            at: at.max(0.0),
            retroactive,
        });
        self.next_seq += 1;
    }

    /// Seconds spent per state up to `elapsed`. Players start on the bench.
    pub fn player_times(&self, side: TeamSide, number: u16, elapsed: f64) -> PlayerTimes {
        let mut entries: Vec<&StateChange> = self
            .current()
            .filter(|c| c.side == side && c.number == number && c.at <= elapsed)
            .collect();
        entries.sort_by(|a, b| a.at.total_cmp(&b.at).then(a.seq.cmp(&b.seq)));

        let mut times = PlayerTimes::default();
        let mut state = PlayerState::Bench;
        let mut since = 0.0;
        for change in entries {
            times.add(state, change.at - since);
            state = change.to;
            since = change.at;
        }
        times.add(state, (elapsed - since).max(0.0));
        times
    }

    /// Start a new epoch after the clock went back to zero. Everyone not on
    /// the bench gets a marker at 0 so their totals restart from the state
    /// they are actually in.
    pub fn restart<I>(&mut self, holding: I)
    where
        I: IntoIterator<Item = (TeamSide, u16, PlayerState)>,
    {
        self.epoch += 1;
        for (side, number, state) in holding {
            if state != PlayerState::Bench {
                self.append(side, number, state, state, 0.0, false);
            }
        }
    }

    fn current(&self) -> impl Iterator<Item = &StateChange> {
        self.changes.iter().filter(move |c| c.epoch == self.epoch)
    }

    pub fn clear(&mut self) {
        self.changes.clear();
        self.epoch = 0;
    }
}
