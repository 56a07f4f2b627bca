use serde::{Deserialize, Serialize};

use crate::clock::format_clock;
use crate::types::{PenaltyKind, PenaltyRecord, TeamSide};

/// The penalty shown at the top of the board for a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPenalty {
    pub number: u16,
    pub remaining: u64,
}

impl TopPenalty {
    pub fn indicator(top: Option<TopPenalty>) -> String {
        match top {
            Some(t) if t.remaining > 0 => format!("#{} {}", t.number, format_clock(t.remaining as f64)),
            _ => "-".to_string(),
        }
    }
}

/// Append-only list of penalties for both teams. Records leave the active
/// set only by being consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyLedger {
    records: Vec<PenaltyRecord>,
}

impl PenaltyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PenaltyRecord] {
        &self.records
    }

    pub fn record(&mut self, side: TeamSide, number: u16, kind: PenaltyKind, start: f64, duration: f64) -> &PenaltyRecord {
        self.records.push(PenaltyRecord {
            side,
            number,
            kind,
            start,
            end: start + duration,
            consumed: false,
        });
        &self.records[self.records.len() - 1]
    }

    fn open(&self, side: TeamSide) -> impl Iterator<Item = (usize, &PenaltyRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.side == side && !r.consumed)
    }

    /// Earliest-ending open penalty that is still running at `elapsed`.
    pub fn top(&self, side: TeamSide, elapsed: f64) -> Option<TopPenalty> {
        self.open(side)
            .map(|(_, r)| r)
            .filter(|r| r.end > elapsed)
            .min_by(|a, b| a.end.total_cmp(&b.end))
            .map(|r| TopPenalty {
                number: r.number,
                remaining: (r.end - elapsed).round().max(0.0) as u64,
            })
    }

    pub fn is_active(&self, side: TeamSide, number: u16, elapsed: f64) -> bool {
        self.open(side).any(|(_, r)| r.number == number && r.end > elapsed)
    }

    /// Index of the earliest-ending open record for `number`, completed or not.
    pub fn earliest_for(&self, side: TeamSide, number: u16) -> Option<usize> {
        self.open(side)
            .filter(|(_, r)| r.number == number)
            .min_by(|(_, a), (_, b)| a.end.total_cmp(&b.end))
            .map(|(i, _)| i)
    }

    /// Index of the earliest completed open record accepted by `filter`.
    pub fn earliest_completed<F>(&self, side: TeamSide, elapsed: f64, filter: F) -> Option<usize>
    where
        F: Fn(&PenaltyRecord) -> bool,
    {
        self.open(side)
            .filter(|(_, r)| r.end <= elapsed && filter(r))
            .min_by(|(_, a), (_, b)| a.end.total_cmp(&b.end))
            .map(|(i, _)| i)
    }

    pub fn get(&self, index: usize) -> Option<&PenaltyRecord> {
        self.records.get(index)
    }

    pub fn consume(&mut self, index: usize) {
        if let Some(record) = self.records.get_mut(index) {
            record.consumed = true;
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
