use serde::{Deserialize, Serialize};

use crate::clock::ClockSnapshot;
use crate::penalty::TopPenalty;
use crate::session::Session;
use crate::types::{PenaltyRecord, PlayerState, TeamSide};

/// Scoreboard header for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamBoard {
    pub side: TeamSide,
    pub name: String,
    pub color: String,
    pub top_penalty: Option<TopPenalty>,
    pub indicator: String,
    /// Running penalties, earliest end first.
    pub penalties: Vec<PenaltyRecord>,
    pub playing: Vec<u16>,
    pub bench: Vec<u16>,
    pub excluded: Vec<u16>,
    pub expelled: Vec<u16>,
}

/// Everything a viewer needs to draw the board. The clock snapshot is
/// extrapolated client-side; `server_now` lets clients correct for skew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub session_id: String,
    pub join_code: String,
    pub server_now: f64,
    pub elapsed: f64,
    pub clock: ClockSnapshot,
    pub teams: [TeamBoard; 2],
}

/// One row of the data view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub team: String,
    pub side: TeamSide,
    pub number: u16,
    pub state: PlayerState,
    pub exclusions: u8,
    pub penalty_active: bool,
    pub eligible: bool,
    pub played: f64,
    pub bench: f64,
    pub excluded: f64,
}

impl Board {
    pub fn build(session: &Session, session_id: &str, join_code: &str, now: f64) -> Self {
        let elapsed = session.elapsed(now);
        let teams = TeamSide::ALL.map(|side| {
            let team = session.team(side);
            let top = session.top_penalty(side, now);
            let mut penalties: Vec<PenaltyRecord> = session
                .penalties()
                .records()
                .iter()
                .filter(|r| r.side == side && !r.consumed && r.end > elapsed)
                .cloned()
                .collect();
            penalties.sort_by(|a, b| a.end.total_cmp(&b.end));
            TeamBoard {
                side,
                name: team.name.clone(),
                color: team.color.clone(),
                top_penalty: top,
                indicator: TopPenalty::indicator(top),
                penalties,
                playing: session.players_in(side, PlayerState::Playing),
                bench: session.players_in(side, PlayerState::Bench),
                excluded: team.all_in(PlayerState::Excluded),
                expelled: team.all_in(PlayerState::Expelled),
            }
        });
        Self {
            session_id: session_id.to_string(),
            join_code: join_code.to_string(),
            server_now: now,
            elapsed,
            clock: session.clock_snapshot(),
            teams,
        }
    }
}

pub fn report(session: &Session, now: f64) -> Vec<PlayerReport> {
    let mut rows = Vec::new();
    for side in TeamSide::ALL {
        let team = session.team(side);
        for player in &team.roster {
            let times = session.player_times(side, player.number, now);
            rows.push(PlayerReport {
                team: team.name.clone(),
                side,
                number: player.number,
                state: player.state,
                exclusions: player.exclusions,
                penalty_active: session.penalty_active(side, player.number, now),
                eligible: player.eligible,
                played: times.played,
                bench: times.bench,
                excluded: times.excluded,
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameConfig;

    #[test]
    fn board_shows_clock_and_penalty() {
        let mut session = Session::new(&GameConfig::default());
        session.designate_starters(TeamSide::A, &[1, 4], false, 0.0).unwrap();
        session.start_clock(100.0);
        session.exclude_two_minutes(TeamSide::A, 4, 110.0).unwrap();

        let board = Board::build(&session, "sid", "123456", 120.0);
        assert_eq!(board.elapsed, 20.0);
        assert_eq!(board.clock.elapsed_at(130.0), 30.0);
        let a = &board.teams[0];
        assert_eq!(a.name, "Equipe A");
        assert_eq!(a.indicator, "#4 01:50");
        assert_eq!(a.playing, vec![1]);
        assert_eq!(a.excluded, vec![4]);
        assert_eq!(a.penalties.len(), 1);
        assert_eq!(a.penalties[0].end, 130.0);
        assert_eq!(board.teams[1].indicator, "-");
        assert_eq!(board.teams[1].bench.len(), 7);
    }

    #[test]
    fn report_has_a_row_per_player() {
        let mut session = Session::new(&GameConfig::default());
        session.designate_starters(TeamSide::B, &[2], false, 0.0).unwrap();
        session.start_clock(0.0);
        session.exclude_two_minutes(TeamSide::B, 2, 30.0).unwrap();

        let rows = report(&session, 60.0);
        assert_eq!(rows.len(), 14);
        let row = rows.iter().find(|r| r.side == TeamSide::B && r.number == 2).unwrap();
        assert_eq!(row.team, "Equipe B");
        assert_eq!(row.state, PlayerState::Excluded);
        assert_eq!(row.exclusions, 1);
        assert!(row.penalty_active);
        assert!(row.eligible);
        assert_eq!((row.played, row.bench, row.excluded), (30.0, 0.0, 30.0));
    }
}
