use serde::{Deserialize, Serialize};

use crate::board::{Board, PlayerReport};

/// One of the two teams on the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    A,
    B,
}

impl TeamSide {
    pub const ALL: [TeamSide; 2] = [TeamSide::A, TeamSide::B];

    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl std::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Where a player currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Bench,
    Playing,
    Excluded,
    Expelled,
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bench => write!(f, "bench"),
            Self::Playing => write!(f, "playing"),
            Self::Excluded => write!(f, "excluded"),
            Self::Expelled => write!(f, "expelled"),
        }
    }
}

/// A player on a team roster. Numbers are unique within a team only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub number: u16,
    pub state: PlayerState,
    pub eligible: bool,
    pub exclusions: u8,
}

impl Player {
    pub fn new(number: u16) -> Self {
        Self {
            number,
            state: PlayerState::Bench,
            eligible: true,
            exclusions: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    TwoMinutes,
    Expulsion,
}

/// A timed penalty written on exclusion or expulsion, in clock-elapsed seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub side: TeamSide,
    pub number: u16,
    pub kind: PenaltyKind,
    pub start: f64,
    pub end: f64,
    pub consumed: bool,
}

/// Requested shape of a team roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSetup {
    pub name: String,
    pub color: String,
    pub size: usize,
    #[serde(default)]
    pub numbers: Option<Vec<u16>>,
}

/// Game rules loaded from game.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rules {
    pub exclusion_seconds: f64,
    pub expulsion_penalty_seconds: f64,
    pub max_exclusions: u8,
    pub max_on_court: usize,
    pub default_roster_size: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            exclusion_seconds: 120.0,
            expulsion_penalty_seconds: 120.0,
            max_exclusions: 3,
            max_on_court: 7,
            default_roster_size: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDefaults {
    pub name: String,
    pub color: String,
}

/// Game configuration loaded from game.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub operator_password: String,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default = "GameConfig::default_teams")]
    pub teams: [TeamDefaults; 2],
    #[serde(default = "GameConfig::default_grace")]
    pub operator_grace_seconds: u64,
}

impl GameConfig {
    fn default_teams() -> [TeamDefaults; 2] {
        [
            TeamDefaults {
                name: "Equipe A".to_string(),
                color: "#16c1f3".to_string(),
            },
            TeamDefaults {
                name: "Equipe B".to_string(),
                color: "#11e5cf".to_string(),
            },
        ]
    }

    fn default_grace() -> u64 {
        600
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            operator_password: "PASSWORD".to_string(),
            rules: Rules::default(),
            teams: Self::default_teams(),
            operator_grace_seconds: Self::default_grace(),
        }
    }
}

/// Operator actions against a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    ClockStart,
    ClockPause,
    ClockToggle,
    ClockReset,
    Zero,
    ConfigureTeam {
        side: TeamSide,
        setup: TeamSetup,
    },
    SetStarters {
        side: TeamSide,
        numbers: Vec<u16>,
        #[serde(default)]
        retroactive: bool,
    },
    Substitute {
        side: TeamSide,
        player_out: u16,
        player_in: u16,
    },
    Exclude {
        side: TeamSide,
        number: u16,
    },
    Expel {
        side: TeamSide,
        number: u16,
    },
    CompleteReturn {
        side: TeamSide,
        number: u16,
    },
}

/// Messages sent from server to clients via WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMsg {
    SessionCreated {
        session_id: String,
        join_code: String,
    },
    SuccessJoin {
        session_id: String,
    },
    OperatorReconnected {
        session_id: String,
        board: Board,
    },
    Board {
        board: Board,
    },
    ActionOk {
        message: String,
    },
    ErrorMessage {
        message: String,
    },
    Report {
        rows: Vec<PlayerReport>,
    },
    TotalViewers {
        count: usize,
    },
    Reset {
        message: String,
    },
}

/// Messages sent from clients to server via WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    CreateSession { password: String },
    OperatorReconnect { session_id: String },
    ViewerJoin { join_code: String },
    Act { session_id: String, action: Action },
    RequestReport { session_id: String },
}
