//! Errors shared by games, cups, and the generation logic.

use crate::models::cup::CupFormat;
use crate::models::game::{GameState, MatchId};

/// Errors that can occur during game or tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// A lifecycle call that is not legal from the game's current state
    /// (e.g. `start()` while RUNNING, `score()` while PAUSED).
    InvalidTransition {
        action: &'static str,
        state: GameState,
    },
    /// `score()` named a team that is neither the home nor the away side.
    TeamNotInGame(String),
    /// A format tag that does not parse to a known tournament format.
    UnknownFormat(String),
    /// Team names must be non-empty.
    EmptyTeamName,
    /// Roster removal of a player the team does not have.
    PlayerNotFound { team: String, player: String },
    /// A tournament needs at least two entrants.
    NotEnoughTeams { required: usize, actual: usize },
    /// Group count of zero, above the team count, or past the A-Z labels.
    InvalidGroupCount { num_groups: usize, teams: usize },
    /// Playoff slots below two or above the team count.
    InvalidPlayoffSlots { slots: usize, teams: usize },
    /// `gametree()` on a format without round structure (plain league).
    GametreeUnavailable(CupFormat),
    /// `generate_playoffs()` on a tournament without a group stage.
    PlayoffsUnavailable(CupFormat),
    /// `generate_playoffs()` after the bracket was already generated.
    PlayoffsAlreadyGenerated,
    /// Lookup of a game id the cup does not own.
    GameNotFound(MatchId),
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InvalidTransition { action, state } => {
                let state_msg = match state {
                    GameState::Ready => "game has not started yet",
                    GameState::Running => "game is already running",
                    GameState::Paused => "game is paused",
                    GameState::Ended => "game has already ended",
                };
                write!(f, "Cannot {}: {}", action, state_msg)
            }
            TournamentError::TeamNotInGame(name) => {
                write!(f, "Team '{}' is not participating in this game", name)
            }
            TournamentError::UnknownFormat(tag) => write!(f, "Unknown cup format: {}", tag),
            TournamentError::EmptyTeamName => write!(f, "Team name cannot be empty"),
            TournamentError::PlayerNotFound { team, player } => {
                write!(f, "Player '{}' not found in team '{}'", player, team)
            }
            TournamentError::NotEnoughTeams { required, actual } => {
                write!(f, "Need at least {} teams, got {}", required, actual)
            }
            TournamentError::InvalidGroupCount { num_groups, teams } => {
                write!(f, "Cannot split {} teams into {} groups", teams, num_groups)
            }
            TournamentError::InvalidPlayoffSlots { slots, teams } => {
                write!(f, "Invalid playoff slot count {} for {} teams", slots, teams)
            }
            TournamentError::GametreeUnavailable(format) => {
                write!(f, "gametree() is not available for {} tournaments", format)
            }
            TournamentError::PlayoffsUnavailable(format) => {
                write!(f, "generate_playoffs() only works for group tournaments, not {}", format)
            }
            TournamentError::PlayoffsAlreadyGenerated => {
                write!(f, "Playoff bracket has already been generated")
            }
            TournamentError::GameNotFound(id) => {
                write!(f, "Game with ID {} not found in this cup", id)
            }
        }
    }
}

impl std::error::Error for TournamentError {}
