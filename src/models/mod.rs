//! Data structures for the tournament engine: teams, games, cups, errors.

mod cup;
mod error;
mod game;
mod team;

pub use cup::{Cup, CupConfig, CupFormat, CupId, SearchFilter};
pub use error::TournamentError;
pub use game::{
    Game, GameObserver, GameState, GameStats, MatchId, SharedObserver, Side, SideStats,
    TimelineEntry,
};
pub use team::{Participant, Team};
