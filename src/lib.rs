//! Sports tournament engine: team rosters, a per-game state machine with
//! clock and scoring timeline, and a fixture/bracket engine covering
//! round-robin leagues, knockout brackets, and group-stage + playoff cups.

pub mod allocator;
pub mod logic;
pub mod models;

pub use allocator::{MatchIdAllocator, SequentialAllocator, SharedAllocator};
pub use logic::{
    round_robin_pairings, BracketProgress, BracketResult, GameTree, GameView, LeagueRecord,
    RoundView, ScoreView, Standings,
};
pub use models::{
    Cup, CupConfig, CupFormat, CupId, Game, GameObserver, GameState, GameStats, MatchId,
    Participant, SearchFilter, SharedObserver, Side, SideStats, Team, TimelineEntry,
    TournamentError,
};
