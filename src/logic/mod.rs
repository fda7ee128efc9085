//! Tournament logic: fixture generation, brackets, standings, game trees.

pub mod elimination;
pub mod gametree;
pub mod groups;
pub mod round_robin;
pub mod standings;

pub use gametree::{GameTree, GameView, RoundView, ScoreView};
pub use round_robin::round_robin_pairings;
pub use standings::{BracketProgress, BracketResult, LeagueRecord, Standings};
