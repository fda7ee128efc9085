//! Round-structured views of a tournament, with winner-of slots resolved
//! where their source games have finished.

use crate::logic::elimination::{resolve_participant, round_names};
use crate::models::{Cup, Game, GameState, MatchId, TournamentError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final score of an ended game.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoreView {
    pub home: u32,
    pub away: u32,
}

/// One fixture in the tree. Unresolved bracket slots render as the literal
/// labels "Winner of Game <id>" / "Winner of Games [<a>, <b>]".
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub match_id: MatchId,
    pub home: String,
    pub away: String,
    pub datetime: String,
    pub state: GameState,
    pub score: Option<ScoreView>,
}

/// A named knockout round and its fixtures.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub name: String,
    pub games: Vec<GameView>,
}

/// The tree shape depends on the format: flat named rounds for knockouts,
/// groups plus a playoff bracket for hybrid tournaments. The playoff list is
/// empty until the bracket has been generated.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GameTree {
    Rounds(Vec<RoundView>),
    Grouped {
        groups: BTreeMap<String, Vec<GameView>>,
        playoffs: Vec<RoundView>,
    },
}

/// Build the game tree. Plain leagues have no round structure and error.
pub(crate) fn build(cup: &Cup) -> Result<GameTree, TournamentError> {
    if !cup.format.has_rounds() {
        return Err(TournamentError::GametreeUnavailable(cup.format));
    }
    if cup.format.has_groups() {
        let mut groups = BTreeMap::new();
        for (label, ids) in &cup.group_games {
            groups.insert(label.clone(), game_views(cup, ids));
        }
        Ok(GameTree::Grouped {
            groups,
            playoffs: round_views(cup, &cup.playoff_rounds),
        })
    } else {
        Ok(GameTree::Rounds(round_views(cup, &cup.rounds)))
    }
}

fn round_views(cup: &Cup, rounds: &[Vec<MatchId>]) -> Vec<RoundView> {
    let names = round_names(rounds.len());
    rounds
        .iter()
        .zip(names)
        .map(|(ids, name)| RoundView {
            name,
            games: game_views(cup, ids),
        })
        .collect()
}

fn game_views(cup: &Cup, ids: &[MatchId]) -> Vec<GameView> {
    ids.iter()
        .filter_map(|id| cup.game(*id).ok())
        .map(|game| game_view(cup, game))
        .collect()
}

fn game_view(cup: &Cup, game: &Game) -> GameView {
    let score = (game.state() == GameState::Ended).then(|| ScoreView {
        home: game.home_score(),
        away: game.away_score(),
    });
    GameView {
        match_id: game.id(),
        home: resolve_participant(cup, game.home()).into_label(),
        away: resolve_participant(cup, game.away()).into_label(),
        datetime: game.datetime().format("%Y-%m-%d %H:%M").to_string(),
        state: game.state(),
        score,
    }
}
