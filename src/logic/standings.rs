//! Standings: league tables, bracket progress, and the hybrid nested view.
//! Only ENDED games count; all reads are pure.

use crate::logic::elimination::{resolve_participant, Resolved};
use crate::models::{Cup, CupFormat, Game, GameState, MatchId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One row of a league table. Win = 2 points, draw = 1, loss = 0.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LeagueRecord {
    pub team: String,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
}

impl LeagueRecord {
    fn new(team: String) -> Self {
        Self {
            team,
            won: 0,
            draw: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }
}

/// One finished tie from a team's perspective.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketResult {
    pub opponent: String,
    pub scored: u32,
    pub conceded: u32,
}

/// A team's progress through a knockout bracket: the furthest round it has a
/// concrete fixture in, the ties it won, and the tie that knocked it out.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketProgress {
    pub round: usize,
    pub won: Vec<BracketResult>,
    pub lost: Option<BracketResult>,
}

/// Standings in the shape appropriate for the tournament format.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Standings {
    /// League table, sorted by points then goal difference (stable beyond).
    League(Vec<LeagueRecord>),
    /// Knockout progress per team.
    Bracket(BTreeMap<String, BracketProgress>),
    /// Per-group tables plus playoff progress (empty until playoffs exist).
    Grouped {
        groups: BTreeMap<String, Vec<LeagueRecord>>,
        playoffs: BTreeMap<String, BracketProgress>,
    },
}

pub(crate) fn compute(cup: &Cup) -> Standings {
    match cup.format {
        CupFormat::League | CupFormat::LeagueDouble => {
            let teams: Vec<String> = cup.teams.iter().map(|t| t.name().to_string()).collect();
            Standings::League(table_for(&teams, cup.games.iter()))
        }
        CupFormat::Elimination | CupFormat::EliminationDouble => {
            Standings::Bracket(bracket_progress(cup, &cup.rounds))
        }
        CupFormat::Group | CupFormat::GroupDouble => {
            let mut groups = BTreeMap::new();
            for label in cup.groups.keys() {
                groups.insert(label.clone(), group_table(cup, label));
            }
            let playoffs = if cup.playoff_rounds.is_empty() {
                BTreeMap::new()
            } else {
                bracket_progress(cup, &cup.playoff_rounds)
            };
            Standings::Grouped { groups, playoffs }
        }
    }
}

/// League table for a single group.
pub(crate) fn group_table(cup: &Cup, label: &str) -> Vec<LeagueRecord> {
    let teams = cup.groups.get(label).cloned().unwrap_or_default();
    let games: Vec<&Game> = cup
        .group_games
        .get(label)
        .into_iter()
        .flatten()
        .filter_map(|id| cup.game(*id).ok())
        .collect();
    table_for(&teams, games.into_iter())
}

/// Accumulate a league table over the given games, then sort descending by
/// (points, goal difference). The sort is stable: teams level on both keep
/// their insertion order.
fn table_for<'a>(teams: &[String], games: impl Iterator<Item = &'a Game>) -> Vec<LeagueRecord> {
    let mut records: Vec<LeagueRecord> = teams
        .iter()
        .map(|name| LeagueRecord::new(name.clone()))
        .collect();
    let index: HashMap<&str, usize> = teams
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    for game in games {
        if game.state() != GameState::Ended {
            continue;
        }
        let (Some(home), Some(away)) = (game.home().name(), game.away().name()) else {
            continue;
        };
        let (Some(&home_idx), Some(&away_idx)) = (index.get(home), index.get(away)) else {
            continue;
        };
        let home_score = game.home_score();
        let away_score = game.away_score();

        records[home_idx].goals_for += home_score;
        records[home_idx].goals_against += away_score;
        records[away_idx].goals_for += away_score;
        records[away_idx].goals_against += home_score;

        if home_score > away_score {
            records[home_idx].won += 1;
            records[home_idx].points += 2;
            records[away_idx].lost += 1;
        } else if home_score < away_score {
            records[away_idx].won += 1;
            records[away_idx].points += 2;
            records[home_idx].lost += 1;
        } else {
            records[home_idx].draw += 1;
            records[home_idx].points += 1;
            records[away_idx].draw += 1;
            records[away_idx].points += 1;
        }
    }

    records.sort_by(|a, b| {
        (b.points, b.goal_difference()).cmp(&(a.points, a.goal_difference()))
    });
    records
}

/// Progress through a bracket. A game contributes only once both of its
/// slots resolve to concrete teams; results are recorded once it has ENDED.
/// Drawn single-leg games decide nothing and are skipped.
pub(crate) fn bracket_progress(
    cup: &Cup,
    rounds: &[Vec<MatchId>],
) -> BTreeMap<String, BracketProgress> {
    let mut standings: BTreeMap<String, BracketProgress> = BTreeMap::new();

    for (round_idx, ids) in rounds.iter().enumerate() {
        let round_num = round_idx + 1;
        for id in ids {
            let Ok(game) = cup.game(*id) else { continue };
            let home = resolve_participant(cup, game.home());
            let away = resolve_participant(cup, game.away());
            let (Resolved::Team(home_name), Resolved::Team(away_name)) = (home, away) else {
                continue;
            };

            standings.entry(home_name.clone()).or_default().round = round_num;
            standings.entry(away_name.clone()).or_default().round = round_num;

            if game.state() != GameState::Ended {
                continue;
            }
            let home_score = game.home_score();
            let away_score = game.away_score();
            let (winner, loser, winner_score, loser_score) = if home_score > away_score {
                (home_name, away_name, home_score, away_score)
            } else if away_score > home_score {
                (away_name, home_name, away_score, home_score)
            } else {
                continue;
            };

            if let Some(progress) = standings.get_mut(&winner) {
                progress.won.push(BracketResult {
                    opponent: loser.clone(),
                    scored: winner_score,
                    conceded: loser_score,
                });
            }
            if let Some(progress) = standings.get_mut(&loser) {
                progress.lost = Some(BracketResult {
                    opponent: winner.clone(),
                    scored: loser_score,
                    conceded: winner_score,
                });
            }
        }
    }

    standings
}
