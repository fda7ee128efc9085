//! Elimination brackets: builder, byes, round names, placeholder resolution.

use crate::models::{Cup, Game, GameState, MatchId, Participant, Side, Team};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Generate the complete knockout bracket for an elimination cup.
pub(crate) fn generate_elimination(cup: &mut Cup, double: bool) {
    let mut entrants: Vec<Participant> = cup
        .teams
        .iter()
        .cloned()
        .map(Participant::Team)
        .collect();
    entrants.shuffle(&mut rand::thread_rng());
    cup.rounds = build_bracket(cup, entrants, double);
    log::debug!(
        "generated elimination bracket: {} rounds, {} games",
        cup.rounds.len(),
        cup.games.len()
    );
}

/// Build every round of a knockout bracket from the seeded entrant list.
///
/// Odd entrant counts drop the last entrant as a bye; it re-enters at the
/// head of the next round. Later rounds pair `Participant::Winner` slots
/// carrying the source game id(s) of each tie (two ids per two-leg tie).
/// The loop stops when a single slot remains - the champion slot, which is
/// never instantiated as a game.
pub(crate) fn build_bracket(
    cup: &mut Cup,
    mut entrants: Vec<Participant>,
    double: bool,
) -> Vec<Vec<MatchId>> {
    let mut rounds: Vec<Vec<MatchId>> = Vec::new();
    if entrants.len() < 2 {
        return rounds;
    }

    let mut bye: Option<Participant> = None;
    if entrants.len() % 2 == 1 {
        bye = entrants.pop();
        if let Some(lucky) = &bye {
            log::debug!("{} has a bye (advances without playing)", lucky.display_name());
        }
    }

    let first_round = create_round(cup, entrants, double, true);
    rounds.push(first_round);

    let mut next_entrants: Vec<Participant> = Vec::new();
    if let Some(lucky) = bye.take() {
        next_entrants.push(lucky);
    }
    if let Some(latest) = rounds.last() {
        next_entrants.extend(winner_slots(latest, double));
    }

    while next_entrants.len() > 1 {
        let mut round_bye: Option<Participant> = None;
        if next_entrants.len() % 2 == 1 {
            round_bye = next_entrants.pop();
            if let Some(lucky) = &round_bye {
                log::debug!("{} has a bye in this round", lucky.display_name());
            }
        }

        let round = create_round(cup, next_entrants, double, false);
        rounds.push(round);

        next_entrants = Vec::new();
        if let Some(lucky) = round_bye {
            next_entrants.push(lucky);
        }
        if let Some(latest) = rounds.last() {
            next_entrants.extend(winner_slots(latest, double));
        }
    }

    rounds
}

/// Create the games for one round: consecutive entrants pair up, two-leg
/// ties add a mirrored second leg. Rounds after the first start two
/// intervals after the previous round.
fn create_round(
    cup: &mut Cup,
    entrants: Vec<Participant>,
    double: bool,
    is_first_round: bool,
) -> Vec<MatchId> {
    if !is_first_round {
        cup.next_date = cup.next_date + cup.config.interval * 2;
    }
    let mut date = cup.next_date;
    let mut ids = Vec::new();

    for tie in entrants.chunks(2) {
        let [home, away] = tie else { continue };
        if double {
            ids.push(cup.register_game(home.clone(), away.clone(), date, None));
            date = date + cup.config.interval;
            ids.push(cup.register_game(away.clone(), home.clone(), date, None));
        } else {
            ids.push(cup.register_game(home.clone(), away.clone(), date, None));
        }
        date = date + cup.config.interval;
    }

    ids
}

/// Winner placeholders for the next round: one per game (single-leg) or one
/// per pair of legs (two-leg ties).
fn winner_slots(round: &[MatchId], double: bool) -> Vec<Participant> {
    let legs_per_tie = if double { 2 } else { 1 };
    round
        .chunks(legs_per_tie)
        .map(|legs| Participant::Winner(legs.to_vec()))
        .collect()
}

/// Conventional names for knockout rounds, derived from the round count.
pub(crate) fn round_names(total_rounds: usize) -> Vec<String> {
    let canonical = [
        "Round of 32",
        "Round of 16",
        "Quarter-Final",
        "Semi-Final",
        "Final",
    ];
    if total_rounds == 0 {
        return Vec::new();
    }
    if total_rounds <= canonical.len() {
        return canonical[canonical.len() - total_rounds..]
            .iter()
            .map(|name| name.to_string())
            .collect();
    }
    // Very large brackets: generic early rounds before the last three names.
    let mut names: Vec<String> = (1..=total_rounds - 3)
        .map(|round| format!("Round {}", round))
        .collect();
    names.extend(
        ["Quarter-Final", "Semi-Final", "Final"]
            .iter()
            .map(|name| name.to_string()),
    );
    names
}

/// Outcome of asking "who is really in this slot".
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Resolved {
    /// A concrete team name.
    Team(String),
    /// Not decidable yet; carries the literal "Winner of ..." label.
    Pending(String),
}

impl Resolved {
    pub(crate) fn into_label(self) -> String {
        match self {
            Resolved::Team(name) | Resolved::Pending(name) => name,
        }
    }
}

/// Resolve a bracket slot. A single-source slot resolves through the winner
/// of its ENDED source game (recursively); a two-source slot resolves only
/// when both legs have ENDED, on aggregate score matched by team identity.
/// Drawn games and level aggregates stay pending.
pub(crate) fn resolve_participant(cup: &Cup, participant: &Participant) -> Resolved {
    match participant {
        Participant::Team(team) => Resolved::Team(team.name().to_string()),
        Participant::Winner(sources) => match sources.as_slice() {
            [single] => resolve_single(cup, *single, participant),
            [first, second] => resolve_aggregate(cup, *first, *second, participant),
            _ => Resolved::Pending(participant.display_name()),
        },
    }
}

fn resolve_single(cup: &Cup, source: MatchId, slot: &Participant) -> Resolved {
    let pending = || Resolved::Pending(slot.display_name());
    let Ok(game) = cup.game(source) else {
        return pending();
    };
    if game.state() != GameState::Ended {
        return pending();
    }
    match game_winner(game) {
        Some(winner) => resolve_participant(cup, winner),
        None => pending(), // drawn: undecidable
    }
}

fn resolve_aggregate(
    cup: &Cup,
    first: MatchId,
    second: MatchId,
    slot: &Participant,
) -> Resolved {
    let pending = || Resolved::Pending(slot.display_name());
    let (Ok(leg1), Ok(leg2)) = (cup.game(first), cup.game(second)) else {
        return pending();
    };
    if leg1.state() != GameState::Ended || leg2.state() != GameState::Ended {
        return pending();
    }

    // Aggregate by participant identity, not by home/away side: the return
    // leg swaps sides, and either slot may itself still be a placeholder.
    let side_a = leg1.home();
    let side_b = leg1.away();
    let mut total_a = leg1.home_score();
    let mut total_b = leg1.away_score();

    if leg2.home() == side_a {
        total_a += leg2.home_score();
    } else if leg2.away() == side_a {
        total_a += leg2.away_score();
    }
    if leg2.home() == side_b {
        total_b += leg2.home_score();
    } else if leg2.away() == side_b {
        total_b += leg2.away_score();
    }

    if total_a > total_b {
        resolve_participant(cup, side_a)
    } else if total_b > total_a {
        resolve_participant(cup, side_b)
    } else {
        pending() // level on aggregate: undecidable
    }
}

/// Advance winners through the bracket: for every READY game holding a
/// pending slot whose source games have now ENDED, swap in the resolved
/// team so the next round can actually be played. Cup-level subscriptions
/// are re-applied, since the game may match a team-name filter only now.
pub(crate) fn advance_winners(cup: &mut Cup) {
    let mut replacements: Vec<(usize, Side, Team)> = Vec::new();
    for (idx, game) in cup.games.iter().enumerate() {
        if game.state() != GameState::Ready {
            continue;
        }
        for (side, slot) in [(Side::Home, game.home()), (Side::Away, game.away())] {
            if !slot.is_placeholder() {
                continue;
            }
            if let Resolved::Team(name) = resolve_participant(cup, slot) {
                if let Some(team) = cup.teams.iter().find(|team| team.name() == name) {
                    replacements.push((idx, side, team.clone()));
                }
            }
        }
    }

    for (idx, side, team) in replacements {
        let side_name = match side {
            Side::Home => "home",
            Side::Away => "away",
        };
        let game = &mut cup.games[idx];
        log::debug!("game {}: {} slot resolved to {}", game.id(), side_name, team.name());
        match side {
            Side::Home => game.set_home(Participant::Team(team)),
            Side::Away => game.set_away(Participant::Team(team)),
        }
        for subscription in &cup.subscriptions {
            if subscription.filter.matches(game) {
                game.watch(Arc::clone(&subscription.observer));
            }
        }
    }
}

/// The winning side of an ENDED game, or None on a draw.
fn game_winner(game: &Game) -> Option<&Participant> {
    if game.home_score() > game.away_score() {
        Some(game.home())
    } else if game.away_score() > game.home_score() {
        Some(game.away())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::round_names;

    #[test]
    fn canonical_names_for_small_brackets() {
        assert_eq!(round_names(1), ["Final"]);
        assert_eq!(round_names(2), ["Semi-Final", "Final"]);
        assert_eq!(round_names(3), ["Quarter-Final", "Semi-Final", "Final"]);
        assert_eq!(
            round_names(4),
            ["Round of 16", "Quarter-Final", "Semi-Final", "Final"]
        );
        assert_eq!(
            round_names(5),
            ["Round of 32", "Round of 16", "Quarter-Final", "Semi-Final", "Final"]
        );
    }

    #[test]
    fn large_brackets_pad_with_generic_rounds() {
        let names = round_names(7);
        assert_eq!(
            names,
            ["Round 1", "Round 2", "Round 3", "Round 4", "Quarter-Final", "Semi-Final", "Final"]
        );
    }

    #[test]
    fn zero_rounds_has_no_names() {
        assert!(round_names(0).is_empty());
    }
}
