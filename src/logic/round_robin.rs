//! Round-robin scheduling via the circle method.

use crate::models::{Cup, MatchId, Participant, Team};
use chrono::{DateTime, Utc};

/// Pair indices `0..n` into rounds using the circle method: with a synthetic
/// bye slot for odd `n`, run `n-1` rounds pairing index `i` with `n-1-i`,
/// then rotate all slots but the first by one position. Every unordered pair
/// meets exactly once, and no index appears twice in a round.
pub fn round_robin_pairings(n: usize) -> Vec<Vec<(usize, usize)>> {
    if n < 2 {
        return Vec::new();
    }
    let mut slots: Vec<Option<usize>> = (0..n).map(Some).collect();
    if n % 2 == 1 {
        slots.push(None); // bye
    }
    let size = slots.len();

    let mut rounds = Vec::with_capacity(size - 1);
    for _ in 0..size - 1 {
        let mut round = Vec::with_capacity(size / 2);
        for i in 0..size / 2 {
            if let (Some(home), Some(away)) = (slots[i], slots[size - 1 - i]) {
                round.push((home, away));
            }
        }
        rounds.push(round);

        // Rotate, keeping slot 0 fixed.
        if let Some(last) = slots.pop() {
            slots.insert(1, last);
        }
    }
    rounds
}

/// Schedule a round-robin among `teams`, one interval per round starting at
/// `start`. The double variant appends mirrored return legs after all first
/// legs. Returns the created match ids in creation order.
pub(crate) fn schedule_round_robin(
    cup: &mut Cup,
    teams: &[Team],
    group: Option<&str>,
    double: bool,
    start: DateTime<Utc>,
) -> Vec<MatchId> {
    let rounds = round_robin_pairings(teams.len());
    let mut ids = Vec::new();
    let mut first_legs = Vec::new();
    let mut date = start;

    for round in &rounds {
        for &(home, away) in round {
            let id = cup.register_game(
                Participant::Team(teams[home].clone()),
                Participant::Team(teams[away].clone()),
                date,
                group.map(str::to_string),
            );
            ids.push(id);
            first_legs.push((home, away));
        }
        date = date + cup.config.interval;
    }

    if double {
        for (home, away) in first_legs {
            let id = cup.register_game(
                Participant::Team(teams[away].clone()),
                Participant::Team(teams[home].clone()),
                date,
                group.map(str::to_string),
            );
            ids.push(id);
            date = date + cup.config.interval;
        }
    }

    ids
}

/// Generate the fixtures for a league cup from its team list (in order; a
/// league draw has no shuffle).
pub(crate) fn generate_league(cup: &mut Cup, double: bool) {
    let teams = cup.teams.clone();
    let start = cup.config.start_date;
    let ids = schedule_round_robin(cup, &teams, None, double, start);
    log::debug!(
        "generated {} league fixtures for {} teams",
        ids.len(),
        teams.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_pair_meets_exactly_once() {
        for n in 2..=9 {
            let rounds = round_robin_pairings(n);
            let mut seen = HashSet::new();
            for round in &rounds {
                for &(a, b) in round {
                    let pair = (a.min(b), a.max(b));
                    assert!(seen.insert(pair), "pair {:?} repeated for n={}", pair, n);
                }
            }
            assert_eq!(seen.len(), n * (n - 1) / 2, "wrong pair count for n={}", n);
        }
    }

    #[test]
    fn no_team_plays_twice_in_a_round() {
        for n in 2..=9 {
            for round in round_robin_pairings(n) {
                let mut busy = HashSet::new();
                for (a, b) in round {
                    assert!(busy.insert(a));
                    assert!(busy.insert(b));
                }
            }
        }
    }

    #[test]
    fn round_count_matches_the_circle_method() {
        assert_eq!(round_robin_pairings(6).len(), 5);
        // Odd counts gain a bye slot and one extra round.
        assert_eq!(round_robin_pairings(5).len(), 5);
        assert!(round_robin_pairings(1).is_empty());
    }
}
