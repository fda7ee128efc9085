//! Group stage generation and the playoff orchestrator: partition teams into
//! groups, schedule intra-group round-robins, and build the knockout bracket
//! from group results when the group stage completes.

use crate::logic::{elimination, round_robin, standings};
use crate::models::{Cup, GameState, Participant, Team};
use rand::seq::SliceRandom;

/// Generate the group stage: shuffle the field, deal teams round-robin
/// across named groups (A, B, C, ...), and schedule a circle-method
/// round-robin inside each group. Groups run in parallel on shared dates.
pub(crate) fn generate_group_stage(cup: &mut Cup, double: bool) {
    let mut shuffled = cup.teams.clone();
    shuffled.shuffle(&mut rand::thread_rng());

    let labels: Vec<String> = (0..cup.config.num_groups).map(group_label).collect();
    let mut members: Vec<Vec<Team>> = vec![Vec::new(); labels.len()];
    // Dealing one-by-one tolerates team counts not divisible by the group
    // count (e.g. 11 teams in 4 groups -> 3/3/3/2).
    for (i, team) in shuffled.into_iter().enumerate() {
        members[i % labels.len()].push(team);
    }

    let start = cup.config.start_date;
    for (label, teams) in labels.into_iter().zip(members) {
        let ids = round_robin::schedule_round_robin(cup, &teams, Some(label.as_str()), double, start);
        log::debug!("group {}: {} teams, {} games", label, teams.len(), ids.len());
        cup.groups.insert(
            label.clone(),
            teams.iter().map(|team| team.name().to_string()).collect(),
        );
        cup.group_games.insert(label, ids);
    }
    log::info!(
        "generated group stage: {} groups, {} games; {} playoff slots",
        cup.groups.len(),
        cup.games.len(),
        cup.config.playoff_slots
    );
}

/// Group labels run A, B, C, ... (the group count is validated to 26).
fn group_label(index: usize) -> String {
    char::from(b'A' + index as u8).to_string()
}

/// The playoff trigger, run after every successful `end_game`. Generates the
/// bracket exactly once: when the format has groups, no playoff games exist
/// yet, and every group-stage game has ENDED. Re-entrant calls after that
/// point are no-ops because the guard condition is false.
pub(crate) fn maybe_generate_playoffs(cup: &mut Cup) {
    if !cup.format.has_groups() || !cup.playoff_games.is_empty() {
        return;
    }
    let group_stage_done = cup
        .games
        .iter()
        .filter(|game| game.group().is_some())
        .all(|game| game.state() == GameState::Ended);
    if group_stage_done {
        generate_playoffs(cup);
    }
}

/// Build the complete playoff bracket from current group standings.
///
/// Qualification: the top `playoff_slots / num_groups` of each group advance
/// automatically; remaining slots go to the best non-qualified teams across
/// all groups, ranked by points, then goal difference, then stable group
/// order. The qualified field is shuffled and fed through the full
/// elimination builder, producing every round up front.
pub(crate) fn generate_playoffs(cup: &mut Cup) {
    let per_group = cup.config.playoff_slots / cup.config.num_groups;
    let wildcard_count = cup.config.playoff_slots - per_group * cup.config.num_groups;
    log::info!(
        "generating playoffs: top {} per group, {} wild card slot(s)",
        per_group,
        wildcard_count
    );

    let mut qualified: Vec<String> = Vec::new();
    let mut candidates: Vec<(String, u32, i64)> = Vec::new();
    for label in cup.groups.keys() {
        let table = standings::group_table(cup, label);
        for (position, record) in table.into_iter().enumerate() {
            if position < per_group {
                qualified.push(record.team);
            } else {
                let goal_difference = record.goal_difference();
                candidates.push((record.team, record.points, goal_difference));
            }
        }
    }

    if wildcard_count > 0 {
        // Best of the rest across groups; stable sort keeps group order for
        // teams level on points and goal difference.
        candidates.sort_by(|a, b| (b.1, b.2).cmp(&(a.1, a.2)));
        for (team, points, _) in candidates.into_iter().take(wildcard_count) {
            log::debug!("wild card: {} ({} pts)", team, points);
            qualified.push(team);
        }
    }

    let mut entrants: Vec<Participant> = qualified
        .iter()
        .filter_map(|name| cup.teams.iter().find(|team| team.name() == name).cloned())
        .map(Participant::Team)
        .collect();
    entrants.shuffle(&mut rand::thread_rng());

    // The knockout starts after a break from the group stage.
    cup.next_date = cup.next_date + cup.config.interval * 3;

    let rounds = elimination::build_bracket(cup, entrants, cup.format.is_double());
    cup.playoff_games = rounds.iter().flatten().copied().collect();
    cup.playoff_rounds = rounds;
    log::info!(
        "playoff bracket complete: {} rounds, {} games",
        cup.playoff_rounds.len(),
        cup.playoff_games.len()
    );
}
