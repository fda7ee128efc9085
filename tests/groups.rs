//! Integration tests for group tournaments: partitioning, the playoff
//! auto-trigger, wildcard qualification, search, and cup-level subscriptions.

use chrono::{Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tournament_engine::{
    Cup, CupConfig, CupFormat, Game, GameObserver, GameState, GameTree, MatchId, SearchFilter,
    Standings, Team, TournamentError,
};

fn start_date() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap()
}

fn config(num_groups: usize, playoff_slots: usize) -> CupConfig {
    let mut config = CupConfig::new(start_date(), Duration::days(1));
    config.num_groups = num_groups;
    config.playoff_slots = playoff_slots;
    config
}

fn teams(n: usize) -> Vec<Team> {
    (1..=n)
        .map(|i| Team::new(format!("Team {i}")).unwrap())
        .collect()
}

fn group_cup(n: usize, num_groups: usize, playoff_slots: usize) -> Cup {
    Cup::new(teams(n), CupFormat::Group, config(num_groups, playoff_slots)).unwrap()
}

/// Play every group game to an ENDED home win.
fn finish_group_stage(cup: &mut Cup) {
    let ids: Vec<MatchId> = cup
        .games()
        .iter()
        .filter(|game| game.group().is_some())
        .map(Game::id)
        .collect();
    for id in ids {
        let home = cup.game(id).unwrap().home().name().unwrap().to_string();
        cup.start_game(id).unwrap();
        cup.score_game(id, 2, &home, None).unwrap();
        cup.end_game(id).unwrap();
    }
}

#[derive(Default)]
struct Recorder {
    events: Vec<(MatchId, GameState)>,
}

impl GameObserver for Recorder {
    fn update(&mut self, game: &Game) -> Result<(), Box<dyn std::error::Error>> {
        self.events.push((game.id(), game.state()));
        Ok(())
    }
}

#[test]
fn sixteen_teams_in_four_groups() {
    let cup = group_cup(16, 4, 8);
    assert_eq!(cup.groups().len(), 4);
    let labels: Vec<&String> = cup.groups().keys().collect();
    assert_eq!(labels, ["A", "B", "C", "D"]);
    for members in cup.groups().values() {
        assert_eq!(members.len(), 4);
    }
    // 4 groups x C(4,2) fixtures.
    assert_eq!(cup.games().len(), 24);
    for (label, ids) in cup.group_games() {
        assert_eq!(ids.len(), 6);
        for id in ids {
            assert_eq!(cup.game(*id).unwrap().group(), Some(label.as_str()));
        }
    }
}

#[test]
fn uneven_team_counts_are_dealt_round_robin() {
    let cup = group_cup(11, 4, 4);
    let sizes: Vec<usize> = cup.groups().values().map(Vec::len).collect();
    assert_eq!(sizes, [3, 3, 3, 2]);
}

#[test]
fn group_stage_completion_triggers_playoffs_exactly_once() {
    let mut cup = group_cup(16, 4, 8);
    assert!(cup.playoff_games().is_empty());

    finish_group_stage(&mut cup);

    // 8 qualifiers -> a complete 7-game bracket, generated automatically.
    let sizes: Vec<usize> = cup.playoff_rounds().iter().map(Vec::len).collect();
    assert_eq!(sizes, [4, 2, 1]);
    assert_eq!(cup.playoff_games().len(), 7);
    assert_eq!(cup.games().len(), 31);

    // Ending an already-ended group game errors and must not re-trigger.
    let group_game = cup.games()[0].id();
    assert!(matches!(
        cup.end_game(group_game),
        Err(TournamentError::InvalidTransition { state: GameState::Ended, .. })
    ));
    assert_eq!(cup.playoff_games().len(), 7);
    assert_eq!(cup.games().len(), 31);
}

#[test]
fn playoff_teams_come_from_group_results() {
    let mut cup = group_cup(8, 2, 4);
    finish_group_stage(&mut cup);

    let qualified: std::collections::HashSet<String> = cup
        .playoff_rounds()[0]
        .iter()
        .flat_map(|id| {
            let game = cup.game(*id).unwrap();
            [
                game.home().name().unwrap().to_string(),
                game.away().name().unwrap().to_string(),
            ]
        })
        .collect();
    assert_eq!(qualified.len(), 4);

    // Top two per group by points.
    let Standings::Grouped { groups, .. } = cup.standings() else {
        panic!("expected grouped standings");
    };
    for table in groups.values() {
        for record in &table[..2] {
            assert!(
                qualified.contains(&record.team),
                "{} should have qualified",
                record.team
            );
        }
    }
}

#[test]
fn wildcard_slots_fill_from_cross_group_ranking() {
    let mut cup = group_cup(9, 3, 4);
    finish_group_stage(&mut cup);

    // k = 1 per group, plus one wildcard ranked on (points, goal difference).
    let sizes: Vec<usize> = cup.playoff_rounds().iter().map(Vec::len).collect();
    assert_eq!(sizes, [2, 1]);
    assert_eq!(cup.playoff_games().len(), 3);
    assert_eq!(cup.games().len(), 9 + 3);
}

#[test]
fn explicit_generation_is_guarded() {
    let mut cup = group_cup(8, 2, 4);

    // Explicit trigger works even before the group stage completes...
    cup.generate_playoffs().unwrap();
    assert_eq!(cup.playoff_games().len(), 3);

    // ...but a second call is a logical error, and the auto-trigger stays
    // a no-op once the bracket exists.
    assert!(matches!(
        cup.generate_playoffs(),
        Err(TournamentError::PlayoffsAlreadyGenerated)
    ));
    finish_group_stage(&mut cup);
    assert_eq!(cup.playoff_games().len(), 3);
}

#[test]
fn grouped_standings_nest_groups_and_playoffs() {
    let mut cup = group_cup(8, 2, 4);
    let Standings::Grouped { groups, playoffs } = cup.standings() else {
        panic!("expected grouped standings");
    };
    assert_eq!(groups.len(), 2);
    assert!(playoffs.is_empty(), "no playoff section before generation");
    for table in groups.values() {
        assert_eq!(table.len(), 4);
        assert!(table.iter().all(|record| record.points == 0));
    }

    finish_group_stage(&mut cup);
    let Standings::Grouped { groups, playoffs } = cup.standings() else {
        panic!("expected grouped standings");
    };
    // Every group game ended, so per-group wins sum to the fixture count.
    for table in groups.values() {
        let wins: u32 = table.iter().map(|record| record.won).sum();
        assert_eq!(wins, 6);
    }
    // Playoff round 1 is concrete, so every qualifier has a progress entry.
    assert_eq!(playoffs.len(), 4);
}

#[test]
fn grouped_gametree_nests_groups_and_playoffs() {
    let mut cup = group_cup(16, 4, 8);
    let GameTree::Grouped { groups, playoffs } = cup.gametree().unwrap() else {
        panic!("expected grouped tree");
    };
    assert_eq!(groups.len(), 4);
    assert!(playoffs.is_empty());
    assert!(groups.values().all(|games| games.len() == 6));

    finish_group_stage(&mut cup);
    let GameTree::Grouped { playoffs, .. } = cup.gametree().unwrap() else {
        panic!("expected grouped tree");
    };
    let names: Vec<&str> = playoffs.iter().map(|round| round.name.as_str()).collect();
    assert_eq!(names, ["Quarter-Final", "Semi-Final", "Final"]);
    // Later rounds show literal winner-of labels until results come in.
    assert!(playoffs[1]
        .games
        .iter()
        .all(|game| game.home.starts_with("Winner of Game")));
}

#[test]
fn search_filters_and_combine() {
    let mut cup = group_cup(8, 2, 4);

    let by_group = cup.search(&SearchFilter {
        group: Some("A".into()),
        ..Default::default()
    });
    assert_eq!(by_group.len(), 6);
    assert!(by_group.iter().all(|game| game.group() == Some("A")));

    let member = cup.groups()["A"][0].clone();
    let by_team = cup.search(&SearchFilter {
        team: Some(member.to_uppercase()),
        ..Default::default()
    });
    assert_eq!(by_team.len(), 3, "case-insensitive team search");

    let combined = cup.search(&SearchFilter {
        team: Some(member.clone()),
        group: Some("B".into()),
        ..Default::default()
    });
    assert!(combined.is_empty(), "filters AND together");

    // Date range: the first matchday only.
    let matchday = cup.search(&SearchFilter {
        between: Some((start_date(), start_date())),
        ..Default::default()
    });
    assert!(!matchday.is_empty());
    assert!(matchday.iter().all(|game| game.datetime() == start_date()));

    // An empty filter matches everything.
    assert_eq!(cup.search(&SearchFilter::default()).len(), cup.games().len());

    finish_group_stage(&mut cup);
    let all = cup.search(&SearchFilter::default());
    assert_eq!(all.len(), cup.games().len(), "playoff games are searchable");
}

#[test]
fn cup_watch_covers_matching_and_future_games() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cup = group_cup(8, 2, 4);

    let everything = Arc::new(Mutex::new(Recorder::default()));
    let group_a_only = Arc::new(Mutex::new(Recorder::default()));
    cup.watch(everything.clone(), SearchFilter::default());
    cup.watch(
        group_a_only.clone(),
        SearchFilter {
            group: Some("A".into()),
            ..Default::default()
        },
    );

    finish_group_stage(&mut cup);

    // 12 group games x (start + score + end).
    assert_eq!(everything.lock().unwrap().events.len(), 36);
    assert_eq!(group_a_only.lock().unwrap().events.len(), 18);

    // The unfiltered observer was auto-subscribed to the playoff bracket.
    let playoff_id = cup.playoff_rounds()[0][0];
    let home = cup.game(playoff_id).unwrap().home().name().unwrap().to_string();
    cup.start_game(playoff_id).unwrap();
    cup.score_game(playoff_id, 2, &home, None).unwrap();
    cup.end_game(playoff_id).unwrap();

    assert_eq!(everything.lock().unwrap().events.len(), 39);
    // Playoff games carry no group label, so the filtered observer is done.
    assert_eq!(group_a_only.lock().unwrap().events.len(), 18);
}

#[test]
fn unwatch_removes_from_every_game() {
    let mut cup = group_cup(8, 2, 4);
    let recorder = Arc::new(Mutex::new(Recorder::default()));
    let observer: tournament_engine::SharedObserver = recorder.clone();
    cup.watch(Arc::clone(&observer), SearchFilter::default());

    let first = cup.games()[0].id();
    cup.start_game(first).unwrap();
    assert_eq!(recorder.lock().unwrap().events.len(), 1);

    cup.unwatch(&observer);
    cup.end_game(first).unwrap();
    assert_eq!(recorder.lock().unwrap().events.len(), 1);
}

#[test]
fn team_filtered_watch_follows_the_team_into_the_playoffs() {
    let mut cup = group_cup(4, 2, 2);
    finish_group_stage(&mut cup);

    // Both playoff entrants are known; subscribe to one of them now.
    let final_id = cup.playoff_rounds()[0][0];
    let followed = cup.game(final_id).unwrap().home().name().unwrap().to_string();
    let recorder = Arc::new(Mutex::new(Recorder::default()));
    cup.watch(
        recorder.clone(),
        SearchFilter {
            team: Some(followed.clone()),
            ..Default::default()
        },
    );

    cup.start_game(final_id).unwrap();
    cup.score_game(final_id, 2, &followed, None).unwrap();
    cup.end_game(final_id).unwrap();
    assert_eq!(recorder.lock().unwrap().events.len(), 3);
}

#[test]
fn group_config_is_validated() {
    assert!(matches!(
        Cup::new(teams(4), CupFormat::Group, config(0, 2)),
        Err(TournamentError::InvalidGroupCount { num_groups: 0, .. })
    ));
    assert!(matches!(
        Cup::new(teams(4), CupFormat::Group, config(5, 2)),
        Err(TournamentError::InvalidGroupCount { num_groups: 5, teams: 4 })
    ));
    assert!(matches!(
        Cup::new(teams(4), CupFormat::Group, config(2, 1)),
        Err(TournamentError::InvalidPlayoffSlots { slots: 1, .. })
    ));
    assert!(matches!(
        Cup::new(teams(4), CupFormat::Group, config(2, 5)),
        Err(TournamentError::InvalidPlayoffSlots { slots: 5, .. })
    ));
}

#[test]
fn playoffs_schedule_after_a_break() {
    let mut cup = group_cup(8, 2, 4);
    finish_group_stage(&mut cup);
    // Group stage runs matchdays from the start date; playoffs begin three
    // intervals after the scheduling cursor.
    let first_playoff = cup.game(cup.playoff_rounds()[0][0]).unwrap();
    assert_eq!(first_playoff.datetime(), start_date() + Duration::days(3));
}
