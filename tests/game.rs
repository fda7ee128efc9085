//! Integration tests for the game state machine, scoring, and observers.

use std::sync::{Arc, Mutex};
use tournament_engine::{
    Game, GameObserver, GameState, MatchId, SharedObserver, Side, Team, TournamentError,
};

use chrono::{TimeZone, Utc};

fn team(name: &str, players: &[(&str, u32)]) -> Team {
    let mut team = Team::new(name).unwrap();
    for (player, number) in players {
        team.add_player(*player, *number);
    }
    team
}

fn game() -> Game {
    Game::new(
        1,
        team("Lions", &[("Alice", 9)]),
        team("Tigers", &[("Bob", 10)]),
        Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap(),
    )
}

/// Records every notification it receives.
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

/// Always fails, to prove one bad subscriber cannot block the rest.
struct Faulty;

impl GameObserver for Faulty {
    fn update(&mut self, _game: &Game) -> Result<(), Box<dyn std::error::Error>> {
        Err("observer exploded".into())
    }
}

#[test]
fn full_match_sequence() {
    // start -> score(home, 2) -> score(away, 1) -> end
    let mut game = game();
    game.start().unwrap();
    game.score(2, "Lions", Some("Alice")).unwrap();
    game.score(1, "Tigers", Some("Bob")).unwrap();
    game.end().unwrap();

    assert_eq!(game.timeline().len(), 2);
    assert_eq!(game.home_score(), 2);
    assert_eq!(game.away_score(), 1);

    let stats = game.stats();
    assert_eq!(stats.time, "Full Time");
    assert_eq!(stats.home.name, "Lions");
    assert_eq!(stats.home.points, 2);
    assert_eq!(stats.home.players["Alice"], 2);
    assert_eq!(stats.away.players["Bob"], 1);
    assert_eq!(stats.timeline[0].side, Side::Home);
    assert_eq!(stats.timeline[0].player, "Alice");
    assert_eq!(stats.timeline[1].points, 1);
}

#[test]
fn start_is_only_valid_from_ready() {
    let mut game = game();
    game.start().unwrap();
    assert!(matches!(
        game.start(),
        Err(TournamentError::InvalidTransition { action: "start", state: GameState::Running })
    ));
    game.pause().unwrap();
    assert!(matches!(
        game.start(),
        Err(TournamentError::InvalidTransition { state: GameState::Paused, .. })
    ));
    game.end().unwrap();
    assert!(matches!(
        game.start(),
        Err(TournamentError::InvalidTransition { state: GameState::Ended, .. })
    ));
}

#[test]
fn pause_and_resume_cycle() {
    let mut game = game();
    assert!(matches!(
        game.pause(),
        Err(TournamentError::InvalidTransition { action: "pause", state: GameState::Ready })
    ));
    assert!(matches!(
        game.resume(),
        Err(TournamentError::InvalidTransition { action: "resume", state: GameState::Ready })
    ));

    game.start().unwrap();
    game.pause().unwrap();
    assert_eq!(game.state(), GameState::Paused);
    assert!(matches!(
        game.pause(),
        Err(TournamentError::InvalidTransition { state: GameState::Paused, .. })
    ));
    game.resume().unwrap();
    assert_eq!(game.state(), GameState::Running);
    assert!(matches!(
        game.resume(),
        Err(TournamentError::InvalidTransition { state: GameState::Running, .. })
    ));
}

#[test]
fn end_is_terminal_and_valid_from_any_live_state() {
    let mut paused = game();
    paused.start().unwrap();
    paused.pause().unwrap();
    paused.end().unwrap();
    assert_eq!(paused.state(), GameState::Ended);

    let mut ready = game();
    ready.end().unwrap();
    assert!(matches!(
        ready.end(),
        Err(TournamentError::InvalidTransition { action: "end", state: GameState::Ended })
    ));
}

#[test]
fn scoring_requires_a_running_game() {
    let mut game = game();
    assert!(matches!(
        game.score(2, "Lions", None),
        Err(TournamentError::InvalidTransition { action: "score", state: GameState::Ready })
    ));
    game.start().unwrap();
    game.pause().unwrap();
    assert!(matches!(
        game.score(2, "Lions", None),
        Err(TournamentError::InvalidTransition { state: GameState::Paused, .. })
    ));
    // A failed score leaves no trace.
    assert_eq!(game.home_score(), 0);
    assert!(game.timeline().is_empty());
}

#[test]
fn scoring_for_a_stranger_team_errors() {
    let mut game = game();
    game.start().unwrap();
    let err = game.score(3, "Bears", None).unwrap_err();
    assert!(matches!(err, TournamentError::TeamNotInGame(name) if name == "Bears"));
    assert_eq!(game.home_score(), 0);
}

#[test]
fn unattributed_and_unrostered_scores() {
    let mut game = game();
    game.start().unwrap();
    game.score(2, "Lions", None).unwrap();
    game.score(3, "Lions", Some("Ringer")).unwrap();

    assert_eq!(game.home_score(), 5);
    assert_eq!(game.timeline()[0].player, "Unknown");
    assert_eq!(game.timeline()[1].player, "Ringer");
    // Only rostered players accumulate a personal tally.
    let stats = game.stats();
    assert_eq!(stats.home.players["Alice"], 0);
    assert!(!stats.home.players.contains_key("Ringer"));
}

#[test]
fn clock_display_before_and_after_ending() {
    let mut game = game();
    assert_eq!(game.stats().time, "00:00.00");
    game.start().unwrap();
    game.end().unwrap();
    assert_eq!(game.stats().time, "Full Time");
}

#[test]
fn observers_see_every_state_change_in_order() {
    let recorder = Arc::new(Mutex::new(Recorder::default()));
    let mut game = game();
    game.watch(recorder.clone());

    game.start().unwrap();
    game.score(2, "Lions", None).unwrap();
    game.pause().unwrap();
    game.resume().unwrap();
    game.end().unwrap();

    let events = &recorder.lock().unwrap().events;
    let states: Vec<GameState> = events.iter().map(|(_, state)| *state).collect();
    assert_eq!(
        states,
        [
            GameState::Running,
            GameState::Running, // score
            GameState::Paused,
            GameState::Running,
            GameState::Ended,
        ]
    );
    assert!(events.iter().all(|(id, _)| *id == 1));
}

#[test]
fn failed_transitions_notify_nobody() {
    let recorder = Arc::new(Mutex::new(Recorder::default()));
    let mut game = game();
    game.watch(recorder.clone());
    assert!(game.pause().is_err());
    assert!(game.score(1, "Lions", None).is_err());
    assert!(recorder.lock().unwrap().events.is_empty());
}

#[test]
fn one_bad_observer_does_not_block_delivery() {
    let _ = env_logger::builder().is_test(true).try_init();
    let recorder = Arc::new(Mutex::new(Recorder::default()));
    let mut game = game();
    game.watch(Arc::new(Mutex::new(Faulty)));
    game.watch(recorder.clone());

    game.start().unwrap();
    game.end().unwrap();
    assert_eq!(recorder.lock().unwrap().events.len(), 2);
}

#[test]
fn duplicate_watch_is_ignored_and_unwatch_stops_delivery() {
    let recorder = Arc::new(Mutex::new(Recorder::default()));
    let observer: SharedObserver = recorder.clone();
    let mut game = game();
    game.watch(Arc::clone(&observer));
    game.watch(Arc::clone(&observer));

    game.start().unwrap();
    assert_eq!(recorder.lock().unwrap().events.len(), 1);

    game.unwatch(&observer);
    game.end().unwrap();
    assert_eq!(recorder.lock().unwrap().events.len(), 1);
}
