//! Game: per-fixture state machine, clock, scoring, timeline, and observers.

use crate::models::error::TournamentError;
use crate::models::team::{Participant, Team};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Unique identifier for a game within its owning cup (allocator assigned).
pub type MatchId = u64;

/// Lifecycle state of a game. Transitions are strictly ordered:
/// READY -> RUNNING <-> PAUSED, any non-ENDED state -> ENDED (terminal).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Ready,
    Running,
    Paused,
    Ended,
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameState::Ready => "READY",
            GameState::Running => "RUNNING",
            GameState::Paused => "PAUSED",
            GameState::Ended => "ENDED",
        };
        write!(f, "{}", name)
    }
}

/// Which side of the fixture a timeline entry belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

/// Name recorded on timeline entries with no attributed player.
const UNKNOWN_PLAYER: &str = "Unknown";

/// One scoring event: clock reading, side, player, points.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub time: String,
    pub side: Side,
    pub player: String,
    pub points: u32,
}

/// Score and per-player tallies for one side (for `stats()`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SideStats {
    pub name: String,
    pub points: u32,
    pub players: HashMap<String, u32>,
}

/// Snapshot of a game's statistics: scores, tallies, clock display, timeline.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub home: SideStats,
    pub away: SideStats,
    /// "MM:SS.ff" while the game is live, "Full Time" once ended.
    pub time: String,
    pub timeline: Vec<TimelineEntry>,
}

/// Callback interface for state-change notifications. `update` is invoked
/// synchronously on every successful mutating call; returning an error is
/// logged and does not block delivery to other observers.
///
/// Observers must not block or re-enter the engine.
pub trait GameObserver {
    fn update(&mut self, game: &Game) -> Result<(), Box<dyn std::error::Error>>;
}

/// Shared handle to an observer; identity (`Arc::ptr_eq`) is what `unwatch`
/// removes by.
pub type SharedObserver = Arc<Mutex<dyn GameObserver + Send>>;

/// A single fixture between two participants, with its own clock and score.
pub struct Game {
    id: MatchId,
    home: Participant,
    away: Participant,
    datetime: DateTime<Utc>,
    /// Group label for group-stage fixtures (e.g. "A"), None otherwise.
    group: Option<String>,
    state: GameState,
    /// Play time accumulated over completed RUNNING segments.
    elapsed: Duration,
    /// Origin of the current RUNNING segment; Some iff state is RUNNING.
    segment_start: Option<Instant>,
    home_score: u32,
    away_score: u32,
    /// Per-player tallies, snapshotted from the rosters at creation.
    home_tally: HashMap<String, u32>,
    away_tally: HashMap<String, u32>,
    timeline: Vec<TimelineEntry>,
    observers: Vec<SharedObserver>,
}

impl Game {
    /// Create a fixture between two concrete teams.
    pub fn new(id: MatchId, home: Team, away: Team, datetime: DateTime<Utc>) -> Self {
        Self::with_participants(
            id,
            Participant::Team(home),
            Participant::Team(away),
            datetime,
            None,
        )
    }

    /// Create a fixture where either side may still be a pending bracket slot.
    pub fn with_participants(
        id: MatchId,
        home: Participant,
        away: Participant,
        datetime: DateTime<Utc>,
        group: Option<String>,
    ) -> Self {
        let home_tally = roster_tally(&home);
        let away_tally = roster_tally(&away);
        Self {
            id,
            home,
            away,
            datetime,
            group,
            state: GameState::Ready,
            elapsed: Duration::ZERO,
            segment_start: None,
            home_score: 0,
            away_score: 0,
            home_tally,
            away_tally,
            timeline: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn home(&self) -> &Participant {
        &self.home
    }

    pub fn away(&self) -> &Participant {
        &self.away
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.datetime
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn home_score(&self) -> u32 {
        self.home_score
    }

    pub fn away_score(&self) -> u32 {
        self.away_score
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// Swap in the resolved participant for a pending slot. Crate-internal:
    /// only the bracket resolver rewrites slots, and only before kick-off.
    pub(crate) fn set_home(&mut self, participant: Participant) {
        self.home_tally = roster_tally(&participant);
        self.home = participant;
    }

    pub(crate) fn set_away(&mut self, participant: Participant) {
        self.away_tally = roster_tally(&participant);
        self.away = participant;
    }

    /// Start the game. Valid only from READY.
    pub fn start(&mut self) -> Result<(), TournamentError> {
        if self.state != GameState::Ready {
            return Err(TournamentError::InvalidTransition {
                action: "start",
                state: self.state,
            });
        }
        self.state = GameState::Running;
        self.segment_start = Some(Instant::now());
        self.notify_observers();
        Ok(())
    }

    /// Pause the game, folding the current segment into the elapsed total.
    /// Valid only from RUNNING.
    pub fn pause(&mut self) -> Result<(), TournamentError> {
        if self.state != GameState::Running {
            return Err(TournamentError::InvalidTransition {
                action: "pause",
                state: self.state,
            });
        }
        if let Some(origin) = self.segment_start.take() {
            self.elapsed += origin.elapsed();
        }
        self.state = GameState::Paused;
        self.notify_observers();
        Ok(())
    }

    /// Resume a paused game with a fresh clock origin. Valid only from PAUSED.
    pub fn resume(&mut self) -> Result<(), TournamentError> {
        if self.state != GameState::Paused {
            return Err(TournamentError::InvalidTransition {
                action: "resume",
                state: self.state,
            });
        }
        self.state = GameState::Running;
        self.segment_start = Some(Instant::now());
        self.notify_observers();
        Ok(())
    }

    /// End the game (terminal). Valid from any non-ENDED state; a running
    /// clock is flushed first.
    pub fn end(&mut self) -> Result<(), TournamentError> {
        if self.state == GameState::Ended {
            return Err(TournamentError::InvalidTransition {
                action: "end",
                state: self.state,
            });
        }
        if let Some(origin) = self.segment_start.take() {
            self.elapsed += origin.elapsed();
        }
        self.state = GameState::Ended;
        self.notify_observers();
        Ok(())
    }

    /// Record `points` for `team` (must be the home or away side of this
    /// game), optionally attributed to a named player. Valid only while
    /// RUNNING.
    pub fn score(
        &mut self,
        points: u32,
        team: &str,
        player: Option<&str>,
    ) -> Result<(), TournamentError> {
        if self.state != GameState::Running {
            return Err(TournamentError::InvalidTransition {
                action: "score",
                state: self.state,
            });
        }

        let side = if self.home.name() == Some(team) {
            Side::Home
        } else if self.away.name() == Some(team) {
            Side::Away
        } else {
            return Err(TournamentError::TeamNotInGame(team.to_string()));
        };

        let entry = TimelineEntry {
            time: format_game_time(self.current_elapsed()),
            side,
            player: player.unwrap_or(UNKNOWN_PLAYER).to_string(),
            points,
        };
        self.timeline.push(entry);

        let (score, tally) = match side {
            Side::Home => (&mut self.home_score, &mut self.home_tally),
            Side::Away => (&mut self.away_score, &mut self.away_tally),
        };
        *score += points;
        // Unknown names still land on the timeline, but only rostered
        // players accumulate a personal tally.
        if let Some(name) = player {
            if let Some(total) = tally.get_mut(name) {
                *total += points;
            }
        }

        self.notify_observers();
        Ok(())
    }

    /// Pure read: current scores, per-player tallies, clock display, timeline.
    pub fn stats(&self) -> GameStats {
        let time = if self.state == GameState::Ended {
            "Full Time".to_string()
        } else {
            format_game_time(self.current_elapsed())
        };
        GameStats {
            home: SideStats {
                name: self.home.display_name(),
                points: self.home_score,
                players: self.home_tally.clone(),
            },
            away: SideStats {
                name: self.away.display_name(),
                points: self.away_score,
                players: self.away_tally.clone(),
            },
            time,
            timeline: self.timeline.clone(),
        }
    }

    /// Subscribe an observer. Duplicate handles (same allocation) are ignored.
    pub fn watch(&mut self, observer: SharedObserver) {
        let already = self
            .observers
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &observer));
        if !already {
            self.observers.push(observer);
        }
    }

    /// Unsubscribe an observer by handle identity.
    pub fn unwatch(&mut self, observer: &SharedObserver) {
        self.observers.retain(|existing| !Arc::ptr_eq(existing, observer));
    }

    /// Elapsed play time including the live segment, if any.
    fn current_elapsed(&self) -> Duration {
        match self.segment_start {
            Some(origin) => self.elapsed + origin.elapsed(),
            None => self.elapsed,
        }
    }

    /// Deliver `update` to every observer in subscription order. A failing
    /// observer (or a poisoned handle) is logged and skipped so it cannot
    /// block delivery to the rest.
    fn notify_observers(&self) {
        for observer in &self.observers {
            match observer.lock() {
                Ok(mut observer) => {
                    if let Err(err) = observer.update(self) {
                        log::warn!("observer update failed for game {}: {}", self.id, err);
                    }
                }
                Err(_) => {
                    log::warn!("observer mutex poisoned for game {}; skipping", self.id);
                }
            }
        }
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Game {}: {} vs {}",
            self.id,
            self.home.display_name(),
            self.away.display_name()
        )
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("id", &self.id)
            .field("home", &self.home)
            .field("away", &self.away)
            .field("datetime", &self.datetime)
            .field("group", &self.group)
            .field("state", &self.state)
            .field("home_score", &self.home_score)
            .field("away_score", &self.away_score)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Initial per-player tally for a participant (empty for pending slots).
fn roster_tally(participant: &Participant) -> HashMap<String, u32> {
    participant
        .team()
        .map(|team| team.players().keys().map(|name| (name.clone(), 0)).collect())
        .unwrap_or_default()
}

/// Format elapsed play time as MM:SS.ff (e.g. "05:23.45").
pub(crate) fn format_game_time(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    let minutes = (seconds / 60.0) as u64;
    format!("{:02}:{:05.2}", minutes, seconds % 60.0)
}
