//! Cup: a tournament owning its fixtures, with format-specific scheduling.

use crate::allocator::{MatchIdAllocator, SequentialAllocator};
use crate::logic;
use crate::logic::gametree::GameTree;
use crate::logic::standings::Standings;
use crate::models::error::TournamentError;
use crate::models::game::{Game, MatchId, SharedObserver};
use crate::models::team::{Participant, Team};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a cup.
pub type CupId = Uuid;

/// Tournament format. The "double" variants play every pairing twice:
/// mirrored return legs for leagues, two-leg aggregate ties for knockouts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CupFormat {
    /// Single round-robin: every pair of teams meets exactly once.
    League,
    /// Double round-robin with home/away return legs.
    LeagueDouble,
    /// Single-elimination knockout bracket.
    Elimination,
    /// Knockout bracket with two-leg ties decided on aggregate score.
    EliminationDouble,
    /// Group stage followed by an auto-generated knockout playoff.
    Group,
    /// Group stage and playoffs with two-leg fixtures throughout.
    GroupDouble,
}

impl CupFormat {
    /// Whether every pairing is played twice.
    pub fn is_double(self) -> bool {
        matches!(
            self,
            CupFormat::LeagueDouble | CupFormat::EliminationDouble | CupFormat::GroupDouble
        )
    }

    /// Whether the format starts with a group stage.
    pub fn has_groups(self) -> bool {
        matches!(self, CupFormat::Group | CupFormat::GroupDouble)
    }

    /// Whether the format has a round structure (anything but a plain league).
    pub fn has_rounds(self) -> bool {
        !matches!(self, CupFormat::League | CupFormat::LeagueDouble)
    }

    /// Canonical wire tag, the inverse of `FromStr`.
    pub fn tag(self) -> &'static str {
        match self {
            CupFormat::League => "LEAGUE",
            CupFormat::LeagueDouble => "LEAGUE2",
            CupFormat::Elimination => "ELIMINATION",
            CupFormat::EliminationDouble => "ELIMINATION2",
            CupFormat::Group => "GROUP",
            CupFormat::GroupDouble => "GROUP2",
        }
    }
}

impl std::fmt::Display for CupFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for CupFormat {
    type Err = TournamentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        let format = [
            CupFormat::League,
            CupFormat::LeagueDouble,
            CupFormat::Elimination,
            CupFormat::EliminationDouble,
            CupFormat::Group,
            CupFormat::GroupDouble,
        ]
        .into_iter()
        .find(|format| format.tag().eq_ignore_ascii_case(tag));
        format.ok_or_else(|| TournamentError::UnknownFormat(s.to_string()))
    }
}

/// Scheduling and group-stage parameters for a cup.
#[derive(Clone, Debug)]
pub struct CupConfig {
    /// Kick-off of the first fixture.
    pub start_date: DateTime<Utc>,
    /// Gap between consecutive fixtures (rounds, for round-robin formats).
    pub interval: Duration,
    /// Number of groups (group formats only).
    pub num_groups: usize,
    /// Number of teams advancing to the playoffs (group formats only).
    pub playoff_slots: usize,
}

impl CupConfig {
    /// Config with the conventional defaults: 4 groups, 8 playoff slots.
    pub fn new(start_date: DateTime<Utc>, interval: Duration) -> Self {
        Self {
            start_date,
            interval,
            num_groups: 4,
            playoff_slots: 8,
        }
    }
}

/// Filter for `search()` and cup-level subscriptions. Supplied criteria are
/// AND-combined; an empty filter matches every game.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchFilter {
    /// Team name, matched case-insensitively against either side.
    pub team: Option<String>,
    /// Group label (e.g. "A").
    pub group: Option<String>,
    /// Inclusive scheduled-datetime range.
    pub between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl SearchFilter {
    pub fn matches(&self, game: &Game) -> bool {
        if let Some(team) = &self.team {
            // Pending bracket slots have no team name and never match.
            let home = game
                .home()
                .name()
                .is_some_and(|name| name.eq_ignore_ascii_case(team));
            let away = game
                .away()
                .name()
                .is_some_and(|name| name.eq_ignore_ascii_case(team));
            if !home && !away {
                return false;
            }
        }
        if let Some(group) = &self.group {
            if game.group() != Some(group.as_str()) {
                return false;
            }
        }
        if let Some((start, end)) = &self.between {
            let datetime = game.datetime();
            if datetime < *start || datetime > *end {
                return false;
            }
        }
        true
    }
}

/// A cup-level subscription: observer plus the filter it was registered with.
/// The filter is re-applied to fixtures generated later (e.g. playoffs).
pub(crate) struct CupSubscription {
    pub(crate) observer: SharedObserver,
    pub(crate) filter: SearchFilter,
}

/// A tournament: teams, format, and every fixture it schedules.
///
/// All fixture mutation goes through the cup (`start_game`, `score_game`,
/// `end_game`, ...) so the playoff auto-trigger always observes group
/// completion. The engine is synchronous; callers serialize concurrent access.
pub struct Cup {
    id: CupId,
    pub(crate) teams: Vec<Team>,
    pub(crate) format: CupFormat,
    pub(crate) config: CupConfig,
    pub(crate) games: Vec<Game>,
    /// Elimination formats: match ids per round, first round first.
    pub(crate) rounds: Vec<Vec<MatchId>>,
    /// Group formats: group label -> team names.
    pub(crate) groups: BTreeMap<String, Vec<String>>,
    /// Group formats: group label -> match ids.
    pub(crate) group_games: BTreeMap<String, Vec<MatchId>>,
    /// Group formats: playoff match ids per round; populated at most once.
    pub(crate) playoff_rounds: Vec<Vec<MatchId>>,
    pub(crate) playoff_games: Vec<MatchId>,
    pub(crate) subscriptions: Vec<CupSubscription>,
    pub(crate) allocator: Box<dyn MatchIdAllocator + Send>,
    /// Scheduling cursor advanced by the bracket builders.
    pub(crate) next_date: DateTime<Utc>,
}

impl std::fmt::Debug for Cup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cup")
            .field("id", &self.id)
            .field("teams", &self.teams)
            .field("format", &self.format)
            .field("config", &self.config)
            .field("games", &self.games)
            .field("rounds", &self.rounds)
            .field("groups", &self.groups)
            .field("group_games", &self.group_games)
            .field("playoff_rounds", &self.playoff_rounds)
            .field("playoff_games", &self.playoff_games)
            .field("subscriptions", &self.subscriptions.len())
            .field("next_date", &self.next_date)
            .finish_non_exhaustive()
    }
}

impl Cup {
    /// Create a cup with a locally owned id sequence starting at 1.
    pub fn new(
        teams: Vec<Team>,
        format: CupFormat,
        config: CupConfig,
    ) -> Result<Self, TournamentError> {
        Self::with_allocator(teams, format, config, Box::<SequentialAllocator>::default())
    }

    /// Create a cup using an injected id allocator (e.g. a sequence shared
    /// across a whole system). The cup uses this allocator for every fixture
    /// it ever creates, including auto-generated playoff fixtures.
    pub fn with_allocator(
        teams: Vec<Team>,
        format: CupFormat,
        config: CupConfig,
        allocator: Box<dyn MatchIdAllocator + Send>,
    ) -> Result<Self, TournamentError> {
        if teams.len() < 2 {
            return Err(TournamentError::NotEnoughTeams {
                required: 2,
                actual: teams.len(),
            });
        }
        if format.has_groups() {
            let num_groups = config.num_groups;
            if num_groups == 0 || num_groups > teams.len() || num_groups > 26 {
                return Err(TournamentError::InvalidGroupCount {
                    num_groups,
                    teams: teams.len(),
                });
            }
            let slots = config.playoff_slots;
            if slots < 2 || slots > teams.len() {
                return Err(TournamentError::InvalidPlayoffSlots {
                    slots,
                    teams: teams.len(),
                });
            }
        }

        let next_date = config.start_date;
        let mut cup = Self {
            id: Uuid::new_v4(),
            teams,
            format,
            config,
            games: Vec::new(),
            rounds: Vec::new(),
            groups: BTreeMap::new(),
            group_games: BTreeMap::new(),
            playoff_rounds: Vec::new(),
            playoff_games: Vec::new(),
            subscriptions: Vec::new(),
            allocator,
            next_date,
        };

        match format {
            CupFormat::League | CupFormat::LeagueDouble => {
                logic::round_robin::generate_league(&mut cup, format.is_double());
            }
            CupFormat::Elimination | CupFormat::EliminationDouble => {
                logic::elimination::generate_elimination(&mut cup, format.is_double());
            }
            CupFormat::Group | CupFormat::GroupDouble => {
                logic::groups::generate_group_stage(&mut cup, format.is_double());
            }
        }
        Ok(cup)
    }

    pub fn id(&self) -> CupId {
        self.id
    }

    pub fn format(&self) -> CupFormat {
        self.format
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Every fixture the cup owns, in creation order.
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// Elimination rounds as match-id lists (empty for other formats).
    pub fn rounds(&self) -> &[Vec<MatchId>] {
        &self.rounds
    }

    /// Group label -> team names (group formats only).
    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Group label -> match ids (group formats only).
    pub fn group_games(&self) -> &BTreeMap<String, Vec<MatchId>> {
        &self.group_games
    }

    /// Playoff rounds as match-id lists (empty until playoffs generate).
    pub fn playoff_rounds(&self) -> &[Vec<MatchId>] {
        &self.playoff_rounds
    }

    pub fn playoff_games(&self) -> &[MatchId] {
        &self.playoff_games
    }

    /// Look up a game by id.
    pub fn game(&self, id: MatchId) -> Result<&Game, TournamentError> {
        self.games
            .iter()
            .find(|game| game.id() == id)
            .ok_or(TournamentError::GameNotFound(id))
    }

    pub(crate) fn game_mut(&mut self, id: MatchId) -> Result<&mut Game, TournamentError> {
        self.games
            .iter_mut()
            .find(|game| game.id() == id)
            .ok_or(TournamentError::GameNotFound(id))
    }

    /// Start a fixture.
    pub fn start_game(&mut self, id: MatchId) -> Result<(), TournamentError> {
        self.game_mut(id)?.start()
    }

    /// Pause a fixture.
    pub fn pause_game(&mut self, id: MatchId) -> Result<(), TournamentError> {
        self.game_mut(id)?.pause()
    }

    /// Resume a paused fixture.
    pub fn resume_game(&mut self, id: MatchId) -> Result<(), TournamentError> {
        self.game_mut(id)?.resume()
    }

    /// End a fixture. For group formats, ending the last unfinished
    /// group-stage game generates the playoff bracket exactly once.
    pub fn end_game(&mut self, id: MatchId) -> Result<(), TournamentError> {
        self.game_mut(id)?.end()?;
        logic::groups::maybe_generate_playoffs(self);
        logic::elimination::advance_winners(self);
        Ok(())
    }

    /// Record points for a team in a fixture.
    pub fn score_game(
        &mut self,
        id: MatchId,
        points: u32,
        team: &str,
        player: Option<&str>,
    ) -> Result<(), TournamentError> {
        self.game_mut(id)?.score(points, team, player)
    }

    /// Games matching the filter, in creation order.
    pub fn search(&self, filter: &SearchFilter) -> Vec<&Game> {
        self.games
            .iter()
            .filter(|game| filter.matches(game))
            .collect()
    }

    /// Subscribe an observer to every current game matching `filter`, and to
    /// matching games the cup generates later (e.g. playoff fixtures).
    pub fn watch(&mut self, observer: SharedObserver, filter: SearchFilter) {
        let duplicate = self.subscriptions.iter().any(|subscription| {
            Arc::ptr_eq(&subscription.observer, &observer) && subscription.filter == filter
        });
        if duplicate {
            return;
        }
        for game in self.games.iter_mut() {
            if filter.matches(game) {
                game.watch(Arc::clone(&observer));
            }
        }
        self.subscriptions.push(CupSubscription { observer, filter });
    }

    /// Remove an observer from the cup's bookkeeping and from every game.
    pub fn unwatch(&mut self, observer: &SharedObserver) {
        self.subscriptions
            .retain(|subscription| !Arc::ptr_eq(&subscription.observer, observer));
        for game in self.games.iter_mut() {
            game.unwatch(observer);
        }
    }

    /// Current standings in the shape appropriate for the format: league
    /// table, bracket progress, or nested group + playoff view. Pure read.
    pub fn standings(&self) -> Standings {
        logic::standings::compute(self)
    }

    /// Round-structured view of the tournament. Errors for plain leagues,
    /// which have no round structure.
    pub fn gametree(&self) -> Result<GameTree, TournamentError> {
        logic::gametree::build(self)
    }

    /// Resolve "who is really in this slot": the concrete team name once the
    /// slot's source game(s) have ENDED, otherwise the literal
    /// "Winner of ..." label.
    pub fn resolved_name(&self, participant: &Participant) -> String {
        logic::elimination::resolve_participant(self, participant).into_label()
    }

    /// Explicitly generate the playoff bracket from current group standings.
    /// Errors on non-group formats and once the bracket already exists.
    pub fn generate_playoffs(&mut self) -> Result<(), TournamentError> {
        if !self.format.has_groups() {
            return Err(TournamentError::PlayoffsUnavailable(self.format));
        }
        if !self.playoff_games.is_empty() {
            return Err(TournamentError::PlayoffsAlreadyGenerated);
        }
        logic::groups::generate_playoffs(self);
        logic::elimination::advance_winners(self);
        Ok(())
    }

    /// Create and register a fixture: allocator-assigned id, cup-level
    /// subscriptions applied, appended to the owned game list.
    pub(crate) fn register_game(
        &mut self,
        home: Participant,
        away: Participant,
        datetime: DateTime<Utc>,
        group: Option<String>,
    ) -> MatchId {
        let id = self.allocator.allocate();
        let mut game = Game::with_participants(id, home, away, datetime, group);
        for subscription in &self.subscriptions {
            if subscription.filter.matches(&game) {
                game.watch(Arc::clone(&subscription.observer));
            }
        }
        self.games.push(game);
        id
    }
}

impl std::fmt::Display for Cup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cup Tournament: {} with {} teams, {} games",
            self.format,
            self.teams.len(),
            self.games.len()
        )
    }
}
