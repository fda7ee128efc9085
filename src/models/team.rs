//! Team roster and bracket participants (concrete team or pending winner slot).

use crate::models::error::TournamentError;
use crate::models::game::MatchId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A sports team: name, roster, and an open attribute bag for ad-hoc fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    name: String,
    /// Player name -> jersey number.
    players: HashMap<String, u32>,
    /// Free-form attributes (e.g. "city", "coach"); values are arbitrary JSON.
    attributes: HashMap<String, Value>,
}

impl Team {
    /// Create a team with the given name. The name must be non-empty.
    pub fn new(name: impl Into<String>) -> Result<Self, TournamentError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TournamentError::EmptyTeamName);
        }
        Ok(Self {
            name,
            players: HashMap::new(),
            attributes: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace a player in the roster.
    pub fn add_player(&mut self, name: impl Into<String>, number: u32) {
        self.players.insert(name.into(), number);
    }

    /// Remove a player from the roster.
    pub fn remove_player(&mut self, name: &str) -> Result<(), TournamentError> {
        self.players
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| TournamentError::PlayerNotFound {
                team: self.name.clone(),
                player: name.to_string(),
            })
    }

    /// Roster view: player name -> jersey number.
    pub fn players(&self) -> &HashMap<String, u32> {
        &self.players
    }

    /// Set a free-form attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Read a free-form attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Remove a free-form attribute, returning its previous value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One side of a fixture: a concrete team, or a slot for the winner of one
/// (single-leg) or two (two-leg tie) earlier games.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Participant {
    Team(Team),
    Winner(Vec<MatchId>),
}

impl Participant {
    /// The concrete team, if this slot is resolved.
    pub fn team(&self) -> Option<&Team> {
        match self {
            Participant::Team(team) => Some(team),
            Participant::Winner(_) => None,
        }
    }

    /// The team name, if this slot is resolved. A pending slot has no name,
    /// so it can never be scored against.
    pub fn name(&self) -> Option<&str> {
        self.team().map(Team::name)
    }

    /// The source game ids a pending slot is waiting on (empty when resolved).
    pub fn source_games(&self) -> &[MatchId] {
        match self {
            Participant::Team(_) => &[],
            Participant::Winner(sources) => sources,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Participant::Winner(_))
    }

    /// Display name: the team name, or the literal "Winner of ..." label.
    pub fn display_name(&self) -> String {
        match self {
            Participant::Team(team) => team.name().to_string(),
            Participant::Winner(sources) => match sources.as_slice() {
                [single] => format!("Winner of Game {}", single),
                many => {
                    let ids: Vec<String> = many.iter().map(|id| id.to_string()).collect();
                    format!("Winner of Games [{}]", ids.join(", "))
                }
            },
        }
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
