//! Squad data sources.
//!
//! Defines the `SquadSource` trait the simulation runner loads from, an
//! in-memory implementation over pre-built squads, and the on-disk JSON
//! squad cache in [`store`].

pub mod clubs;
pub mod store;

use std::collections::HashMap;

use crate::types::{season_key, SimError, Squad};

/// Abstraction over where squads come from.
///
/// Loaders are synchronous; the HTTP layer runs them on the blocking pool.
#[cfg_attr(test, mockall::automock)]
pub trait SquadSource: Send + Sync {
    /// The acting club's squad for one season.
    fn load_squad(&self, club: &str, season: u16) -> Result<Squad, SimError>;

    /// Every other club of the league for the same season. Clubs without
    /// data are left out.
    fn load_peer_squads(
        &self,
        league: &str,
        season: u16,
        excluding: &str,
    ) -> Result<Vec<Squad>, SimError>;
}

/// In-memory source, keyed by league.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    leagues: HashMap<String, Vec<Squad>>,
}

impl SnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_squad(mut self, league: &str, squad: Squad) -> Self {
        self.insert(league, squad);
        self
    }

    pub fn insert(&mut self, league: &str, squad: Squad) {
        self.leagues.entry(league.to_string()).or_default().push(squad);
    }
}

impl SquadSource for SnapshotSource {
    fn load_squad(&self, club: &str, season: u16) -> Result<Squad, SimError> {
        self.leagues
            .values()
            .flatten()
            .find(|s| s.club == club && s.season == season)
            .cloned()
            .ok_or_else(|| SimError::MissingData {
                club: club.to_string(),
                season: season_key(season),
            })
    }

    fn load_peer_squads(
        &self,
        league: &str,
        season: u16,
        excluding: &str,
    ) -> Result<Vec<Squad>, SimError> {
        Ok(self
            .leagues
            .get(league)
            .map(|squads| {
                squads
                    .iter()
                    .filter(|s| s.season == season && s.club != excluding)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
