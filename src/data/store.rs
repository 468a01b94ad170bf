//! JSON squad cache.
//!
//! One file per club and season, `{slug}_{YYYY-YY}.json`, in the layout
//! the Transfermarkt scraper writes. Only the squad list is read; transfer
//! and valuation histories in the same file are ignored.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::clubs::{ClubEntry, ClubRegistry};
use super::SquadSource;
use crate::types::{season_key, Player, PositionGroup, SimError, Squad};

// ---------------------------------------------------------------------------
// Cache file schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SquadCache {
    team_name: String,
    #[serde(default)]
    players: Vec<PlayerRecord>,
}

#[derive(Debug, Deserialize)]
struct PlayerRecord {
    player_id: String,
    name: String,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    market_value: Option<u64>,
}

impl PlayerRecord {
    /// Convert to a squad member. Records without an age or with an
    /// unmapped position are dropped.
    fn into_player(self, club: &str) -> Option<Player> {
        let Some(age) = self.age else {
            warn!(player_id = %self.player_id, name = %self.name, "Skipping player without age");
            return None;
        };
        let Some(position) = self.position.as_deref().and_then(PositionGroup::from_position) else {
            warn!(
                player_id = %self.player_id,
                name = %self.name,
                position = ?self.position,
                "Skipping player with unknown position"
            );
            return None;
        };
        Some(Player {
            id: self.player_id,
            name: self.name,
            age,
            position,
            market_value: self.market_value.map(Decimal::from).unwrap_or(Decimal::ZERO),
            club: club.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Reads cached squads from a data directory.
#[derive(Debug, Clone)]
pub struct JsonSquadStore {
    data_dir: PathBuf,
    registry: ClubRegistry,
}

impl JsonSquadStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            registry: ClubRegistry,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Cache path for one club and season.
    pub fn path_for(&self, slug: &str, season: u16) -> PathBuf {
        self.data_dir.join(format!("{slug}_{}.json", season_key(season)))
    }

    fn read(&self, club: &ClubEntry, season: u16) -> Result<Squad, SimError> {
        let missing = || SimError::MissingData {
            club: club.name.to_string(),
            season: season_key(season),
        };
        let path = self.path_for(club.slug, season);

        let json = std::fs::read_to_string(&path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "Squad cache not readable");
            missing()
        })?;
        let cache: SquadCache = serde_json::from_str(&json).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Squad cache is malformed");
            missing()
        })?;

        let total = cache.players.len();
        let players: Vec<Player> = cache
            .players
            .into_iter()
            .filter_map(|r| r.into_player(club.name))
            .collect();

        debug!(
            club = club.name,
            team_name = %cache.team_name,
            season,
            players = players.len(),
            skipped = total - players.len(),
            "Squad loaded from cache"
        );

        Ok(Squad::new(club.name, season, players))
    }
}

impl SquadSource for JsonSquadStore {
    fn load_squad(&self, club: &str, season: u16) -> Result<Squad, SimError> {
        let entry = self.registry.lookup(club)?;
        self.read(entry, season)
    }

    fn load_peer_squads(
        &self,
        league: &str,
        season: u16,
        excluding: &str,
    ) -> Result<Vec<Squad>, SimError> {
        let excluded = self.registry.lookup(excluding).map(|c| c.slug).ok();
        let mut peers = Vec::new();

        for club in self.registry.by_league(league) {
            if Some(club.slug) == excluded || club.name == excluding {
                continue;
            }
            match self.read(club, season) {
                Ok(squad) => peers.push(squad),
                Err(e) => warn!(club = club.name, error = %e, "Peer squad unavailable, skipping"),
            }
        }

        info!(
            league,
            season = %season_key(season),
            peers = peers.len(),
            "Peer squads loaded"
        );
        Ok(peers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn temp_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("transfer_sim_test_store_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&p).unwrap();
        p
    }

    fn write_cache(dir: &Path, slug: &str, team: &str, players: serde_json::Value) {
        let body = json!({
            "team_name": team,
            "season": "2024-25",
            "players": players,
            "transfers": [],
            "valuations": [],
        });
        std::fs::write(
            dir.join(format!("{slug}_2024-25.json")),
            serde_json::to_string_pretty(&body).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_load_squad_maps_records() {
        let dir = temp_dir();
        write_cache(
            &dir,
            "real-madrid",
            "Real Madrid",
            json!([
                {"player_id": "1", "name": "Keeper", "age": 31, "position": "Goalkeeper",
                 "nationality": "Belgium", "current_club": "Real Madrid", "market_value": 18000000},
                {"player_id": "2", "name": "Winger", "age": 24, "position": "Left Winger",
                 "market_value": null},
                {"player_id": "3", "name": "No Age", "age": null, "position": "Centre-Back"},
                {"player_id": "4", "name": "Odd Role", "age": 22, "position": "Libero"}
            ]),
        );

        let store = JsonSquadStore::new(&dir);
        let squad = store.load_squad("Real Madrid", 2024).unwrap();
        assert_eq!(squad.club, "Real Madrid");
        assert_eq!(squad.season, 2024);
        assert_eq!(squad.len(), 2);
        assert_eq!(squad.players[0].position, PositionGroup::Goalkeeper);
        assert_eq!(squad.players[0].market_value, dec!(18000000));
        assert_eq!(squad.players[1].position, PositionGroup::Forward);
        assert_eq!(squad.players[1].market_value, Decimal::ZERO);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_missing_data() {
        let dir = temp_dir();
        let store = JsonSquadStore::new(&dir);
        let err = store.load_squad("real-madrid", 2024).unwrap_err();
        assert!(matches!(err, SimError::MissingData { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_file_is_missing_data() {
        let dir = temp_dir();
        std::fs::write(dir.join("real-madrid_2024-25.json"), "{not json").unwrap();
        let store = JsonSquadStore::new(&dir);
        let err = store.load_squad("Real Madrid", 2024).unwrap_err();
        assert!(matches!(err, SimError::MissingData { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unknown_club() {
        let store = JsonSquadStore::new(std::env::temp_dir());
        let err = store.load_squad("Hull City", 2024).unwrap_err();
        assert!(matches!(err, SimError::UnknownClub(_)));
    }

    #[test]
    fn test_peers_skip_missing_and_acting_club() {
        let dir = temp_dir();
        let player = json!([{"player_id": "9", "name": "Mid", "age": 25,
                             "position": "Central Midfield", "market_value": 1000}]);
        write_cache(&dir, "real-madrid", "Real Madrid", player.clone());
        write_cache(&dir, "fc-barcelona", "FC Barcelona", player.clone());
        write_cache(&dir, "real-sociedad", "Real Sociedad", player);

        let store = JsonSquadStore::new(&dir);
        let peers = store.load_peer_squads("laliga", 2024, "Real Madrid").unwrap();
        let clubs: Vec<&str> = peers.iter().map(|s| s.club.as_str()).collect();
        assert_eq!(clubs, vec!["FC Barcelona", "Real Sociedad"]);
        assert_eq!(peers[0].players[0].club, "FC Barcelona");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_path_for() {
        let store = JsonSquadStore::new("data");
        assert_eq!(
            store.path_for("ogc-nice", 2023),
            PathBuf::from("data").join("ogc-nice_2023-24.json")
        );
    }
}
