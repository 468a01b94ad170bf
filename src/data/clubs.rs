//! Supported clubs.
//!
//! Five top clubs per league for the five major European leagues. The
//! slug and id are Transfermarkt's; the slug also names the squad cache
//! file on disk.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{SimError, SimulationRequest, StrategyMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClubEntry {
    pub slug: &'static str,
    pub transfermarkt_id: u32,
    pub name: &'static str,
    pub league: &'static str,
}

struct League {
    key: &'static str,
    label: &'static str,
}

const LEAGUES: &[League] = &[
    League { key: "laliga", label: "LaLiga" },
    League { key: "premier-league", label: "Premier League" },
    League { key: "bundesliga", label: "Bundesliga" },
    League { key: "serie-a", label: "Serie A" },
    League { key: "ligue-1", label: "Ligue 1" },
];

const CLUBS: &[ClubEntry] = &[
    ClubEntry { slug: "real-madrid", transfermarkt_id: 418, name: "Real Madrid", league: "laliga" },
    ClubEntry { slug: "fc-barcelona", transfermarkt_id: 131, name: "FC Barcelona", league: "laliga" },
    ClubEntry { slug: "atletico-madrid", transfermarkt_id: 13, name: "Atletico Madrid", league: "laliga" },
    ClubEntry { slug: "real-sociedad", transfermarkt_id: 681, name: "Real Sociedad", league: "laliga" },
    ClubEntry { slug: "fc-villarreal", transfermarkt_id: 1050, name: "Villarreal", league: "laliga" },
    ClubEntry { slug: "manchester-city", transfermarkt_id: 281, name: "Manchester City", league: "premier-league" },
    ClubEntry { slug: "arsenal-fc", transfermarkt_id: 11, name: "Arsenal", league: "premier-league" },
    ClubEntry { slug: "liverpool-fc", transfermarkt_id: 31, name: "Liverpool", league: "premier-league" },
    ClubEntry { slug: "fc-chelsea", transfermarkt_id: 631, name: "Chelsea", league: "premier-league" },
    ClubEntry { slug: "tottenham-hotspur", transfermarkt_id: 148, name: "Tottenham", league: "premier-league" },
    ClubEntry { slug: "fc-bayern-munchen", transfermarkt_id: 27, name: "Bayern Munich", league: "bundesliga" },
    ClubEntry { slug: "borussia-dortmund", transfermarkt_id: 16, name: "Borussia Dortmund", league: "bundesliga" },
    ClubEntry { slug: "bayer-04-leverkusen", transfermarkt_id: 15, name: "Bayer Leverkusen", league: "bundesliga" },
    ClubEntry { slug: "rasenballsport-leipzig", transfermarkt_id: 23826, name: "RB Leipzig", league: "bundesliga" },
    ClubEntry { slug: "eintracht-frankfurt", transfermarkt_id: 24, name: "Eintracht Frankfurt", league: "bundesliga" },
    ClubEntry { slug: "inter-mailand", transfermarkt_id: 46, name: "Inter Milan", league: "serie-a" },
    ClubEntry { slug: "juventus-turin", transfermarkt_id: 506, name: "Juventus", league: "serie-a" },
    ClubEntry { slug: "ac-mailand", transfermarkt_id: 5, name: "AC Milan", league: "serie-a" },
    ClubEntry { slug: "as-rom", transfermarkt_id: 12, name: "AS Roma", league: "serie-a" },
    ClubEntry { slug: "ssn-neapel", transfermarkt_id: 6195, name: "Napoli", league: "serie-a" },
    ClubEntry { slug: "paris-saint-germain", transfermarkt_id: 583, name: "PSG", league: "ligue-1" },
    ClubEntry { slug: "olympique-marseille", transfermarkt_id: 244, name: "Marseille", league: "ligue-1" },
    ClubEntry { slug: "as-monaco", transfermarkt_id: 162, name: "Monaco", league: "ligue-1" },
    ClubEntry { slug: "olympique-lyon", transfermarkt_id: 1041, name: "Lyon", league: "ligue-1" },
    ClubEntry { slug: "ogc-nice", transfermarkt_id: 417, name: "Nice", league: "ligue-1" },
];

/// Lookup over the static club table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClubRegistry;

impl ClubRegistry {
    pub fn all(&self) -> &'static [ClubEntry] {
        CLUBS
    }

    /// Find a club by display name or slug, ignoring case.
    pub fn lookup(&self, club: &str) -> Result<&'static ClubEntry, SimError> {
        let needle = club.trim();
        CLUBS
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(needle) || c.slug.eq_ignore_ascii_case(needle))
            .ok_or_else(|| SimError::UnknownClub(club.to_string()))
    }

    pub fn by_league(&self, league: &str) -> Vec<&'static ClubEntry> {
        CLUBS.iter().filter(|c| c.league == league).collect()
    }

    /// League keys in display order.
    pub fn leagues(&self) -> impl Iterator<Item = &'static str> {
        LEAGUES.iter().map(|l| l.key)
    }

    /// Engine request for a supported club. The league comes from the
    /// registry, never from the caller.
    pub fn build_request(
        &self,
        team_name: &str,
        season: u16,
        transfer_budget: Decimal,
        salary_budget: Decimal,
        mode: StrategyMode,
    ) -> Result<SimulationRequest, SimError> {
        let club = self.lookup(team_name)?;
        let request = SimulationRequest {
            club: club.name.to_string(),
            league: club.league.to_string(),
            season,
            transfer_budget,
            salary_budget,
            mode,
        };
        request.validate()?;
        Ok(request)
    }

    /// Human-readable league name; unknown keys are returned unchanged.
    pub fn league_label<'a>(&self, league: &'a str) -> &'a str {
        LEAGUES
            .iter()
            .find(|l| l.key == league)
            .map(|l| l.label)
            .unwrap_or(league)
    }
}
