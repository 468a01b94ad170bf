//! Transfer market pool.
//!
//! Candidates are drawn only from peer clubs' squads for the same season.
//! The pool is built once per run; purchased players are removed so the
//! same player can never be bought twice.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::StrategyConfig;
use crate::types::{Player, PositionGroup, Squad};

/// Ordered buy candidates: market value descending, then younger first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketPool {
    players: Vec<Player>,
}

impl MarketPool {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// Candidates remaining for one position group, in pool order.
    pub fn for_group(&self, group: PositionGroup) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.position == group)
    }

    /// Take a purchased player out of the pool.
    pub fn remove(&mut self, player_id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        Some(self.players.remove(idx))
    }
}

/// Builds the [`MarketPool`] for one run.
pub struct MarketPoolBuilder<'a> {
    season: u16,
    acting_club: &'a str,
    excluded_ids: HashSet<&'a str>,
}

impl<'a> MarketPoolBuilder<'a> {
    pub fn new(season: u16, acting_club: &'a str) -> Self {
        Self {
            season,
            acting_club,
            excluded_ids: HashSet::new(),
        }
    }

    /// Exclude the acting club's roster by player id as well as by club
    /// name, so a player listed under a peer is still never bought back.
    pub fn excluding_roster(mut self, roster: &'a Squad) -> Self {
        self.excluded_ids
            .extend(roster.players.iter().map(|p| p.id.as_str()));
        self
    }

    /// Union the peers' players, filter and order them.
    pub fn build(&self, peers: &[Squad], strategy: &StrategyConfig) -> MarketPool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut players: Vec<Player> = Vec::new();

        for squad in peers {
            if squad.season != self.season {
                warn!(
                    club = %squad.club,
                    season = squad.season,
                    expected = self.season,
                    "Peer squad from another season ignored"
                );
                continue;
            }
            if squad.club == self.acting_club {
                continue;
            }
            for player in &squad.players {
                if player.club == self.acting_club || self.excluded_ids.contains(player.id.as_str()) {
                    continue;
                }
                if !strategy.accepts_age(player.age) {
                    continue;
                }
                if !seen.insert(player.id.as_str()) {
                    debug!(player_id = %player.id, "Duplicate pool entry dropped");
                    continue;
                }
                players.push(player.clone());
            }
        }

        players.sort_by(|a, b| {
            b.market_value
                .cmp(&a.market_value)
                .then_with(|| a.age.cmp(&b.age))
                .then_with(|| a.id.cmp(&b.id))
        });

        info!(
            peers = peers.len(),
            candidates = players.len(),
            age_min = strategy.buy_age_range.0,
            age_max = strategy.buy_age_range.1,
            "Market pool built"
        );

        MarketPool { players }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
