//! Simulation runner — one transfer window from snapshot to result.
//!
//! A run walks a fixed lifecycle:
//!
//! ```text
//! Initialized → SellPhase → BuyPhase → KpiComputed → Completed
//! ```
//!
//! Each step consumes the previous step's output. The runner reads only
//! the [`SeasonSnapshot`] it is handed, so identical inputs always yield
//! identical results.

use std::time::Instant;

use tracing::{debug, info};

use super::kpi::KpiCalculator;
use super::projection;
use crate::data::SquadSource;
use crate::strategy::buy::BuyEngine;
use crate::strategy::market::MarketPoolBuilder;
use crate::strategy::sell::SellEngine;
use crate::strategy::{DepthRules, StrategyConfig};
use crate::types::{
    season_key, BudgetState, RunPhase, SimError, SimulationRequest, SimulationResult, Squad,
};

/// Immutable inputs of a run: the acting squad and its league peers.
#[derive(Debug, Clone)]
pub struct SeasonSnapshot {
    pub squad: Squad,
    pub peers: Vec<Squad>,
}

impl SeasonSnapshot {
    pub fn new(squad: Squad, peers: Vec<Squad>) -> Self {
        Self { squad, peers }
    }

    /// Load the acting squad and its peers. A missing acting squad aborts;
    /// missing peers only shrink the market.
    pub fn load(source: &dyn SquadSource, request: &SimulationRequest) -> Result<Self, SimError> {
        let squad = source.load_squad(&request.club, request.season)?;
        let peers = source.load_peer_squads(&request.league, request.season, &squad.club)?;
        Ok(Self { squad, peers })
    }
}

/// Tracks the lifecycle and refuses to skip a phase.
struct PhaseTracker {
    phase: RunPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: RunPhase::Initialized,
        }
    }

    fn advance(&mut self, to: RunPhase) {
        debug_assert_eq!(self.phase.next(), Some(to), "illegal phase transition");
        debug!(from = %self.phase, to = %to, "Phase transition");
        self.phase = to;
    }
}

pub struct SimulationRunner {
    rules: DepthRules,
}

impl SimulationRunner {
    pub fn new(rules: DepthRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &DepthRules {
        &self.rules
    }

    /// Load the snapshot from `source`, then run.
    pub fn run_from_source(
        &self,
        source: &dyn SquadSource,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, SimError> {
        request.validate()?;
        let snapshot = SeasonSnapshot::load(source, request)?;
        self.run(request, &snapshot)
    }

    /// Execute one transfer window over a snapshot.
    pub fn run(
        &self,
        request: &SimulationRequest,
        snapshot: &SeasonSnapshot,
    ) -> Result<SimulationResult, SimError> {
        request.validate()?;
        if snapshot.squad.season != request.season {
            return Err(SimError::InvalidInput(format!(
                "squad season {} does not match requested season {}",
                season_key(snapshot.squad.season),
                season_key(request.season)
            )));
        }

        let started = Instant::now();
        let mut tracker = PhaseTracker::new();
        let strategy = StrategyConfig::resolve(request.mode);
        let squad_before = snapshot.squad.clone();
        let budget = BudgetState::opening(
            request.transfer_budget,
            request.salary_budget,
            squad_before.wage_bill(),
            strategy.spend_cap_fraction,
        );

        info!(
            club = %request.club,
            season = %season_key(request.season),
            mode = %strategy.mode,
            squad_size = squad_before.len(),
            transfer_budget = %request.transfer_budget,
            spend_ceiling = %budget.spend_ceiling_remaining,
            salary_headroom = %budget.salary_budget_remaining,
            "Simulation started"
        );

        tracker.advance(RunPhase::SellPhase);
        let sell = SellEngine::new(self.rules).run(squad_before.clone(), &strategy, budget);

        tracker.advance(RunPhase::BuyPhase);
        let mut pool = MarketPoolBuilder::new(request.season, &squad_before.club)
            .excluding_roster(&squad_before)
            .build(&snapshot.peers, &strategy);
        let buy = BuyEngine::new(self.rules).run(sell.squad, &mut pool, sell.budget, &strategy);

        tracker.advance(RunPhase::KpiComputed);
        let kpis = KpiCalculator::compute(&squad_before, &buy.squad, &buy.budget, request.salary_budget);
        let next_season = projection::next_season_snapshot(&buy.squad, request.salary_budget);

        tracker.advance(RunPhase::Completed);
        let result = SimulationResult {
            request: request.clone(),
            phase: tracker.phase,
            squad_before,
            squad_after: buy.squad,
            sold: sell.sold,
            bought: buy.bought,
            kpis,
            unfilled_gaps: buy.unfilled_gaps,
            next_season,
        };

        info!(
            summary = %result,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Simulation completed"
        );

        Ok(result)
    }
}

impl Default for SimulationRunner {
    fn default() -> Self {
        Self::new(DepthRules::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
