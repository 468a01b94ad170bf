//! Sell phase.
//!
//! Flags ageing players and positional surplus, then executes sales in
//! rank order without ever taking a position group below its floor.

use std::cmp::Ordering;

use tracing::{debug, info};

use super::{DepthRules, StrategyConfig, SELL_FEE_FACTOR};
use crate::types::{BudgetState, PositionGroup, SellReason, Squad, TransferRecord};

/// Output of the sell phase.
#[derive(Debug, Clone)]
pub struct SellOutcome {
    pub squad: Squad,
    pub sold: Vec<TransferRecord>,
    pub budget: BudgetState,
}

/// A player flagged for sale, by squad index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellCandidate {
    pub index: usize,
    pub reason: SellReason,
}

pub struct SellEngine {
    rules: DepthRules,
}

impl SellEngine {
    pub fn new(rules: DepthRules) -> Self {
        Self { rules }
    }

    /// Flag sell candidates and rank them oldest first, then cheapest first.
    ///
    /// Age rule: `age >= sell_age_threshold`. Surplus rule: while a group
    /// is above its ideal depth (after counting the age-flagged players),
    /// its lowest-value remaining members are flagged, older first on
    /// equal value.
    pub fn candidates(&self, squad: &Squad, strategy: &StrategyConfig) -> Vec<SellCandidate> {
        let players = &squad.players;
        let mut flags: Vec<Option<SellReason>> = players
            .iter()
            .map(|p| (p.age >= strategy.sell_age_threshold).then_some(SellReason::Age))
            .collect();

        for group in PositionGroup::ALL {
            let ideal = self.rules.for_group(group).ideal;
            let members: Vec<usize> = (0..players.len())
                .filter(|&i| players[i].position == group)
                .collect();
            let aged = members.iter().filter(|&&i| flags[i].is_some()).count();
            let excess = members.len().saturating_sub(ideal).saturating_sub(aged);
            if excess == 0 {
                continue;
            }

            let mut unflagged: Vec<usize> = members.into_iter().filter(|&i| flags[i].is_none()).collect();
            unflagged.sort_by(|&a, &b| {
                players[a]
                    .market_value
                    .cmp(&players[b].market_value)
                    .then_with(|| players[b].age.cmp(&players[a].age))
                    .then_with(|| a.cmp(&b))
            });
            for &i in unflagged.iter().take(excess) {
                flags[i] = Some(SellReason::Surplus);
            }
            debug!(group = %group, excess, "Positional surplus flagged");
        }

        let mut ranked: Vec<SellCandidate> = flags
            .into_iter()
            .enumerate()
            .filter_map(|(index, reason)| reason.map(|reason| SellCandidate { index, reason }))
            .collect();
        ranked.sort_by(|a, b| Self::rank(squad, a, b));
        ranked
    }

    fn rank(squad: &Squad, a: &SellCandidate, b: &SellCandidate) -> Ordering {
        let pa = &squad.players[a.index];
        let pb = &squad.players[b.index];
        pb.age
            .cmp(&pa.age)
            .then_with(|| pa.market_value.cmp(&pb.market_value))
            .then_with(|| a.index.cmp(&b.index))
    }

    /// Run the sell phase against a working copy of the squad.
    pub fn run(&self, squad: Squad, strategy: &StrategyConfig, mut budget: BudgetState) -> SellOutcome {
        let candidates = self.candidates(&squad, strategy);
        let mut counts = squad.group_counts();
        let mut sold_idx: Vec<(usize, SellReason)> = Vec::new();

        for candidate in &candidates {
            let player = &squad.players[candidate.index];
            let floor = self.rules.for_group(player.position).min_viable;
            let count = counts.get_mut(player.position);
            if *count <= floor {
                debug!(
                    player = %player.name,
                    group = %player.position,
                    count = *count,
                    floor,
                    "Sell skipped: group at minimum viable count"
                );
                continue;
            }
            *count -= 1;
            sold_idx.push((candidate.index, candidate.reason));
        }

        let mut sold = Vec::with_capacity(sold_idx.len());
        for &(index, reason) in &sold_idx {
            let player = squad.players[index].clone();
            let proceeds = player.market_value * SELL_FEE_FACTOR;
            budget.transfer_budget_remaining += proceeds;
            budget.total_sale_proceeds += proceeds;
            budget.salary_budget_remaining += player.estimated_salary();
            debug!(
                player = %player.name,
                age = player.age,
                reason = ?reason,
                proceeds = %proceeds,
                "Player sold"
            );
            sold.push(TransferRecord::sell(player, proceeds, reason));
        }

        let Squad { club, season, players } = squad;
        let remaining: Vec<_> = players
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !sold_idx.iter().any(|&(s, _)| s == *i))
            .map(|(_, p)| p)
            .collect();

        info!(
            candidates = candidates.len(),
            sold = sold.len(),
            proceeds = %budget.total_sale_proceeds,
            transfer_budget = %budget.transfer_budget_remaining,
            "Sell phase complete"
        );

        SellOutcome {
            squad: Squad::new(club, season, remaining),
            sold,
            budget,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
