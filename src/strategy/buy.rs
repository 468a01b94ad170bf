//! Buy phase.
//!
//! Greedy walk over the market pool in its sorted order. Position gaps
//! (ideal depth minus current count) are filled first; reinforcements
//! are only considered once every gap is closed. Two hard budget gates
//! apply to every purchase: the remaining spend ceiling and the remaining
//! salary headroom.

use std::fmt;

use tracing::{debug, info};

use super::market::MarketPool;
use super::{DepthRules, StrategyConfig};
use crate::types::{
    BudgetState, GapReason, GroupCounts, Player, PositionGroup, Squad, TransferRecord, UnfilledGap,
};

/// Output of the buy phase.
#[derive(Debug, Clone)]
pub struct BuyOutcome {
    pub squad: Squad,
    pub bought: Vec<TransferRecord>,
    pub budget: BudgetState,
    pub unfilled_gaps: Vec<UnfilledGap>,
}

/// Why a candidate was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fee above what the ceiling and transfer budget still allow.
    OverSpendCeiling,
    /// Wage would break the salary budget.
    OverSalaryBudget,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OverSpendCeiling => write!(f, "fee exceeds spend ceiling"),
            SkipReason::OverSalaryBudget => write!(f, "wage exceeds salary headroom"),
        }
    }
}

pub struct BuyEngine {
    rules: DepthRules,
}

impl BuyEngine {
    pub fn new(rules: DepthRules) -> Self {
        Self { rules }
    }

    /// Ideal depth minus current count, clipped at zero.
    pub fn gaps(&self, squad: &Squad) -> GroupCounts {
        let counts = squad.group_counts();
        let mut gaps = GroupCounts::default();
        for group in PositionGroup::ALL {
            *gaps.get_mut(group) = self.rules.for_group(group).ideal.saturating_sub(counts.get(group));
        }
        gaps
    }

    /// Both budget gates for one candidate.
    pub fn check_affordable(player: &Player, budget: &BudgetState) -> Result<(), SkipReason> {
        if player.market_value > budget.spendable() {
            return Err(SkipReason::OverSpendCeiling);
        }
        if player.estimated_salary() > budget.salary_budget_remaining {
            return Err(SkipReason::OverSalaryBudget);
        }
        Ok(())
    }

    /// Run the buy phase. `budget` must carry the spend ceiling fixed at
    /// run start.
    pub fn run(
        &self,
        mut squad: Squad,
        pool: &mut MarketPool,
        mut budget: BudgetState,
        strategy: &StrategyConfig,
    ) -> BuyOutcome {
        let mut gaps = self.gaps(&squad);
        let mut bought: Vec<TransferRecord> = Vec::new();
        let opening_gaps = gaps.total();

        // Pass 1: gap fill
        if gaps.total() > 0 {
            for candidate in pool.players().to_vec() {
                if gaps.total() == 0 {
                    break;
                }
                if Self::nothing_affordable(pool, &budget) {
                    debug!(
                        spendable = %budget.spendable(),
                        salary_remaining = %budget.salary_budget_remaining,
                        "Budget exhausted during gap fill"
                    );
                    break;
                }
                let group = candidate.position;
                if gaps.get(group) == 0 {
                    continue;
                }
                if Self::try_purchase(candidate, &mut squad, pool, &mut budget, &mut bought) {
                    *gaps.get_mut(group) -= 1;
                }
            }
        }

        // Pass 2: reinforcements, only with every gap closed
        if gaps.total() == 0 {
            for candidate in pool.players().to_vec() {
                if Self::nothing_affordable(pool, &budget) {
                    debug!("Budget exhausted during reinforcement");
                    break;
                }
                let max = self.rules.for_group(candidate.position).max;
                if squad.count(candidate.position) >= max {
                    continue;
                }
                Self::try_purchase(candidate, &mut squad, pool, &mut budget, &mut bought);
            }
        }

        let unfilled_gaps = Self::unfilled(&gaps, pool);

        info!(
            mode = %strategy.mode,
            opening_gaps,
            bought = bought.len(),
            spend = %budget.total_spend,
            transfer_budget = %budget.transfer_budget_remaining,
            salary_remaining = %budget.salary_budget_remaining,
            unfilled = unfilled_gaps.len(),
            "Buy phase complete"
        );

        BuyOutcome {
            squad,
            bought,
            budget,
            unfilled_gaps,
        }
    }

    /// No candidate left in the pool passes both gates.
    fn nothing_affordable(pool: &MarketPool, budget: &BudgetState) -> bool {
        pool.players()
            .iter()
            .all(|p| Self::check_affordable(p, budget).is_err())
    }

    /// Buy `candidate` if both gates pass. Returns whether it was bought.
    fn try_purchase(
        candidate: Player,
        squad: &mut Squad,
        pool: &mut MarketPool,
        budget: &mut BudgetState,
        bought: &mut Vec<TransferRecord>,
    ) -> bool {
        if let Err(reason) = Self::check_affordable(&candidate, budget) {
            debug!(
                player = %candidate.name,
                value = %candidate.market_value,
                reason = %reason,
                "Candidate skipped"
            );
            return false;
        }

        let fee = candidate.market_value;
        budget.transfer_budget_remaining -= fee;
        budget.spend_ceiling_remaining -= fee;
        budget.total_spend += fee;
        budget.salary_budget_remaining -= candidate.estimated_salary();
        pool.remove(&candidate.id);

        debug!(
            player = %candidate.name,
            group = %candidate.position,
            fee = %fee,
            "Player bought"
        );

        squad.players.push(candidate.clone());
        bought.push(TransferRecord::buy(candidate));
        true
    }

    fn unfilled(gaps: &GroupCounts, pool: &MarketPool) -> Vec<UnfilledGap> {
        PositionGroup::ALL
            .iter()
            .filter(|&&g| gaps.get(g) > 0)
            .map(|&position| UnfilledGap {
                position,
                missing: gaps.get(position),
                reason: if pool.for_group(position).next().is_none() {
                    GapReason::NoCandidate
                } else {
                    GapReason::Unaffordable
                },
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::market::MarketPoolBuilder;
    use crate::types::StrategyMode;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn player(id: &str, age: u32, position: PositionGroup, value: Decimal, club: &str) -> Player {
        Player {
            id: id.into(),
            name: format!("Player {id}"),
            age,
            position,
            market_value: value,
            club: club.into(),
        }
    }

    fn full_squad() -> Squad {
        // Exactly at ideal depth for DepthRules::uniform(2, 2, 3)
        let mut players = Vec::new();
        for group in PositionGroup::ALL {
            for i in 0..2 {
                players.push(player(
                    &format!("{}-{i}", group.short()),
                    25,
                    group,
                    dec!(1_000_000),
                    "Home FC",
                ));
            }
        }
        Squad::new("Home FC", 2024, players)
    }

    fn pool_of(players: Vec<Player>, strategy: &StrategyConfig) -> MarketPool {
        MarketPoolBuilder::new(2024, "Home FC").build(&[Squad::new("Peer", 2024, players)], strategy)
    }

    fn open_budget(transfer: Decimal, fraction: Decimal) -> BudgetState {
        BudgetState::opening(transfer, dec!(1_000_000_000), Decimal::ZERO, fraction)
    }

    #[test]
    fn test_gaps_clipped_at_zero() {
        let engine = BuyEngine::new(DepthRules::uniform(2, 3, 4));
        let mut squad = full_squad();
        squad.players.push(player("extra", 25, PositionGroup::Forward, dec!(1), "Home FC"));
        squad.players.push(player("extra2", 25, PositionGroup::Forward, dec!(1), "Home FC"));
        let gaps = engine.gaps(&squad);
        assert_eq!(gaps.goalkeeper, 1);
        assert_eq!(gaps.forward, 0);
    }

    #[test]
    fn test_conservative_ceiling_rejects_expensive_candidate() {
        let strategy = StrategyConfig::resolve(StrategyMode::Conservative);
        let engine = BuyEngine::new(DepthRules::uniform(2, 2, 3));
        let mut pool = pool_of(
            vec![player("star", 22, PositionGroup::Forward, dec!(60_000_000), "Peer")],
            &strategy,
        );
        let budget = open_budget(dec!(100_000_000), strategy.spend_cap_fraction);
        assert_eq!(budget.spendable(), dec!(50_000_000));

        let out = engine.run(full_squad(), &mut pool, budget, &strategy);
        assert!(out.bought.is_empty());
        assert_eq!(out.budget.transfer_budget_remaining, dec!(100_000_000));
        assert!(pool.contains("star"));
    }

    #[test]
    fn test_gap_filled_before_reinforcement() {
        let strategy = StrategyConfig::resolve(StrategyMode::Balanced);
        let engine = BuyEngine::new(DepthRules::uniform(2, 2, 3));
        let mut squad = full_squad();
        squad.remove("GK-1");

        let mut pool = pool_of(
            vec![
                player("fwd", 24, PositionGroup::Forward, dec!(30_000_000), "Peer"),
                player("gk", 24, PositionGroup::Goalkeeper, dec!(10_000_000), "Peer"),
            ],
            &strategy,
        );
        // Enough for only one of them
        let budget = open_budget(dec!(30_000_000), Decimal::ONE);
        let out = engine.run(squad, &mut pool, budget, &strategy);

        assert_eq!(out.bought.len(), 1);
        assert_eq!(out.bought[0].player.id, "gk");
        assert!(out.unfilled_gaps.is_empty());
        assert_eq!(out.budget.transfer_budget_remaining, dec!(20_000_000));
    }

    #[test]
    fn test_reinforcements_stop_at_max_depth() {
        let strategy = StrategyConfig::resolve(StrategyMode::Balanced);
        let engine = BuyEngine::new(DepthRules::uniform(2, 2, 3));
        let mut pool = pool_of(
            vec![
                player("f1", 24, PositionGroup::Forward, dec!(3), "Peer"),
                player("f2", 24, PositionGroup::Forward, dec!(2), "Peer"),
                player("f3", 24, PositionGroup::Forward, dec!(1), "Peer"),
            ],
            &strategy,
        );
        let out = engine.run(full_squad(), &mut pool, open_budget(dec!(100), Decimal::ONE), &strategy);
        assert_eq!(out.bought.len(), 1);
        assert_eq!(out.bought[0].player.id, "f1");
        assert_eq!(out.squad.count(PositionGroup::Forward), 3);
    }

    #[test]
    fn test_salary_gate_skips_candidate() {
        let strategy = StrategyConfig::resolve(StrategyMode::Balanced);
        let engine = BuyEngine::new(DepthRules::uniform(2, 3, 3));
        let squad = full_squad();
        let mut pool = pool_of(
            vec![
                player("pricey", 24, PositionGroup::Defender, dec!(50_000_000), "Peer"),
                player("modest", 24, PositionGroup::Defender, dec!(10_000_000), "Peer"),
            ],
            &strategy,
        );
        // 2M of wage headroom: 5M wage rejected, 1M wage accepted
        let budget = BudgetState::opening(dec!(100_000_000), dec!(2_000_000), Decimal::ZERO, Decimal::ONE);
        let out = engine.run(squad, &mut pool, budget, &strategy);
        let ids: Vec<&str> = out.bought.iter().map(|r| r.player.id.as_str()).collect();
        assert_eq!(ids, vec!["modest"]);
        assert_eq!(out.budget.salary_budget_remaining, dec!(1_000_000));
        assert_eq!(
            BuyEngine::check_affordable(&pool.players()[0], &out.budget),
            Err(SkipReason::OverSalaryBudget)
        );
    }

    #[test]
    fn test_empty_group_reported_as_unfilled() {
        let strategy = StrategyConfig::resolve(StrategyMode::Balanced);
        let engine = BuyEngine::new(DepthRules::uniform(2, 3, 3));
        let mut pool = pool_of(
            vec![player("mid", 24, PositionGroup::Midfielder, dec!(1), "Peer")],
            &strategy,
        );
        let out = engine.run(full_squad(), &mut pool, open_budget(dec!(100), Decimal::ONE), &strategy);

        assert_eq!(out.bought.len(), 1);
        let gk = out
            .unfilled_gaps
            .iter()
            .find(|g| g.position == PositionGroup::Goalkeeper)
            .unwrap();
        assert_eq!(gk.missing, 1);
        assert_eq!(gk.reason, GapReason::NoCandidate);
    }

    #[test]
    fn test_unaffordable_gap_reason() {
        let strategy = StrategyConfig::resolve(StrategyMode::Balanced);
        let engine = BuyEngine::new(DepthRules::uniform(2, 3, 3));
        let mut squad = full_squad();
        squad.players.retain(|p| p.position == PositionGroup::Goalkeeper);
        let mut pool = pool_of(
            vec![player("gk", 24, PositionGroup::Goalkeeper, dec!(500), "Peer")],
            &strategy,
        );
        let out = engine.run(squad, &mut pool, open_budget(dec!(100), Decimal::ONE), &strategy);
        let gk = out
            .unfilled_gaps
            .iter()
            .find(|g| g.position == PositionGroup::Goalkeeper)
            .unwrap();
        assert_eq!(gk.reason, GapReason::Unaffordable);
    }

    #[test]
    fn test_wage_overrun_blocks_buying() {
        let strategy = StrategyConfig::resolve(StrategyMode::Balanced);
        let engine = BuyEngine::new(DepthRules::uniform(2, 3, 3));
        let mut pool = pool_of(
            vec![player("free", 24, PositionGroup::Defender, Decimal::ZERO, "Peer")],
            &strategy,
        );
        // Wage bill 800k against a 500k budget; even a zero-wage signing
        // must wait until the overrun is paid off
        let squad = full_squad();
        let budget = BudgetState::opening(dec!(10_000_000), dec!(500_000), squad.wage_bill(), Decimal::ONE);
        assert_eq!(budget.salary_budget_remaining, dec!(-300_000));

        let out = engine.run(squad, &mut pool, budget, &strategy);
        assert!(out.bought.is_empty());
        assert_eq!(out.unfilled_gaps.len(), 4);
        let def = out
            .unfilled_gaps
            .iter()
            .find(|g| g.position == PositionGroup::Defender)
            .unwrap();
        assert_eq!(def.reason, GapReason::Unaffordable);
    }

    #[test]
    fn test_free_player_signed_with_spent_budgets() {
        let strategy = StrategyConfig::resolve(StrategyMode::Balanced);
        let engine = BuyEngine::new(DepthRules::uniform(2, 3, 3));
        let mut pool = pool_of(
            vec![
                player("paid", 24, PositionGroup::Goalkeeper, dec!(1_000_000), "Peer"),
                player("free", 24, PositionGroup::Goalkeeper, Decimal::ZERO, "Peer"),
            ],
            &strategy,
        );
        // No transfer money and the wage bill exactly at budget
        let squad = full_squad();
        let budget = BudgetState::opening(Decimal::ZERO, squad.wage_bill(), squad.wage_bill(), Decimal::ONE);

        let out = engine.run(squad, &mut pool, budget, &strategy);
        let ids: Vec<&str> = out.bought.iter().map(|r| r.player.id.as_str()).collect();
        assert_eq!(ids, vec!["free"]);
        assert_eq!(out.budget.salary_budget_remaining, Decimal::ZERO);
    }

    #[test]
    fn test_budgets_never_negative() {
        let strategy = StrategyConfig::resolve(StrategyMode::WinNow);
        let engine = BuyEngine::new(DepthRules::uniform(2, 6, 8));
        let players: Vec<Player> = (0..40)
            .map(|i| {
                let group = PositionGroup::ALL[i % 4];
                player(&format!("c{i}"), 20 + (i as u32 % 10), group, Decimal::from(i as u64 * 1_000_000), "Peer")
            })
            .collect();
        let mut pool = pool_of(players, &strategy);
        let budget = BudgetState::opening(dec!(75_000_000), dec!(9_000_000), Decimal::ZERO, Decimal::ONE);
        let out = engine.run(full_squad(), &mut pool, budget, &strategy);

        assert!(out.budget.transfer_budget_remaining >= Decimal::ZERO);
        assert!(out.budget.salary_budget_remaining >= Decimal::ZERO);
        assert!(out.budget.spend_ceiling_remaining >= Decimal::ZERO);
        let fees: Decimal = out.bought.iter().map(|r| r.fee).sum();
        assert_eq!(fees, out.budget.total_spend);
        for record in &out.bought {
            assert!(!pool.contains(&record.player.id));
        }
    }
}
