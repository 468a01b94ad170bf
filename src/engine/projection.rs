//! One-season projection of a squad.
//!
//! Ages every player by a year and moves market values along the usual
//! age curve: youth appreciates fastest, players over 30 depreciate.
//! The projection is reported alongside the KPIs and never feeds back
//! into them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::kpi::KpiCalculator;
use crate::types::{KpiSnapshot, Player, Squad};

/// Value multiplier for one season, keyed on the player's current age.
pub fn value_multiplier(age: u32) -> Decimal {
    match age {
        0..=20 => dec!(1.15),
        21..=24 => dec!(1.10),
        25..=28 => dec!(1.03),
        29..=30 => dec!(0.95),
        31..=32 => dec!(0.90),
        _ => dec!(0.80),
    }
}

/// New squad one season on. The input is untouched.
pub fn project_squad(squad: &Squad) -> Squad {
    let players = squad
        .players
        .iter()
        .map(|p| Player {
            age: p.age + 1,
            market_value: (p.market_value * value_multiplier(p.age)).round(),
            ..p.clone()
        })
        .collect();
    Squad::new(squad.club.clone(), squad.season + 1, players)
}

/// KPI snapshot of the projected squad.
pub fn next_season_snapshot(squad: &Squad, salary_budget: Decimal) -> KpiSnapshot {
    KpiCalculator::snapshot(&project_squad(squad), salary_budget)
}
