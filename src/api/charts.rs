//! Chart-ready views of a simulation result.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{SimulationResult, Squad};

/// Age buckets as (label, lowest age, highest age).
pub const AGE_BUCKETS: [(&str, u32, u32); 6] = [
    ("U21", 0, 20),
    ("21-23", 21, 23),
    ("24-26", 24, 26),
    ("27-29", 27, 29),
    ("30-32", 30, 32),
    ("33+", 33, u32::MAX),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeDistribution {
    pub labels: Vec<&'static str>,
    pub before: Vec<usize>,
    pub after: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationData {
    pub before: Decimal,
    pub after: Decimal,
    pub change: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetData {
    pub transfer_spent: Decimal,
    pub transfer_remaining: Decimal,
    pub salary_used: Decimal,
    pub salary_remaining: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub age_distribution: AgeDistribution,
    pub valuation: ValuationData,
    pub budget: BudgetData,
}

fn bucket_counts(squad: &Squad) -> Vec<usize> {
    AGE_BUCKETS
        .iter()
        .map(|&(_, lo, hi)| squad.players.iter().filter(|p| (lo..=hi).contains(&p.age)).count())
        .collect()
}

impl ChartData {
    pub fn from_result(result: &SimulationResult) -> Self {
        let k = &result.kpis;
        Self {
            age_distribution: AgeDistribution {
                labels: AGE_BUCKETS.iter().map(|b| b.0).collect(),
                before: bucket_counts(&result.squad_before),
                after: bucket_counts(&result.squad_after),
            },
            valuation: ValuationData {
                before: k.before.valuation,
                after: k.after.valuation,
                change: k.valuation_change,
            },
            budget: BudgetData {
                transfer_spent: k.total_spend,
                transfer_remaining: k.transfer_budget_remaining,
                salary_used: k.salary_used,
                salary_remaining: k.salary_budget_remaining,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Player, PositionGroup};
    use rust_decimal_macros::dec;

    #[test]
    fn test_bucket_edges() {
        let ages = [17, 20, 21, 23, 24, 29, 30, 32, 33, 41];
        let players = ages
            .iter()
            .map(|&age| Player {
                id: format!("p{age}"),
                name: String::new(),
                age,
                position: PositionGroup::Defender,
                market_value: dec!(1),
                club: "Home FC".into(),
            })
            .collect();
        let counts = bucket_counts(&Squad::new("Home FC", 2024, players));
        assert_eq!(counts, vec![2, 2, 1, 1, 2, 2]);
        assert_eq!(counts.iter().sum::<usize>(), ages.len());
    }
}
