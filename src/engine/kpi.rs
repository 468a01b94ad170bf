//! KPI computation — before/after squad and financial metrics.

use rust_decimal::Decimal;

use crate::types::{BudgetState, KpiReport, KpiSnapshot, Squad};

pub struct KpiCalculator;

impl KpiCalculator {
    /// Metrics for one squad against the configured salary budget.
    ///
    /// A zero salary budget reports a usage fraction of zero.
    pub fn snapshot(squad: &Squad, salary_budget: Decimal) -> KpiSnapshot {
        let wages = squad.wage_bill();
        let salary_usage_fraction = if salary_budget > Decimal::ZERO {
            (wages / salary_budget).round_dp(4)
        } else {
            Decimal::ZERO
        };
        KpiSnapshot {
            valuation: squad.valuation(),
            average_age: squad.average_age(),
            salary_usage_fraction,
            squad_size: squad.len(),
        }
    }

    /// Compare the pre-run squad with the final squad.
    pub fn compute(
        before: &Squad,
        after: &Squad,
        budget: &BudgetState,
        salary_budget: Decimal,
    ) -> KpiReport {
        let before_snap = Self::snapshot(before, salary_budget);
        let after_snap = Self::snapshot(after, salary_budget);
        KpiReport {
            valuation_change: after_snap.valuation - before_snap.valuation,
            net_spend: budget.net_spend(),
            total_spend: budget.total_spend,
            total_sale_proceeds: budget.total_sale_proceeds,
            salary_used: after.wage_bill(),
            salary_budget,
            salary_budget_remaining: budget.salary_headroom(),
            transfer_budget_remaining: budget.transfer_budget_remaining,
            before: before_snap,
            after: after_snap,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
