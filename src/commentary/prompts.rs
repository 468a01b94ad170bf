//! Prompt construction for the commentary models.
//!
//! Prompts carry the structured run data and ask for a JSON object back.

use rust_decimal::prelude::*;

use super::{position_stats, ModeSummary};
use crate::types::{season_label, SimulationResult, TransferRecord};

/// System prompt shared by every commentary request.
pub fn system_prompt() -> &'static str {
    "You are a football transfer analyst. You receive the output of a \
     deterministic transfer window simulation and explain it.\n\n\
     RULES:\n\
     1. Ground every sentence in the numbers you are given: names, ages, fees.\n\
     2. Never invent players, fees or transfers that are not listed.\n\
     3. Reply with ONLY a valid JSON object matching the requested schema. \
        No markdown, no text outside the JSON."
}

/// Whole-euro amount with thousands separators, e.g. `€12,500,000`.
pub fn format_eur(amount: Decimal) -> String {
    let whole = amount.round().to_i128().unwrap_or(0);
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-€{grouped}")
    } else {
        format!("€{grouped}")
    }
}

fn transfer_line(t: &TransferRecord) -> String {
    format!(
        "  - {} (age {}, {}, MV {}, fee {})\n",
        t.player.name,
        t.player.age,
        t.player.position.short(),
        format_eur(t.player.market_value),
        format_eur(t.fee),
    )
}

/// User prompt for a single-run season summary.
pub fn build_summary_prompt(result: &SimulationResult) -> String {
    let req = &result.request;
    let k = &result.kpis;
    let mut prompt = String::with_capacity(3000);

    prompt.push_str(&format!(
        "Analyse this transfer window simulation for {} ({} season).\n\n",
        req.club,
        season_label(req.season)
    ));
    prompt.push_str(&format!("CLUB: {}\nLEAGUE: {}\nSTRATEGY MODE: {}\n", req.club, req.league, req.mode));
    prompt.push_str(&format!("TRANSFER BUDGET: {}\n", format_eur(req.transfer_budget)));
    prompt.push_str(&format!("SALARY BUDGET: {}\n\n", format_eur(req.salary_budget)));

    prompt.push_str(&format!("PLAYERS SOLD ({}):\n", result.sold.len()));
    if result.sold.is_empty() {
        prompt.push_str("  (none)\n");
    }
    for t in &result.sold {
        prompt.push_str(&transfer_line(t));
    }

    prompt.push_str(&format!("\nPLAYERS BOUGHT ({}):\n", result.bought.len()));
    if result.bought.is_empty() {
        prompt.push_str("  (none)\n");
    }
    for t in &result.bought {
        prompt.push_str(&transfer_line(t));
    }

    prompt.push_str("\nKPIS:\n");
    prompt.push_str(&format!("  Squad valuation before: {}\n", format_eur(k.before.valuation)));
    prompt.push_str(&format!("  Squad valuation after:  {}\n", format_eur(k.after.valuation)));
    prompt.push_str(&format!("  Valuation change:       {}\n", format_eur(k.valuation_change)));
    prompt.push_str(&format!("  Net spend:              {}\n", format_eur(k.net_spend)));
    prompt.push_str(&format!("  Average age before:     {:.1}\n", k.before.average_age));
    prompt.push_str(&format!("  Average age after:      {:.1}\n", k.after.average_age));
    prompt.push_str(&format!(
        "  Salary used:            {} / {}\n",
        format_eur(k.salary_used),
        format_eur(k.salary_budget)
    ));
    prompt.push_str(&format!(
        "  Transfer budget remaining: {}\n",
        format_eur(k.transfer_budget_remaining)
    ));

    prompt.push_str("\nFINAL SQUAD BY POSITION:\n");
    for stat in position_stats(&result.squad_after) {
        let age = stat
            .average_age
            .map(|a| format!("{a:.1}"))
            .unwrap_or_else(|| "N/A".into());
        prompt.push_str(&format!("  {}: {} players, average age {}\n", stat.group.short(), stat.count, age));
    }

    if !result.unfilled_gaps.is_empty() {
        prompt.push_str("\nUNFILLED GAPS:\n");
        for gap in &result.unfilled_gaps {
            prompt.push_str(&format!("  - {gap}\n"));
        }
    }

    prompt.push_str(
        "\nReturn a JSON object with exactly these keys:\n\
         {\n\
           \"headline\": \"1-3 sentence summary of the window and its direction\",\n\
           \"key_observations\": [\"3 to 5 specific observations\"],\n\
           \"financial_verdict\": \"2-3 sentences on net spend, value for money and wages\",\n\
           \"weakness\": \"1-2 sentences on the biggest remaining squad weakness\",\n\
           \"transfer_justifications\": [\n\
             {\"player_name\": \"exact name\", \"decision\": \"bought | sold\", \"reasoning\": \"1-2 sentences\"}\n\
           ]\n\
         }\n\
         Include one transfer_justifications entry for EVERY player sold and EVERY player bought.\n",
    );

    prompt
}

/// User prompt for a cross-mode comparison.
pub fn build_comparison_prompt(results: &[SimulationResult], summaries: &[ModeSummary]) -> String {
    let mut prompt = String::with_capacity(2000);

    if let Some(first) = results.first() {
        prompt.push_str(&format!(
            "You are advising {} ({}, {}). The same budgets were simulated under {} strategies.\n\n",
            first.request.club,
            first.request.league,
            season_label(first.request.season),
            results.len()
        ));
    }

    for (result, summary) in results.iter().zip(summaries) {
        let k = &result.kpis;
        prompt.push_str(&format!("--- MODE: {} ---\n", summary.mode));
        prompt.push_str(&format!(
            "  Sold {} / bought {}\n",
            summary.players_sold, summary.players_bought
        ));
        prompt.push_str(&format!("  Net spend: {}\n", format_eur(summary.net_spend_eur)));
        prompt.push_str(&format!("  Valuation change: {}\n", format_eur(summary.valuation_change_eur)));
        prompt.push_str(&format!(
            "  Average age: {:.1} -> {:.1}\n",
            k.before.average_age, summary.avg_age_after
        ));
        prompt.push_str(&format!(
            "  Salary used: {} / {}\n",
            format_eur(k.salary_used),
            format_eur(k.salary_budget)
        ));
        prompt.push_str(&format!(
            "  Transfer budget remaining: {}\n",
            format_eur(k.transfer_budget_remaining)
        ));
        prompt.push_str(&format!("  Unfilled gaps: {}\n\n", result.unfilled_gaps.len()));
    }

    prompt.push_str(
        "Return a JSON object with exactly these keys:\n\
         {\n\
           \"recommended_mode\": \"balanced | conservative | win_now\",\n\
           \"recommendation_rationale\": \"2-3 sentences\",\n\
           \"tradeoff_analysis\": \"2-3 sentences comparing the modes\"\n\
         }\n",
    );

    prompt
}
