//! AI commentary on completed simulations.
//!
//! Defines the `CommentaryGenerator` trait and the structured replies it
//! produces. Commentary sits outside the simulation pipeline: it reads a
//! finished [`SimulationResult`] and its failure never affects the result.

pub mod anthropic;
pub mod prompts;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{PositionGroup, SimulationResult, Squad, StrategyMode};

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Bought,
    Sold,
}

/// Reasoning for a single transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferJustification {
    pub player_name: String,
    pub decision: Decision,
    pub reasoning: String,
}

/// Structured analysis of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub headline: String,
    /// Three to five concrete observations.
    pub key_observations: Vec<String>,
    pub financial_verdict: String,
    pub weakness: String,
    #[serde(default)]
    pub transfer_justifications: Vec<TransferJustification>,
}

impl SeasonSummary {
    pub fn validate(&self) -> Result<()> {
        let n = self.key_observations.len();
        if !(3..=5).contains(&n) {
            anyhow::bail!("Expected 3-5 key observations, got {n}");
        }
        if self.headline.trim().is_empty() {
            anyhow::bail!("Empty headline");
        }
        Ok(())
    }
}

/// Locally computed stats for one mode inside a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSummary {
    pub mode: StrategyMode,
    pub headline: String,
    pub net_spend_eur: Decimal,
    pub valuation_change_eur: Decimal,
    pub avg_age_after: f64,
    pub players_bought: usize,
    pub players_sold: usize,
}

impl ModeSummary {
    pub fn from_result(result: &SimulationResult) -> Self {
        let k = &result.kpis;
        Self {
            mode: result.request.mode,
            headline: format!(
                "Sold {}, bought {}, net spend {}, valuation change {}",
                result.sold.len(),
                result.bought.len(),
                prompts::format_eur(k.net_spend),
                prompts::format_eur(k.valuation_change),
            ),
            net_spend_eur: k.net_spend,
            valuation_change_eur: k.valuation_change,
            avg_age_after: k.after.average_age,
            players_bought: result.bought.len(),
            players_sold: result.sold.len(),
        }
    }
}

/// Cross-mode recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub recommended_mode: StrategyMode,
    pub recommendation_rationale: String,
    pub mode_summaries: Vec<ModeSummary>,
    pub tradeoff_analysis: String,
}

/// The part of a comparison the model writes.
#[derive(Debug, Deserialize)]
pub(crate) struct ComparisonReply {
    pub recommended_mode: String,
    pub recommendation_rationale: String,
    pub tradeoff_analysis: String,
}

impl ComparisonReply {
    pub(crate) fn into_comparison(self, mode_summaries: Vec<ModeSummary>) -> Result<StrategyComparison> {
        let recommended_mode: StrategyMode = self
            .recommended_mode
            .parse()
            .context("Model recommended an unknown mode")?;
        Ok(StrategyComparison {
            recommended_mode,
            recommendation_rationale: self.recommendation_rationale,
            mode_summaries,
            tradeoff_analysis: self.tradeoff_analysis,
        })
    }
}

// ---------------------------------------------------------------------------
// Generator trait
// ---------------------------------------------------------------------------

/// Abstraction over commentary providers.
#[async_trait]
pub trait CommentaryGenerator: Send + Sync {
    /// Analyse a single run.
    async fn summarise(&self, result: &SimulationResult) -> Result<SeasonSummary>;

    /// Compare runs of the same club and season under different modes.
    async fn compare(&self, results: &[SimulationResult]) -> Result<StrategyComparison>;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}

/// Commentary attached to an output, or the reason it is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commentary<T> {
    pub commentary: Option<T>,
    pub commentary_error: Option<String>,
}

impl<T> Commentary<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            commentary: None,
            commentary_error: Some(reason.into()),
        }
    }

    fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(c) => Self {
                commentary: Some(c),
                commentary_error: None,
            },
            Err(e) => {
                warn!(error = %e, "AI commentary unavailable");
                Self::unavailable(format!("{e:#}"))
            }
        }
    }
}

/// Season commentary, never failing.
pub async fn season_commentary(
    generator: Option<&dyn CommentaryGenerator>,
    result: &SimulationResult,
) -> Commentary<SeasonSummary> {
    match generator {
        Some(g) => Commentary::from_result(g.summarise(result).await),
        None => Commentary::unavailable("AI commentary is not configured"),
    }
}

/// Comparison commentary, never failing.
pub async fn comparison_commentary(
    generator: Option<&dyn CommentaryGenerator>,
    results: &[SimulationResult],
) -> Commentary<StrategyComparison> {
    match generator {
        Some(g) => Commentary::from_result(g.compare(results).await),
        None => Commentary::unavailable("AI commentary is not configured"),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Count and average age of one position group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionStat {
    pub group: PositionGroup,
    pub count: usize,
    pub average_age: Option<f64>,
}

/// Per-group counts and average ages of a squad.
pub fn position_stats(squad: &Squad) -> Vec<PositionStat> {
    PositionGroup::ALL
        .iter()
        .map(|&group| {
            let ages: Vec<u32> = squad
                .players
                .iter()
                .filter(|p| p.position == group)
                .map(|p| p.age)
                .collect();
            let average_age = (!ages.is_empty()).then(|| {
                let avg = ages.iter().sum::<u32>() as f64 / ages.len() as f64;
                (avg * 10.0).round() / 10.0
            });
            PositionStat {
                group,
                count: ages.len(),
                average_age,
            }
        })
        .collect()
}

/// Strip markdown code fences and surrounding prose from a JSON reply.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end().trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

/// Parse a model reply into `T`.
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(extract_json(text)).context("Model reply is not valid JSON for the expected schema")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;
    use rust_decimal_macros::dec;

    fn squad() -> Squad {
        let p = |id: &str, age, position| Player {
            id: id.into(),
            name: id.into(),
            age,
            position,
            market_value: dec!(1),
            club: "Home FC".into(),
        };
        Squad::new(
            "Home FC",
            2024,
            vec![
                p("a", 30, PositionGroup::Goalkeeper),
                p("b", 21, PositionGroup::Goalkeeper),
                p("c", 24, PositionGroup::Forward),
            ],
        )
    }

    #[test]
    fn test_position_stats() {
        let stats = position_stats(&squad());
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].average_age, Some(25.5));
        assert_eq!(stats[1].count, 0);
        assert_eq!(stats[1].average_age, None);
        assert_eq!(stats[3].average_age, Some(24.0));
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(extract_json("Here you go: {\"a\":1} hope it helps"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_summary_reply() {
        let text = r#"```json
        {
          "headline": "A measured window.",
          "key_observations": ["one", "two", "three"],
          "financial_verdict": "Sustainable.",
          "weakness": "Thin at keeper.",
          "transfer_justifications": [
            {"player_name": "X", "decision": "sold", "reasoning": "Age."}
          ]
        }
        ```"#;
        let summary: SeasonSummary = parse_reply(text).unwrap();
        assert!(summary.validate().is_ok());
        assert_eq!(summary.transfer_justifications[0].decision, Decision::Sold);
    }

    #[test]
    fn test_summary_validation() {
        let summary = SeasonSummary {
            headline: "h".into(),
            key_observations: vec!["only one".into()],
            financial_verdict: String::new(),
            weakness: String::new(),
            transfer_justifications: vec![],
        };
        assert!(summary.validate().is_err());
    }

    #[test]
    fn test_comparison_reply_mode() {
        let reply: ComparisonReply = parse_reply(
            r#"{"recommended_mode": "win_now", "recommendation_rationale": "r", "tradeoff_analysis": "t"}"#,
        )
        .unwrap();
        let cmp = reply.into_comparison(vec![]).unwrap();
        assert_eq!(cmp.recommended_mode, StrategyMode::WinNow);

        let bad = ComparisonReply {
            recommended_mode: "all_in".into(),
            recommendation_rationale: String::new(),
            tradeoff_analysis: String::new(),
        };
        assert!(bad.into_comparison(vec![]).is_err());
    }

    #[tokio::test]
    async fn test_commentary_without_generator() {
        let result = crate::engine::SimulationRunner::default()
            .run(
                &crate::types::SimulationRequest {
                    club: "Home FC".into(),
                    league: "test".into(),
                    season: 2024,
                    transfer_budget: dec!(0),
                    salary_budget: dec!(0),
                    mode: StrategyMode::Balanced,
                },
                &crate::engine::SeasonSnapshot::new(squad(), vec![]),
            )
            .unwrap();
        let c = season_commentary(None, &result).await;
        assert!(c.commentary.is_none());
        assert!(c.commentary_error.is_some());
    }
}
