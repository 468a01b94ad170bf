//! Shared types for the transfer simulator.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that the strategy, engine, data and
//! api modules can depend on them without circular references.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimated annual salary as a fraction of market value.
pub const SALARY_RATIO: Decimal = dec!(0.10);

// ---------------------------------------------------------------------------
// Position groups
// ---------------------------------------------------------------------------

/// Simplified position group used by every squad rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionGroup {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl PositionGroup {
    /// All groups in canonical order (useful for iteration).
    pub const ALL: [PositionGroup; 4] = [
        PositionGroup::Goalkeeper,
        PositionGroup::Defender,
        PositionGroup::Midfielder,
        PositionGroup::Forward,
    ];

    /// Map a Transfermarkt position label to its group.
    pub fn from_position(position: &str) -> Option<Self> {
        match position.trim() {
            "Goalkeeper" => Some(PositionGroup::Goalkeeper),
            "Sweeper" | "Centre-Back" | "Left-Back" | "Right-Back" => Some(PositionGroup::Defender),
            "Defensive Midfield" | "Central Midfield" | "Left Midfield" | "Right Midfield"
            | "Attacking Midfield" => Some(PositionGroup::Midfielder),
            "Left Winger" | "Right Winger" | "Second Striker" | "Centre-Forward" => {
                Some(PositionGroup::Forward)
            }
            _ => None,
        }
    }

    /// Short label used in prompts and charts.
    pub fn short(&self) -> &'static str {
        match self {
            PositionGroup::Goalkeeper => "GK",
            PositionGroup::Defender => "DEF",
            PositionGroup::Midfielder => "MID",
            PositionGroup::Forward => "ATT",
        }
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionGroup::Goalkeeper => write!(f, "Goalkeeper"),
            PositionGroup::Defender => write!(f, "Defender"),
            PositionGroup::Midfielder => write!(f, "Midfielder"),
            PositionGroup::Forward => write!(f, "Forward"),
        }
    }
}

/// Per-group counter indexed by [`PositionGroup`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounts {
    pub goalkeeper: usize,
    pub defender: usize,
    pub midfielder: usize,
    pub forward: usize,
}

impl GroupCounts {
    pub fn get(&self, group: PositionGroup) -> usize {
        match group {
            PositionGroup::Goalkeeper => self.goalkeeper,
            PositionGroup::Defender => self.defender,
            PositionGroup::Midfielder => self.midfielder,
            PositionGroup::Forward => self.forward,
        }
    }

    pub fn get_mut(&mut self, group: PositionGroup) -> &mut usize {
        match group {
            PositionGroup::Goalkeeper => &mut self.goalkeeper,
            PositionGroup::Defender => &mut self.defender,
            PositionGroup::Midfielder => &mut self.midfielder,
            PositionGroup::Forward => &mut self.forward,
        }
    }

    pub fn total(&self) -> usize {
        self.goalkeeper + self.defender + self.midfielder + self.forward
    }
}

// ---------------------------------------------------------------------------
// Player & Squad
// ---------------------------------------------------------------------------

/// A player as loaded from the squad cache. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub position: PositionGroup,
    /// Market value in euros (>= 0)
    pub market_value: Decimal,
    /// Owning club at load time
    pub club: String,
}

impl Player {
    /// Estimated annual wage: 10% of market value.
    pub fn estimated_salary(&self) -> Decimal {
        self.market_value * SALARY_RATIO
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}) EUR {} [{}]",
            self.name,
            self.age,
            self.position.short(),
            self.market_value.round(),
            self.club,
        )
    }
}

/// A club's roster for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub club: String,
    /// Season start year (2024 = 2024/25)
    pub season: u16,
    pub players: Vec<Player>,
}

impl Squad {
    pub fn new(club: impl Into<String>, season: u16, players: Vec<Player>) -> Self {
        Self {
            club: club.into(),
            season,
            players,
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Derived position-group counts.
    pub fn group_counts(&self) -> GroupCounts {
        let mut counts = GroupCounts::default();
        for p in &self.players {
            *counts.get_mut(p.position) += 1;
        }
        counts
    }

    pub fn count(&self, group: PositionGroup) -> usize {
        self.players.iter().filter(|p| p.position == group).count()
    }

    /// Sum of market values.
    pub fn valuation(&self) -> Decimal {
        self.players.iter().map(|p| p.market_value).sum()
    }

    /// Sum of estimated salaries.
    pub fn wage_bill(&self) -> Decimal {
        self.players.iter().map(Player::estimated_salary).sum()
    }

    /// Average age rounded to one decimal; 0.0 for an empty squad.
    pub fn average_age(&self) -> f64 {
        if self.players.is_empty() {
            return 0.0;
        }
        let total: u32 = self.players.iter().map(|p| p.age).sum();
        let avg = total as f64 / self.players.len() as f64;
        (avg * 10.0).round() / 10.0
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// Remove a player by id, returning it if present.
    pub fn remove(&mut self, player_id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        Some(self.players.remove(idx))
    }

    /// "2024/25" style label.
    pub fn season_label(&self) -> String {
        season_label(self.season)
    }
}

/// "2024/25" style label for a season start year.
pub fn season_label(season: u16) -> String {
    format!("{}/{:02}", season, season.wrapping_add(1) % 100)
}

/// "2024-25" style key used in cache file names.
pub fn season_key(season: u16) -> String {
    format!("{}-{:02}", season, season.wrapping_add(1) % 100)
}

// ---------------------------------------------------------------------------
// Strategy mode
// ---------------------------------------------------------------------------

/// Transfer strategy selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    Balanced,
    Conservative,
    WinNow,
}

impl StrategyMode {
    pub const ALL: [StrategyMode; 3] = [
        StrategyMode::Balanced,
        StrategyMode::Conservative,
        StrategyMode::WinNow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyMode::Balanced => "balanced",
            StrategyMode::Conservative => "conservative",
            StrategyMode::WinNow => "win_now",
        }
    }
}

impl Default for StrategyMode {
    fn default() -> Self {
        StrategyMode::Balanced
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a caller-supplied mode string (case-insensitive).
impl std::str::FromStr for StrategyMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(StrategyMode::Balanced),
            "conservative" => Ok(StrategyMode::Conservative),
            "win_now" | "win-now" | "winnow" => Ok(StrategyMode::WinNow),
            _ => Err(SimError::UnknownMode(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

/// Working budget of a single run. Only the sell and buy engines mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    pub transfer_budget_remaining: Decimal,
    /// Salary budget minus the current wage bill. Negative while the
    /// squad is over its wage budget.
    pub salary_budget_remaining: Decimal,
    pub total_spend: Decimal,
    pub total_sale_proceeds: Decimal,
    /// What is left of the strategy's effective spend ceiling.
    pub spend_ceiling_remaining: Decimal,
}

impl BudgetState {
    /// Opening budget for a run. The spend ceiling is fixed here, before
    /// any sale. Salary room keeps any overrun of the current wage bill so
    /// sales must first pay it off.
    pub fn opening(
        transfer_budget: Decimal,
        salary_budget: Decimal,
        wage_bill: Decimal,
        spend_cap_fraction: Decimal,
    ) -> Self {
        Self {
            transfer_budget_remaining: transfer_budget,
            salary_budget_remaining: salary_budget - wage_bill,
            total_spend: Decimal::ZERO,
            total_sale_proceeds: Decimal::ZERO,
            spend_ceiling_remaining: transfer_budget * spend_cap_fraction,
        }
    }

    /// Largest fee the club may pay right now.
    pub fn spendable(&self) -> Decimal {
        self.spend_ceiling_remaining
            .min(self.transfer_budget_remaining)
            .max(Decimal::ZERO)
    }

    /// Salary room as reported, never below zero.
    pub fn salary_headroom(&self) -> Decimal {
        self.salary_budget_remaining.max(Decimal::ZERO)
    }

    pub fn net_spend(&self) -> Decimal {
        self.total_spend - self.total_sale_proceeds
    }
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Sell,
    Buy,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Sell => write!(f, "SELL"),
            TransferDirection::Buy => write!(f, "BUY"),
        }
    }
}

/// Why a player was put up for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellReason {
    Age,
    Surplus,
}

/// One executed transfer. Immutable once appended to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub player: Player,
    pub direction: TransferDirection,
    /// Sale proceeds received, or fee paid
    pub fee: Decimal,
    /// Change in squad valuation caused by this move
    pub valuation_delta: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_reason: Option<SellReason>,
}

impl TransferRecord {
    pub fn sell(player: Player, fee: Decimal, reason: SellReason) -> Self {
        let valuation_delta = -player.market_value;
        Self {
            player,
            direction: TransferDirection::Sell,
            fee,
            valuation_delta,
            sell_reason: Some(reason),
        }
    }

    pub fn buy(player: Player) -> Self {
        let fee = player.market_value;
        Self {
            player,
            direction: TransferDirection::Buy,
            fee,
            valuation_delta: fee,
            sell_reason: None,
        }
    }
}

impl fmt::Display for TransferRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} for EUR {} (valuation {:+})",
            self.direction,
            self.player,
            self.fee.round(),
            self.valuation_delta.round(),
        )
    }
}

/// Why a position gap could not be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    /// No eligible candidate for the group remained in the pool.
    NoCandidate,
    /// Candidates existed but none fitted the remaining budgets.
    Unaffordable,
}

/// A position gap left open after the buy phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfilledGap {
    pub position: PositionGroup,
    pub missing: usize,
    pub reason: GapReason,
}

impl fmt::Display for UnfilledGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            GapReason::NoCandidate => "no eligible candidate",
            GapReason::Unaffordable => "budget",
        };
        write!(f, "{} short by {} ({reason})", self.position, self.missing)
    }
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

/// Squad metrics at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub valuation: Decimal,
    pub average_age: f64,
    /// Wage bill divided by the configured salary budget
    pub salary_usage_fraction: Decimal,
    pub squad_size: usize,
}

/// Before/after KPI comparison for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    pub before: KpiSnapshot,
    pub after: KpiSnapshot,
    pub valuation_change: Decimal,
    /// Fees paid minus proceeds received (positive = net spend)
    pub net_spend: Decimal,
    pub total_spend: Decimal,
    pub total_sale_proceeds: Decimal,
    pub salary_used: Decimal,
    pub salary_budget: Decimal,
    pub salary_budget_remaining: Decimal,
    pub transfer_budget_remaining: Decimal,
}

// ---------------------------------------------------------------------------
// Run lifecycle & result
// ---------------------------------------------------------------------------

/// Linear lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RunPhase {
    Initialized,
    SellPhase,
    BuyPhase,
    KpiComputed,
    Completed,
}

impl RunPhase {
    /// The only phase allowed to follow this one.
    pub fn next(&self) -> Option<RunPhase> {
        match self {
            RunPhase::Initialized => Some(RunPhase::SellPhase),
            RunPhase::SellPhase => Some(RunPhase::BuyPhase),
            RunPhase::BuyPhase => Some(RunPhase::KpiComputed),
            RunPhase::KpiComputed => Some(RunPhase::Completed),
            RunPhase::Completed => None,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Initialized => "initialized",
            RunPhase::SellPhase => "sell_phase",
            RunPhase::BuyPhase => "buy_phase",
            RunPhase::KpiComputed => "kpi_computed",
            RunPhase::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Caller-supplied parameters of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub club: String,
    pub league: String,
    pub season: u16,
    pub transfer_budget: Decimal,
    pub salary_budget: Decimal,
    #[serde(default)]
    pub mode: StrategyMode,
}

impl SimulationRequest {
    /// Reject inputs the engine cannot reason about.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.transfer_budget < Decimal::ZERO {
            return Err(SimError::InvalidInput(
                "transfer budget must not be negative".into(),
            ));
        }
        if self.salary_budget < Decimal::ZERO {
            return Err(SimError::InvalidInput(
                "salary budget must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Complete, immutable output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub request: SimulationRequest,
    pub phase: RunPhase,
    pub squad_before: Squad,
    pub squad_after: Squad,
    pub sold: Vec<TransferRecord>,
    pub bought: Vec<TransferRecord>,
    pub kpis: KpiReport,
    pub unfilled_gaps: Vec<UnfilledGap>,
    /// One-season projection of the final squad
    pub next_season: KpiSnapshot,
}

impl SimulationResult {
    /// Every record, sells first.
    pub fn transfers(&self) -> impl Iterator<Item = &TransferRecord> {
        self.sold.iter().chain(self.bought.iter())
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] sold={} bought={} squad {}->{} valuation EUR {} -> EUR {} net_spend=EUR {} gaps={}",
            self.request.club,
            season_label(self.request.season),
            self.request.mode,
            self.sold.len(),
            self.bought.len(),
            self.squad_before.len(),
            self.squad_after.len(),
            self.kpis.before.valuation.round(),
            self.kpis.after.valuation.round(),
            self.kpis.net_spend.round(),
            self.unfilled_gaps.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the simulator.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("No squad data for {club} in season {season}")]
    MissingData { club: String, season: String },

    #[error("Unknown strategy mode: {0}")]
    UnknownMode(String),

    #[error("Unknown club: {0}")]
    UnknownClub(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
