//! TRANSFER-SIM — Rule-based football transfer window simulator
//!
//! Entry point. Loads configuration, initialises structured logging and
//! dispatches to the CLI subcommands: one-off simulations, three-mode
//! comparisons, the club list, or the HTTP API server.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn};

use transfer_sim::api::{self, ApiState};
use transfer_sim::commentary::anthropic::AnthropicAnalyst;
use transfer_sim::commentary::prompts::format_eur;
use transfer_sim::commentary::{comparison_commentary, season_commentary, CommentaryGenerator};
use transfer_sim::config::AppConfig;
use transfer_sim::data::clubs::ClubRegistry;
use transfer_sim::data::store::JsonSquadStore;
use transfer_sim::engine::SimulationRunner;
use transfer_sim::storage;
use transfer_sim::types::{season_label, SimulationResult, StrategyMode};

/// Rule-based football transfer window simulator
#[derive(Parser)]
#[command(name = "transfer-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct WindowArgs {
    /// Club display name or Transfermarkt slug
    #[arg(long)]
    team_name: String,

    /// Season start year (2024 = 2024/25)
    #[arg(long)]
    season: u16,

    /// Transfer budget in EUR
    #[arg(long)]
    transfer_budget: Decimal,

    /// Annual salary budget in EUR
    #[arg(long)]
    salary_budget: Decimal,

    /// Skip AI commentary
    #[arg(long)]
    no_commentary: bool,

    /// Write results to the configured results directory
    #[arg(long)]
    save: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one transfer window
    Simulate {
        #[command(flatten)]
        window: WindowArgs,

        /// balanced, conservative or win_now
        #[arg(long, default_value = "balanced")]
        strategy_mode: StrategyMode,
    },

    /// Run all three strategy modes and compare them
    Compare {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// List supported clubs
    Clubs,

    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let cfg = AppConfig::load_or_default(&cli.config)?;

    init_logging();

    info!(
        config = %cli.config,
        data_dir = %cfg.simulation.data_dir.display(),
        "transfer-sim starting"
    );

    let registry = ClubRegistry;
    let source = Arc::new(JsonSquadStore::new(&cfg.simulation.data_dir));
    let runner = SimulationRunner::new(cfg.simulation.depth);

    match cli.command {
        Commands::Simulate { window, strategy_mode } => {
            let request = registry.build_request(
                &window.team_name,
                window.season,
                window.transfer_budget,
                window.salary_budget,
                strategy_mode,
            )?;
            let result = runner.run_from_source(source.as_ref(), &request)?;
            print_result(&result);

            if window.save {
                let path = storage::save_result(&result, Some(&cfg.simulation.results_dir))?;
                println!("\nSaved to {}", path.display());
            }

            if !window.no_commentary {
                let analyst = build_analyst(&cfg)?;
                let analysis = season_commentary(analyst.as_deref(), &result).await;
                match analysis.commentary {
                    Some(summary) => {
                        println!("\n== Analysis ==\n{}", summary.headline);
                        for obs in &summary.key_observations {
                            println!("  * {obs}");
                        }
                        println!("Financial verdict: {}", summary.financial_verdict);
                        println!("Weakness: {}", summary.weakness);
                        for j in &summary.transfer_justifications {
                            println!("  [{:?}] {}: {}", j.decision, j.player_name, j.reasoning);
                        }
                    }
                    None => println!(
                        "\nAI commentary unavailable: {}",
                        analysis.commentary_error.unwrap_or_default()
                    ),
                }
            }
        }

        Commands::Compare { window } => {
            let mut results = Vec::with_capacity(StrategyMode::ALL.len());
            for mode in StrategyMode::ALL {
                let request = registry.build_request(
                    &window.team_name,
                    window.season,
                    window.transfer_budget,
                    window.salary_budget,
                    mode,
                )?;
                results.push(runner.run_from_source(source.as_ref(), &request)?);
            }

            println!("{:<14} {:>6} {:>6} {:>16} {:>16} {:>8}", "MODE", "SOLD", "BOUGHT", "NET SPEND", "VALUE CHANGE", "AGE");
            for r in &results {
                println!(
                    "{:<14} {:>6} {:>6} {:>16} {:>16} {:>8.1}",
                    r.request.mode.as_str(),
                    r.sold.len(),
                    r.bought.len(),
                    format_eur(r.kpis.net_spend),
                    format_eur(r.kpis.valuation_change),
                    r.kpis.after.average_age,
                );
            }

            if window.save {
                for r in &results {
                    storage::save_result(r, Some(&cfg.simulation.results_dir))?;
                }
                println!("\nSaved to {}", cfg.simulation.results_dir.display());
            }

            if !window.no_commentary {
                let analyst = build_analyst(&cfg)?;
                let comparison = comparison_commentary(analyst.as_deref(), &results).await;
                match comparison.commentary {
                    Some(c) => {
                        println!("\nRecommended: {}", c.recommended_mode);
                        println!("{}", c.recommendation_rationale);
                        println!("Trade-offs: {}", c.tradeoff_analysis);
                    }
                    None => println!(
                        "\nAI commentary unavailable: {}",
                        comparison.commentary_error.unwrap_or_default()
                    ),
                }
            }
        }

        Commands::Clubs => {
            for league in registry.leagues() {
                println!("{}", registry.league_label(league));
                for club in registry.by_league(league) {
                    println!("  {:<22} {}", club.name, club.slug);
                }
            }
        }

        Commands::Serve { host, port } => {
            let analyst = build_analyst(&cfg)?;
            let state = Arc::new(ApiState::new(source, runner, analyst));
            let host = host.unwrap_or_else(|| cfg.server.host.clone());
            let port = port.unwrap_or(cfg.server.port);
            api::serve(state, &host, port).await?;
        }
    }

    Ok(())
}

/// Commentary provider from config, if a key is available.
fn build_analyst(cfg: &AppConfig) -> Result<Option<Arc<dyn CommentaryGenerator>>> {
    if !cfg.llm.enabled {
        return Ok(None);
    }
    let Some(key) = cfg.llm.api_key() else {
        warn!(env = %cfg.llm.api_key_env, "No LLM API key configured, AI commentary disabled");
        return Ok(None);
    };

    match cfg.llm.provider.as_str() {
        "anthropic" => {
            info!(model = %cfg.llm.model, "Using Anthropic commentary provider");
            let analyst: Arc<dyn CommentaryGenerator> = Arc::new(AnthropicAnalyst::new(
                key,
                Some(cfg.llm.model.clone()),
                Some(cfg.llm.max_tokens),
            )?);
            Ok(Some(analyst))
        }
        other => {
            warn!(provider = other, "Unknown LLM provider, AI commentary disabled");
            Ok(None)
        }
    }
}

fn print_result(result: &SimulationResult) {
    let req = &result.request;
    let k = &result.kpis;

    println!(
        "{} ({}) {} | mode: {}",
        req.club,
        ClubRegistry.league_label(&req.league),
        season_label(req.season),
        req.mode
    );
    println!(
        "Budgets: transfer {} / salary {}\n",
        format_eur(req.transfer_budget),
        format_eur(req.salary_budget)
    );

    println!("Sold ({}):", result.sold.len());
    for t in &result.sold {
        println!("  {t}");
    }
    println!("Bought ({}):", result.bought.len());
    for t in &result.bought {
        println!("  {t}");
    }
    if !result.unfilled_gaps.is_empty() {
        println!("Unfilled gaps:");
        for gap in &result.unfilled_gaps {
            println!("  {gap}");
        }
    }

    println!("\n== KPIs ==");
    println!(
        "Valuation:        {} -> {} ({})",
        format_eur(k.before.valuation),
        format_eur(k.after.valuation),
        format_eur(k.valuation_change)
    );
    println!("Average age:      {:.1} -> {:.1}", k.before.average_age, k.after.average_age);
    println!("Squad size:       {} -> {}", k.before.squad_size, k.after.squad_size);
    println!("Net spend:        {}", format_eur(k.net_spend));
    println!(
        "Salary used:      {} of {} ({}%)",
        format_eur(k.salary_used),
        format_eur(k.salary_budget),
        (k.after.salary_usage_fraction * Decimal::from(100)).round_dp(1)
    );
    println!("Transfer budget remaining: {}", format_eur(k.transfer_budget_remaining));
    println!(
        "Next season projection: valuation {}, average age {:.1}",
        format_eur(result.next_season.valuation),
        result.next_season.average_age
    );
}

/// Initialise tracing subscriber with env filter.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("transfer_sim=info"));

    let json_logging = std::env::var("TRANSFER_SIM_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
