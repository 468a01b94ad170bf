//! End-to-end simulation over an on-disk squad cache.
//!
//! Writes a small LaLiga data directory, runs the full pipeline through
//! the public API and checks the outcome, the saved result and the HTTP
//! surface against it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use transfer_sim::api::{build_router, ApiState};
use transfer_sim::data::clubs::ClubRegistry;
use transfer_sim::data::store::JsonSquadStore;
use transfer_sim::engine::SimulationRunner;
use transfer_sim::storage;
use transfer_sim::strategy::DepthRules;
use transfer_sim::types::{
    RunPhase, SellReason, SimError, StrategyMode, TransferDirection,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn temp_dir(tag: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("transfer_sim_it_{tag}_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn record(id: &str, age: u32, position: &str, value: u64) -> Value {
    json!({
        "player_id": id,
        "name": format!("Player {id}"),
        "age": age,
        "position": position,
        "market_value": value,
    })
}

fn write_cache(dir: &Path, slug: &str, team: &str, players: Vec<Value>) {
    let body = json!({
        "team_name": team,
        "season": "2024-25",
        "players": players,
        "transfers": [],
        "valuations": [],
    });
    std::fs::write(
        dir.join(format!("{slug}_2024-25.json")),
        serde_json::to_string_pretty(&body).unwrap(),
    )
    .unwrap();
}

/// Real Madrid with an ageing keeper and striker; Barcelona holds the
/// only eligible replacements, Villarreal only players outside the
/// balanced age window.
fn laliga_fixture() -> PathBuf {
    let dir = temp_dir("data");
    write_cache(
        &dir,
        "real-madrid",
        "Real Madrid",
        vec![
            record("rm-gk1", 25, "Goalkeeper", 10_000_000),
            record("rm-gk2", 35, "Goalkeeper", 2_000_000),
            record("rm-cb", 27, "Centre-Back", 30_000_000),
            record("rm-lb", 29, "Left-Back", 15_000_000),
            record("rm-cm", 24, "Central Midfield", 60_000_000),
            record("rm-am", 26, "Attacking Midfield", 40_000_000),
            record("rm-cf", 30, "Centre-Forward", 25_000_000),
            record("rm-ss", 33, "Second Striker", 5_000_000),
        ],
    );
    write_cache(
        &dir,
        "fc-barcelona",
        "FC Barcelona",
        vec![
            record("fcb-gk", 22, "Goalkeeper", 8_000_000),
            record("fcb-rw", 23, "Right Winger", 20_000_000),
        ],
    );
    write_cache(
        &dir,
        "fc-villarreal",
        "Villarreal",
        vec![
            record("vil-gk", 36, "Goalkeeper", 1_000_000),
            record("vil-cf", 31, "Centre-Forward", 3_000_000),
        ],
    );
    dir
}

fn runner() -> SimulationRunner {
    SimulationRunner::new(DepthRules::uniform(1, 2, 3))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_balanced_window_from_disk() {
    let dir = laliga_fixture();
    let store = JsonSquadStore::new(&dir);
    let request = ClubRegistry
        .build_request("real-madrid", 2024, dec!(50_000_000), dec!(100_000_000), StrategyMode::Balanced)
        .unwrap();

    let result = runner().run_from_source(&store, &request).unwrap();

    assert_eq!(result.phase, RunPhase::Completed);
    assert_eq!(result.squad_before.len(), 8);

    let sold: HashSet<&str> = result.sold.iter().map(|r| r.player.id.as_str()).collect();
    assert_eq!(sold, HashSet::from(["rm-gk2", "rm-ss"]));
    assert!(result
        .sold
        .iter()
        .all(|r| r.sell_reason == Some(SellReason::Age) && r.direction == TransferDirection::Sell));

    let bought: HashSet<&str> = result.bought.iter().map(|r| r.player.id.as_str()).collect();
    assert_eq!(bought, HashSet::from(["fcb-gk", "fcb-rw"]));
    assert!(result.bought.iter().all(|r| r.player.club == "FC Barcelona"));
    assert!(result.unfilled_gaps.is_empty());

    assert_eq!(result.kpis.total_sale_proceeds, dec!(5_950_000));
    assert_eq!(result.kpis.total_spend, dec!(28_000_000));
    assert_eq!(result.kpis.net_spend, dec!(22_050_000));
    assert_eq!(result.kpis.transfer_budget_remaining, dec!(27_950_000));
    assert_eq!(result.squad_after.len(), 8);
    assert_eq!(
        result.kpis.valuation_change,
        result.kpis.after.valuation - result.kpis.before.valuation
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_modes_diverge_on_same_data() {
    let dir = laliga_fixture();
    let store = JsonSquadStore::new(&dir);

    for mode in StrategyMode::ALL {
        let request = ClubRegistry
            .build_request("Real Madrid", 2024, dec!(50_000_000), dec!(100_000_000), mode)
            .unwrap();
        let result = runner().run_from_source(&store, &request).unwrap();
        let strategy = transfer_sim::strategy::StrategyConfig::resolve(mode);

        for r in &result.bought {
            assert!(strategy.accepts_age(r.player.age), "{mode}: bought age {}", r.player.age);
        }
        assert!(result.kpis.total_spend <= dec!(50_000_000) * strategy.spend_cap_fraction);
        assert!(result.kpis.transfer_budget_remaining >= Decimal::ZERO);
        assert!(result.kpis.salary_budget_remaining >= Decimal::ZERO);
    }

    // WinNow keeps the 33-year-old striker and has no forward gap to fill
    let win_now = runner()
        .run_from_source(
            &store,
            &ClubRegistry
                .build_request("Real Madrid", 2024, dec!(50_000_000), dec!(100_000_000), StrategyMode::WinNow)
                .unwrap(),
        )
        .unwrap();
    let sold: Vec<&str> = win_now.sold.iter().map(|r| r.player.id.as_str()).collect();
    assert_eq!(sold, vec!["rm-gk2"]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_squad_is_reported() {
    let dir = laliga_fixture();
    let store = JsonSquadStore::new(&dir);
    let request = ClubRegistry
        .build_request("Atletico Madrid", 2024, dec!(10), dec!(10), StrategyMode::Balanced)
        .unwrap();

    let err = runner().run_from_source(&store, &request).unwrap_err();
    assert!(matches!(err, SimError::MissingData { .. }));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_saved_result_round_trip() {
    let dir = laliga_fixture();
    let results_dir = temp_dir("results");
    let store = JsonSquadStore::new(&dir);
    let request = ClubRegistry
        .build_request("Real Madrid", 2024, dec!(50_000_000), dec!(100_000_000), StrategyMode::Conservative)
        .unwrap();
    let result = runner().run_from_source(&store, &request).unwrap();

    let path = storage::save_result(&result, Some(&results_dir)).unwrap();
    assert!(path.ends_with("real-madrid_2024-25_conservative.json"));

    let loaded = storage::load_result(Some(&results_dir), "Real Madrid", 2024, StrategyMode::Conservative)
        .unwrap()
        .unwrap()
        .result;
    assert_eq!(loaded.request, result.request);
    assert_eq!(loaded.sold, result.sold);
    assert_eq!(loaded.bought, result.bought);
    assert_eq!(loaded.kpis.net_spend, result.kpis.net_spend);

    std::fs::remove_dir_all(&dir).unwrap();
    std::fs::remove_dir_all(&results_dir).unwrap();
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_api_simulate_from_disk() {
    let dir = laliga_fixture();
    let state = Arc::new(ApiState::new(Arc::new(JsonSquadStore::new(&dir)), runner(), None));
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/simulate")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "team_name": "Real Madrid",
                "season": 2024,
                "transfer_budget": 50000000,
                "salary_budget": 100000000,
            })
            .to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), 10_000_000).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["club"], "Real Madrid");
    assert_eq!(body["league"], "LaLiga");
    assert_eq!(body["season"], "2024/25");
    assert_eq!(body["strategy_mode"], "balanced");
    assert_eq!(body["result"]["sold"].as_array().unwrap().len(), 2);
    assert_eq!(body["result"]["bought"].as_array().unwrap().len(), 2);
    assert!(body["commentary"].is_null());
    assert!(body["commentary_error"].is_string());

    std::fs::remove_dir_all(&dir).unwrap();
}
