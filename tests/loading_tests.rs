/// Startup loading tests: artifacts on disk → AppState → served predictions.
///
/// Run with: cargo test --test loading_tests -- --nocapture

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use fiji_predictor::{router, AppState, ServerConfig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::{fs, path::Path};
use tempfile::TempDir;
use tower::ServiceExt;

fn write(dir: &Path, name: &str, value: Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

/// Lays out a complete artifact directory and a config pointing at it.
fn artifacts() -> (TempDir, ServerConfig) {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();

    write(p, "temperature_model_info.json", json!({
        "features": ["years_since_1950", "sin_month", "cos_month"],
        "std_dev": 0.8
    }));
    write(p, "temperature_model.json", json!({
        "coefficients": [[0.02, 0.0, 0.0]],
        "intercepts": [25.0]
    }));
    write(p, "population.json", json!({"2030": 950000.0, "2031": null}));
    write(p, "death_rate_predictions.json", json!({"2030": 7.2, "2031": 7.3}));
    write(p, "environmental_model.json", json!({
        "indicators": ["rainfall", "sea_level"],
        "model": {"coefficients": [[0.0, 1.0], [0.0, 0.1]], "intercepts": [0.0, 0.0]}
    }));
    write(p, "econ_linear.json", json!({
        "coefficients": [[0.0]],
        "intercepts": [2.5]
    }));
    write(p, "economic_model.json", json!({
        "indicators": ["gdp_growth"],
        "model": {"path": "econ_linear.json"}
    }));

    let cfg = ServerConfig {
        temp_model_path: p.join("temperature_model.json"),
        temp_meta_path: p.join("temperature_model_info.json"),
        population_path: p.join("population.json"),
        death_rate_path: p.join("death_rate_predictions.json"),
        env_bundle_path: p.join("environmental_model.json"),
        econ_bundle_path: p.join("economic_model.json"),
        ..ServerConfig::default()
    };
    (dir, cfg)
}

async fn post_json(state: AppState, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_loads_and_serves_all_endpoints() {
    println!("\n=== Test: Load Artifacts And Serve ===");
    let (_dir, cfg) = artifacts();
    let state = AppState::load(&cfg).expect("artifacts should load");

    // 25 + 0.02 * (2024 - 1950) = 26.48
    let (status, body) = post_json(
        state.clone(),
        "/predict-temperature",
        json!({"year": 2024, "month": 3, "day": 15, "hour": 13, "dayofweek": 4}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"prediction": 26.48, "range": {"lower": 25.68, "upper": 27.28}}));
    println!("✓ Temperature served from linear artifact");

    let (_, body) = post_json(state.clone(), "/predict-mortality", json!({"year": 2031})).await;
    assert_eq!(body, json!({"population": null, "death_rate": 7.3, "expected_deaths": null}));

    let (_, body) = post_json(
        state.clone(),
        "/predict-environment",
        json!({"year": 2030, "temperature": 27.5}),
    )
    .await;
    assert_eq!(body, json!({"rainfall": 27.5, "sea_level": 2.75}));

    let (_, body) = post_json(state, "/predict-economy", json!({"year": 2030})).await;
    assert_eq!(body, json!({"gdp_growth": 2.5}));
    println!("✓ Bundle with relative model path resolved");
}

#[test]
fn test_unknown_temperature_feature_aborts_startup() {
    println!("\n=== Test: Unknown Feature ===");
    let (dir, cfg) = artifacts();
    write(dir.path(), "temperature_model_info.json", json!({"features": ["humidity"]}));
    let err = AppState::load(&cfg).err().expect("load should fail");
    println!("  error: {:#}", err);
    assert!(format!("{:#}", err).contains("humidity"));
}

#[test]
fn test_indicator_count_mismatch_aborts_startup() {
    println!("\n=== Test: Indicator Mismatch ===");
    let (dir, cfg) = artifacts();
    write(dir.path(), "economic_model.json", json!({
        "indicators": ["gdp_growth", "inflation"],
        "model": {"path": "econ_linear.json"}
    }));
    let err = AppState::load(&cfg).err().expect("load should fail");
    println!("  error: {:#}", err);
    assert!(format!("{:#}", err).contains("economy warmup failed"));
}

#[test]
fn test_negative_std_dev_aborts_startup() {
    println!("\n=== Test: Negative std_dev ===");
    let (dir, cfg) = artifacts();
    write(dir.path(), "temperature_model_info.json", json!({
        "features": ["years_since_1950"],
        "std_dev": -2.0
    }));
    let err = AppState::load(&cfg).err().expect("load should fail");
    println!("  error: {:#}", err);
    assert!(format!("{:#}", err).contains("invalid std_dev -2"));
}

#[test]
fn test_duplicate_indicator_names_abort_startup() {
    println!("\n=== Test: Duplicate Indicators ===");
    let (dir, cfg) = artifacts();
    write(dir.path(), "environmental_model.json", json!({
        "indicators": ["rainfall", "rainfall"],
        "model": {"coefficients": [[0.0, 1.0], [0.0, 0.1]], "intercepts": [0.0, 0.0]}
    }));
    let err = AppState::load(&cfg).err().expect("load should fail");
    println!("  error: {:#}", err);
    assert!(format!("{:#}", err).contains("indicator 'rainfall' more than once"));
}

#[test]
fn test_missing_table_aborts_startup() {
    let (dir, cfg) = artifacts();
    fs::remove_file(dir.path().join("population.json")).unwrap();
    let err = AppState::load(&cfg).err().expect("load should fail");
    assert!(format!("{:#}", err).contains("failed to read table"));
}

#[test]
fn test_non_numeric_table_value_aborts_startup() {
    let (dir, cfg) = artifacts();
    write(dir.path(), "death_rate_predictions.json", json!({"2030": "high"}));
    assert!(AppState::load(&cfg).is_err());
}

#[cfg(not(feature = "torch"))]
#[test]
fn test_torchscript_requires_feature() {
    let (dir, mut cfg) = artifacts();
    cfg.temp_model_path = dir.path().join("temperature_model.pt");
    fs::write(&cfg.temp_model_path, b"not a real module").unwrap();
    let err = AppState::load(&cfg).err().expect("load should fail");
    assert!(format!("{:#}", err).contains("--features torch"));
}
