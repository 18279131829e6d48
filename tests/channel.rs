//! Integration tests for the execution channel
//!
//! Drives a host thread through `SimulationClient`:
//! - init / runMonth / runSimulation / getState round trips
//! - Errors keyed by request id (not initialized, malformed, unknown type)
//! - Pending table cleared once requests complete
//! - Termination

use labor_frontier::channel::{Response, SimulationClient};
use labor_frontier::core::config::{ScenarioConfig, ScenarioUpdate};
use labor_frontier::core::error::SimError;

fn small(seed: u64) -> ScenarioConfig {
    let mut s = ScenarioConfig::default().with_seed(seed);
    s.num_workers = 200;
    s.num_firms = 20;
    s.num_training_programs = 4;
    s.num_regions = 2;
    s.duration_months = 18;
    s
}

// ============================================================================
// Round trips
// ============================================================================

#[tokio::test]
async fn test_init_then_state() {
    let client = SimulationClient::spawn().unwrap();
    let info = client.init(small(1)).await.unwrap();
    assert_eq!(info.worker_count, 200);
    assert_eq!(info.firm_count, 20);
    assert_eq!(info.training_program_count, 4);
    assert_eq!(info.seed, 1);

    let state = client.get_state().await.unwrap();
    assert!(state.is_initialized);
    assert_eq!(state.month, 0);
    assert_eq!(state.worker_count, 200);
    client.terminate().await.unwrap();
}

#[tokio::test]
async fn test_run_month_advances_one_month() {
    let client = SimulationClient::spawn().unwrap();
    client.init(small(2)).await.unwrap();

    let first = client.run_month(None, None).await.unwrap();
    assert_eq!(first.month, 1);
    let jumped = client.run_month(Some(4), None).await.unwrap();
    assert_eq!(jumped.month, 4);
    assert_eq!(jumped.employed + jumped.unemployed + jumped.retraining + jumped.out_of_labor_force, 200);

    let state = client.get_state().await.unwrap();
    assert_eq!(state.month, 4);
    client.terminate().await.unwrap();
}

#[tokio::test]
async fn test_run_simulation_streams_progress() {
    let client = SimulationClient::spawn().unwrap();
    client.init(small(3)).await.unwrap();

    let mut months = Vec::new();
    let result = client
        .run_simulation(None, |p| months.push(p.month))
        .await
        .unwrap();

    assert_eq!(months, vec![6, 12, 18]);
    assert_eq!(result.timeline.len(), 19);
    assert_eq!(result.seed, 3);
    assert_eq!(result.summary.duration_months, 18);
    assert_eq!(client.pending_requests().await, 0);
    client.terminate().await.unwrap();
}

#[tokio::test]
async fn test_run_simulation_applies_scenario_update() {
    let client = SimulationClient::spawn().unwrap();
    client.init(small(4)).await.unwrap();

    let update = ScenarioUpdate {
        duration_months: Some(6),
        ..Default::default()
    };
    let result = client.run_simulation(Some(update), |_| {}).await.unwrap();
    assert_eq!(result.summary.duration_months, 6);
    assert_eq!(result.timeline.last().map(|s| s.month), Some(6));
    client.terminate().await.unwrap();
}

#[tokio::test]
async fn test_channel_matches_in_process_run() {
    let client = SimulationClient::spawn().unwrap();
    client.init(small(5)).await.unwrap();
    let remote = client.run_simulation(None, |_| {}).await.unwrap();
    client.terminate().await.unwrap();

    let mut sim = labor_frontier::Simulation::new();
    sim.init(small(5)).unwrap();
    let local = sim.run_simulation(None, &mut labor_frontier::simulation::Silent).unwrap();

    assert_eq!(remote.timeline.len(), local.timeline.len());
    for (r, l) in remote.timeline.iter().zip(&local.timeline) {
        assert_eq!((r.month, r.employed, r.unemployed, r.retraining), (l.month, l.employed, l.unemployed, l.retraining));
        assert_eq!(r.activity, l.activity);
    }
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_calls_before_init_fail() {
    let client = SimulationClient::spawn().unwrap();

    match client.get_state().await {
        Err(SimError::Remote { message, .. }) => assert!(message.contains("not initialized")),
        other => panic!("expected remote error, got {:?}", other.map(|s| s.month)),
    }
    assert!(matches!(client.run_month(None, None).await, Err(SimError::Remote { .. })));

    // The host survives and can still be initialized
    client.init(small(6)).await.unwrap();
    assert!(client.get_state().await.unwrap().is_initialized);
    client.terminate().await.unwrap();
}

#[tokio::test]
async fn test_unknown_message_type_is_reported() {
    let client = SimulationClient::spawn().unwrap();
    let response = client.send_raw(r#"{"type":"explode","id":900}"#).await.unwrap();
    match response {
        Response::Error { id, message } => {
            assert_eq!(id, Some(900));
            assert!(message.contains("unknown message type: explode"));
        }
        other => panic!("expected error, got {:?}", other),
    }
    client.terminate().await.unwrap();
}

#[tokio::test]
async fn test_invalid_request_keeps_host_alive() {
    let client = SimulationClient::spawn().unwrap();
    let response = client.send_raw(r#"{"type":"runMonth","id":901,"month":"soon"}"#).await.unwrap();
    assert!(matches!(response, Response::Error { id: Some(901), .. }));

    let raw_state = client.send_raw(r#"{"type":"getState","id":902}"#).await.unwrap();
    assert!(matches!(raw_state, Response::Error { id: Some(902), .. }));

    client.init(small(7)).await.unwrap();
    let raw_state = client.send_raw(r#"{"type":"getState","id":903}"#).await.unwrap();
    match raw_state {
        Response::State { id, is_initialized, .. } => {
            assert_eq!(id, 903);
            assert!(is_initialized);
        }
        other => panic!("expected state, got {:?}", other),
    }
    client.terminate().await.unwrap();
}

#[tokio::test]
async fn test_send_raw_requires_id() {
    let client = SimulationClient::spawn().unwrap();
    assert!(matches!(
        client.send_raw("not json at all").await,
        Err(SimError::Transport(_))
    ));
    client.terminate().await.unwrap();
}

#[tokio::test]
async fn test_past_month_is_rejected() {
    let client = SimulationClient::spawn().unwrap();
    client.init(small(8)).await.unwrap();
    client.run_month(Some(3), None).await.unwrap();
    assert!(matches!(client.run_month(Some(2), None).await, Err(SimError::Remote { .. })));
    assert_eq!(client.get_state().await.unwrap().month, 3);
    client.terminate().await.unwrap();
}
