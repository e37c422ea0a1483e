//! Selection and approve/reject round trips.

mod common;

use common::{build, ranked_actions_json, risk_json, test_config};
use liquidity_monitor::error::{MonitorError, PreconditionError, TransportError};
use liquidity_monitor::model::Decision;
use serde_json::json;

async fn with_actions() -> (
    liquidity_monitor::controller::Controller,
    std::sync::Arc<common::FakeTransport>,
    std::sync::Arc<common::RecordingDashboard>,
) {
    let (controller, transport, sink) = build(&test_config());
    transport.set_risk("E1", "USD", risk_json(1_250_000.0, 1_000_000.0, Some(20)));
    transport.route("run_cycle", ranked_actions_json());
    controller.assess(true).await.unwrap();
    (controller, transport, sink)
}

#[tokio::test]
async fn decision_without_selection_sends_nothing() {
    let (controller, transport, sink) = build(&test_config());

    let err = controller.decide(Decision::Approve).await.unwrap_err();

    assert_eq!(err, MonitorError::Precondition(PreconditionError::NoActionSelected));
    assert_eq!(err.to_string(), "select an action first");
    assert!(transport.requests().is_empty());
    assert_eq!(sink.error_count(), 1);
}

#[tokio::test]
async fn approve_forwards_engine_payload_verbatim() {
    let (controller, transport, sink) = with_actions().await;
    transport.route("actions/approve", json!({"status": "EXECUTED", "ref": "X-77"}));

    let selected = controller.select_rendered(1).unwrap();
    assert_eq!(selected.label(), "INTRADAY_SWEEP");
    let response = controller.decide(Decision::Approve).await.unwrap();

    assert_eq!(response, json!({"status": "EXECUTED", "ref": "X-77"}));
    let sent = &transport.requests_to("actions/approve")[0];
    assert_eq!(sent.method, "POST");
    assert_eq!(
        sent.body,
        Some(json!({
            "scenario_id": "demo",
            "entity_id": "E1",
            "currency": "USD",
            "decision": "APPROVE",
            "action": ranked_actions_json()["ranked_actions"][0],
        }))
    );
    assert_eq!(sink.decisions.lock().unwrap().as_slice(), &[response]);
}

#[tokio::test]
async fn reject_names_the_decision() {
    let (controller, transport, _sink) = with_actions().await;

    controller.select_rendered(2).unwrap();
    controller.decide(Decision::Reject).await.unwrap();

    let sent = &transport.requests_to("actions/approve")[0];
    let body = sent.body.as_ref().unwrap();
    assert_eq!(body["decision"], json!("REJECT"));
    assert_eq!(body["action"]["action_id"], json!("A-2"));
}

#[tokio::test]
async fn selection_outside_list_is_ignored() {
    let (controller, _transport, _sink) = with_actions().await;

    assert!(controller.select_rendered(0).is_none());
    assert!(controller.select_rendered(3).is_none());
    assert!(controller.session().lock().selected_action().is_none());
}

#[tokio::test]
async fn rerender_drops_vanished_selection() {
    let (controller, transport, _sink) = with_actions().await;
    controller.select_rendered(1).unwrap();

    // Same list again keeps it.
    controller.assess(true).await.unwrap();
    assert!(controller.session().lock().selected_action().is_some());

    transport.route(
        "run_cycle",
        json!({"ranked_actions": [{"action_type": "DRAW_FACILITY", "score": 0.5}], "explanation": ""}),
    );
    controller.assess(true).await.unwrap();
    assert!(controller.session().lock().selected_action().is_none());

    let err = controller.decide(Decision::Approve).await.unwrap_err();
    assert!(matches!(err, MonitorError::Precondition(_)));
}

#[tokio::test]
async fn engine_rejection_surfaces_status_and_body() {
    let (controller, transport, sink) = with_actions().await;
    transport.fail_path(
        "actions/approve",
        TransportError::Status {
            status: 409,
            body: "{\"detail\":\"stale recommendation\"}".to_string(),
        },
    );
    controller.select_rendered(1).unwrap();

    let err = controller.decide(Decision::Approve).await.unwrap_err();

    assert_eq!(
        err,
        MonitorError::Transport(TransportError::Status {
            status: 409,
            body: "{\"detail\":\"stale recommendation\"}".to_string(),
        })
    );
    assert!(sink.decisions.lock().unwrap().is_empty());
    assert_eq!(sink.error_count(), 1);
    // Selection stays for a retry.
    assert!(controller.session().lock().selected_action().is_some());
}
