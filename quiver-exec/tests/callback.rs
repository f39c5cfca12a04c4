use std::collections::BTreeMap;

use quiver_core::types::Verb;
use quiver_core::VariableStore;
use quiver_exec::{
    CallbackError, CallbackRegistry, CaptureField, HttpOutcome, IncrementVar, ResolvedRequest,
};

fn resolved_request() -> ResolvedRequest {
    ResolvedRequest {
        desc: "add a product".to_string(),
        method: Verb::Post,
        base: "https://fakestoreapi.com".to_string(),
        endpoint: "/products".to_string(),
        headers: BTreeMap::new(),
        params: BTreeMap::new(),
        body: Some(serde_json::json!({"price": "1"})),
    }
}

fn response(body: &str) -> HttpOutcome {
    HttpOutcome {
        status: 200,
        duration_ms: 12,
        body: serde_json::from_str(body).ok(),
        text: body.to_string(),
    }
}

#[test]
fn increment_parses_and_bumps_the_variable() {
    let mut store = VariableStore::new();
    store.set("next_id", "41");
    let mut registry = CallbackRegistry::new();
    registry.register("bump", IncrementVar::new("next_id"));

    registry
        .invoke("bump", &resolved_request(), &response("{}"), &mut store)
        .unwrap();
    assert_eq!(store.get("next_id"), Some("42"));
}

#[test]
fn increment_fails_on_missing_variable() {
    let mut store = VariableStore::new();
    let mut registry = CallbackRegistry::new();
    registry.register("bump", IncrementVar::new("next_id"));

    let err = registry
        .invoke("bump", &resolved_request(), &response("{}"), &mut store)
        .unwrap_err();
    assert!(matches!(err, CallbackError::Failed { .. }));
}

#[test]
fn increment_fails_on_non_integer_value() {
    let mut store = VariableStore::new();
    store.set("next_id", "banana");
    let mut registry = CallbackRegistry::new();
    registry.register("bump", IncrementVar::new("next_id"));

    let err = registry
        .invoke("bump", &resolved_request(), &response("{}"), &mut store)
        .unwrap_err();
    assert!(matches!(err, CallbackError::Failed { .. }));
    // Failed invocation, untouched store.
    assert_eq!(store.get("next_id"), Some("banana"));
}

#[test]
fn capture_lifts_a_string_field_from_the_body() {
    let mut store = VariableStore::new();
    let mut registry = CallbackRegistry::new();
    registry.register("save_token", CaptureField::new("token", "/auth/token"));

    registry
        .invoke(
            "save_token",
            &resolved_request(),
            &response(r#"{"auth": {"token": "abc123"}}"#),
            &mut store,
        )
        .unwrap();
    assert_eq!(store.get("token"), Some("abc123"));
}

#[test]
fn capture_stringifies_non_string_fields() {
    let mut store = VariableStore::new();
    let mut registry = CallbackRegistry::new();
    registry.register("save_id", CaptureField::new("id", "/id"));

    registry
        .invoke(
            "save_id",
            &resolved_request(),
            &response(r#"{"id": 21}"#),
            &mut store,
        )
        .unwrap();
    assert_eq!(store.get("id"), Some("21"));
}

#[test]
fn capture_fails_when_the_pointer_misses() {
    let mut store = VariableStore::new();
    let mut registry = CallbackRegistry::new();
    registry.register("save", CaptureField::new("x", "/nope"));

    let err = registry
        .invoke("save", &resolved_request(), &response("{}"), &mut store)
        .unwrap_err();
    assert!(matches!(err, CallbackError::Failed { .. }));
}

#[test]
fn invoking_an_unknown_name_reports_not_registered() {
    let mut store = VariableStore::new();
    let registry = CallbackRegistry::new();
    let err = registry
        .invoke("ghost", &resolved_request(), &response("{}"), &mut store)
        .unwrap_err();
    assert_eq!(err, CallbackError::NotRegistered("ghost".to_string()));
}
