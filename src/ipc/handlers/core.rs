use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::rubric::{Band, Criterion, MIN_COMMENT_WORDS};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessionId": state.session_id,
            "storePath": state.store.path().to_string_lossy(),
            "reportsDir": state.settings.reports_dir.to_string_lossy(),
        }),
    )
}

fn handle_store_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(state.store.self_check()))
}

fn handle_rubric_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let criteria: Vec<_> = Criterion::ALL
        .iter()
        .map(|c| {
            json!({
                "key": c.key(),
                "name": c.display_name(),
                "weight": c.weight(),
            })
        })
        .collect();
    let bands: Vec<_> = Band::ALL
        .iter()
        .map(|b| {
            let (min, max) = b.range();
            json!({
                "band": b.letter(),
                "min": min,
                "max": max,
                "midpoint": b.midpoint(),
                "colour": b.colour(),
            })
        })
        .collect();
    ok(
        &req.id,
        json!({
            "criteria": criteria,
            "bands": bands,
            "minCommentWords": MIN_COMMENT_WORDS,
            "assessors": state.settings.assessors,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "store.check" => Some(handle_store_check(state, req)),
        "rubric.get" => Some(handle_rubric_get(state, req)),
        _ => None,
    }
}
