use crate::ipc::error::{fail, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = state.session.generate(
        state.renderer.as_ref(),
        &state.store,
        &state.settings.reports_dir,
    );
    match result {
        Ok(outcome) => {
            if let Some(w) = &outcome.warning {
                tracing::warn!(warning = %w, "generate finished with warning");
            }
            ok(
                &req.id,
                json!({
                    "outcome": outcome,
                    "status": state.session.status(),
                }),
            )
        }
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, "cannot generate report");
            fail(&req.id, &e)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assessment.generate" => Some(handle_generate(state, req)),
        _ => None,
    }
}
