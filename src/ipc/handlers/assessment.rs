use crate::error::AssessError;
use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers::{band_param, criterion_param, required_bool, required_str, score_param};
use crate::ipc::types::{AppState, Request};
use crate::session::FormField;
use serde_json::json;

fn status(state: &AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "status": state.session.status() }))
}

fn handle_set_field(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "field") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(field) = FormField::parse(&name) else {
        return err(
            &req.id,
            "bad_params",
            "unknown form field",
            Some(json!({ "field": name })),
        );
    };
    let value = match required_str(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };
    state.session.set_field(field, &value);
    status(state, req)
}

fn handle_set_band(state: &mut AppState, req: &Request) -> serde_json::Value {
    let criterion = match criterion_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let band = match band_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let score = state.session.set_band(criterion, band);
    ok(
        &req.id,
        json!({
            "score": score,
            "status": state.session.status(),
        }),
    )
}

fn handle_set_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let criterion = match criterion_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let score = match score_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = state.session.set_score(criterion, score) {
        return fail(&req.id, &AssessError::Validation(e));
    }
    status(state, req)
}

fn handle_clear_criterion(state: &mut AppState, req: &Request) -> serde_json::Value {
    let criterion = match criterion_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    state.session.clear_criterion(criterion);
    status(state, req)
}

fn handle_comment_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = match required_str(req, "text") {
        Ok(v) => v,
        Err(e) => return e,
    };
    state.session.set_comment(&text);
    status(state, req)
}

fn handle_comment_opt_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let enabled = match required_bool(req, "enabled") {
        Ok(v) => v,
        Err(e) => return e,
    };
    state.session.set_comment_opt_in(enabled);
    status(state, req)
}

fn handle_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session.reset();
    tracing::info!(session_id = %state.session_id, "assessment reset");
    status(state, req)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "form.setField" => Some(handle_set_field(state, req)),
        "criteria.setBand" => Some(handle_set_band(state, req)),
        "criteria.setScore" => Some(handle_set_score(state, req)),
        "criteria.clear" => Some(handle_clear_criterion(state, req)),
        "comment.set" => Some(handle_comment_set(state, req)),
        "comment.optIn" => Some(handle_comment_opt_in(state, req)),
        "assessment.status" => Some(status(state, req)),
        "assessment.reset" => Some(handle_reset(state, req)),
        _ => None,
    }
}
