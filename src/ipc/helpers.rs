use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::rubric::{Band, Criterion};
use serde_json::{json, Value};

pub fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_bool(req: &Request, key: &str) -> Result<bool, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Accepts a JSON string or number; ids arrive both ways from spreadsheets.
pub fn required_id(req: &Request, key: &str) -> Result<String, Value> {
    match req.params.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(err(&req.id, "bad_params", format!("missing {}", key), None)),
    }
}

pub fn criterion_param(req: &Request) -> Result<Criterion, Value> {
    let raw = required_str(req, "criterion")?;
    Criterion::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "unknown criterion",
            Some(json!({
                "criterion": raw,
                "expected": Criterion::ALL.iter().map(|c| c.key()).collect::<Vec<_>>(),
            })),
        )
    })
}

pub fn band_param(req: &Request) -> Result<Band, Value> {
    let raw = required_str(req, "band")?;
    Band::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "band must be one of: A+, A, B, C, D, E, F",
            Some(json!({ "band": raw })),
        )
    })
}

pub fn score_param(req: &Request) -> Result<u8, Value> {
    let Some(raw) = req.params.get("score") else {
        return Err(err(&req.id, "bad_params", "missing score", None));
    };
    match raw.as_i64() {
        Some(s) if (0..=100).contains(&s) => Ok(s as u8),
        _ => Err(err(
            &req.id,
            "bad_params",
            "score must be an integer between 0 and 100",
            Some(json!({ "score": raw })),
        )),
    }
}
