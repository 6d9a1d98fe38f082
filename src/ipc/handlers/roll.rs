use crate::ipc::error::{ok, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_roll_mode(state: &mut AppState, req: &Request, on: bool) -> serde_json::Value {
    state.roll_mode = on;
    ok(&req.id, json!({ "rollMode": state.roll_mode }))
}

fn roll_summary(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let mut v = serde_json::to_value(state.board.roll_summary()).map_err(|e| HandlerErr {
        code: "serialize_failed",
        message: e.to_string(),
        details: None,
    })?;
    v["generatedAt"] = json!(chrono::Utc::now().to_rfc3339());
    Ok(v)
}

fn handle_roll_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, roll_summary(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roll.start" => Some(handle_roll_mode(state, req, true)),
        "roll.exit" => Some(handle_roll_mode(state, req, false)),
        "roll.summary" => Some(handle_roll_summary(state, req)),
        _ => None,
    }
}
