use crate::ipc::error::{get_required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster::StateFilter;
use serde_json::json;

/// Board snapshot plus the presentation roll-mode flag.
pub fn board_json(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let mut v = serde_json::to_value(state.board.snapshot()).map_err(|e| HandlerErr {
        code: "serialize_failed",
        message: e.to_string(),
        details: None,
    })?;
    v["rollMode"] = json!(state.roll_mode);
    Ok(v)
}

fn set_search_text(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let text = get_required_str(params, "text")?;
    let rows = state.board.set_search_text(text).len();
    tracing::debug!(rows, "search text set");
    board_json(state)
}

fn set_state_filter(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let raw = get_required_str(params, "filter")?;
    let filter = StateFilter::parse(raw).ok_or_else(|| HandlerErr {
        code: "bad_params",
        message: format!("unknown filter: {}", raw),
        details: Some(json!({ "allowed": ["all", "present", "late", "absent"] })),
    })?;
    let rows = state.board.set_state_filter(filter).len();
    tracing::debug!(filter = raw, rows, "state filter set");
    board_json(state)
}

fn advance_student(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = params
        .get("studentId")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params("missing studentId"))?;
    if !state.board.contains(student_id) {
        return Err(HandlerErr {
            code: "not_found",
            message: "student not found".to_string(),
            details: Some(json!({ "studentId": student_id })),
        });
    }
    let roll_state = state.board.advance_student(student_id);
    Ok(json!({
        "studentId": student_id,
        "rollState": roll_state,
        "board": board_json(state)?
    }))
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    tracing::debug!(rows = state.board.view().len(), "board requested");
    respond(&req.id, board_json(state))
}

fn handle_toggle_sort_key(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.board.toggle_sort_key();
    tracing::debug!(sort_key = ?state.board.criteria().sort_key, "sort key toggled");
    respond(&req.id, board_json(state))
}

fn handle_toggle_sort_direction(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.board.toggle_sort_direction();
    tracing::debug!(
        sort_direction = ?state.board.criteria().sort_direction,
        "sort direction toggled"
    );
    respond(&req.id, board_json(state))
}

fn handle_set_search_text(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, set_search_text(state, &req.params))
}

fn handle_set_state_filter(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, set_state_filter(state, &req.params))
}

fn handle_advance_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, advance_student(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "board.get" => Some(handle_get(state, req)),
        "board.toggleSortKey" => Some(handle_toggle_sort_key(state, req)),
        "board.toggleSortDirection" => Some(handle_toggle_sort_direction(state, req)),
        "board.setSearchText" => Some(handle_set_search_text(state, req)),
        "board.setStateFilter" => Some(handle_set_state_filter(state, req)),
        "board.advanceStudent" => Some(handle_advance_student(state, req)),
        _ => None,
    }
}
