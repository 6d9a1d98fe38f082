use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::board::board_json;
use crate::ipc::types::{AppState, Request};
use crate::source::{JsonFileSource, RosterSource, WorkspaceSource};
use serde_json::json;

fn source_from_params(params: &serde_json::Value) -> Option<Box<dyn RosterSource>> {
    if let Some(path) = params.get("path").and_then(|v| v.as_str()) {
        return Some(Box::new(JsonFileSource::new(path)));
    }
    params
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .map(|dir| Box::new(WorkspaceSource::new(dir)) as Box<dyn RosterSource>)
}

fn roster_load(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    if let Some(source) = source_from_params(params) {
        state.source = Some(source);
    }
    let Some(source) = state.source.as_ref() else {
        return Err(HandlerErr {
            code: "no_source",
            message: "pass params.path or params.workspacePath, or start with --roster/--workspace"
                .to_string(),
            details: None,
        });
    };
    let described = source.describe();

    state.board.begin_load();
    let fetched = source.fetch_roster();
    let failure = fetched.as_ref().err().map(|e| e.to_string());
    state.board.finish_load(fetched);

    if let Some(message) = failure {
        return Err(HandlerErr {
            code: "fetch_failed",
            message,
            details: Some(json!({ "rosterSource": described })),
        });
    }
    Ok(json!({
        "rosterSource": described,
        "studentCount": state.board.counts().all,
        "board": board_json(state)?
    }))
}

fn handle_roster_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, roster_load(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.load" => Some(handle_roster_load(state, req)),
        _ => None,
    }
}
