use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_str, get_required_index, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::{RecordError, StudentRecord};
use serde_json::json;
use std::path::PathBuf;

impl From<RecordError> for HandlerErr {
    fn from(e: RecordError) -> Self {
        let (code, details) = match &e {
            RecordError::NoSource { tried } => (
                "records_not_found",
                Some(json!({
                    "tried": tried.iter().map(|p| p.to_string_lossy().to_string()).collect::<Vec<_>>()
                })),
            ),
            RecordError::Read { path, .. } => (
                "records_read_failed",
                Some(json!({ "path": path.to_string_lossy() })),
            ),
            RecordError::Incomplete { field } => {
                ("record_incomplete", Some(json!({ "field": field })))
            }
            RecordError::NotFound { index } => {
                ("record_not_found", Some(json!({ "index": index })))
            }
        };
        HandlerErr {
            code,
            message: e.to_string(),
            details,
        }
    }
}

fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = match get_optional_str(&req.params, "path") {
        Some(p) => state.records.load_file(&PathBuf::from(p)),
        None => {
            let candidates = state.config.record_candidates.clone();
            state.records.load_first(&candidates)
        }
    };
    match result {
        Ok(summary) => {
            tracing::info!(path = %summary.path.display(), count = summary.count, "records loaded");
            ok(&req.id, json!(summary))
        }
        Err(e) => {
            tracing::warn!(error = %e, "records load failed");
            HandlerErr::from(e).response(&req.id)
        }
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let query = get_optional_str(&req.params, "query").unwrap_or_default();
    let rows = state.records.search(&query);
    ok(
        &req.id,
        json!({
            "rows": rows,
            "total": state.records.count(),
        }),
    )
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let record: StudentRecord = match serde_json::from_value(req.params.clone()) {
        Ok(r) => r,
        Err(e) => return HandlerErr::bad_params(format!("invalid record: {}", e)).response(&req.id),
    };
    match state.records.add(record) {
        Ok(index) => ok(
            &req.id,
            json!({ "index": index, "count": state.records.count() }),
        ),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match get_required_index(&req.params, "index") {
        Ok(i) => i,
        Err(e) => return e.response(&req.id),
    };
    match state.records.delete(index) {
        Ok(deleted) => ok(
            &req.id,
            json!({ "deleted": deleted, "count": state.records.count() }),
        ),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.load" => Some(handle_load(state, req)),
        "records.list" => Some(handle_list(state, req)),
        "records.add" => Some(handle_add(state, req)),
        "records.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
