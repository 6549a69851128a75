use crate::attendance::{AttendanceDraft, AttendanceError, COURSES};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use chrono::Local;
use serde_json::json;
use std::path::PathBuf;

impl From<AttendanceError> for HandlerErr {
    fn from(e: AttendanceError) -> Self {
        let details = match &e {
            AttendanceError::CourseNotSelected { raw } => {
                Some(json!({ "field": "course", "raw": raw }))
            }
            _ => None,
        };
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

fn handle_courses(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "courses": COURSES }))
}

fn handle_draft(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(AttendanceDraft::fresh()))
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    // Missing name/course are validation failures, not protocol errors.
    let name = get_optional_str(p, "name").unwrap_or_default();
    let course = get_optional_str(p, "course").unwrap_or_default();
    let signature = get_optional_str(p, "signature");

    match state
        .attendance
        .submit(&name, &course, signature.as_deref(), Local::now())
    {
        Ok(entry) => {
            tracing::info!(course = %entry.course, "attendance recorded");
            ok(&req.id, json!({ "entry": entry }))
        }
        Err(e) => {
            tracing::debug!(error = %e, "attendance rejected");
            HandlerErr::from(e).response(&req.id)
        }
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "entries": state.attendance.entries() }))
}

fn handle_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match get_required_str(&req.params, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };
    match state.attendance.export_csv(&out_path) {
        Ok(rows) => ok(
            &req.id,
            json!({ "path": out_path.to_string_lossy(), "rowsExported": rows }),
        ),
        Err(e) => {
            let message = format!("{e:#}");
            tracing::warn!(error = %message, "attendance export failed");
            HandlerErr {
                code: "export_failed",
                message,
                details: None,
            }
            .response(&req.id)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.courses" => Some(handle_courses(state, req)),
        "attendance.draft" => Some(handle_draft(state, req)),
        "attendance.submit" => Some(handle_submit(state, req)),
        "attendance.list" => Some(handle_list(state, req)),
        "attendance.exportCsv" => Some(handle_export_csv(state, req)),
        _ => None,
    }
}
