use crate::calc::{self, GradeError};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_field_text, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

impl From<GradeError> for HandlerErr {
    fn from(e: GradeError) -> Self {
        let details = match &e {
            GradeError::InvalidAbsences { raw } => json!({ "field": "absences", "raw": raw }),
            GradeError::InvalidLabScore { lab, raw } => {
                json!({ "field": format!("lab{}", lab), "raw": raw })
            }
        };
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details: Some(details),
        }
    }
}

fn current_json(state: &AppState) -> serde_json::Value {
    state
        .current_grade
        .as_ref()
        .map(|r| r.to_json())
        .unwrap_or(serde_json::Value::Null)
}

fn handle_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = &req.params;
    let report = match calc::calculate(
        &get_field_text(p, "absences"),
        &get_field_text(p, "lab1"),
        &get_field_text(p, "lab2"),
        &get_field_text(p, "lab3"),
    ) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "grade input rejected");
            return HandlerErr::from(e).response(&req.id);
        }
    };

    tracing::debug!(category = ?report.outcome.category(), "grade computed");
    state.current_grade = Some(report);
    ok(&req.id, report.to_json())
}

fn handle_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "result": current_json(state) }))
}

fn handle_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.current_grade = None;
    ok(&req.id, json!({ "result": serde_json::Value::Null }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grade.compute" => Some(handle_compute(state, req)),
        "grade.current" => Some(handle_current(state, req)),
        "grade.reset" => Some(handle_reset(state, req)),
        _ => None,
    }
}
