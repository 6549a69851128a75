use serde::Deserialize;

use crate::attendance::AttendanceLog;
use crate::calc::GradeReport;
use crate::config::Config;
use crate::records::RecordTable;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub records: RecordTable,
    pub attendance: AttendanceLog,
    /// Last successful calculator result. Replaced wholesale on every
    /// successful `grade.compute`, never patched.
    pub current_grade: Option<GradeReport>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            records: RecordTable::default(),
            attendance: AttendanceLog::default(),
            current_grade: None,
        }
    }
}
