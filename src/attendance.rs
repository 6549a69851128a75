use anyhow::Context;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::records::csv_quote;

pub const COURSES: [&str; 8] = [
    "BSCS 1st Year",
    "BSCS 2nd Year",
    "BSCS 3rd Year",
    "BSCS 4th Year",
    "IT 1st Year",
    "IT 2nd Year",
    "IT 3rd Year",
    "IT 4th Year",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SIGNATURE_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("Attendance Name is required!")]
    NameMissing,
    #[error("Attendance Name must be at least 2 characters!")]
    NameTooShort,
    #[error("Attendance Name can only contain letters and spaces!")]
    NameInvalidChars,
    #[error("Please select a course!")]
    CourseNotSelected { raw: String },
}

impl AttendanceError {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::CourseNotSelected { .. } => "invalid_course",
            _ => "invalid_name",
        }
    }
}

pub fn format_time(t: &DateTime<Local>) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub fn generate_signature() -> String {
    Uuid::new_v4()
        .to_string()
        .chars()
        .take(SIGNATURE_LEN)
        .collect::<String>()
        .to_uppercase()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDraft {
    pub time_in: String,
    pub signature: String,
}

impl AttendanceDraft {
    pub fn fresh() -> Self {
        Self {
            time_in: format_time(&Local::now()),
            signature: generate_signature(),
        }
    }
}

pub fn validate_name(raw: &str) -> Result<String, AttendanceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AttendanceError::NameMissing);
    }
    if name.chars().count() < 2 {
        return Err(AttendanceError::NameTooShort);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_ascii_whitespace())
    {
        return Err(AttendanceError::NameInvalidChars);
    }
    Ok(name.to_string())
}

pub fn validate_course(raw: &str) -> Result<&'static str, AttendanceError> {
    COURSES
        .iter()
        .copied()
        .find(|c| *c == raw.trim())
        .ok_or_else(|| AttendanceError::CourseNotSelected {
            raw: raw.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub id: String,
    pub name: String,
    pub course: String,
    pub time_in: String,
    pub signature: String,
}

#[derive(Debug, Default)]
pub struct AttendanceLog {
    entries: Vec<AttendanceEntry>,
}

impl AttendanceLog {
    pub fn entries(&self) -> &[AttendanceEntry] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Validates and records one sign-in. `now` is the server clock at
    /// submit time; the client never supplies the time.
    pub fn submit(
        &mut self,
        name: &str,
        course: &str,
        signature: Option<&str>,
        now: DateTime<Local>,
    ) -> Result<&AttendanceEntry, AttendanceError> {
        let name = validate_name(name)?;
        let course = validate_course(course)?;
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(generate_signature);

        self.entries.push(AttendanceEntry {
            id: Uuid::new_v4().to_string(),
            name,
            course: course.to_string(),
            time_in: format_time(&now),
            signature,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("id,name,course,timeIn,signature\n");
        for e in &self.entries {
            let row = [&e.id, &e.name, &e.course, &e.time_in, &e.signature]
                .iter()
                .map(|s| csv_quote(s))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&row);
            out.push('\n');
        }
        out
    }

    pub fn export_csv(&self, out_path: &Path) -> anyhow::Result<usize> {
        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
        let mut file = std::fs::File::create(out_path).with_context(|| {
            format!("failed to create output file {}", out_path.to_string_lossy())
        })?;
        file.write_all(self.to_csv().as_bytes())
            .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))?;
        Ok(self.entries.len())
    }
}
