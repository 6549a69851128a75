use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HEADER: [&str; 8] = [
    "StudentID",
    "first_name",
    "last_name",
    "LAB WORK 1",
    "LAB WORK 2",
    "LAB WORK 3",
    "PRELIM EXAM",
    "ATTENDANCE GRADE",
];

pub fn default_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("MOCK_DATA.csv"),
        Path::new("..").join("MOCK_DATA.csv"),
        PathBuf::from("class_records.csv"),
        Path::new("..").join("class_records.csv"),
    ]
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unable to read records CSV; tried {}", display_paths(.tried))]
    NoSource { tried: Vec<PathBuf> },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{field} is required")]
    Incomplete { field: &'static str },
    #[error("no record at row {index}")]
    NotFound { index: usize },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentRecord {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub lab1: String,
    pub lab2: String,
    pub lab3: String,
    pub prelim_exam: String,
    pub attendance_grade: String,
}

impl StudentRecord {
    fn cells(&self) -> [&str; 8] {
        [
            self.student_id.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.lab1.as_str(),
            self.lab2.as_str(),
            self.lab3.as_str(),
            self.prelim_exam.as_str(),
            self.attendance_grade.as_str(),
        ]
    }

    fn from_cells(cells: &[String]) -> Option<Self> {
        if cells.len() < HEADER.len() {
            return None;
        }
        let c = |i: usize| clean_cell(&cells[i]);
        Some(Self {
            student_id: c(0),
            first_name: c(1),
            last_name: c(2),
            lab1: c(3),
            lab2: c(4),
            lab3: c(5),
            prelim_exam: c(6),
            attendance_grade: c(7),
        })
    }

    /// Trims every field and rejects the record if any is left empty.
    pub fn normalized(self) -> Result<Self, RecordError> {
        let fields = [
            ("studentId", self.student_id),
            ("firstName", self.first_name),
            ("lastName", self.last_name),
            ("lab1", self.lab1),
            ("lab2", self.lab2),
            ("lab3", self.lab3),
            ("prelimExam", self.prelim_exam),
            ("attendanceGrade", self.attendance_grade),
        ];
        let mut out: Vec<String> = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            let t = value.trim();
            if t.is_empty() {
                return Err(RecordError::Incomplete { field: name });
            }
            out.push(t.to_string());
        }
        let mut it = out.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Ok(Self {
            student_id: next(),
            first_name: next(),
            last_name: next(),
            lab1: next(),
            lab2: next(),
            lab3: next(),
            prelim_exam: next(),
            attendance_grade: next(),
        })
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        self.cells()
            .iter()
            .any(|c| c.to_lowercase().contains(needle_lower))
    }
}

fn clean_cell(s: &str) -> String {
    s.trim().replace('"', "")
}

pub fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                buf.push('"');
                chars.next();
                continue;
            }
            in_quotes = !in_quotes;
            continue;
        }
        if ch == ',' && !in_quotes {
            out.push(std::mem::take(&mut buf));
            continue;
        }
        buf.push(ch);
    }
    out.push(buf);
    out
}

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<StudentRecord>,
    pub skipped: usize,
}

pub fn parse_records_csv(text: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    for raw in text.lines() {
        let t = raw.trim();
        if t.is_empty() {
            continue;
        }
        let cells = parse_csv_record(t);
        if cells
            .first()
            .map(|c| clean_cell(c).eq_ignore_ascii_case(HEADER[0]))
            .unwrap_or(false)
        {
            continue;
        }
        match StudentRecord::from_cells(&cells) {
            Some(r) => parsed.records.push(r),
            None => parsed.skipped += 1,
        }
    }
    parsed
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedRecord<'a> {
    pub index: usize,
    pub record: &'a StudentRecord,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub path: PathBuf,
    pub count: usize,
    pub skipped: usize,
}

/// In-memory student table. Row indices always refer to the unfiltered
/// order.
#[derive(Debug, Default)]
pub struct RecordTable {
    source: Option<PathBuf>,
    rows: Vec<StudentRecord>,
}

impl RecordTable {
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn load_file(&mut self, path: &Path) -> Result<LoadSummary, RecordError> {
        let bytes = std::fs::read(path).map_err(|source| RecordError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let parsed = parse_records_csv(&text);
        self.rows = parsed.records;
        self.source = Some(path.to_path_buf());
        Ok(LoadSummary {
            path: path.to_path_buf(),
            count: self.rows.len(),
            skipped: parsed.skipped,
        })
    }

    /// Loads the first readable candidate. The table is untouched when none
    /// can be read.
    pub fn load_first(&mut self, candidates: &[PathBuf]) -> Result<LoadSummary, RecordError> {
        for p in candidates {
            match self.load_file(p) {
                Ok(summary) => return Ok(summary),
                Err(e) => tracing::debug!(error = %e, "records candidate skipped"),
            }
        }
        Err(RecordError::NoSource {
            tried: candidates.to_vec(),
        })
    }

    pub fn add(&mut self, record: StudentRecord) -> Result<usize, RecordError> {
        let record = record.normalized()?;
        self.rows.push(record);
        Ok(self.rows.len() - 1)
    }

    pub fn delete(&mut self, index: usize) -> Result<StudentRecord, RecordError> {
        if index >= self.rows.len() {
            return Err(RecordError::NotFound { index });
        }
        Ok(self.rows.remove(index))
    }

    pub fn search(&self, query: &str) -> Vec<IndexedRecord<'_>> {
        let needle = query.trim().to_lowercase();
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| needle.is_empty() || r.matches(&needle))
            .map(|(index, record)| IndexedRecord { index, record })
            .collect()
    }
}
