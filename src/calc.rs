use serde::Serialize;
use thiserror::Error;

pub const AUTO_FAIL_ABSENCES: u8 = 4;
pub const ABSENCE_PENALTY: f64 = 10.0;
pub const MAX_LAB_SCORE: f64 = 100.0;

pub const ATTENDANCE_WEIGHT: f64 = 0.40;
pub const LAB_WORK_WEIGHT: f64 = 0.60;

pub const CLASS_STANDING_WEIGHT: f64 = 0.30;
pub const EXAM_WEIGHT: f64 = 0.70;

pub const PASSING_GRADE: f64 = 75.0;
pub const EXCELLENT_GRADE: f64 = 100.0;

const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("Absences must be between 0 and {max} (got {raw:?})", max = AUTO_FAIL_ABSENCES)]
    InvalidAbsences { raw: String },
    #[error("Lab Work {lab} grade must be between 0 and 100 (got {raw:?})")]
    InvalidLabScore { lab: u8, raw: String },
}

impl GradeError {
    pub fn code(&self) -> &'static str {
        match self {
            GradeError::InvalidAbsences { .. } => "invalid_absences",
            GradeError::InvalidLabScore { .. } => "invalid_lab_score",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeInput {
    pub absences: u8,
    pub labs: [f64; 3],
}

fn lab_in_range(v: f64) -> bool {
    v.is_finite() && (0.0..=MAX_LAB_SCORE).contains(&v)
}

fn parse_absences(text: &str) -> Result<u8, GradeError> {
    let invalid = || GradeError::InvalidAbsences {
        raw: text.to_string(),
    };
    let n = text.trim().parse::<i64>().map_err(|_| invalid())?;
    u8::try_from(n)
        .ok()
        .filter(|a| *a <= AUTO_FAIL_ABSENCES)
        .ok_or_else(invalid)
}

fn parse_lab(lab: u8, text: &str) -> Result<f64, GradeError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| lab_in_range(*v))
        .ok_or_else(|| GradeError::InvalidLabScore {
            lab,
            raw: text.to_string(),
        })
}

/// Validates the four text fields of the calculator form.
///
/// Absences are checked first, then the labs in order, so the error always
/// names the first offending field.
pub fn parse_grade_input(
    absences: &str,
    lab1: &str,
    lab2: &str,
    lab3: &str,
) -> Result<GradeInput, GradeError> {
    let absences = parse_absences(absences)?;
    let labs = [parse_lab(1, lab1)?, parse_lab(2, lab2)?, parse_lab(3, lab3)?];
    Ok(GradeInput { absences, labs })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingMetrics {
    pub lab_work_average: f64,
    pub attendance_score: f64,
    pub class_standing: f64,
    pub required_pass_score: f64,
    pub required_excel_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RemarkCategory {
    AutomaticFailure,
    Unattainable,
    AlreadyPassing,
    PassingAchievable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExcelOutlook {
    AlreadyExcellent,
    Achievable { score: f64 },
    NotAchievable,
}

impl ExcelOutlook {
    fn classify(required_excel_score: f64) -> Self {
        if required_excel_score <= 0.0 {
            ExcelOutlook::AlreadyExcellent
        } else if required_excel_score <= EXCELLENT_GRADE {
            ExcelOutlook::Achievable {
                score: required_excel_score,
            }
        } else {
            ExcelOutlook::NotAchievable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    AutomaticFailure,
    Unattainable,
    AlreadyPassing(ExcelOutlook),
    PassingAchievable(ExcelOutlook),
}

impl Outcome {
    pub fn category(&self) -> RemarkCategory {
        match self {
            Outcome::AutomaticFailure => RemarkCategory::AutomaticFailure,
            Outcome::Unattainable => RemarkCategory::Unattainable,
            Outcome::AlreadyPassing(_) => RemarkCategory::AlreadyPassing,
            Outcome::PassingAchievable(_) => RemarkCategory::PassingAchievable,
        }
    }

    pub fn excel(&self) -> Option<ExcelOutlook> {
        match self {
            Outcome::AlreadyPassing(x) | Outcome::PassingAchievable(x) => Some(*x),
            Outcome::AutomaticFailure | Outcome::Unattainable => None,
        }
    }
}

/// Result of one calculator run. `metrics` is `None` exactly when the
/// outcome is `AutomaticFailure`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeReport {
    pub input: GradeInput,
    pub metrics: Option<StandingMetrics>,
    pub outcome: Outcome,
}

pub fn attendance_score(absences: u8) -> f64 {
    100.0 - ABSENCE_PENALTY * f64::from(absences)
}

pub fn class_standing(attendance_score: f64, lab_work_average: f64) -> f64 {
    ATTENDANCE_WEIGHT * attendance_score + LAB_WORK_WEIGHT * lab_work_average
}

/// Exam score needed to reach `target` given the non-exam class standing.
pub fn required_exam_score(target: f64, class_standing: f64) -> f64 {
    (target - CLASS_STANDING_WEIGHT * class_standing) / EXAM_WEIGHT
}

/// Picks the remark outcome from the two required exam scores.
pub fn classify(required_pass_score: f64, required_excel_score: f64) -> Outcome {
    if required_pass_score > EXCELLENT_GRADE {
        Outcome::Unattainable
    } else if required_pass_score <= 0.0 {
        let excel = ExcelOutlook::classify(required_excel_score);
        // The excel target is always above the pass target, so an already
        // passing standing can never make excellence impossible.
        debug_assert!(excel != ExcelOutlook::NotAchievable);
        Outcome::AlreadyPassing(excel)
    } else {
        Outcome::PassingAchievable(ExcelOutlook::classify(required_excel_score))
    }
}

pub fn compute_prelim(input: GradeInput) -> GradeReport {
    if input.absences >= AUTO_FAIL_ABSENCES {
        return GradeReport {
            input,
            metrics: None,
            outcome: Outcome::AutomaticFailure,
        };
    }

    let [l1, l2, l3] = input.labs;
    let lab_work_average = (l1 + l2 + l3) / 3.0;
    let attendance_score = attendance_score(input.absences);
    let class_standing = class_standing(attendance_score, lab_work_average);
    let required_pass_score = required_exam_score(PASSING_GRADE, class_standing);
    let required_excel_score = required_exam_score(EXCELLENT_GRADE, class_standing);

    let outcome = classify(required_pass_score, required_excel_score);

    GradeReport {
        input,
        metrics: Some(StandingMetrics {
            lab_work_average,
            attendance_score,
            class_standing,
            required_pass_score,
            required_excel_score,
        }),
        outcome,
    }
}

pub fn calculate(
    absences: &str,
    lab1: &str,
    lab2: &str,
    lab3: &str,
) -> Result<GradeReport, GradeError> {
    parse_grade_input(absences, lab1, lab2, lab3).map(compute_prelim)
}

/// Zero-decimal display rounding, half away from zero. Never yields "-0".
pub fn round_display(x: f64) -> String {
    let r = x.round();
    let r = if r == 0.0 { 0.0 } else { r };
    format!("{:.0}", r)
}

fn required_display(score: f64, already: &str) -> String {
    if score > EXCELLENT_GRADE {
        "Not Possible".to_string()
    } else if score < 0.0 {
        already.to_string()
    } else {
        round_display(score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeView {
    pub attendance: String,
    pub lab_average: String,
    pub class_standing: String,
    pub required_pass: String,
    pub required_excel: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    pub category: RemarkCategory,
    pub excel: Option<ExcelOutlook>,
    pub class_standing: Option<f64>,
    pub required_excel_score: Option<f64>,
    pub absences: Option<u8>,
    pub title: String,
    pub body: String,
}

impl GradeReport {
    pub fn view(&self) -> GradeView {
        let Some(m) = self.metrics else {
            return GradeView {
                attendance: "FAIL".to_string(),
                lab_average: PLACEHOLDER.to_string(),
                class_standing: PLACEHOLDER.to_string(),
                required_pass: PLACEHOLDER.to_string(),
                required_excel: PLACEHOLDER.to_string(),
            };
        };
        GradeView {
            attendance: format!("{}%", round_display(m.attendance_score)),
            lab_average: round_display(m.lab_work_average),
            class_standing: round_display(m.class_standing),
            required_pass: required_display(m.required_pass_score, "Already Pass"),
            required_excel: required_display(m.required_excel_score, "Already Excel"),
        }
    }

    pub fn remark(&self) -> Remark {
        let category = self.outcome.category();
        let excel = self.outcome.excel();
        let Some(m) = self.metrics else {
            let a = self.input.absences;
            return Remark {
                category,
                excel,
                class_standing: None,
                required_excel_score: None,
                absences: Some(a),
                title: "Automatic Failure".to_string(),
                body: format!(
                    "You have {} absences. With {} or more absences, you automatically fail the Prelim period.",
                    a, AUTO_FAIL_ABSENCES
                ),
            };
        };

        let cs = round_display(m.class_standing);
        let (title, body) = match self.outcome {
            Outcome::AutomaticFailure | Outcome::Unattainable => (
                "Critical Notice",
                format!(
                    "Even with a perfect Prelim Exam score (100), you cannot achieve a passing grade of 75 with your current Class Standing of {}. Your Class Standing is too low.",
                    cs
                ),
            ),
            Outcome::AlreadyPassing(x) => {
                let mut body = format!(
                    "You are already guaranteed to pass the Prelim period with your current Class Standing of {}!",
                    cs
                );
                match x {
                    ExcelOutlook::AlreadyExcellent => {
                        body.push_str(" You are also already guaranteed an Excellent grade (100)!")
                    }
                    ExcelOutlook::Achievable { score } => body.push_str(&format!(
                        " You can achieve an Excellent grade with a score of {} in the Prelim Exam.",
                        round_display(score)
                    )),
                    ExcelOutlook::NotAchievable => {}
                }
                ("Excellent News!", body)
            }
            Outcome::PassingAchievable(x) => {
                let mut body = format!(
                    "Based on your current Class Standing of {}, you can achieve a passing grade.",
                    cs
                );
                match x {
                    ExcelOutlook::AlreadyExcellent => {
                        body.push_str(" You are already guaranteed an Excellent grade (100)!")
                    }
                    ExcelOutlook::Achievable { score } => body.push_str(&format!(
                        " An excellent grade (100) is achievable with a score of {} in the Prelim Exam.",
                        round_display(score)
                    )),
                    ExcelOutlook::NotAchievable => body.push_str(
                        " To achieve an Excellent grade (100), you would need more than 100 in the Prelim Exam, which is not possible.",
                    ),
                }
                ("You Can Pass!", body)
            }
        };

        Remark {
            category,
            excel,
            class_standing: Some(m.class_standing),
            required_excel_score: Some(m.required_excel_score),
            absences: None,
            title: title.to_string(),
            body,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "input": self.input,
            "metrics": self.metrics,
            "view": self.view(),
            "remark": self.remark(),
        })
    }
}
