//! Client-side drafts of a workout and its exercises.
//!
//! Drafts are the pre-commit shadow of a future `Workout` + `Exercise` set.
//! They carry no server identifiers; those are assigned on commit. Field
//! names are snake_case in Rust and camelCase in the JSON view of a draft,
//! while the GraphQL wire uses snake_case (see [`crate::api::types`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::slots::SlotStore;
use crate::error::ComposeError;

/// Unit attached to an exercise weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightUnit {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(WeightUnit::Kg),
            "lb" | "lbs" | "pound" | "pounds" => Ok(WeightUnit::Lb),
            other => Err(ComposeError::InvalidFieldValue {
                field: "weightUnit".into(),
                value: other.into(),
                message: "expected 'kg' or 'lb'".into(),
            }),
        }
    }
}

/// One exercise entry within a workout draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDraft {
    pub title: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub weight_unit: Option<WeightUnit>,
    #[serde(default)]
    pub sets: Option<i64>,
    #[serde(default)]
    pub reps: Option<i64>,
    /// Free-form override for how sets/reps are displayed (e.g. "5-3-1").
    #[serde(default)]
    pub reps_display: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl ExerciseDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Replace the single field named by `edit`.
    pub fn apply(&mut self, edit: ExerciseEdit) {
        match edit {
            ExerciseEdit::Title(v) => self.title = v,
            ExerciseEdit::Weight(v) => self.weight = v,
            ExerciseEdit::WeightUnit(v) => self.weight_unit = v,
            ExerciseEdit::Sets(v) => self.sets = v,
            ExerciseEdit::Reps(v) => self.reps = v,
            ExerciseEdit::RepsDisplay(v) => self.reps_display = v,
            ExerciseEdit::Comment(v) => self.comment = v,
            ExerciseEdit::StartTime(v) => self.start_time = v,
            ExerciseEdit::EndTime(v) => self.end_time = v,
        }
    }
}

/// Names of the editable exercise fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseField {
    Title,
    Weight,
    WeightUnit,
    Sets,
    Reps,
    RepsDisplay,
    Comment,
    StartTime,
    EndTime,
}

impl ExerciseField {
    pub const ALL: [ExerciseField; 9] = [
        ExerciseField::Title,
        ExerciseField::Weight,
        ExerciseField::WeightUnit,
        ExerciseField::Sets,
        ExerciseField::Reps,
        ExerciseField::RepsDisplay,
        ExerciseField::Comment,
        ExerciseField::StartTime,
        ExerciseField::EndTime,
    ];

    /// camelCase name used by the draft's JSON view.
    pub fn camel_name(&self) -> &'static str {
        match self {
            ExerciseField::Title => "title",
            ExerciseField::Weight => "weight",
            ExerciseField::WeightUnit => "weightUnit",
            ExerciseField::Sets => "sets",
            ExerciseField::Reps => "reps",
            ExerciseField::RepsDisplay => "repsDisplay",
            ExerciseField::Comment => "comment",
            ExerciseField::StartTime => "startTime",
            ExerciseField::EndTime => "endTime",
        }
    }

    /// snake_case name used on the GraphQL wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ExerciseField::Title => "title",
            ExerciseField::Weight => "weight",
            ExerciseField::WeightUnit => "weight_unit",
            ExerciseField::Sets => "sets",
            ExerciseField::Reps => "reps",
            ExerciseField::RepsDisplay => "reps_display",
            ExerciseField::Comment => "comment",
            ExerciseField::StartTime => "start_time",
            ExerciseField::EndTime => "end_time",
        }
    }

    /// Human label used in violation messages.
    pub fn label(&self) -> &'static str {
        match self {
            ExerciseField::Title => "Title",
            ExerciseField::Weight => "Weight",
            ExerciseField::WeightUnit => "Weight unit",
            ExerciseField::Sets => "Sets",
            ExerciseField::Reps => "Reps",
            ExerciseField::RepsDisplay => "Reps display",
            ExerciseField::Comment => "Comment",
            ExerciseField::StartTime => "Start time",
            ExerciseField::EndTime => "End time",
        }
    }
}

impl FromStr for ExerciseField {
    type Err = ComposeError;

    /// Accepts both the camelCase and the snake_case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ExerciseField::ALL
            .into_iter()
            .find(|f| f.camel_name() == name || f.wire_name() == name)
            .ok_or_else(|| ComposeError::UnknownField(name.to_string()))
    }
}

impl fmt::Display for ExerciseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.camel_name())
    }
}

/// A single-field replacement on an exercise draft.
///
/// `None` clears an optional field.
#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseEdit {
    Title(String),
    Weight(Option<f64>),
    WeightUnit(Option<WeightUnit>),
    Sets(Option<i64>),
    Reps(Option<i64>),
    RepsDisplay(Option<String>),
    Comment(Option<String>),
    StartTime(Option<DateTime<Utc>>),
    EndTime(Option<DateTime<Utc>>),
}

impl ExerciseEdit {
    pub fn field(&self) -> ExerciseField {
        match self {
            ExerciseEdit::Title(_) => ExerciseField::Title,
            ExerciseEdit::Weight(_) => ExerciseField::Weight,
            ExerciseEdit::WeightUnit(_) => ExerciseField::WeightUnit,
            ExerciseEdit::Sets(_) => ExerciseField::Sets,
            ExerciseEdit::Reps(_) => ExerciseField::Reps,
            ExerciseEdit::RepsDisplay(_) => ExerciseField::RepsDisplay,
            ExerciseEdit::Comment(_) => ExerciseField::Comment,
            ExerciseEdit::StartTime(_) => ExerciseField::StartTime,
            ExerciseEdit::EndTime(_) => ExerciseField::EndTime,
        }
    }

    /// Build an edit from a field name and a raw text value, the way a form
    /// input reports it. An empty value clears optional fields.
    pub fn parse(field: &str, raw: &str) -> Result<Self, ComposeError> {
        let field: ExerciseField = field.parse()?;
        let value = raw.trim();
        let invalid = |message: &str| ComposeError::InvalidFieldValue {
            field: field.camel_name().to_string(),
            value: value.to_string(),
            message: message.to_string(),
        };

        let edit = match field {
            ExerciseField::Title => ExerciseEdit::Title(value.to_string()),
            ExerciseField::Weight => ExerciseEdit::Weight(
                optional(value)
                    .map(|v| {
                        v.parse::<f64>()
                            .ok()
                            .filter(|w| w.is_finite())
                            .ok_or_else(|| invalid("expected a number"))
                    })
                    .transpose()?,
            ),
            ExerciseField::WeightUnit => {
                ExerciseEdit::WeightUnit(optional(value).map(str::parse::<WeightUnit>).transpose()?)
            }
            ExerciseField::Sets => ExerciseEdit::Sets(
                optional(value)
                    .map(|v| v.parse::<i64>().map_err(|_| invalid("expected a whole number")))
                    .transpose()?,
            ),
            ExerciseField::Reps => ExerciseEdit::Reps(
                optional(value)
                    .map(|v| v.parse::<i64>().map_err(|_| invalid("expected a whole number")))
                    .transpose()?,
            ),
            ExerciseField::RepsDisplay => {
                ExerciseEdit::RepsDisplay(optional(value).map(str::to_string))
            }
            ExerciseField::Comment => ExerciseEdit::Comment(optional(value).map(str::to_string)),
            ExerciseField::StartTime => ExerciseEdit::StartTime(
                optional(value)
                    .map(|v| parse_timestamp(v).ok_or_else(|| invalid("expected an RFC 3339 timestamp")))
                    .transpose()?,
            ),
            ExerciseField::EndTime => ExerciseEdit::EndTime(
                optional(value)
                    .map(|v| parse_timestamp(v).ok_or_else(|| invalid("expected an RFC 3339 timestamp")))
                    .transpose()?,
            ),
        };
        Ok(edit)
    }
}

/// Workout-level field replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutEdit {
    CreatedAt(Option<DateTime<Utc>>),
    Comment(Option<String>),
}

/// The whole workout being composed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDraft {
    pub created_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub comment: Option<String>,
    pub exercises: SlotStore,
}

impl WorkoutDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, edit: WorkoutEdit) {
        match edit {
            WorkoutEdit::CreatedAt(v) => self.created_at = v,
            WorkoutEdit::Comment(v) => self.comment = v,
        }
    }
}

fn optional(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
