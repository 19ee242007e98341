//! Human-readable descriptions of drafts for the save confirmation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::compose::{ExerciseDraft, WorkoutDraft};

/// Text shown before a workout is committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confirmation {
    /// e.g. "Saturday, March 09, 2024"; absent when no date is set.
    pub date_line: Option<String>,
    pub exercise_lines: Vec<String>,
    pub elapsed: String,
}

impl Confirmation {
    pub fn from_draft(draft: &WorkoutDraft) -> Self {
        Self {
            date_line: draft.created_at.map(format_date),
            exercise_lines: draft
                .exercises
                .iter()
                .map(|slot| format_exercise(&slot.draft))
                .collect(),
            elapsed: format_elapsed(draft.elapsed_seconds),
        }
    }

    /// All lines, in display order.
    pub fn lines(&self) -> Vec<String> {
        self.date_line
            .iter()
            .cloned()
            .chain(self.exercise_lines.iter().cloned())
            .collect()
    }
}

/// One-line description of an exercise.
///
/// `Bench Press: 3 x 10 @ 135 lb`. A non-empty `reps_display` replaces the
/// sets/reps part verbatim.
pub fn format_exercise(exercise: &ExerciseDraft) -> String {
    let title = exercise.title.trim();
    let mut line = if title.is_empty() {
        "Untitled exercise".to_string()
    } else {
        title.to_string()
    };

    let volume = match exercise.reps_display.as_deref().map(str::trim) {
        Some(display) if !display.is_empty() => Some(display.to_string()),
        _ => match (exercise.sets, exercise.reps) {
            (Some(sets), Some(reps)) => Some(format!("{sets} x {reps}")),
            (Some(sets), None) => Some(plural(sets, "set")),
            (None, Some(reps)) => Some(plural(reps, "rep")),
            (None, None) => None,
        },
    };

    let load = exercise.weight.map(|w| match exercise.weight_unit {
        Some(unit) => format!("{} {unit}", format_weight(w)),
        None => format_weight(w),
    });

    match (volume, load) {
        (Some(volume), Some(load)) => line.push_str(&format!(": {volume} @ {load}")),
        (Some(volume), None) => line.push_str(&format!(": {volume}")),
        (None, Some(load)) => line.push_str(&format!(": {load}")),
        (None, None) => {}
    }
    line
}

/// `dddd, MMMM DD, YYYY`
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%A, %B %d, %Y").to_string()
}

/// `HH:MM:SS`, hours keep growing past 99.
pub fn format_elapsed(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Parse `HH:MM:SS`, `MM:SS` or a plain number of seconds.
pub fn parse_elapsed(raw: &str) -> Option<u64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    parts
        .iter()
        .try_fold(0u64, |acc, p| Some(acc * 60 + p.parse::<u64>().ok()?))
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{}", weight as i64)
    } else {
        format!("{weight}")
    }
}

fn plural(n: i64, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
