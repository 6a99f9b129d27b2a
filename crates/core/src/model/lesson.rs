use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::LessonId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WeekError {
    #[error("invalid course week: {0}")]
    InvalidWeek(u8),
}

//
// ─── WEEK ──────────────────────────────────────────────────────────────────────
//

/// Course week a lesson belongs to.
///
/// Purely a grouping tag for navigation; it has no effect on progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Week {
    /// Foundations.
    One,
    /// Advanced techniques.
    Two,
}

impl Week {
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Week::One => 1,
            Week::Two => 2,
        }
    }
}

impl TryFrom<u8> for Week {
    type Error = WeekError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Week::One),
            2 => Ok(Week::Two),
            other => Err(WeekError::InvalidWeek(other)),
        }
    }
}

impl From<Week> for u8 {
    fn from(week: Week) -> Self {
        week.number()
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Week {}", self.number())
    }
}

//
// ─── LESSON DEFINITION ─────────────────────────────────────────────────────────
//

/// One immutable unit of the curriculum.
///
/// The text fields are never interpreted by the core. They are handed to the
/// renderer and to the grading collaborator as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDefinition {
    pub id: LessonId,
    pub title: String,
    pub week: Week,
    pub theory: String,
    pub example: String,
    pub task: String,
    pub grading_criteria: String,
}

impl LessonDefinition {
    #[must_use]
    pub fn new(
        id: LessonId,
        week: Week,
        title: impl Into<String>,
        theory: impl Into<String>,
        example: impl Into<String>,
        task: impl Into<String>,
        grading_criteria: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            week,
            theory: theory.into(),
            example: example.into(),
            task: task.into(),
            grading_criteria: grading_criteria.into(),
        }
    }

    /// Title without a trailing parenthesised subtitle, for compact menus.
    #[must_use]
    pub fn short_title(&self) -> &str {
        self.title
            .split('(')
            .next()
            .map_or(self.title.as_str(), str::trim_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_round_trips_through_number() {
        assert_eq!(Week::try_from(1).unwrap(), Week::One);
        assert_eq!(Week::try_from(2).unwrap(), Week::Two);
        assert_eq!(Week::try_from(3).unwrap_err(), WeekError::InvalidWeek(3));
        assert_eq!(u8::from(Week::Two), 2);
    }

    #[test]
    fn week_deserialization_rejects_unknown_numbers() {
        assert!(serde_json::from_str::<Week>("1").is_ok());
        assert!(serde_json::from_str::<Week>("4").is_err());
    }

    #[test]
    fn definition_uses_camel_case_fields() {
        let lesson = LessonDefinition::new(
            LessonId::new(1),
            Week::One,
            "Roles (persona prompting)",
            "theory",
            "example",
            "task",
            "criteria",
        );
        let json = serde_json::to_value(&lesson).unwrap();
        assert_eq!(json["gradingCriteria"], "criteria");
        assert_eq!(json["week"], 1);
        assert_eq!(lesson.short_title(), "Roles");
    }
}
