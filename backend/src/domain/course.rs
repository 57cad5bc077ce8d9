//! Course catalogue entities: courses, their ten modules, and module content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of modules every course is made of.
pub const MODULE_COUNT: u8 = 10;

/// Stable course identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(Uuid);

impl CourseId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable module identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(Uuid);

impl ModuleId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Validation errors for catalogue values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CourseValidationError {
    #[error("module number must be between 1 and {MODULE_COUNT}, got {0}")]
    ModuleNumberOutOfRange(i64),
    #[error("unknown course level: {0}")]
    UnknownLevel(String),
}

/// Course difficulty, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl FromStr for CourseLevel {
    type Err = CourseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(CourseValidationError::UnknownLevel(other.to_owned())),
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A course in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub level: CourseLevel,
    pub skills: Vec<String>,
    pub duration: String,
    pub icon: String,
}

/// Position of a module inside its course, always within `1..=MODULE_COUNT`.
///
/// # Examples
/// ```
/// use skillflash::domain::ModuleNumber;
///
/// let first = ModuleNumber::new(1).unwrap();
/// assert!(first.previous().is_none());
/// assert!(ModuleNumber::new(11).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct ModuleNumber(u8);

impl ModuleNumber {
    pub const FIRST: Self = Self(1);
    pub const LAST: Self = Self(MODULE_COUNT);

    pub fn new(value: i64) -> Result<Self, CourseValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|n| (1..=MODULE_COUNT).contains(n))
            .map(Self)
            .ok_or(CourseValidationError::ModuleNumberOutOfRange(value))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// The module that must be completed before this one unlocks.
    pub fn previous(self) -> Option<Self> {
        (self.0 > 1).then(|| Self(self.0 - 1))
    }

    /// Every module number of a course, in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=MODULE_COUNT).map(Self)
    }
}

impl TryFrom<i64> for ModuleNumber {
    type Error = CourseValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModuleNumber> for u8 {
    fn from(value: ModuleNumber) -> Self {
        value.0
    }
}

impl fmt::Display for ModuleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Worked example shown under a module explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleExample {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Practice exercise closing a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleExercise {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Lesson body of a module. Stored as a JSON document and overwritten on
/// regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleContent {
    pub explanation: String,
    pub examples: Vec<ModuleExample>,
    pub exercise: ModuleExercise,
}

/// A persisted module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub number: ModuleNumber,
    pub title: String,
    pub content: ModuleContent,
}
