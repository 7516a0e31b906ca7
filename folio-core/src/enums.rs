//! Enum types for Folio entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Error when parsing an enum from its database string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl EnumParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

// ============================================================================
// SKILLS
// ============================================================================

/// Proficiency level of a technical skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            _ => Err(EnumParseError::new("skill level", s)),
        }
    }
}

/// Grouping used by the skills grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    Backend,
    Frontend,
    Other,
}

impl SkillCategory {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SkillCategory::Backend => "Backend",
            SkillCategory::Frontend => "Frontend",
            SkillCategory::Other => "Other",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "backend" => Ok(SkillCategory::Backend),
            "frontend" => Ok(SkillCategory::Frontend),
            "other" => Ok(SkillCategory::Other),
            _ => Err(EnumParseError::new("skill category", s)),
        }
    }
}

// ============================================================================
// CAREERS
// ============================================================================

/// Kind of career journey entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CareerType {
    Education,
    Job,
}

impl CareerType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            CareerType::Education => "Education",
            CareerType::Job => "Job",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "education" => Ok(CareerType::Education),
            "job" => Ok(CareerType::Job),
            _ => Err(EnumParseError::new("career type", s)),
        }
    }
}

// ============================================================================
// PROJECTS
// ============================================================================

/// Platform a project targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    Web,
    Mobile,
    #[serde(rename = "Machine Learning")]
    MachineLearning,
}

impl ProjectType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ProjectType::Web => "Web",
            ProjectType::Mobile => "Mobile",
            ProjectType::MachineLearning => "Machine Learning",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "web" => Ok(ProjectType::Web),
            "mobile" => Ok(ProjectType::Mobile),
            "machine learning" | "machine_learning" => Ok(ProjectType::MachineLearning),
            _ => Err(EnumParseError::new("project type", s)),
        }
    }
}

/// Whether a project was built solo or with a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionType {
    Personal,
    Team,
}

impl ContributionType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ContributionType::Personal => "Personal",
            ContributionType::Team => "Team",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(ContributionType::Personal),
            "team" => Ok(ContributionType::Team),
            _ => Err(EnumParseError::new("contribution type", s)),
        }
    }
}

// ============================================================================
// DISPLAY / FROMSTR
// ============================================================================

macro_rules! impl_db_str_traits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.as_db_str())
                }
            }

            impl FromStr for $ty {
                type Err = EnumParseError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::from_db_str(s)
                }
            }
        )*
    };
}

impl_db_str_traits!(
    SkillLevel,
    SkillCategory,
    CareerType,
    ProjectType,
    ContributionType,
);
