//! Portfolio entities and their request shapes.
//!
//! Page sections are singletons (one row each). Item collections carry a
//! numeric id assigned by the store. Create bodies and partial update bodies
//! reject unknown fields so typos surface as validation errors.

use crate::enums::{CareerType, ContributionType, ProjectType, SkillCategory, SkillLevel};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Numeric identifier for collection items.
pub type ItemId = i64;

/// Lowest accepted testimony rating.
pub const MIN_RATING: i32 = 1;
/// Highest accepted testimony rating.
pub const MAX_RATING: i32 = 5;

// ============================================================================
// LIST ENVELOPE
// ============================================================================

/// Envelope for every collection response: `{"length": n, "data": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub length: usize,
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for Listing<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            length: data.len(),
            data,
        }
    }
}

// ============================================================================
// HERO
// ============================================================================

/// Landing section of the portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeroPage {
    pub name: String,
    pub rank: String,
    pub title: String,
    pub subtitle: String,
    pub resume_link: String,
    pub contact_link: String,
    pub image_urls: Vec<String>,
    pub hobbies: Vec<String>,
}

// ============================================================================
// ABOUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AboutCard {
    /// Present on reads; ignored on writes since cards are replaced wholesale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AboutPage {
    pub description: String,
    pub cards: Vec<AboutCard>,
    pub github_link: String,
    pub linkedin_link: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalSkill {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub specialities: Vec<String>,
    pub level: SkillLevel,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTechnicalSkill {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specialities: Vec<String>,
    pub level: SkillLevel,
    pub category: SkillCategory,
}

impl NewTechnicalSkill {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }

    pub fn with_id(self, id: ItemId) -> TechnicalSkill {
        TechnicalSkill {
            id,
            name: self.name,
            description: self.description,
            specialities: self.specialities,
            level: self.level,
            category: self.category,
        }
    }
}

/// Partial skill update. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TechnicalSkillPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub specialities: Option<Vec<String>>,
    pub level: Option<SkillLevel>,
    pub category: Option<SkillCategory>,
}

impl TechnicalSkillPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => require_non_empty("name", name),
            None => Ok(()),
        }
    }

    pub fn apply_to(self, skill: &mut TechnicalSkill) {
        if let Some(v) = self.name {
            skill.name = v;
        }
        if let Some(v) = self.description {
            skill.description = v;
        }
        if let Some(v) = self.specialities {
            skill.specialities = v;
        }
        if let Some(v) = self.level {
            skill.level = v;
        }
        if let Some(v) = self.category {
            skill.category = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerJourney {
    pub id: ItemId,
    pub started_at: String,
    pub ended_at: String,
    pub title: String,
    pub affiliation: String,
    pub description: String,
    pub location: String,
    #[serde(rename = "type")]
    pub career_type: CareerType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCareerJourney {
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub ended_at: String,
    pub title: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type")]
    pub career_type: CareerType,
}

impl NewCareerJourney {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)
    }

    pub fn with_id(self, id: ItemId) -> CareerJourney {
        CareerJourney {
            id,
            started_at: self.started_at,
            ended_at: self.ended_at,
            title: self.title,
            affiliation: self.affiliation,
            description: self.description,
            location: self.location,
            career_type: self.career_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CareerJourneyPatch {
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub title: Option<String>,
    pub affiliation: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub career_type: Option<CareerType>,
}

impl CareerJourneyPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.title {
            Some(title) => require_non_empty("title", title),
            None => Ok(()),
        }
    }

    pub fn apply_to(self, career: &mut CareerJourney) {
        if let Some(v) = self.started_at {
            career.started_at = v;
        }
        if let Some(v) = self.ended_at {
            career.ended_at = v;
        }
        if let Some(v) = self.title {
            career.title = v;
        }
        if let Some(v) = self.affiliation {
            career.affiliation = v;
        }
        if let Some(v) = self.description {
            career.description = v;
        }
        if let Some(v) = self.location {
            career.location = v;
        }
        if let Some(v) = self.career_type {
            career.career_type = v;
        }
    }
}

// ============================================================================
// TESTIMONY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestimonyPage {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimony {
    pub id: ItemId,
    pub name: String,
    pub profile_url: String,
    pub affiliation: String,
    pub rating: i32,
    pub description: String,
    pub ai_summary: String,
    pub approved: bool,
}

/// Submitted testimony. The summary and approval flag are set server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTestimony {
    pub name: String,
    #[serde(default)]
    pub profile_url: String,
    #[serde(default)]
    pub affiliation: String,
    pub rating: i32,
    pub description: String,
}

impl NewTestimony {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        validate_rating(self.rating)
    }

    pub fn into_testimony(self, id: ItemId, ai_summary: String) -> Testimony {
        Testimony {
            id,
            name: self.name,
            profile_url: self.profile_url,
            affiliation: self.affiliation,
            rating: self.rating,
            description: self.description,
            ai_summary,
            approved: false,
        }
    }
}

/// Partial testimony update. Approval goes through [`TestimonyApproval`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TestimonyPatch {
    pub name: Option<String>,
    pub profile_url: Option<String>,
    pub affiliation: Option<String>,
    pub rating: Option<i32>,
    pub description: Option<String>,
}

impl TestimonyPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        match self.rating {
            Some(rating) => validate_rating(rating),
            None => Ok(()),
        }
    }

    pub fn apply_to(self, testimony: &mut Testimony) {
        if let Some(v) = self.name {
            testimony.name = v;
        }
        if let Some(v) = self.profile_url {
            testimony.profile_url = v;
        }
        if let Some(v) = self.affiliation {
            testimony.affiliation = v;
        }
        if let Some(v) = self.rating {
            testimony.rating = v;
        }
        if let Some(v) = self.description {
            testimony.description = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestimonyApproval {
    pub approved: bool,
}

// ============================================================================
// PROJECT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectPage {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ItemId,
    pub name: String,
    pub image_urls: Vec<String>,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub github_link: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub contribution: ContributionType,
    pub project_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub github_link: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub contribution: ContributionType,
    #[serde(default)]
    pub project_link: String,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }

    pub fn with_id(self, id: ItemId) -> Project {
        Project {
            id,
            name: self.name,
            image_urls: self.image_urls,
            description: self.description,
            tech_stack: self.tech_stack,
            github_link: self.github_link,
            project_type: self.project_type,
            contribution: self.contribution,
            project_link: self.project_link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub description: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub github_link: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<ProjectType>,
    pub contribution: Option<ContributionType>,
    pub project_link: Option<String>,
}

impl ProjectPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => require_non_empty("name", name),
            None => Ok(()),
        }
    }

    pub fn apply_to(self, project: &mut Project) {
        if let Some(v) = self.name {
            project.name = v;
        }
        if let Some(v) = self.image_urls {
            project.image_urls = v;
        }
        if let Some(v) = self.description {
            project.description = v;
        }
        if let Some(v) = self.tech_stack {
            project.tech_stack = v;
        }
        if let Some(v) = self.github_link {
            project.github_link = v;
        }
        if let Some(v) = self.project_type {
            project.project_type = v;
        }
        if let Some(v) = self.contribution {
            project.contribution = v;
        }
        if let Some(v) = self.project_link {
            project.project_link = v;
        }
    }
}

// ============================================================================
// VALIDATION HELPERS
// ============================================================================

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing { field });
    }
    Ok(())
}

pub fn validate_rating(rating: i32) -> Result<(), ValidationError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::RatingOutOfRange { rating });
    }
    Ok(())
}
