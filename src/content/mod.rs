//! Portfolio content: projects, skills, recommendations and the uploaded
//! CV / hero image, persisted as one JSON document.

pub mod store;
pub mod uploads;

use crate::auth::oauth::Provider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

pub use store::JsonContentStore;
pub use uploads::{StoredUpload, UploadKind, UploadStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// JSON document holding all portfolio content
    #[serde(default = "default_content_path")]
    pub path: PathBuf,
    /// Directory uploaded files are written to and served from
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_content_path() -> PathBuf {
    PathBuf::from("data/content.json")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            path: default_content_path(),
            uploads_dir: default_uploads_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },
    #[error("{0}")]
    Validation(String),
    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("Content storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Content document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub image: String,
}

/// Body of project create/update requests
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub image: String,
}

impl ProjectInput {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.title.trim().is_empty() {
            return Err(ContentError::Validation(
                "Project title must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn into_project(self, id: Uuid) -> Project {
        Project {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            tech: self
                .tech
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            repo: self.repo,
            image: self.image,
        }
    }
}

/// Section of the skills page a skill is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Stack,
    DbStack,
    Tools,
    AiStack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillInput {
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub category: SkillCategory,
}

impl SkillInput {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.name.trim().is_empty() {
            return Err(ContentError::Validation(
                "Skill name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn into_skill(self, id: Uuid) -> Skill {
        Skill {
            id,
            name: self.name.trim().to_string(),
            image: self.image,
            category: self.category,
        }
    }
}

/// A visitor comment, attributed to a verified provider identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub text: String,
    pub avatar: String,
    pub username: String,
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
}

/// The whole persisted content document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentStats {
    pub projects_count: usize,
    pub skills_count: usize,
    pub recommendations_count: usize,
}

impl From<&ContentDocument> for ContentStats {
    fn from(document: &ContentDocument) -> Self {
        Self {
            projects_count: document.projects.len(),
            skills_count: document.skills.len(),
            recommendations_count: document.recommendations.len(),
        }
    }
}
