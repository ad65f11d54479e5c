use super::{
    ContentDocument, ContentError, ContentStats, Project, ProjectInput, Recommendation, Skill,
    SkillInput,
};
use crate::health::{HealthCheckResult, HealthChecker};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Content document stored as a single JSON file.
///
/// Writers are serialized through one lock and replace the file with a
/// rename, so readers never observe a half-written document.
pub struct JsonContentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonContentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document; a missing file reads as empty content.
    pub async fn load(&self) -> Result<ContentDocument, ContentError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(ContentDocument::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ContentDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-modify-write under the writer lock. Nothing is written when
    /// `mutate` fails.
    pub async fn update<T, F>(&self, mutate: F) -> Result<T, ContentError>
    where
        F: FnOnce(&mut ContentDocument) -> Result<T, ContentError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        let result = mutate(&mut document)?;
        self.persist(&document).await?;
        Ok(result)
    }

    async fn persist(&self, document: &ContentDocument) -> Result<(), ContentError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(document)?).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "Content document written");
        Ok(())
    }

    /// Wait until no write is in progress.
    pub async fn wait_for_writers(&self) {
        drop(self.write_lock.lock().await);
    }

    pub async fn projects(&self) -> Result<Vec<Project>, ContentError> {
        Ok(self.load().await?.projects)
    }

    pub async fn skills(&self) -> Result<Vec<Skill>, ContentError> {
        Ok(self.load().await?.skills)
    }

    pub async fn recommendations(&self) -> Result<Vec<Recommendation>, ContentError> {
        Ok(self.load().await?.recommendations)
    }

    pub async fn stats(&self) -> Result<ContentStats, ContentError> {
        Ok(ContentStats::from(&self.load().await?))
    }

    pub async fn create_project(&self, input: ProjectInput) -> Result<Project, ContentError> {
        input.validate()?;
        let project = input.into_project(Uuid::new_v4());
        let created = project.clone();
        self.update(move |document| {
            document.projects.push(project);
            Ok(())
        })
        .await?;
        info!(project_id = %created.id, title = %created.title, "Project created");
        Ok(created)
    }

    pub async fn update_project(
        &self,
        id: Uuid,
        input: ProjectInput,
    ) -> Result<Project, ContentError> {
        input.validate()?;
        self.update(move |document| {
            let slot = document
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(ContentError::NotFound { kind: "Project", id })?;
            *slot = input.into_project(id);
            Ok(slot.clone())
        })
        .await
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<(), ContentError> {
        self.update(move |document| {
            let before = document.projects.len();
            document.projects.retain(|p| p.id != id);
            if document.projects.len() == before {
                return Err(ContentError::NotFound { kind: "Project", id });
            }
            Ok(())
        })
        .await?;
        info!(project_id = %id, "Project deleted");
        Ok(())
    }

    pub async fn create_skill(&self, input: SkillInput) -> Result<Skill, ContentError> {
        input.validate()?;
        let skill = input.into_skill(Uuid::new_v4());
        let created = skill.clone();
        self.update(move |document| {
            document.skills.push(skill);
            Ok(())
        })
        .await?;
        info!(skill_id = %created.id, name = %created.name, "Skill created");
        Ok(created)
    }

    pub async fn update_skill(&self, id: Uuid, input: SkillInput) -> Result<Skill, ContentError> {
        input.validate()?;
        self.update(move |document| {
            let slot = document
                .skills
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(ContentError::NotFound { kind: "Skill", id })?;
            *slot = input.into_skill(id);
            Ok(slot.clone())
        })
        .await
    }

    pub async fn delete_skill(&self, id: Uuid) -> Result<(), ContentError> {
        self.update(move |document| {
            let before = document.skills.len();
            document.skills.retain(|s| s.id != id);
            if document.skills.len() == before {
                return Err(ContentError::NotFound { kind: "Skill", id });
            }
            Ok(())
        })
        .await?;
        info!(skill_id = %id, "Skill deleted");
        Ok(())
    }

    pub async fn add_recommendation(
        &self,
        recommendation: Recommendation,
    ) -> Result<Recommendation, ContentError> {
        if recommendation.text.trim().is_empty() {
            return Err(ContentError::Validation(
                "Recommendation text must not be empty".to_string(),
            ));
        }
        let stored = recommendation.clone();
        self.update(move |document| {
            document.recommendations.push(recommendation);
            Ok(())
        })
        .await?;
        Ok(stored)
    }

    pub async fn set_cv_url(&self, url: String) -> Result<(), ContentError> {
        self.update(move |document| {
            document.cv_url = Some(url);
            Ok(())
        })
        .await
    }

    pub async fn set_hero_image_url(&self, url: String) -> Result<(), ContentError> {
        self.update(move |document| {
            document.hero_image_url = Some(url);
            Ok(())
        })
        .await
    }
}

#[async_trait::async_trait]
impl HealthChecker for JsonContentStore {
    fn name(&self) -> &str {
        "content"
    }

    async fn check(&self) -> HealthCheckResult {
        match self.load().await {
            Ok(document) => HealthCheckResult::healthy_with_details(serde_json::json!({
                "path": self.path.display().to_string(),
                "stats": ContentStats::from(&document),
            })),
            Err(e) => HealthCheckResult::unhealthy(format!("Content document unreadable: {e}")),
        }
    }
}
