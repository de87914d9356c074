//! Domain service for the artifact catalog.

use thiserror::Error;

use crate::clients::chat::ChatError;
use crate::domain::{IdError, Page, PageRequest};
use crate::models::artifact::{Artifact, ArtifactCriteria, ArtifactInput};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Could not find artifact with Id {0} :(")]
    NotFound(String),

    #[error("Failed to generate artifact id: {0}")]
    IdGeneration(#[from] IdError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Failed to serialize artifacts: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for ArtifactError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ArtifactError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait ArtifactService: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Artifact, ArtifactError>;

    async fn find_all(&self) -> Result<Vec<Artifact>, ArtifactError>;

    async fn find_all_paged(&self, page: PageRequest) -> Result<Page<Artifact>, ArtifactError>;

    /// Pages through artifacts matching every populated criterion.
    async fn find_by_criteria(
        &self,
        criteria: &ArtifactCriteria,
        page: PageRequest,
    ) -> Result<Page<Artifact>, ArtifactError>;

    /// Persists a new, unowned artifact under a freshly generated id.
    async fn save(&self, input: ArtifactInput) -> Result<Artifact, ArtifactError>;

    /// Overwrites name, description and image URL. Ownership is untouched.
    async fn update(&self, id: &str, input: ArtifactInput) -> Result<Artifact, ArtifactError>;

    async fn delete(&self, id: &str) -> Result<(), ArtifactError>;

    /// Asks the chat model for a short prose summary of `artifacts`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Chat`] when the model call fails or yields no
    /// choices.
    async fn summarize(&self, artifacts: &[Artifact]) -> Result<String, ArtifactError>;
}
