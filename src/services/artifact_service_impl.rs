//! `SeaORM` implementation of the `ArtifactService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::chat::{ChatClient, Message};
use crate::db::Store;
use crate::domain::{Page, PageRequest, SnowflakeGenerator};
use crate::models::artifact::{Artifact, ArtifactCriteria, ArtifactInput};
use crate::services::artifact_service::{ArtifactError, ArtifactService};

pub const SUMMARY_PROMPT: &str = "Your task is to generate a short summary of a given JSON array in at most 100 words. The summary must include the number of artifacts, each artifact's description and the ownership information. Don't mention that the summary is from a given JSON array.";

pub struct SeaOrmArtifactService {
    store: Store,
    ids: Arc<SnowflakeGenerator>,
    chat: Arc<dyn ChatClient>,
}

impl SeaOrmArtifactService {
    #[must_use]
    pub fn new(store: Store, ids: Arc<SnowflakeGenerator>, chat: Arc<dyn ChatClient>) -> Self {
        Self { store, ids, chat }
    }
}

#[async_trait]
impl ArtifactService for SeaOrmArtifactService {
    async fn find_by_id(&self, id: &str) -> Result<Artifact, ArtifactError> {
        self.store
            .get_artifact(id)
            .await?
            .ok_or_else(|| ArtifactError::NotFound(id.to_string()))
    }

    async fn find_all(&self) -> Result<Vec<Artifact>, ArtifactError> {
        Ok(self.store.list_artifacts().await?)
    }

    async fn find_all_paged(&self, page: PageRequest) -> Result<Page<Artifact>, ArtifactError> {
        self.find_by_criteria(&ArtifactCriteria::default(), page)
            .await
    }

    async fn find_by_criteria(
        &self,
        criteria: &ArtifactCriteria,
        page: PageRequest,
    ) -> Result<Page<Artifact>, ArtifactError> {
        let (items, total_elements, total_pages) =
            self.store.search_artifacts(criteria, page).await?;

        Ok(Page::new(items, page, total_elements, total_pages))
    }

    async fn save(&self, input: ArtifactInput) -> Result<Artifact, ArtifactError> {
        let id = self.ids.next_id()?.to_string();
        let artifact = self.store.add_artifact(id, input).await?;

        info!(id = %artifact.id, name = %artifact.name, "Artifact added");
        Ok(artifact)
    }

    async fn update(&self, id: &str, input: ArtifactInput) -> Result<Artifact, ArtifactError> {
        self.store
            .update_artifact(id, input)
            .await?
            .ok_or_else(|| ArtifactError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), ArtifactError> {
        if !self.store.remove_artifact(id).await? {
            return Err(ArtifactError::NotFound(id.to_string()));
        }

        info!(id = %id, "Artifact deleted");
        Ok(())
    }

    async fn summarize(&self, artifacts: &[Artifact]) -> Result<String, ArtifactError> {
        let json = serde_json::to_string(artifacts)
            .map_err(|e| ArtifactError::Serialization(e.to_string()))?;

        debug!(artifacts = artifacts.len(), "Requesting artifact summary");

        let messages = [Message::system(SUMMARY_PROMPT), Message::user(json)];
        let response = self.chat.complete(&messages).await?;

        Ok(response.into_first_content()?)
    }
}
