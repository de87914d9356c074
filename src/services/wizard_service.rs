//! Domain service for wizards and artifact ownership.

use thiserror::Error;

use crate::domain::WizardId;
use crate::models::wizard::{Wizard, WizardInput};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Could not find wizard with Id {0} :(")]
    NotFound(WizardId),

    #[error("Could not find artifact with Id {0} :(")]
    ArtifactNotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for WizardError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for WizardError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait WizardService: Send + Sync {
    async fn find_by_id(&self, id: WizardId) -> Result<Wizard, WizardError>;

    async fn find_all(&self) -> Result<Vec<Wizard>, WizardError>;

    async fn create(&self, input: WizardInput) -> Result<Wizard, WizardError>;

    /// Renames a wizard.
    async fn update(&self, id: WizardId, input: WizardInput) -> Result<Wizard, WizardError>;

    /// Removes a wizard. Its artifacts stay in the catalog without an owner.
    async fn delete(&self, id: WizardId) -> Result<(), WizardError>;

    /// Transfers `artifact_id` to `wizard_id`, detaching it from any previous
    /// owner.
    ///
    /// # Errors
    ///
    /// [`WizardError::ArtifactNotFound`] is checked before
    /// [`WizardError::NotFound`]. Neither leaves any change behind.
    async fn assign_artifact(
        &self,
        wizard_id: WizardId,
        artifact_id: &str,
    ) -> Result<(), WizardError>;
}
