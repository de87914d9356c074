//! `SeaORM` implementation of the `WizardService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Assignment, Store};
use crate::domain::WizardId;
use crate::models::wizard::{Wizard, WizardInput};
use crate::services::wizard_service::{WizardError, WizardService};

pub struct SeaOrmWizardService {
    store: Store,
}

impl SeaOrmWizardService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WizardService for SeaOrmWizardService {
    async fn find_by_id(&self, id: WizardId) -> Result<Wizard, WizardError> {
        self.store
            .get_wizard(id)
            .await?
            .ok_or(WizardError::NotFound(id))
    }

    async fn find_all(&self) -> Result<Vec<Wizard>, WizardError> {
        Ok(self.store.list_wizards().await?)
    }

    async fn create(&self, input: WizardInput) -> Result<Wizard, WizardError> {
        let wizard = self.store.add_wizard(input).await?;
        info!(id = %wizard.id, name = %wizard.name, "Wizard added");
        Ok(wizard)
    }

    async fn update(&self, id: WizardId, input: WizardInput) -> Result<Wizard, WizardError> {
        self.store
            .update_wizard(id, input)
            .await?
            .ok_or(WizardError::NotFound(id))
    }

    async fn delete(&self, id: WizardId) -> Result<(), WizardError> {
        if !self.store.remove_wizard(id).await? {
            return Err(WizardError::NotFound(id));
        }

        info!(id = %id, "Wizard deleted, owned artifacts released");
        Ok(())
    }

    async fn assign_artifact(
        &self,
        wizard_id: WizardId,
        artifact_id: &str,
    ) -> Result<(), WizardError> {
        match self.store.assign_artifact(wizard_id, artifact_id).await? {
            Assignment::Assigned { previous_owner } => {
                info!(
                    artifact = %artifact_id,
                    from = ?previous_owner.map(|w| w.value()),
                    to = %wizard_id,
                    "Artifact ownership changed"
                );
                Ok(())
            }
            Assignment::ArtifactNotFound => {
                Err(WizardError::ArtifactNotFound(artifact_id.to_string()))
            }
            Assignment::WizardNotFound => Err(WizardError::NotFound(wizard_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmWizardService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        SeaOrmWizardService::new(store)
    }

    fn named(name: &str) -> WizardInput {
        WizardInput {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_rename() {
        let service = service().await;

        let wizard = service.create(named("Hermione Granger")).await.unwrap();
        assert_eq!(wizard.number_of_artifacts, 0);

        let renamed = service
            .update(wizard.id, named("Hermione Granger-Weasley"))
            .await
            .unwrap();
        assert_eq!(renamed.id, wizard.id);
        assert_eq!(renamed.name, "Hermione Granger-Weasley");
    }

    #[tokio::test]
    async fn unknown_wizard_is_not_found() {
        let service = service().await;
        let id = WizardId::new(42);

        assert!(matches!(service.find_by_id(id).await, Err(WizardError::NotFound(w)) if w == id));
        assert!(matches!(
            service.update(id, named("x")).await,
            Err(WizardError::NotFound(_))
        ));
        assert!(matches!(service.delete(id).await, Err(WizardError::NotFound(_))));
    }

    #[tokio::test]
    async fn assign_reports_missing_artifact_first() {
        let service = service().await;

        let err = service
            .assign_artifact(WizardId::new(7), "123")
            .await
            .unwrap_err();
        assert!(matches!(err, WizardError::ArtifactNotFound(id) if id == "123"));
    }
}
