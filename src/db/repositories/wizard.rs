use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::artifact::count_by_owner;
use crate::domain::WizardId;
use crate::entities::{artifacts, prelude::*, wizards};
use crate::models::wizard::{Wizard, WizardInput};

/// Result of moving an artifact to a new owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Assigned { previous_owner: Option<WizardId> },
    ArtifactNotFound,
    WizardNotFound,
}

pub struct WizardRepository {
    conn: DatabaseConnection,
}

impl WizardRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: WizardId) -> Result<Option<Wizard>> {
        let model = Wizards::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query wizard by id")?;

        let Some(model) = model else {
            return Ok(None);
        };

        Ok(with_counts(&self.conn, vec![model]).await?.pop())
    }

    pub async fn list_all(&self) -> Result<Vec<Wizard>> {
        let models = Wizards::find()
            .order_by_asc(wizards::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list wizards")?;

        with_counts(&self.conn, models).await
    }

    pub async fn count(&self) -> Result<u64> {
        Wizards::find()
            .count(&self.conn)
            .await
            .context("Failed to count wizards")
    }

    pub async fn insert(&self, input: WizardInput) -> Result<Wizard> {
        let model = wizards::ActiveModel {
            name: Set(input.name),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert wizard")?;

        Ok(Wizard {
            id: WizardId::new(model.id),
            name: model.name,
            number_of_artifacts: 0,
        })
    }

    pub async fn update(&self, id: WizardId, input: WizardInput) -> Result<Option<Wizard>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = Wizards::find_by_id(id.value())
            .one(&txn)
            .await
            .context("Failed to query wizard for update")?
        else {
            return Ok(None);
        };

        let mut active: wizards::ActiveModel = existing.into();
        active.name = Set(input.name);
        let model = active
            .update(&txn)
            .await
            .context("Failed to update wizard")?;

        let wizard = with_counts(&txn, vec![model]).await?.pop();
        txn.commit().await?;
        Ok(wizard)
    }

    /// Detaches the wizard's artifacts and removes the wizard in one
    /// transaction. Returns `false` when the wizard does not exist.
    pub async fn delete(&self, id: WizardId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let exists = Wizards::find_by_id(id.value())
            .one(&txn)
            .await
            .context("Failed to query wizard for delete")?
            .is_some();
        if !exists {
            return Ok(false);
        }

        Artifacts::update_many()
            .col_expr(artifacts::Column::OwnerId, Expr::value(Option::<i32>::None))
            .filter(artifacts::Column::OwnerId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to detach artifacts from wizard")?;

        Wizards::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete wizard")?;

        txn.commit().await?;
        Ok(true)
    }

    /// Makes `wizard_id` the owner of `artifact_id`.
    ///
    /// The artifact is looked up first, then the wizard. Nothing is written
    /// unless both exist.
    pub async fn assign_artifact(&self, wizard_id: WizardId, artifact_id: &str) -> Result<Assignment> {
        let txn = self.conn.begin().await?;

        let Some(artifact) = Artifacts::find_by_id(artifact_id.to_string())
            .one(&txn)
            .await
            .context("Failed to query artifact for assignment")?
        else {
            return Ok(Assignment::ArtifactNotFound);
        };

        let wizard_exists = Wizards::find_by_id(wizard_id.value())
            .one(&txn)
            .await
            .context("Failed to query wizard for assignment")?
            .is_some();
        if !wizard_exists {
            return Ok(Assignment::WizardNotFound);
        }

        let previous_owner = artifact.owner_id.map(WizardId::new);

        let mut active: artifacts::ActiveModel = artifact.into();
        active.owner_id = Set(Some(wizard_id.value()));
        active
            .update(&txn)
            .await
            .context("Failed to reassign artifact owner")?;

        txn.commit().await?;
        Ok(Assignment::Assigned { previous_owner })
    }

}

async fn with_counts<C>(conn: &C, models: Vec<wizards::Model>) -> Result<Vec<Wizard>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let counts = count_by_owner(conn, &ids).await?;

    Ok(models
        .into_iter()
        .map(|m| Wizard {
            id: WizardId::new(m.id),
            number_of_artifacts: counts.get(&m.id).copied().unwrap_or(0),
            name: m.name,
        })
        .collect())
}
