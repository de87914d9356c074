use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

use crate::domain::{PageRequest, WizardId};
use crate::entities::{artifacts, prelude::*, wizards};
use crate::models::artifact::{Artifact, ArtifactCriteria, ArtifactInput};
use crate::models::wizard::Wizard;

pub struct ArtifactRepository {
    conn: DatabaseConnection,
}

impl ArtifactRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Artifact>> {
        find_with_owner(&self.conn, id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Artifact>> {
        let rows = Artifacts::find()
            .find_also_related(Wizards)
            .order_by_asc(artifacts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list artifacts")?;

        with_owners(&self.conn, rows).await
    }

    /// Returns one page of artifacts matching `criteria` with the total item
    /// and page counts.
    pub async fn search(
        &self,
        criteria: &ArtifactCriteria,
        page: PageRequest,
    ) -> Result<(Vec<Artifact>, u64, u64)> {
        let mut query = Artifacts::find()
            .find_also_related(Wizards)
            .order_by_asc(artifacts::Column::Id);
        if !criteria.is_empty() {
            query = query.filter(criteria_condition(criteria));
        }

        let paginator = query.paginate(&self.conn, page.size);
        let totals = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count artifacts")?;
        let rows = paginator
            .fetch_page(page.page)
            .await
            .context("Failed to fetch artifact page")?;

        let items = with_owners(&self.conn, rows).await?;
        Ok((items, totals.number_of_items, totals.number_of_pages))
    }

    pub async fn insert(&self, id: String, input: ArtifactInput) -> Result<Artifact> {
        let model = artifacts::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            image_url: Set(input.image_url),
            owner_id: Set(None),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert artifact")?;

        Ok(Artifact {
            id: model.id,
            name: model.name,
            description: model.description,
            image_url: model.image_url,
            owner: None,
        })
    }

    /// Overwrites the editable fields in one transaction. Returns `None`
    /// when the artifact does not exist.
    pub async fn update(&self, id: &str, input: ArtifactInput) -> Result<Option<Artifact>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = Artifacts::find_by_id(id.to_string())
            .one(&txn)
            .await
            .context("Failed to query artifact for update")?
        else {
            return Ok(None);
        };

        let mut active: artifacts::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.image_url = Set(input.image_url);
        active
            .update(&txn)
            .await
            .context("Failed to update artifact")?;

        let artifact = find_with_owner(&txn, id).await?;
        txn.commit().await?;
        Ok(artifact)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = Artifacts::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await
            .context("Failed to delete artifact")?;

        Ok(result.rows_affected > 0)
    }
}

async fn find_with_owner<C>(conn: &C, id: &str) -> Result<Option<Artifact>>
where
    C: ConnectionTrait,
{
    let row = Artifacts::find_by_id(id.to_string())
        .find_also_related(Wizards)
        .one(conn)
        .await
        .context("Failed to query artifact by id")?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(with_owners(conn, vec![row]).await?.pop())
}

async fn with_owners<C>(
    conn: &C,
    rows: Vec<(artifacts::Model, Option<wizards::Model>)>,
) -> Result<Vec<Artifact>>
where
    C: ConnectionTrait,
{
    let owner_ids: Vec<i32> = rows
        .iter()
        .filter_map(|(_, owner)| owner.as_ref().map(|w| w.id))
        .collect();
    let counts = count_by_owner(conn, &owner_ids).await?;

    Ok(rows
        .into_iter()
        .map(|(artifact, owner)| Artifact {
            id: artifact.id,
            name: artifact.name,
            description: artifact.description,
            image_url: artifact.image_url,
            owner: owner.map(|w| Wizard {
                id: WizardId::new(w.id),
                number_of_artifacts: counts.get(&w.id).copied().unwrap_or(0),
                name: w.name,
            }),
        })
        .collect())
}

pub(crate) async fn count_by_owner<C>(conn: &C, owner_ids: &[i32]) -> Result<HashMap<i32, u64>>
where
    C: ConnectionTrait,
{
    if owner_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let results: Vec<(i32, i64)> = Artifacts::find()
        .select_only()
        .column(artifacts::Column::OwnerId)
        .column_as(artifacts::Column::Id.count(), "count")
        .filter(artifacts::Column::OwnerId.is_in(owner_ids.to_vec()))
        .group_by(artifacts::Column::OwnerId)
        .into_tuple()
        .all(conn)
        .await
        .context("Failed to count artifacts per owner")?;

    Ok(results
        .into_iter()
        .map(|(id, count)| (id, u64::try_from(count).unwrap_or(0)))
        .collect())
}

fn criteria_condition(criteria: &ArtifactCriteria) -> Condition {
    let mut condition = Condition::all();

    if let Some(id) = &criteria.id {
        condition = condition.add(artifacts::Column::Id.eq(id.clone()));
    }

    if let Some(name) = &criteria.name {
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col((Artifacts, artifacts::Column::Name))))
                .like(contains_pattern(name)),
        );
    }

    if let Some(description) = &criteria.description {
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col((
                Artifacts,
                artifacts::Column::Description,
            ))))
            .like(contains_pattern(description)),
        );
    }

    if let Some(owner_name) = &criteria.owner_name {
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col((Wizards, wizards::Column::Name))))
                .eq(owner_name.to_ascii_lowercase()),
        );
    }

    condition
}

/// `%term%` with LIKE wildcards in `term` escaped.
///
/// SQLite's `lower()` only folds ASCII, so the term is folded the same way.
/// Non-ASCII letters match only in the case they were stored in.
fn contains_pattern(term: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');

    LikeExpr::new(escaped).escape('\\')
}

