use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{PageRequest, UserId, WizardId};
use crate::models::artifact::{Artifact, ArtifactCriteria, ArtifactInput};
use crate::models::user::{User, UserInput, UserUpdate};
use crate::models::wizard::{Wizard, WizardInput};

pub mod migrator;
pub mod repositories;
mod seed;

pub use repositories::wizard::Assignment;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // Every SQLite `:memory:` connection is its own database, so keep
        // exactly one open for the life of the pool.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
            (max_connections, min_connections)
        };
        opt.max_connections(max_connections)
            .min_connections(min_connections);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn artifact_repo(&self) -> repositories::artifact::ArtifactRepository {
        repositories::artifact::ArtifactRepository::new(self.conn.clone())
    }

    fn wizard_repo(&self) -> repositories::wizard::WizardRepository {
        repositories::wizard::WizardRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    /// Loads the demo catalog when no wizards exist yet. Returns whether
    /// anything was written.
    pub async fn seed_if_empty(&self, security: &SecurityConfig) -> Result<bool> {
        if self.wizard_repo().count().await? > 0 {
            return Ok(false);
        }

        seed::seed_demo_data(&self.conn, security).await?;
        Ok(true)
    }

    // ========== Artifacts ==========

    pub async fn get_artifact(&self, id: &str) -> Result<Option<Artifact>> {
        self.artifact_repo().get(id).await
    }

    pub async fn list_artifacts(&self) -> Result<Vec<Artifact>> {
        self.artifact_repo().list_all().await
    }

    pub async fn search_artifacts(
        &self,
        criteria: &ArtifactCriteria,
        page: PageRequest,
    ) -> Result<(Vec<Artifact>, u64, u64)> {
        self.artifact_repo().search(criteria, page).await
    }

    pub async fn add_artifact(&self, id: String, input: ArtifactInput) -> Result<Artifact> {
        self.artifact_repo().insert(id, input).await
    }

    pub async fn update_artifact(&self, id: &str, input: ArtifactInput) -> Result<Option<Artifact>> {
        self.artifact_repo().update(id, input).await
    }

    pub async fn remove_artifact(&self, id: &str) -> Result<bool> {
        self.artifact_repo().delete(id).await
    }

    // ========== Wizards ==========

    pub async fn get_wizard(&self, id: WizardId) -> Result<Option<Wizard>> {
        self.wizard_repo().get(id).await
    }

    pub async fn list_wizards(&self) -> Result<Vec<Wizard>> {
        self.wizard_repo().list_all().await
    }

    pub async fn add_wizard(&self, input: WizardInput) -> Result<Wizard> {
        self.wizard_repo().insert(input).await
    }

    pub async fn update_wizard(&self, id: WizardId, input: WizardInput) -> Result<Option<Wizard>> {
        self.wizard_repo().update(id, input).await
    }

    pub async fn remove_wizard(&self, id: WizardId) -> Result<bool> {
        self.wizard_repo().delete(id).await
    }

    pub async fn assign_artifact(&self, wizard_id: WizardId, artifact_id: &str) -> Result<Assignment> {
        self.wizard_repo()
            .assign_artifact(wizard_id, artifact_id)
            .await
    }

    // ========== Users ==========

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo()
            .get_by_username_with_password(username)
            .await
    }

    pub async fn add_user(&self, input: UserInput, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(input, security).await
    }

    pub async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>> {
        self.user_repo().update(id, update).await
    }

    pub async fn remove_user(&self, id: UserId) -> Result<bool> {
        self.user_repo().delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    async fn seeded_store() -> Store {
        let store = Store::new("sqlite::memory:").await.unwrap();
        assert!(store.seed_if_empty(&cheap_security()).await.unwrap());
        store
    }

    fn input(name: &str) -> ArtifactInput {
        ArtifactInput {
            name: name.to_string(),
            description: format!("{name} description"),
            image_url: "ImageUrl".to_string(),
        }
    }

    #[tokio::test]
    async fn seeding_runs_once() {
        let store = seeded_store().await;
        assert!(!store.seed_if_empty(&cheap_security()).await.unwrap());

        assert_eq!(store.list_wizards().await.unwrap().len(), 3);
        assert_eq!(store.list_artifacts().await.unwrap().len(), 6);
        assert_eq!(store.list_users().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn wizard_counts_reflect_owned_artifacts() {
        let store = seeded_store().await;
        let wizards = store.list_wizards().await.unwrap();

        let counts: Vec<u64> = wizards.iter().map(|w| w.number_of_artifacts).collect();
        assert_eq!(counts, vec![2, 2, 1]);

        let stone = store
            .get_artifact("125080601744904196")
            .await
            .unwrap()
            .unwrap();
        assert!(stone.owner.is_none());
    }

    #[tokio::test]
    async fn assign_moves_artifact_between_wizards() {
        let store = seeded_store().await;
        let harry = WizardId::new(2);
        let neville = WizardId::new(3);

        let outcome = store
            .assign_artifact(neville, "125080601744904192")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Assignment::Assigned {
                previous_owner: Some(harry)
            }
        );

        assert_eq!(store.get_wizard(harry).await.unwrap().unwrap().number_of_artifacts, 1);
        assert_eq!(store.get_wizard(neville).await.unwrap().unwrap().number_of_artifacts, 2);

        let cloak = store
            .get_artifact("125080601744904192")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cloak.owner.map(|o| o.id), Some(neville));
    }

    #[tokio::test]
    async fn assign_checks_artifact_before_wizard() {
        let store = seeded_store().await;

        let outcome = store
            .assign_artifact(WizardId::new(99), "does-not-exist")
            .await
            .unwrap();
        assert_eq!(outcome, Assignment::ArtifactNotFound);

        let outcome = store
            .assign_artifact(WizardId::new(99), "125080601744904192")
            .await
            .unwrap();
        assert_eq!(outcome, Assignment::WizardNotFound);

        let cloak = store
            .get_artifact("125080601744904192")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cloak.owner.map(|o| o.id), Some(WizardId::new(2)));
    }

    #[tokio::test]
    async fn deleting_wizard_orphans_its_artifacts() {
        let store = seeded_store().await;

        assert!(store.remove_wizard(WizardId::new(1)).await.unwrap());
        assert!(!store.remove_wizard(WizardId::new(1)).await.unwrap());

        let wand = store
            .get_artifact("125080601744904193")
            .await
            .unwrap()
            .unwrap();
        assert!(wand.owner.is_none());
        assert_eq!(store.list_artifacts().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn search_combines_criteria_case_insensitively() {
        let store = seeded_store().await;

        let criteria = ArtifactCriteria {
            name: Some("WAND".into()),
            ..Default::default()
        };
        let (items, total, pages) = store
            .search_artifacts(&criteria, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(pages, 1);
        assert_eq!(items[0].name, "Elder Wand");

        let criteria = ArtifactCriteria {
            owner_name: Some("harry potter".into()),
            description: Some("map".into()),
            ..Default::default()
        };
        let (items, total, _) = store
            .search_artifacts(&criteria, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "The Marauder's Map");
    }

    #[tokio::test]
    async fn search_folds_only_ascii_case() {
        let store = seeded_store().await;
        store.add_artifact("1".into(), input("Épée of Ébène")).await.unwrap();

        let criteria = ArtifactCriteria {
            name: Some("Épée OF".into()),
            ..Default::default()
        };
        let (items, total, _) = store
            .search_artifacts(&criteria, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "Épée of Ébène");

        let criteria = ArtifactCriteria {
            name: Some("épée".into()),
            ..Default::default()
        };
        let (_, total, _) = store
            .search_artifacts(&criteria, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn in_memory_store_keeps_one_database() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.add_wizard(WizardInput { name: "Luna".into() }).await.unwrap();

        let (first, second) = tokio::join!(store.list_wizards(), store.list_wizards());
        assert_eq!(first.unwrap().len(), 1);
        assert_eq!(second.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn updates_of_missing_rows_return_none() {
        let store = seeded_store().await;

        assert!(store.update_artifact("nope", input("x")).await.unwrap().is_none());
        assert!(
            store
                .update_wizard(WizardId::new(99), WizardInput { name: "x".into() })
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .update_user(
                    UserId::new(99),
                    UserUpdate {
                        username: "x".into(),
                        enabled: true,
                        roles: "user".into(),
                    },
                )
                .await
                .unwrap()
                .is_none()
        );

        let renamed = store
            .update_wizard(WizardId::new(2), WizardInput { name: "Harry J. Potter".into() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Harry J. Potter");
        assert_eq!(renamed.number_of_artifacts, 2);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let store = seeded_store().await;
        store.add_artifact("1".into(), input("100% Felix")).await.unwrap();

        let criteria = ArtifactCriteria {
            name: Some("%".into()),
            ..Default::default()
        };
        let (items, total, _) = store
            .search_artifacts(&criteria, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "100% Felix");
    }

    #[tokio::test]
    async fn search_pages_results() {
        let store = seeded_store().await;

        let (items, total, pages) = store
            .search_artifacts(&ArtifactCriteria::default(), PageRequest::new(1, 4))
            .await
            .unwrap();
        assert_eq!(total, 6);
        assert_eq!(pages, 2);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn update_keeps_owner_and_id() {
        let store = seeded_store().await;

        let updated = store
            .update_artifact("125080601744904193", input("Deathstick"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, "125080601744904193");
        assert_eq!(updated.name, "Deathstick");
        assert_eq!(updated.owner.map(|o| o.id), Some(WizardId::new(1)));

        assert!(store.update_artifact("missing", input("x")).await.unwrap().is_none());
    }
}
