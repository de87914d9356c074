use std::sync::Arc;
use tracing::info;

use crate::auth::TokenProvider;
use crate::clients::chat::{ChatClient, OpenAiChatClient};
use crate::clients::image_storage::{self, ImageStorage};
use crate::config::Config;
use crate::db::Store;
use crate::domain::SnowflakeGenerator;
use crate::services::{
    ArtifactService, AuthService, SeaOrmArtifactService, SeaOrmUserService, SeaOrmWizardService,
    TokenAuthService, UserService, WizardService,
};

/// Build a shared HTTP client for the chat and blob storage collaborators.
/// One client is reused so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("artifacts-online/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub artifact_service: Arc<dyn ArtifactService>,

    pub wizard_service: Arc<dyn WizardService>,

    pub user_service: Arc<dyn UserService>,

    pub auth_service: Arc<dyn AuthService>,

    pub image_storage: Arc<dyn ImageStorage>,

    pub start_time: std::time::Instant,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::init(config, None).await
    }

    /// Like [`AppState::new`] but summarizes through `chat` instead of the
    /// configured endpoint.
    pub async fn with_chat_client(
        config: Config,
        chat: Arc<dyn ChatClient>,
    ) -> anyhow::Result<Self> {
        Self::init(config, Some(chat)).await
    }

    async fn init(config: Config, chat: Option<Arc<dyn ChatClient>>) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        if config.general.seed_demo_data && store.seed_if_empty(&config.security).await? {
            info!("Demo catalog loaded");
        }

        let http_client = build_shared_http_client(config.ai.request_timeout_seconds)?;

        let chat = chat.unwrap_or_else(|| {
            Arc::new(OpenAiChatClient::new(http_client.clone(), &config.ai)) as Arc<dyn ChatClient>
        });
        let image_storage: Arc<dyn ImageStorage> =
            Arc::from(image_storage::from_config(http_client, &config.storage));

        let ids = Arc::new(SnowflakeGenerator::new(
            config.id_generator.datacenter_id,
            config.id_generator.worker_id,
        )?);
        let tokens = Arc::new(TokenProvider::generate(&config.security)?);

        let artifact_service = Arc::new(SeaOrmArtifactService::new(store.clone(), ids, chat))
            as Arc<dyn ArtifactService + Send + Sync + 'static>;

        let wizard_service = Arc::new(SeaOrmWizardService::new(store.clone()))
            as Arc<dyn WizardService + Send + Sync + 'static>;

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService + Send + Sync + 'static>;

        let auth_service = Arc::new(TokenAuthService::new(user_service.clone(), tokens))
            as Arc<dyn AuthService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(config),
            store,
            artifact_service,
            wizard_service,
            user_service,
            auth_service,
            image_storage,
            start_time: std::time::Instant::now(),
        })
    }

    /// API prefix without a trailing slash; empty when mounted at the root.
    #[must_use]
    pub fn base_path(&self) -> &str {
        self.config.base_path()
    }
}
