pub mod artifact_service;
pub use artifact_service::{ArtifactError, ArtifactService};

pub mod artifact_service_impl;
pub use artifact_service_impl::SeaOrmArtifactService;

pub mod wizard_service;
pub use wizard_service::{WizardError, WizardService};

pub mod wizard_service_impl;
pub use wizard_service_impl::SeaOrmWizardService;

pub mod user_service;
pub use user_service::{StoredCredentials, UserError, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, LoginResult};

pub mod auth_service_impl;
pub use auth_service_impl::TokenAuthService;
