use std::sync::Arc;

use common::storage::FileStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::integrations::generative::TextGenerator;
use crate::integrations::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub files: Arc<dyn FileStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub generator: Arc<dyn TextGenerator>,
}
