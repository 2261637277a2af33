pub mod api_client;
pub mod config;
pub mod database;
pub mod error;
pub mod mirror;
pub mod models;
pub mod services;
pub mod session;

use crate::api_client::ApiClient;
use crate::error::AdminError;
use crate::mirror::MirrorStore;
use crate::services::admin::AdminView;
use crate::services::booking::BookingReconciler;
use crate::services::sync::SyncCoordinator;
use crate::services::tickets::TicketValidator;
use crate::session::Session;

// Общее состояние клиентского ядра: API, зеркало и конфигурация
#[derive(Clone)]
pub struct TicketClient {
    pub api: ApiClient,
    pub mirror: MirrorStore,
    pub config: config::Config,
}

impl TicketClient {
    pub async fn new(config: config::Config) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let db = database::Database::new(&config.mirror.url, config.mirror.pool_size).await?;

        db.run_migrations().await?;

        let api = ApiClient::from_config(&config)?;
        Ok(Self { api, mirror: MirrorStore::new(db), config })
    }

    pub fn sync(&self) -> SyncCoordinator {
        SyncCoordinator::new(self.mirror.clone())
    }

    pub fn bookings(&self) -> BookingReconciler {
        BookingReconciler::new(self.api.clone(), self.mirror.clone())
    }

    pub fn ticket_validator(&self) -> TicketValidator {
        TicketValidator::new(self.api.clone())
    }

    pub fn admin(&self, session: Session) -> Result<AdminView, AdminError> {
        AdminView::new(self.api.clone(), self.mirror.clone(), session)
    }
}
