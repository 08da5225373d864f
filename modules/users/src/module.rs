use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::{openapi::UsersApiDoc, routes};
use crate::config::UsersConfig;
use crate::contract::client::UsersApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::UsersLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::SeaOrmUsersRepository;

/// Users module: owns the domain service and hands out its adapters.
#[derive(Clone)]
pub struct UsersModule {
    service: Arc<Service>,
}

impl UsersModule {
    /// Wire the SeaORM repository into the domain service.
    pub fn init(conn: DatabaseConnection, cfg: &UsersConfig) -> Self {
        info!("Initializing users module");
        debug!(
            "Loaded users config: max_name_length={}, max_email_length={}",
            cfg.max_name_length, cfg.max_email_length
        );

        let repo = SeaOrmUsersRepository::new(conn);
        let service = Service::new(Arc::new(repo), ServiceConfig::from(cfg));
        Self {
            service: Arc::new(service),
        }
    }

    /// Apply pending schema migrations.
    pub async fn migrate(conn: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running users database migrations");
        Migrator::up(conn, None).await?;
        info!("Users database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// In-process client for the console and other consumers.
    pub fn client(&self) -> Arc<dyn UsersApi> {
        Arc::new(UsersLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering users REST routes");
        routes::register_routes(router, self.service.clone())
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        <UsersApiDoc as utoipa::OpenApi>::openapi()
    }
}
