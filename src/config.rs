// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    common::{error::AppError, i18n::I18nStore},
    db::{
        ApprovalRepository, ApprovalStore, CertificateRepository, CertificateStore,
        NotificationRepository, NotificationStore, PerDiemRepository, PerDiemStore,
    },
    services::{ApprovalService, CertificateService, NotificationService, PerDiemService},
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5)?;
        let acquire_secs: u64 = parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(self.db_acquire_timeout)
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("{} inválido: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub per_diem_service: PerDiemService,
    pub approval_service: ApprovalService,
    pub notification_service: NotificationService,
    pub certificate_service: CertificateService,
}

impl AppState {
    /// Monta o grafo de dependências a partir do pool.
    pub fn new(config: Config, db_pool: PgPool) -> Result<Self, AppError> {
        Self::from_stores(
            config,
            Arc::new(PerDiemRepository::new(db_pool.clone())),
            Arc::new(ApprovalRepository::new(db_pool.clone())),
            Arc::new(NotificationRepository::new(db_pool.clone())),
            Arc::new(CertificateRepository::new(db_pool)),
        )
    }

    pub fn from_stores(
        config: Config,
        per_diem: Arc<dyn PerDiemStore>,
        approvals: Arc<dyn ApprovalStore>,
        notifications: Arc<dyn NotificationStore>,
        certificates: Arc<dyn CertificateStore>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            per_diem_service: PerDiemService::new(per_diem),
            approval_service: ApprovalService::new(approvals),
            notification_service: NotificationService::new(notifications),
            certificate_service: CertificateService::new(certificates)?,
        })
    }
}
