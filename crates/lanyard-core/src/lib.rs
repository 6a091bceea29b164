pub mod auth;
pub mod checkin;
pub mod diploma;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod mailer;
pub mod qr;
pub mod roles;
pub mod stats;

use std::sync::Arc;

use lanyard_db::DbPool;
use mailer::Mailer;

/// Worker id baked into generated snowflake ids. Single-instance
/// deployment, so a fixed value is fine.
pub const WORKER_ID: u16 = 1;

/// Placeholder name rendered on diploma previews.
pub const DIPLOMA_PREVIEW_NAME: &str = "Nombre Apellido";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    /// Root directory for stored diploma templates.
    pub storage_path: String,
    /// Public base URL of this server, used in invitation email bodies.
    pub public_url: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub mailer: Arc<dyn Mailer>,
}

#[cfg(test)]
pub(crate) mod testutil;
