use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use lanyard_core::mailer::{ConsoleMailer, Mailer, SmtpMailer};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lanyard=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    ensure_data_dirs(&config);

    let db =
        lanyard_db::create_pool(&config.database.url, config.database.max_connections).await?;
    lanyard_db::run_migrations(&db).await?;

    let mailer = build_mailer(&config.mail)?;

    let state = lanyard_core::AppState {
        db,
        config: lanyard_core::AppConfig {
            jwt_secret: config.auth.jwt_secret.clone(),
            storage_path: config.storage.path.clone(),
            public_url: config.server.public_url.clone(),
        },
        mailer,
    };

    let app = lanyard_api::build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        bind = %config.server.bind_address,
        database = %config.database.url,
        "lanyard server listening"
    );

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn build_mailer(mail: &config::MailConfig) -> Result<Arc<dyn Mailer>> {
    match mail.smtp_server.as_deref() {
        Some(server) => {
            tracing::info!(server, "using SMTP mail transport");
            let mailer =
                SmtpMailer::new(server, mail.smtp_port, &mail.username, &mail.password, &mail.from)
                    .map_err(|e| anyhow::anyhow!("SMTP setup failed: {e}"))?;
            Ok(Arc::new(mailer))
        }
        None => {
            tracing::warn!("no SMTP server configured, outbound mail will only be logged");
            Ok(Arc::new(ConsoleMailer))
        }
    }
}

/// Ensure all data directories exist before the server starts.
fn ensure_data_dirs(config: &config::Config) {
    if let Err(e) = std::fs::create_dir_all(&config.storage.path) {
        tracing::warn!("could not create directory '{}': {}", config.storage.path, e);
    }

    if let Some(db_path) = config
        .database
        .url
        .strip_prefix("sqlite://")
        .or_else(|| config.database.url.strip_prefix("sqlite:"))
    {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("could not create directory {:?}: {}", parent, e);
                }
            }
        }
    }
}
