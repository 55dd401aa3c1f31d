//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Admissio application.

use tracing::{info, warn, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
///
/// The returned guard must stay alive for the duration of the process so the
/// file appender keeps flushing.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "admissio.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log registration lifecycle events with structured data
pub fn log_registration_event(registration_id: i64, user_id: &str, event: &str, details: Option<&str>) {
    info!(
        registration_id = registration_id,
        user_id = user_id,
        event = event,
        details = details,
        "Registration event"
    );
}

/// Log document uploads and review decisions
pub fn log_document_event(registration_id: i64, document_id: i64, action: &str, details: Option<&str>) {
    info!(
        registration_id = registration_id,
        document_id = document_id,
        action = action,
        details = details,
        "Document event"
    );
}

/// Log certificate issuance and validation
pub fn log_certificate_event(certificate_code: &str, action: &str, user_id: Option<&str>) {
    info!(
        certificate_code = certificate_code,
        action = action,
        user_id = user_id,
        "Certificate event"
    );
}

/// Log CEP lookup results
pub fn log_cep_lookup(cep: &str, provider: &str, hit: bool) {
    if hit {
        debug!(cep = cep, provider = provider, "CEP resolved");
    } else {
        warn!(cep = cep, provider = provider, "CEP lookup missed");
    }
}
