// Embedder-facing helpers: tracing setup and session bootstrap.

use std::sync::{Arc, Once};

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::SessionConfig;
use crate::engine::session::ConversionSession;
use crate::engine::worker::EngineFactory;

static INIT_TRACING: Once = Once::new();

/// Initialize tracing once for the embedding application.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        info!("conversion engine tracing initialized");
    });
}

/// Create a session and start warming the engine immediately, mirroring
/// page-mount initialization in a browser embedder.
pub fn start_session(config: SessionConfig, factory: EngineFactory) -> Arc<ConversionSession> {
    let session = ConversionSession::new(config);
    session.initialize(factory);
    session
}
