//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the shared dataset, the listener fan-out and the notifier
//! - Register routes and assemble the dispatcher
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - One long-lived instance of each piece, passed explicitly
//! - Binding the socket is left to the caller so tests can use port 0

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::broadcast::{Fanout, SnapshotNotifier};
use crate::config::validation::validate_config;
use crate::config::{AppConfig, ConfigError};
use crate::forum::{self, Database};
use crate::http::HttpServer;
use crate::routing::{Dispatcher, MutationNotifier, RouteError, RouteTable};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route setup failed: {0}")]
    Routes(#[from] RouteError),
}

/// A fully wired application, ready to be served.
pub struct Application {
    pub config: AppConfig,
    pub state: Arc<Mutex<Database>>,
    pub fanout: Arc<Fanout>,
    pub dispatcher: Arc<Dispatcher<Database>>,
}

impl Application {
    /// HTTP server sharing this application's dispatcher and fan-out.
    pub fn server(&self) -> HttpServer {
        HttpServer::new(&self.config, self.dispatcher.clone(), self.fanout.clone())
    }
}

/// Build the application around the reference dataset.
pub fn bootstrap(config: AppConfig) -> Result<Application, StartupError> {
    bootstrap_with(config, Database::seed())
}

/// Build the application around `database`.
pub fn bootstrap_with(config: AppConfig, database: Database) -> Result<Application, StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let state = Arc::new(Mutex::new(database));
    let fanout = Arc::new(Fanout::new());
    let notifier: Arc<dyn MutationNotifier> =
        Arc::new(SnapshotNotifier::new(state.clone(), fanout.clone()));

    let mut routes = RouteTable::new();
    forum::register_routes(&mut routes, &config.forum)?;
    tracing::info!(routes = routes.len(), "Routes registered");

    let dispatcher = Arc::new(Dispatcher::new(routes, state.clone(), notifier));

    Ok(Application {
        config,
        state,
        fanout,
        dispatcher,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_registers_forum_routes() {
        let app = bootstrap(AppConfig::default()).unwrap();
        assert_eq!(app.dispatcher.routes().len(), 12);
        assert!(app.fanout.is_empty());
        assert_eq!(app.state.lock().unwrap().topics.len(), 2);
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.timeouts.request_secs = 0;
        assert!(matches!(
            bootstrap(config),
            Err(StartupError::Config(ConfigError::Validation(_)))
        ));
    }
}
