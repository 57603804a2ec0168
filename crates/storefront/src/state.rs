//! Application state shared across handlers.

use std::sync::Arc;

use mongodb::Database;

use crate::config::ShopConfig;
use crate::media::MediaClient;
use crate::payments::GatewayClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database handle and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShopConfig,
    db: Database,
    gateway: GatewayClient,
    media: MediaClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ShopConfig, db: Database) -> Self {
        let gateway = GatewayClient::new(config.gateway.clone());
        let media = MediaClient::new(config.media.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                gateway,
                media,
            }),
        }
    }

    /// Get a reference to the shop configuration.
    #[must_use]
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    /// Get a reference to the database handle.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn gateway(&self) -> &GatewayClient {
        &self.inner.gateway
    }

    /// Get a reference to the media store client.
    #[must_use]
    pub fn media(&self) -> &MediaClient {
        &self.inner.media
    }
}
