//! Injector : construction unique des dépendances au démarrage
//!
//! Remplace un singleton paresseux : l'application crée un `Injector` à
//! partir de la configuration et d'un hôte, puis lui demande ses objets.

use std::sync::Arc;

use pmoconfig::Config;
use tracing::info;

use crate::connection::MusicServiceConnection;
use crate::errors::{BrowserError, Result};
use crate::local_host::LocalSessionHost;
use crate::service::{CatalogService, MediaBrowserService, MusicService};
use crate::session::MediaSessionHost;
use crate::subscription::BrowseSubscription;

/// Service name selecting the placeholder [`MusicService`].
pub const MUSIC_SERVICE_NAME: &str = "MusicService";

pub struct Injector {
    config: Arc<Config>,
    connection: Arc<MusicServiceConnection>,
    detect_moves: bool,
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("config_dir", &self.config.config_dir())
            .field("connection", &self.connection)
            .field("detect_moves", &self.detect_moves)
            .finish()
    }
}

impl Injector {
    /// Builds the connection to `host` right away.
    pub fn new(config: Arc<Config>, host: Arc<dyn MediaSessionHost>) -> Result<Self> {
        let detect_moves = config.get_diff_detect_moves()?;
        let connection = MusicServiceConnection::new(host);
        info!(
            detect_moves = detect_moves,
            connected = ?connection.is_connected().value(),
            "Injector ready"
        );
        Ok(Self {
            config,
            connection,
            detect_moves,
        })
    }

    /// Builds the service named by `browser.service_name`, served by a
    /// [`LocalSessionHost`] for `client_package`.
    pub fn with_local_host(
        config: Arc<Config>,
        client_package: &str,
        client_uid: u32,
    ) -> Result<(Self, LocalSessionHost)> {
        let service = service_from_config(&config)?;
        let host = LocalSessionHost::new(service, client_package, client_uid);
        let injector = Self::new(config, Arc::new(host.clone()))?;
        Ok((injector, host))
    }

    /// Always the same connection for the lifetime of the injector.
    pub fn provide_music_service_connection(&self) -> Arc<MusicServiceConnection> {
        Arc::clone(&self.connection)
    }

    /// Browse subscription on `parent_id`, or on the root when `None`.
    pub fn provide_browse_subscription(
        &self,
        parent_id: Option<&str>,
    ) -> Result<BrowseSubscription> {
        let parent_id = match parent_id {
            Some(id) => id.to_string(),
            None => self
                .connection
                .root_media_id()
                .ok_or(BrowserError::NotConnected)?,
        };
        BrowseSubscription::start(
            self.provide_music_service_connection(),
            &parent_id,
            self.detect_moves,
        )
    }
}

/// Service described by the `browser` section of the configuration.
pub fn service_from_config(config: &Config) -> Result<Arc<dyn MediaBrowserService>> {
    let name = config.get_browser_service_name()?;
    if name == MUSIC_SERVICE_NAME {
        return Ok(Arc::new(MusicService::new(name)));
    }
    let root_id = config.get_browser_root_id()?;
    if root_id.is_empty() {
        return Err(BrowserError::service("browser.root_id must not be empty"));
    }
    Ok(Arc::new(CatalogService::new(name, root_id)))
}
