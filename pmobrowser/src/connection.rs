//! MusicServiceConnection : connexion client vers un service de navigation
//!
//! La connexion traduit les callbacks de l'hôte en valeurs observables
//! (`is_connected`, `network_failure`, `playback_state`, `now_playing`) et
//! relaie navigation et commandes tant que l'hôte est connecté.

use std::sync::{Arc, RwLock, Weak};

use tracing::{debug, info, warn};

use crate::errors::{BrowserError, Result};
use crate::model::{Bundle, EMPTY_PLAYBACK_STATE, MediaMetadata, NOTHING_PLAYING, PlaybackState};
use crate::observable::Observable;
use crate::service::NETWORK_FAILURE;
use crate::session::{
    ConnectionCallback, ControllerCallback, MediaSessionHost, SubscriptionCallback,
    TransportControls,
};

pub struct MusicServiceConnection {
    host: Arc<dyn MediaSessionHost>,
    is_connected: Observable<bool>,
    network_failure: Observable<bool>,
    playback_state: Observable<PlaybackState>,
    now_playing: Observable<MediaMetadata>,
    root_media_id: RwLock<Option<String>>,
}

impl std::fmt::Debug for MusicServiceConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicServiceConnection")
            .field("is_connected", &self.is_connected.value())
            .field("network_failure", &self.network_failure.value())
            .field("root_media_id", &self.root_media_id())
            .finish()
    }
}

impl MusicServiceConnection {
    /// Creates the connection and immediately asks `host` to connect.
    pub fn new(host: Arc<dyn MediaSessionHost>) -> Arc<Self> {
        let connection = Arc::new(Self {
            host,
            is_connected: Observable::with_value(false),
            network_failure: Observable::with_value(false),
            playback_state: Observable::new(),
            now_playing: Observable::new(),
            root_media_id: RwLock::new(None),
        });

        let bridge = Arc::new(SessionBridge {
            connection: Arc::downgrade(&connection),
        });
        connection.host.connect(bridge);
        // L'hôte peut connecter de façon synchrone : la racine est déjà là
        connection.refresh_root();
        connection
    }

    pub fn is_connected(&self) -> &Observable<bool> {
        &self.is_connected
    }

    pub fn network_failure(&self) -> &Observable<bool> {
        &self.network_failure
    }

    pub fn playback_state(&self) -> &Observable<PlaybackState> {
        &self.playback_state
    }

    pub fn now_playing(&self) -> &Observable<MediaMetadata> {
        &self.now_playing
    }

    /// Root media id granted by the service, `None` before connection.
    pub fn root_media_id(&self) -> Option<String> {
        self.root_media_id
            .read()
            .ok()
            .and_then(|root| root.clone())
    }

    pub fn subscribe(
        &self,
        parent_id: &str,
        callback: Arc<dyn SubscriptionCallback>,
    ) -> Result<()> {
        self.host.subscribe(parent_id, callback)
    }

    pub fn unsubscribe(
        &self,
        parent_id: &str,
        callback: &Arc<dyn SubscriptionCallback>,
    ) -> Result<()> {
        self.host.unsubscribe(parent_id, callback)
    }

    /// Sends `command` and ignores its result. Returns `false` when the host
    /// is not connected.
    pub fn send_command(&self, command: &str, params: Option<&Bundle>) -> bool {
        self.send_command_with(command, params, |_, _| {})
    }

    /// Sends `command`; `on_result` is called with the result code and data.
    /// Returns `false`, without calling `on_result`, when the host is not
    /// connected.
    pub fn send_command_with<F>(&self, command: &str, params: Option<&Bundle>, on_result: F) -> bool
    where
        F: FnOnce(i32, Option<Bundle>) + Send + 'static,
    {
        if !self.host.is_connected() {
            debug!(command = command, "Command dropped: not connected");
            return false;
        }
        match self.host.send_command(command, params, Box::new(on_result)) {
            Ok(()) => true,
            Err(e) => {
                warn!(command = command, error = %e, "Command failed");
                false
            }
        }
    }

    /// Transport controls of the session, once connected.
    pub fn transport_controls(&self) -> Option<Arc<dyn TransportControls>> {
        self.host.transport_controls()
    }

    /// Same as [`transport_controls`](Self::transport_controls), as an error
    /// when not connected.
    pub fn require_transport_controls(&self) -> Result<Arc<dyn TransportControls>> {
        self.transport_controls().ok_or(BrowserError::NotConnected)
    }

    fn refresh_root(&self) {
        let root = self.host.root().map(|r| r.root_id);
        if let Ok(mut current) = self.root_media_id.write() {
            *current = root;
        }
    }

    fn handle_connected(&self, bridge: Arc<SessionBridge>) {
        self.refresh_root();
        self.host.register_controller_callback(bridge);
        info!(root = ?self.root_media_id(), "Media browser connected");
        self.is_connected.post_value(true);
    }

    fn handle_connection_lost(&self, reason: &str) {
        info!(reason = reason, "Media browser disconnected");
        self.is_connected.post_value(false);
    }

    fn handle_playback_state(&self, state: Option<PlaybackState>) {
        self.playback_state
            .post_value(state.unwrap_or(EMPTY_PLAYBACK_STATE));
    }

    fn handle_metadata(&self, metadata: Option<MediaMetadata>) {
        // Un lecteur arrêté envoie des métadonnées par défaut, sans media id
        let Some(metadata) = metadata else {
            return;
        };
        if metadata.media_id.is_none() {
            self.now_playing.post_value(NOTHING_PLAYING);
        } else {
            self.now_playing.post_value(metadata);
        }
    }

    fn handle_session_event(&self, event: &str) {
        if event == NETWORK_FAILURE {
            warn!("Network failure reported by the media session");
            self.network_failure.post_value(true);
        } else {
            debug!(event = event, "Session event ignored");
        }
    }
}

/// Callbacks handed to the host. Holds a weak reference so that the host
/// never keeps the connection alive.
struct SessionBridge {
    connection: Weak<MusicServiceConnection>,
}

impl SessionBridge {
    fn with_connection(&self, f: impl FnOnce(&MusicServiceConnection)) {
        if let Some(connection) = self.connection.upgrade() {
            f(&connection);
        }
    }
}

impl ConnectionCallback for SessionBridge {
    fn on_connected(&self) {
        let bridge = Arc::new(SessionBridge {
            connection: self.connection.clone(),
        });
        self.with_connection(|c| c.handle_connected(bridge));
    }

    fn on_connection_suspended(&self) {
        self.with_connection(|c| c.handle_connection_lost("suspended"));
    }

    fn on_connection_failed(&self) {
        self.with_connection(|c| c.handle_connection_lost("failed"));
    }
}

impl ControllerCallback for SessionBridge {
    fn on_playback_state_changed(&self, state: Option<PlaybackState>) {
        self.with_connection(|c| c.handle_playback_state(state));
    }

    fn on_metadata_changed(&self, metadata: Option<MediaMetadata>) {
        self.with_connection(|c| c.handle_metadata(metadata));
    }

    fn on_session_event(&self, event: &str, _extras: &Bundle) {
        self.with_connection(|c| c.handle_session_event(event));
    }

    fn on_session_destroyed(&self) {
        self.on_connection_suspended();
    }
}
