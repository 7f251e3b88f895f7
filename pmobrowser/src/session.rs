//! Frontière avec le framework de session média
//!
//! Ces traits décrivent ce que la connexion attend de l'hôte (connexion,
//! navigation, commandes, contrôles de transport) et ce que l'hôte rappelle
//! en retour. [`LocalSessionHost`](crate::LocalSessionHost) en est une
//! implémentation en mémoire.

use std::sync::Arc;

use pmolistdiff::MediaItemRecord;

use crate::errors::Result;
use crate::model::{Bundle, BrowserRoot, MediaMetadata, PlaybackState, QueueItem};

/// Outcome of a connection attempt, reported by the host.
pub trait ConnectionCallback: Send + Sync {
    fn on_connected(&self);
    fn on_connection_suspended(&self);
    fn on_connection_failed(&self);
}

/// Changes of the media session, reported once a controller is registered.
pub trait ControllerCallback: Send + Sync {
    fn on_playback_state_changed(&self, state: Option<PlaybackState>);

    fn on_metadata_changed(&self, metadata: Option<MediaMetadata>);

    fn on_queue_changed(&self, _queue: &[QueueItem]) {}

    fn on_session_event(&self, event: &str, extras: &Bundle);

    fn on_session_destroyed(&self);
}

/// Receives the children of a subscribed node, each time they are (re)loaded.
pub trait SubscriptionCallback: Send + Sync {
    fn on_children_loaded(&self, parent_id: &str, children: &[MediaItemRecord]);

    fn on_error(&self, _parent_id: &str) {}
}

/// Called with the result code and optional data of a custom command.
pub type ResultCallback = Box<dyn FnOnce(i32, Option<Bundle>) + Send>;

/// Abstraction des commandes de transport exposées par la session.
pub trait TransportControls: Send + Sync {
    /// Démarre ou reprend la lecture.
    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    /// Seek à une position absolue, en millisecondes.
    fn seek_to(&self, position_ms: u64) -> Result<()>;

    fn skip_to_next(&self) -> Result<()>;

    fn skip_to_previous(&self) -> Result<()>;

    /// Charge `media_id` et commence la lecture.
    fn play_from_media_id(&self, media_id: &str, extras: Option<&Bundle>) -> Result<()>;
}

/// Client side of a media browse service plus its session.
pub trait MediaSessionHost: Send + Sync {
    /// Starts connecting; the outcome is reported to `callback`.
    fn connect(&self, callback: Arc<dyn ConnectionCallback>);

    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    /// Root granted by the service, `None` until connected.
    fn root(&self) -> Option<BrowserRoot>;

    fn register_controller_callback(&self, callback: Arc<dyn ControllerCallback>);

    fn subscribe(&self, parent_id: &str, callback: Arc<dyn SubscriptionCallback>) -> Result<()>;

    /// Removes `callback` from the subscribers of `parent_id`; the other
    /// subscribers of the node keep receiving its children.
    fn unsubscribe(
        &self,
        parent_id: &str,
        callback: &Arc<dyn SubscriptionCallback>,
    ) -> Result<()>;

    /// Sends a custom command. `on_result` is invoked at most once.
    fn send_command(
        &self,
        command: &str,
        params: Option<&Bundle>,
        on_result: ResultCallback,
    ) -> Result<()>;

    fn transport_controls(&self) -> Option<Arc<dyn TransportControls>>;
}
