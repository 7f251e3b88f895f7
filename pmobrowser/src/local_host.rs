//! Hôte de session en mémoire
//!
//! Sert un [`MediaBrowserService`] dans le même processus et simule le côté
//! session (état de lecture, métadonnées, file d'attente, événements).
//! Les callbacks sont toujours appelés hors verrou : ils peuvent rappeler
//! l'hôte sans risque de deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::errors::{BrowserError, Result};
use crate::model::{Bundle, BrowserRoot, MediaMetadata, PlaybackState, PlaybackStatus, QueueItem};
use crate::service::MediaBrowserService;
use crate::session::{
    ConnectionCallback, ControllerCallback, MediaSessionHost, ResultCallback,
    SubscriptionCallback, TransportControls,
};

/// Result code passed to command callbacks on success.
pub const RESULT_OK: i32 = 0;

#[derive(Default)]
struct HostState {
    connected: bool,
    root: Option<BrowserRoot>,
    controllers: Vec<Arc<dyn ControllerCallback>>,
    subscriptions: HashMap<String, Vec<Arc<dyn SubscriptionCallback>>>,
    playback_state: Option<PlaybackState>,
    metadata: Option<MediaMetadata>,
    queue: Vec<QueueItem>,
}

struct HostInner {
    service: Arc<dyn MediaBrowserService>,
    client_package: String,
    client_uid: u32,
    state: Mutex<HostState>,
}

/// [`MediaSessionHost`] serving a browse service in process.
#[derive(Clone)]
pub struct LocalSessionHost {
    inner: Arc<HostInner>,
}

impl std::fmt::Debug for LocalSessionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSessionHost")
            .field("service", &self.inner.service.name())
            .field("client_package", &self.inner.client_package)
            .field("connected", &self.inner.lock().connected)
            .finish()
    }
}

impl HostInner {
    fn lock(&self) -> MutexGuard<'_, HostState> {
        // Un callback qui panique ne doit pas rendre l'hôte inutilisable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn controllers(&self) -> Vec<Arc<dyn ControllerCallback>> {
        self.lock().controllers.clone()
    }

    fn set_playback_state(&self, state: Option<PlaybackState>) {
        self.lock().playback_state = state.clone();
        for controller in self.controllers() {
            controller.on_playback_state_changed(state.clone());
        }
    }

    fn set_metadata(&self, metadata: Option<MediaMetadata>) {
        self.lock().metadata = metadata.clone();
        for controller in self.controllers() {
            controller.on_metadata_changed(metadata.clone());
        }
    }

    fn require_connected(&self) -> Result<()> {
        if self.lock().connected {
            Ok(())
        } else {
            Err(BrowserError::NotConnected)
        }
    }

    /// Builds a new state from the current one, keeping the position unless
    /// `position_ms` is given.
    fn transition(&self, status: PlaybackStatus, position_ms: Option<u64>) {
        let current = self.lock().playback_state.clone();
        let position_ms = position_ms
            .or_else(|| current.as_ref().map(|s| s.position_ms))
            .unwrap_or(0);
        let speed = match status {
            PlaybackStatus::Playing => 1.0,
            _ => 0.0,
        };
        self.set_playback_state(Some(PlaybackState::new(status, position_ms, speed)));
    }

    fn play_queue_item(&self, item: &QueueItem) {
        debug!(media_id = %item.media_id, queue_id = item.queue_id, "Playing queue item");
        self.set_metadata(Some(
            MediaMetadata::for_media(item.media_id.clone()).with_title(item.title.clone()),
        ));
        self.transition(PlaybackStatus::Playing, Some(0));
    }

    /// Queue entry `offset` positions away from the one currently playing.
    fn queue_neighbour(&self, offset: isize) -> Option<QueueItem> {
        let state = self.lock();
        let current = state.metadata.as_ref()?.media_id.as_deref()?;
        let index = state.queue.iter().position(|q| q.media_id == current)?;
        let target = index.checked_add_signed(offset)?;
        state.queue.get(target).cloned()
    }
}

impl LocalSessionHost {
    pub fn new(
        service: Arc<dyn MediaBrowserService>,
        client_package: impl Into<String>,
        client_uid: u32,
    ) -> Self {
        Self {
            inner: Arc::new(HostInner {
                service,
                client_package: client_package.into(),
                client_uid,
                state: Mutex::new(HostState::default()),
            }),
        }
    }

    pub fn service(&self) -> &Arc<dyn MediaBrowserService> {
        &self.inner.service
    }

    /// Reloads the children of `parent_id` and redelivers them to every
    /// subscriber of that node.
    pub fn notify_children_changed(&self, parent_id: &str) -> Result<()> {
        self.inner.require_connected()?;
        let callbacks = self
            .inner
            .lock()
            .subscriptions
            .get(parent_id)
            .cloned()
            .unwrap_or_default();
        if callbacks.is_empty() {
            debug!(parent = parent_id, "Children changed, no subscriber");
            return Ok(());
        }
        self.deliver(parent_id, &callbacks);
        Ok(())
    }

    pub fn set_playback_state(&self, state: Option<PlaybackState>) {
        self.inner.set_playback_state(state);
    }

    pub fn set_metadata(&self, metadata: Option<MediaMetadata>) {
        self.inner.set_metadata(metadata);
    }

    pub fn set_queue(&self, queue: Vec<QueueItem>) {
        self.inner.lock().queue = queue.clone();
        for controller in self.inner.controllers() {
            controller.on_queue_changed(&queue);
        }
    }

    pub fn emit_session_event(&self, event: &str, extras: &Bundle) {
        info!(event = event, "Session event");
        for controller in self.inner.controllers() {
            controller.on_session_event(event, extras);
        }
    }

    /// Tears the session down: controllers are told, then forgotten.
    pub fn destroy_session(&self) {
        let controllers = {
            let mut state = self.inner.lock();
            state.connected = false;
            std::mem::take(&mut state.controllers)
        };
        warn!(
            service = %self.inner.service.name(),
            controllers = controllers.len(),
            "Media session destroyed"
        );
        for controller in controllers {
            controller.on_session_destroyed();
        }
    }

    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.inner.lock().playback_state.clone()
    }

    pub fn metadata(&self) -> Option<MediaMetadata> {
        self.inner.lock().metadata.clone()
    }

    fn deliver(&self, parent_id: &str, callbacks: &[Arc<dyn SubscriptionCallback>]) {
        match self.inner.service.load_children(parent_id) {
            Ok(children) => {
                debug!(
                    parent = parent_id,
                    children = children.len(),
                    subscribers = callbacks.len(),
                    "Delivering children"
                );
                for callback in callbacks {
                    callback.on_children_loaded(parent_id, &children);
                }
            }
            Err(e) => {
                warn!(parent = parent_id, error = %e, "Failed to load children");
                for callback in callbacks {
                    callback.on_error(parent_id);
                }
            }
        }
    }
}

impl MediaSessionHost for LocalSessionHost {
    fn connect(&self, callback: Arc<dyn ConnectionCallback>) {
        let root = self
            .inner
            .service
            .get_root(&self.inner.client_package, self.inner.client_uid, None);

        match root {
            Some(root) => {
                info!(
                    service = %self.inner.service.name(),
                    root = %root.root_id,
                    "Connected to media browser service"
                );
                {
                    let mut state = self.inner.lock();
                    state.connected = true;
                    state.root = Some(root);
                }
                callback.on_connected();
            }
            None => {
                warn!(
                    service = %self.inner.service.name(),
                    client = %self.inner.client_package,
                    "Connection rejected: no browsable root"
                );
                {
                    let mut state = self.inner.lock();
                    state.connected = false;
                    state.root = None;
                }
                callback.on_connection_failed();
            }
        }
    }

    fn disconnect(&self) {
        let mut state = self.inner.lock();
        state.connected = false;
        state.root = None;
        state.controllers.clear();
        state.subscriptions.clear();
        info!(service = %self.inner.service.name(), "Disconnected");
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    fn root(&self) -> Option<BrowserRoot> {
        self.inner.lock().root.clone()
    }

    fn register_controller_callback(&self, callback: Arc<dyn ControllerCallback>) {
        let (state, metadata) = {
            let mut host = self.inner.lock();
            host.controllers.push(Arc::clone(&callback));
            (host.playback_state.clone(), host.metadata.clone())
        };
        // Le nouveau contrôleur reçoit l'état courant s'il existe
        if state.is_some() {
            callback.on_playback_state_changed(state);
        }
        if metadata.is_some() {
            callback.on_metadata_changed(metadata);
        }
    }

    fn subscribe(&self, parent_id: &str, callback: Arc<dyn SubscriptionCallback>) -> Result<()> {
        self.inner.require_connected()?;
        self.inner
            .lock()
            .subscriptions
            .entry(parent_id.to_string())
            .or_default()
            .push(Arc::clone(&callback));
        debug!(parent = parent_id, "Subscribed");
        self.deliver(parent_id, &[callback]);
        Ok(())
    }

    fn unsubscribe(
        &self,
        parent_id: &str,
        callback: &Arc<dyn SubscriptionCallback>,
    ) -> Result<()> {
        let mut state = self.inner.lock();
        let Some(callbacks) = state.subscriptions.get_mut(parent_id) else {
            debug!(parent = parent_id, "Unsubscribe of a node without subscriber");
            return Ok(());
        };
        callbacks.retain(|c| !std::ptr::addr_eq(Arc::as_ptr(c), Arc::as_ptr(callback)));
        let remaining = callbacks.len();
        if remaining == 0 {
            state.subscriptions.remove(parent_id);
        }
        debug!(parent = parent_id, remaining = remaining, "Unsubscribed");
        Ok(())
    }

    fn send_command(
        &self,
        command: &str,
        params: Option<&Bundle>,
        on_result: ResultCallback,
    ) -> Result<()> {
        self.inner.require_connected()?;
        debug!(
            command = command,
            params = params.map(|p| p.len()).unwrap_or(0),
            "Command received"
        );
        on_result(RESULT_OK, None);
        Ok(())
    }

    fn transport_controls(&self) -> Option<Arc<dyn TransportControls>> {
        if self.is_connected() {
            Some(Arc::new(LocalTransportControls {
                inner: Arc::clone(&self.inner),
            }))
        } else {
            None
        }
    }
}

/// Transport controls acting on the local session state.
struct LocalTransportControls {
    inner: Arc<HostInner>,
}

impl TransportControls for LocalTransportControls {
    fn play(&self) -> Result<()> {
        self.inner.require_connected()?;
        if self.inner.lock().metadata.is_none() {
            return Err(BrowserError::service("nothing to play"));
        }
        self.inner.transition(PlaybackStatus::Playing, None);
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.inner.require_connected()?;
        self.inner.transition(PlaybackStatus::Paused, None);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.inner.require_connected()?;
        self.inner.transition(PlaybackStatus::Stopped, Some(0));
        self.inner.set_metadata(Some(MediaMetadata::default()));
        Ok(())
    }

    fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.inner.require_connected()?;
        let status = self
            .inner
            .lock()
            .playback_state
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(PlaybackStatus::Paused);
        self.inner.transition(status, Some(position_ms));
        Ok(())
    }

    fn skip_to_next(&self) -> Result<()> {
        self.inner.require_connected()?;
        let next = self
            .inner
            .queue_neighbour(1)
            .ok_or_else(|| BrowserError::service("no next item in queue"))?;
        self.inner.play_queue_item(&next);
        Ok(())
    }

    fn skip_to_previous(&self) -> Result<()> {
        self.inner.require_connected()?;
        let previous = self
            .inner
            .queue_neighbour(-1)
            .ok_or_else(|| BrowserError::service("no previous item in queue"))?;
        self.inner.play_queue_item(&previous);
        Ok(())
    }

    fn play_from_media_id(&self, media_id: &str, _extras: Option<&Bundle>) -> Result<()> {
        self.inner.require_connected()?;
        if media_id.is_empty() {
            return Err(BrowserError::service("empty media id"));
        }
        let queued = self
            .inner
            .lock()
            .queue
            .iter()
            .find(|q| q.media_id == media_id)
            .cloned();
        match queued {
            Some(item) => self.inner.play_queue_item(&item),
            None => {
                self.inner
                    .set_metadata(Some(MediaMetadata::for_media(media_id)));
                self.inner.transition(PlaybackStatus::Playing, Some(0));
            }
        }
        Ok(())
    }
}
