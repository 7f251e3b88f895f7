//! BrowseSubscription : liste d'un nœud, maintenue à jour et diffée
//!
//! Les enfants chargés par l'hôte sont décorés avec l'indicateur de lecture
//! (calculé depuis `now_playing` et `playback_state`), puis soumis à une
//! [`MediaItemList`]. Chaque diff non vide est publié sous forme
//! d'[`Event<ListUpdate>`].

use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select};
use pmolistdiff::{MediaItemList, MediaItemRecord, RowOp, UpdateKind, validate_snapshot};
use serde::Serialize;
use tracing::{debug, error, trace, warn};

use crate::connection::MusicServiceConnection;
use crate::errors::{BrowserError, Result};
use crate::event::Event;
use crate::model::{MediaMetadata, PlaybackState, playback_indicator_for};
use crate::observable::Observable;
use crate::session::SubscriptionCallback;

/// New content of a subscribed node and the row edits leading to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListUpdate {
    pub parent_id: String,
    pub items: Vec<MediaItemRecord>,
    pub ops: Vec<RowOp<UpdateKind>>,
}

struct SubscriptionState {
    parent_id: String,
    /// Children as delivered by the host, without indicator.
    loaded: Mutex<Option<Vec<MediaItemRecord>>>,
    list: Mutex<MediaItemList>,
    published: Mutex<bool>,
    now_playing: Observable<MediaMetadata>,
    playback_state: Observable<PlaybackState>,
    updates: Observable<Arc<Event<ListUpdate>>>,
    load_failed: Observable<bool>,
}

impl SubscriptionState {
    fn decorate(&self, children: &[MediaItemRecord]) -> Vec<MediaItemRecord> {
        let now_playing = self.now_playing.value();
        let state = self.playback_state.value();
        children
            .iter()
            .map(|child| {
                let indicator =
                    playback_indicator_for(child.id(), now_playing.as_ref(), state.as_ref());
                child.clone().with_indicator(indicator)
            })
            .collect()
    }

    /// Rebuilds the decorated snapshot and publishes the resulting edits.
    fn refresh(&self) {
        // Le verrou de la liste couvre aussi la lecture de l'état de lecture
        let mut list = self.list.lock().unwrap();
        let Some(children) = self.loaded.lock().unwrap().clone() else {
            trace!(parent = %self.parent_id, "Refresh before first load");
            return;
        };
        let snapshot = self.decorate(&children);
        let diff = list.submit(snapshot);
        let mut published = self.published.lock().unwrap();
        if diff.is_empty() && *published {
            return;
        }
        *published = true;

        debug!(
            parent = %self.parent_id,
            items = list.len(),
            ops = diff.ops().len(),
            "Publishing list update"
        );
        self.updates.post_value(Arc::new(Event::new(ListUpdate {
            parent_id: self.parent_id.clone(),
            items: list.current().to_vec(),
            ops: diff.into_ops(),
        })));
    }
}

/// Subscription callback handed to the host.
struct ChildrenSink {
    state: Weak<SubscriptionState>,
}

impl SubscriptionCallback for ChildrenSink {
    fn on_children_loaded(&self, parent_id: &str, children: &[MediaItemRecord]) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        if let Err(e) = validate_snapshot(children) {
            warn!(parent = parent_id, error = %e, "Children rejected");
            return;
        }
        *state.loaded.lock().unwrap() = Some(children.to_vec());
        if state.load_failed.value() == Some(true) {
            state.load_failed.post_value(false);
        }
        state.refresh();
    }

    fn on_error(&self, parent_id: &str) {
        warn!(parent = parent_id, "Children could not be loaded");
        if let Some(state) = self.state.upgrade() {
            state.load_failed.post_value(true);
        }
    }
}

/// Live, diffed view of the children of one node.
///
/// Dropping the subscription stops the watcher thread and unsubscribes the
/// node from the host.
pub struct BrowseSubscription {
    connection: Arc<MusicServiceConnection>,
    state: Arc<SubscriptionState>,
    sink: Arc<dyn SubscriptionCallback>,
    stop_tx: Option<Sender<()>>,
    watcher: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for BrowseSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowseSubscription")
            .field("parent_id", &self.state.parent_id)
            .field("len", &self.len())
            .finish()
    }
}

impl BrowseSubscription {
    /// Subscribes to `parent_id` through `connection` and starts following
    /// the playback state.
    pub fn start(
        connection: Arc<MusicServiceConnection>,
        parent_id: &str,
        detect_moves: bool,
    ) -> Result<Self> {
        let state = Arc::new(SubscriptionState {
            parent_id: parent_id.to_string(),
            loaded: Mutex::new(None),
            list: Mutex::new(MediaItemList::for_media(detect_moves)),
            published: Mutex::new(false),
            now_playing: connection.now_playing().clone(),
            playback_state: connection.playback_state().clone(),
            updates: Observable::new(),
            load_failed: Observable::with_value(false),
        });

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let watcher = PlaybackWatcher {
            state: Arc::downgrade(&state),
            now_playing_rx: state.now_playing.subscribe(),
            playback_rx: state.playback_state.subscribe(),
            stop_rx,
        };
        let handle = thread::Builder::new()
            .name(format!("browse-watcher-{parent_id}"))
            .spawn(move || watcher.run())
            .map_err(|e| BrowserError::Service(format!("cannot spawn watcher: {e}")))?;

        let sink: Arc<dyn SubscriptionCallback> = Arc::new(ChildrenSink {
            state: Arc::downgrade(&state),
        });
        let subscription = Self {
            connection,
            state,
            sink,
            stop_tx: Some(stop_tx),
            watcher: Some(handle),
        };
        subscription
            .connection
            .subscribe(&subscription.state.parent_id, Arc::clone(&subscription.sink))?;
        Ok(subscription)
    }

    pub fn parent_id(&self) -> &str {
        &self.state.parent_id
    }

    /// Updates published for this node; the latest one is replayed first.
    pub fn updates(&self) -> &Observable<Arc<Event<ListUpdate>>> {
        &self.state.updates
    }

    /// `true` while the last load of the node failed.
    pub fn load_failed(&self) -> &Observable<bool> {
        &self.state.load_failed
    }

    /// Current decorated snapshot.
    pub fn items(&self) -> Vec<MediaItemRecord> {
        self.state.list.lock().unwrap().current().to_vec()
    }

    pub fn len(&self) -> usize {
        self.state.list.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recomputes indicators now, without waiting for the watcher.
    pub fn refresh(&self) {
        self.state.refresh();
    }
}

impl Drop for BrowseSubscription {
    fn drop(&mut self) {
        // Fermer le canal réveille le watcher
        self.stop_tx.take();
        if let Some(handle) = self.watcher.take() {
            if handle.join().is_err() {
                error!(parent = %self.state.parent_id, "Browse watcher panicked");
            }
        }
        if let Err(e) = self
            .connection
            .unsubscribe(&self.state.parent_id, &self.sink)
        {
            warn!(parent = %self.state.parent_id, error = %e, "Unsubscribe failed");
        }
    }
}

/// Worker thread recomputing indicators on playback changes.
struct PlaybackWatcher {
    state: Weak<SubscriptionState>,
    now_playing_rx: Receiver<MediaMetadata>,
    playback_rx: Receiver<PlaybackState>,
    stop_rx: Receiver<()>,
}

impl PlaybackWatcher {
    fn run(self) {
        loop {
            select! {
                recv(self.stop_rx) -> _ => break,
                recv(self.now_playing_rx) -> msg => {
                    if msg.is_err() || !self.refresh() {
                        break;
                    }
                }
                recv(self.playback_rx) -> msg => {
                    if msg.is_err() || !self.refresh() {
                        break;
                    }
                }
            }
        }
        trace!("Browse watcher stopped");
    }

    /// Returns `false` once the subscription is gone.
    fn refresh(&self) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                state.refresh();
                true
            }
            None => false,
        }
    }
}
