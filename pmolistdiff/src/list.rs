//! SnapshotList : liste courante + diff à chaque nouvelle snapshot

use tracing::debug;

use crate::callback::{ItemCallback, MediaItemCallback};
use crate::diff::{DiffResult, calculate_diff};
use crate::record::MediaItemRecord;

/// Holds the snapshot currently displayed and diffs every new one against it.
///
/// This plays the role of a list adapter: the producer submits complete
/// snapshots, the returned [`DiffResult`] is what the view has to apply.
#[derive(Debug, Clone)]
pub struct SnapshotList<T, C> {
    items: Vec<T>,
    callback: C,
    detect_moves: bool,
}

/// Snapshot list of media records, using [`MediaItemCallback`].
pub type MediaItemList = SnapshotList<MediaItemRecord, MediaItemCallback>;

impl<T, C: ItemCallback<T>> SnapshotList<T, C> {
    pub fn new(callback: C, detect_moves: bool) -> Self {
        Self {
            items: Vec::new(),
            callback,
            detect_moves,
        }
    }

    /// Replaces the current snapshot by `snapshot` and returns the edits.
    pub fn submit(&mut self, snapshot: Vec<T>) -> DiffResult<C::Payload> {
        let result = calculate_diff(&self.items, &snapshot, &self.callback, self.detect_moves);
        debug!(
            previous = self.items.len(),
            current = snapshot.len(),
            ops = result.ops().len(),
            "Snapshot submitted"
        );
        self.items = snapshot;
        result
    }

    pub fn current(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl MediaItemList {
    pub fn for_media(detect_moves: bool) -> Self {
        Self::new(MediaItemCallback, detect_moves)
    }
}

impl Default for MediaItemList {
    fn default() -> Self {
        Self::for_media(true)
    }
}
