use serde::{Deserialize, Serialize};

use crate::record::MediaItemRecord;

/// Item comparison contract used by [`calculate_diff`](crate::calculate_diff).
///
/// Implementations must be consistent: `same_content(a, b)` implies
/// `same_identity(a, b)`. The diff algorithm only calls `change_payload` for
/// pairs where the identity holds and the content does not.
pub trait ItemCallback<T> {
    /// Payload describing a partial update of a row.
    type Payload: Clone + PartialEq;

    /// Whether `a` and `b` represent the same logical row.
    fn same_identity(&self, a: &T, b: &T) -> bool;

    /// Whether the row can be kept as is, with no visual refresh.
    fn same_content(&self, a: &T, b: &T) -> bool;

    /// Minimal update needed to turn `old` into `new`, `None` meaning a full
    /// rebind of the row.
    fn change_payload(&self, _old: &T, _new: &T) -> Option<Self::Payload> {
        None
    }
}

/// Kind of partial update a row needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateKind {
    /// Only the play-state glyph must be redrawn.
    PlaybackIndicatorChanged,
}

pub const PLAYBACK_INDICATOR_CHANGED: UpdateKind = UpdateKind::PlaybackIndicatorChanged;

/// [`ItemCallback`] for [`MediaItemRecord`].
///
/// Since every record carries a unique id, two records are the same row when
/// their ids match. The content is the same when, in addition, the playback
/// indicator did not move. Title, subtitle, artwork and browsable flag are
/// constant for an id, so the payload only has to tell whether the indicator
/// changed; anything else falls back to a full refresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaItemCallback;

impl ItemCallback<MediaItemRecord> for MediaItemCallback {
    type Payload = UpdateKind;

    fn same_identity(&self, a: &MediaItemRecord, b: &MediaItemRecord) -> bool {
        // Deux ids absents sont considérés égaux
        a.id == b.id
    }

    fn same_content(&self, a: &MediaItemRecord, b: &MediaItemRecord) -> bool {
        self.same_identity(a, b) && a.playback_indicator == b.playback_indicator
    }

    fn change_payload(
        &self,
        old: &MediaItemRecord,
        new: &MediaItemRecord,
    ) -> Option<UpdateKind> {
        if old.playback_indicator != new.playback_indicator && old.same_invariant_fields(new) {
            Some(PLAYBACK_INDICATOR_CHANGED)
        } else {
            None
        }
    }
}
