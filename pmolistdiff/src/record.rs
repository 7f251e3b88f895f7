//! MediaItemRecord : une entrée d'une liste média navigable

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, Result};

/// Play-state glyph shown next to a row.
///
/// This is the only facet of a [`MediaItemRecord`] allowed to change between
/// two snapshots for the same `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackIndicator {
    #[default]
    NotPlaying,
    Playing,
    Paused,
}

impl PlaybackIndicator {
    /// Returns a human-readable label for the indicator.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackIndicator::NotPlaying => "NOT_PLAYING",
            PlaybackIndicator::Playing => "PLAYING",
            PlaybackIndicator::Paused => "PAUSED",
        }
    }
}

/// One entry of a browsable media list.
///
/// Records are produced fresh by the catalog source for every snapshot and are
/// never mutated by the diff engine. For a given `id`, `title`, `subtitle`,
/// `artwork_uri` and `browsable` are constant; only `playback_indicator` may
/// differ from one snapshot to the next.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItemRecord {
    /// Stable identifier, unique within a snapshot.
    ///
    /// `None` only for degenerate input; two records without id are
    /// considered the same item.
    pub id: Option<String>,
    pub title: String,
    pub subtitle: String,
    /// Cover art locator (usually an URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_uri: Option<String>,
    #[serde(default)]
    pub browsable: bool,
    #[serde(default)]
    pub playback_indicator: PlaybackIndicator,
}

impl MediaItemRecord {
    /// Creates a playable, non-browsable record with no artwork.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            title: title.into(),
            subtitle: subtitle.into(),
            artwork_uri: None,
            browsable: false,
            playback_indicator: PlaybackIndicator::NotPlaying,
        }
    }

    pub fn with_artwork(mut self, uri: impl Into<String>) -> Self {
        self.artwork_uri = Some(uri.into());
        self
    }

    pub fn browsable(mut self, browsable: bool) -> Self {
        self.browsable = browsable;
        self
    }

    pub fn with_indicator(mut self, indicator: PlaybackIndicator) -> Self {
        self.playback_indicator = indicator;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// True if every field that is supposed to be constant for an id is
    /// equal between `self` and `other`.
    pub(crate) fn same_invariant_fields(&self, other: &MediaItemRecord) -> bool {
        self.title == other.title
            && self.subtitle == other.subtitle
            && self.artwork_uri == other.artwork_uri
            && self.browsable == other.browsable
    }
}

/// Checks that every id appears at most once in `snapshot`.
///
/// Duplicate ids break the list-diff precondition; they are reported, not
/// repaired.
pub fn validate_snapshot(snapshot: &[MediaItemRecord]) -> Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(snapshot.len());
    let mut missing: Option<usize> = None;

    for (position, record) in snapshot.iter().enumerate() {
        match record.id() {
            Some(id) => {
                if let Some(first) = seen.insert(id, position) {
                    return Err(DiffError::DuplicateId {
                        id: id.to_string(),
                        first,
                        second: position,
                    });
                }
            }
            None => {
                if let Some(first) = missing {
                    return Err(DiffError::DuplicateMissingId {
                        first,
                        second: position,
                    });
                }
                missing = Some(position);
            }
        }
    }
    Ok(())
}
