use pmolistdiff::PlaybackIndicator;
use serde::{Deserialize, Serialize};

/// Key/value bag passed along commands and session events.
pub type Bundle = serde_json::Map<String, serde_json::Value>;

/// Transport state reported by the media session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackStatus {
    None,
    Stopped,
    Paused,
    Playing,
    Buffering,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub position_ms: u64,
    /// Playback speed, 1.0 for normal playback.
    pub speed: f32,
}

/// Published when the session reports no playback state at all.
pub const EMPTY_PLAYBACK_STATE: PlaybackState = PlaybackState {
    status: PlaybackStatus::Error,
    position_ms: 0,
    speed: 0.0,
};

impl PlaybackState {
    pub fn new(status: PlaybackStatus, position_ms: u64, speed: f32) -> Self {
        Self {
            status,
            position_ms,
            speed,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(
            self.status,
            PlaybackStatus::Playing | PlaybackStatus::Buffering
        )
    }

    pub fn is_prepared(&self) -> bool {
        matches!(
            self.status,
            PlaybackStatus::Playing | PlaybackStatus::Buffering | PlaybackStatus::Paused
        )
    }
}

/// Metadata of the item currently loaded in the session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// `None` when the player stopped and only sent default values.
    pub media_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_art_uri: Option<String>,
    pub duration_ms: u64,
}

/// Published instead of metadata that carries no media id.
pub const NOTHING_PLAYING: MediaMetadata = MediaMetadata {
    media_id: Some(String::new()),
    title: None,
    artist: None,
    album: None,
    album_art_uri: None,
    duration_ms: 0,
};

impl MediaMetadata {
    pub fn for_media(media_id: impl Into<String>) -> Self {
        Self {
            media_id: Some(media_id.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// True for [`NOTHING_PLAYING`] or any metadata with an empty id.
    pub fn is_nothing_playing(&self) -> bool {
        self.media_id.as_deref().is_none_or(str::is_empty)
    }
}

/// Root returned by a browse service to an accepted client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrowserRoot {
    pub root_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Bundle>,
}

impl BrowserRoot {
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            extras: None,
        }
    }
}

/// Entry of the session play queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub queue_id: u64,
    pub media_id: String,
    pub title: String,
}

/// Glyph to show next to `media_id`, given what the session is playing.
///
/// Only the active item gets a glyph: `Playing` while the transport runs,
/// `Paused` otherwise.
pub fn playback_indicator_for(
    media_id: Option<&str>,
    now_playing: Option<&MediaMetadata>,
    state: Option<&PlaybackState>,
) -> PlaybackIndicator {
    let active = match (media_id, now_playing.and_then(|m| m.media_id.as_deref())) {
        (Some(id), Some(current)) => !current.is_empty() && id == current,
        _ => false,
    };
    if !active {
        return PlaybackIndicator::NotPlaying;
    }
    if state.is_some_and(PlaybackState::is_playing) {
        PlaybackIndicator::Playing
    } else {
        PlaybackIndicator::Paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_playback_state() {
        assert_eq!(EMPTY_PLAYBACK_STATE.status, PlaybackStatus::Error);
        assert_eq!(EMPTY_PLAYBACK_STATE.position_ms, 0);
        assert_eq!(EMPTY_PLAYBACK_STATE.speed, 0.0);
        assert!(!EMPTY_PLAYBACK_STATE.is_playing());
        assert!(!EMPTY_PLAYBACK_STATE.is_prepared());
    }

    #[test]
    fn test_nothing_playing() {
        assert_eq!(NOTHING_PLAYING.media_id.as_deref(), Some(""));
        assert_eq!(NOTHING_PLAYING.duration_ms, 0);
        assert!(NOTHING_PLAYING.is_nothing_playing());
        assert!(MediaMetadata::default().is_nothing_playing());
        assert!(!MediaMetadata::for_media("song1").is_nothing_playing());
    }

    #[test]
    fn test_playback_indicator_for() {
        let now = MediaMetadata::for_media("song1");
        let playing = PlaybackState::new(PlaybackStatus::Playing, 1200, 1.0);
        let paused = PlaybackState::new(PlaybackStatus::Paused, 1200, 0.0);

        assert_eq!(
            playback_indicator_for(Some("song1"), Some(&now), Some(&playing)),
            PlaybackIndicator::Playing
        );
        assert_eq!(
            playback_indicator_for(Some("song1"), Some(&now), Some(&paused)),
            PlaybackIndicator::Paused
        );
        assert_eq!(
            playback_indicator_for(Some("song1"), Some(&now), None),
            PlaybackIndicator::Paused
        );
        assert_eq!(
            playback_indicator_for(Some("song2"), Some(&now), Some(&playing)),
            PlaybackIndicator::NotPlaying
        );
        assert_eq!(
            playback_indicator_for(Some(""), Some(&NOTHING_PLAYING), Some(&playing)),
            PlaybackIndicator::NotPlaying
        );
        assert_eq!(
            playback_indicator_for(None, Some(&now), Some(&playing)),
            PlaybackIndicator::NotPlaying
        );
    }
}
