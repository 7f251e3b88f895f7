//! # pmolistdiff - Détection de changements pour les listes média
//!
//! Given two snapshots of a browsable media list, this crate decides which
//! rows are the same item, which rows need a refresh, and how cheap that
//! refresh can be:
//!
//! - [`ItemCallback`] : identity / content / payload contract
//! - [`MediaItemCallback`] : the contract for [`MediaItemRecord`]
//! - [`calculate_diff`] : LCS alignment producing [`RowOp`]s
//! - [`SnapshotList`] : current snapshot holder, diffs on every submit
//!
//! Everything here is pure: no I/O, no shared state, `Send + Sync` as long
//! as the records are.
//!
//! ```
//! use pmolistdiff::{MediaItemRecord, PlaybackIndicator, RowOp, diff_snapshots};
//!
//! let song = MediaItemRecord::new("song1", "X", "Artist");
//! let old = vec![song.clone().with_indicator(PlaybackIndicator::Playing)];
//! let new = vec![song.with_indicator(PlaybackIndicator::Paused)];
//!
//! let diff = diff_snapshots(&old, &new, true)?;
//! assert!(matches!(diff.ops(), [RowOp::Change { position: 0, .. }]));
//! # Ok::<(), pmolistdiff::DiffError>(())
//! ```

mod callback;
mod diff;
mod error;
mod list;
mod record;

pub use callback::{ItemCallback, MediaItemCallback, PLAYBACK_INDICATOR_CHANGED, UpdateKind};
pub use diff::{DiffResult, ListUpdateCallback, RowOp, calculate_diff, diff_snapshots};
pub use error::{DiffError, Result};
pub use list::{MediaItemList, SnapshotList};
pub use record::{MediaItemRecord, PlaybackIndicator, validate_snapshot};
