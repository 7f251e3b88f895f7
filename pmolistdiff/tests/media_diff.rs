use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use pmolistdiff::{
    ItemCallback, MediaItemCallback, MediaItemList, MediaItemRecord, PLAYBACK_INDICATOR_CHANGED,
    PlaybackIndicator, RowOp, UpdateKind, calculate_diff, diff_snapshots,
};

fn track(id: &str, indicator: PlaybackIndicator) -> MediaItemRecord {
    MediaItemRecord::new(id, format!("Title {id}"), "Some Artist")
        .with_artwork(format!("content://art/{id}"))
        .with_indicator(indicator)
}

/// Applies every operation to `old` the way a list view would.
fn replay(
    old: &[MediaItemRecord],
    new: &[MediaItemRecord],
    ops: &[RowOp<UpdateKind>],
) -> Vec<MediaItemRecord> {
    let mut rows = old.to_vec();
    for op in ops {
        match op {
            RowOp::Remove { position, count } => {
                rows.drain(*position..*position + *count);
            }
            RowOp::Insert { position, count } => {
                for k in 0..*count {
                    rows.insert(position + k, new[position + k].clone());
                }
            }
            RowOp::Move { from, to } => {
                let row = rows.remove(*from);
                rows.insert(*to, row);
            }
            RowOp::Change {
                position,
                count,
                payload,
            } => {
                for k in *position..*position + *count {
                    match payload {
                        Some(UpdateKind::PlaybackIndicatorChanged) => {
                            assert_eq!(rows[k].id, new[k].id);
                            rows[k].playback_indicator = new[k].playback_indicator;
                        }
                        None => rows[k] = new[k].clone(),
                    }
                }
            }
        }
    }
    rows
}

fn random_snapshot(rng: &mut StdRng, pool: usize) -> Vec<MediaItemRecord> {
    let indicators = [
        PlaybackIndicator::NotPlaying,
        PlaybackIndicator::Playing,
        PlaybackIndicator::Paused,
    ];
    let mut ids: Vec<usize> = (0..pool).filter(|_| rng.random_range(0..3) != 0).collect();
    ids.shuffle(rng);
    ids.into_iter()
        .map(|id| {
            let indicator = indicators[rng.random_range(0..indicators.len())];
            track(&format!("song{id}"), indicator)
        })
        .collect()
}

#[test]
fn scenario_playing_then_paused() {
    let cb = MediaItemCallback;
    let a = MediaItemRecord::new("song1", "X", "").with_indicator(PlaybackIndicator::Playing);
    let b = MediaItemRecord::new("song1", "X", "").with_indicator(PlaybackIndicator::Paused);

    assert!(cb.same_identity(&a, &b));
    assert!(!cb.same_content(&a, &b));
    assert_eq!(cb.change_payload(&a, &b), Some(PLAYBACK_INDICATOR_CHANGED));
}

#[test]
fn scenario_different_songs_never_ask_for_payload() {
    let old = vec![track("song1", PlaybackIndicator::Playing)];
    let new = vec![track("song2", PlaybackIndicator::Playing)];

    let cb = MediaItemCallback;
    assert!(!cb.same_identity(&old[0], &new[0]));
    assert!(!cb.same_content(&old[0], &new[0]));

    let diff = diff_snapshots(&old, &new, true).unwrap();
    assert!(
        diff.ops()
            .iter()
            .all(|op| !matches!(op, RowOp::Change { .. }))
    );
    assert_eq!(replay(&old, &new, diff.ops()), new);
}

#[test]
fn scenario_identical_snapshots() {
    let snapshot = vec![
        track("song1", PlaybackIndicator::Playing),
        track("song2", PlaybackIndicator::NotPlaying),
    ];
    let diff = diff_snapshots(&snapshot, &snapshot.clone(), true).unwrap();
    assert!(diff.is_empty());
}

#[test]
fn random_snapshots_replay_to_new_list() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let old = random_snapshot(&mut rng, 12);
        let new = random_snapshot(&mut rng, 12);
        for detect_moves in [true, false] {
            let diff = calculate_diff(&old, &new, &MediaItemCallback, detect_moves);
            assert_eq!(
                replay(&old, &new, diff.ops()),
                new,
                "old={:?} new={:?} ops={:?}",
                old,
                new,
                diff.ops()
            );

            for (j, row) in new.iter().enumerate() {
                if let Some(i) = diff.new_position_to_old(j) {
                    assert_eq!(old[i].id, row.id);
                    assert_eq!(diff.old_position_to_new(i), Some(j));
                }
            }
        }
    }
}

#[test]
fn playlist_follows_the_player() {
    let mut list = MediaItemList::default();
    let ids = ["intro", "song1", "song2", "song3"];
    let snapshot = |playing: Option<usize>| -> Vec<MediaItemRecord> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let indicator = if Some(i) == playing {
                    PlaybackIndicator::Playing
                } else {
                    PlaybackIndicator::NotPlaying
                };
                track(id, indicator)
            })
            .collect()
    };

    list.submit(snapshot(None));
    let diff = list.submit(snapshot(Some(1)));
    assert_eq!(
        diff.ops(),
        &[RowOp::Change {
            position: 1,
            count: 1,
            payload: Some(PLAYBACK_INDICATOR_CHANGED)
        }]
    );

    let diff = list.submit(snapshot(Some(3)));
    assert_eq!(
        diff.ops(),
        &[
            RowOp::Change {
                position: 1,
                count: 1,
                payload: Some(PLAYBACK_INDICATOR_CHANGED)
            },
            RowOp::Change {
                position: 3,
                count: 1,
                payload: Some(PLAYBACK_INDICATOR_CHANGED)
            },
        ]
    );
}
