use std::sync::Arc;
use std::time::{Duration, Instant};

use pmobrowser::{
    BrowserError, Bundle, CatalogService, EMPTY_PLAYBACK_STATE, ListUpdate, LocalSessionHost,
    MediaItemRecord, MediaMetadata, MediaSessionHost, MusicService, MusicServiceConnection,
    NETWORK_FAILURE, NOTHING_PLAYING, PlaybackIndicator, PlaybackState, PlaybackStatus, QueueItem,
    RowOp,
};

fn children_ids(children: &[MediaItemRecord]) -> Vec<&str> {
    children.iter().filter_map(MediaItemRecord::id).collect()
}

fn library() -> Arc<CatalogService> {
    let catalog = Arc::new(CatalogService::new("Library", "/"));
    catalog
        .set_children(
            "/",
            vec![
                MediaItemRecord::new("album1", "Album 1", "Artist").browsable(true),
                MediaItemRecord::new("song1", "Song 1", "Artist"),
                MediaItemRecord::new("song2", "Song 2", "Artist"),
            ],
        )
        .unwrap();
    catalog
        .set_children(
            "album1",
            vec![
                MediaItemRecord::new("a1t1", "Track 1", "Artist"),
                MediaItemRecord::new("a1t2", "Track 2", "Artist"),
            ],
        )
        .unwrap();
    catalog
}

/// Waits for an update matching `pred`, skipping the others.
fn wait_for(
    rx: &crossbeam_channel::Receiver<Arc<pmobrowser::Event<ListUpdate>>>,
    pred: impl Fn(&ListUpdate) -> bool,
) -> Option<ListUpdate> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Ok(event) = rx.recv_timeout(Duration::from_millis(50)) {
            let update = event.peek_content();
            if pred(update) {
                return Some(update.clone());
            }
        }
    }
    None
}

#[test]
fn default_service_rejects_the_client() {
    let host = LocalSessionHost::new(Arc::new(MusicService::default()), "client", 1);
    let connection = MusicServiceConnection::new(Arc::new(host.clone()));

    assert_eq!(connection.is_connected().value(), Some(false));
    assert_eq!(connection.network_failure().value(), Some(false));
    assert_eq!(connection.root_media_id(), None);
    assert!(connection.transport_controls().is_none());
    assert!(!connection.send_command("refresh", None));
    assert!(matches!(
        connection.subscribe("/", Arc::new(NoopSubscription)),
        Err(BrowserError::NotConnected)
    ));
}

struct NoopSubscription;

impl pmobrowser::SubscriptionCallback for NoopSubscription {
    fn on_children_loaded(&self, _parent_id: &str, _children: &[MediaItemRecord]) {}
}

#[test]
fn session_events_reach_the_observables() {
    let host = LocalSessionHost::new(library(), "client", 1);
    let connection = MusicServiceConnection::new(Arc::new(host.clone()));
    assert_eq!(connection.is_connected().value(), Some(true));
    assert_eq!(connection.root_media_id().as_deref(), Some("/"));

    let connected_rx = connection.is_connected().subscribe();
    assert_eq!(connected_rx.try_recv(), Ok(true));

    host.set_playback_state(None);
    assert_eq!(
        connection.playback_state().value(),
        Some(EMPTY_PLAYBACK_STATE)
    );

    host.set_metadata(Some(MediaMetadata::default()));
    assert_eq!(connection.now_playing().value(), Some(NOTHING_PLAYING));

    host.emit_session_event(NETWORK_FAILURE, &Bundle::new());
    assert_eq!(connection.network_failure().value(), Some(true));

    host.destroy_session();
    assert_eq!(connected_rx.try_recv(), Ok(false));
    assert!(!connection.send_command("refresh", None));
}

#[test]
fn commands_are_answered_while_connected() {
    let host = LocalSessionHost::new(library(), "client", 1);
    let connection = MusicServiceConnection::new(Arc::new(host));
    let (tx, rx) = crossbeam_channel::bounded(1);
    let mut params = Bundle::new();
    params.insert("rating".into(), serde_json::json!(5));

    assert!(connection.send_command_with("rate", Some(&params), move |code, data| {
        tx.send((code, data)).unwrap();
    }));
    assert_eq!(rx.try_recv(), Ok((pmobrowser::RESULT_OK, None)));
}

#[test]
fn browsing_a_child_node() {
    let host = LocalSessionHost::new(library(), "client", 1);
    let connection = MusicServiceConnection::new(Arc::new(host));
    let subscription =
        pmobrowser::BrowseSubscription::start(connection.clone(), "album1", true).unwrap();
    let items = subscription.items();
    assert_eq!(children_ids(&items), vec!["a1t1", "a1t2"]);

    let root = pmobrowser::BrowseSubscription::start(connection, "/", true).unwrap();
    assert!(root.items()[0].browsable);
}

#[test]
fn player_and_catalog_changes_become_row_edits() {
    let catalog = library();
    let host = LocalSessionHost::new(catalog.clone(), "client", 1);
    let connection = MusicServiceConnection::new(Arc::new(host.clone()));
    let subscription =
        pmobrowser::BrowseSubscription::start(connection.clone(), "/", true).unwrap();
    let rx = subscription.updates().subscribe();

    host.set_queue(vec![
        QueueItem {
            queue_id: 1,
            media_id: "song1".into(),
            title: "Song 1".into(),
        },
        QueueItem {
            queue_id: 2,
            media_id: "song2".into(),
            title: "Song 2".into(),
        },
    ]);
    let controls = connection.transport_controls().unwrap();
    controls.play_from_media_id("song1", None).unwrap();

    let update = wait_for(&rx, |u| {
        u.items[1].playback_indicator == PlaybackIndicator::Playing
    })
    .expect("song1 marked as playing");
    assert_eq!(update.items[2].playback_indicator, PlaybackIndicator::NotPlaying);

    controls.skip_to_next().unwrap();
    let update = wait_for(&rx, |u| {
        u.items[2].playback_indicator == PlaybackIndicator::Playing
            && u.items[1].playback_indicator == PlaybackIndicator::NotPlaying
    })
    .expect("song2 marked as playing");
    assert!(update.ops.iter().all(|op| matches!(op, RowOp::Change { .. })));

    controls.pause().unwrap();
    wait_for(&rx, |u| {
        u.items[2].playback_indicator == PlaybackIndicator::Paused
    })
    .expect("song2 marked as paused");

    // Nouvel ordre côté catalogue : les lignes bougent, l'indicateur reste
    catalog
        .set_children(
            "/",
            vec![
                MediaItemRecord::new("song2", "Song 2", "Artist"),
                MediaItemRecord::new("album1", "Album 1", "Artist").browsable(true),
                MediaItemRecord::new("song1", "Song 1", "Artist"),
            ],
        )
        .unwrap();
    host.notify_children_changed("/").unwrap();

    let items = subscription.items();
    assert_eq!(children_ids(&items), vec!["song2", "album1", "song1"]);
    assert_eq!(items[0].playback_indicator, PlaybackIndicator::Paused);
    let last = subscription.updates().value().unwrap();
    assert!(
        last.peek_content()
            .ops
            .iter()
            .any(|op| matches!(op, RowOp::Move { .. }))
    );
}

#[test]
fn stopping_clears_the_indicator() {
    let host = LocalSessionHost::new(library(), "client", 1);
    let connection = MusicServiceConnection::new(Arc::new(host.clone()));
    let subscription =
        pmobrowser::BrowseSubscription::start(connection.clone(), "/", true).unwrap();

    host.set_metadata(Some(MediaMetadata::for_media("song2")));
    host.set_playback_state(Some(PlaybackState::new(PlaybackStatus::Playing, 0, 1.0)));
    subscription.refresh();
    assert_eq!(
        subscription.items()[2].playback_indicator,
        PlaybackIndicator::Playing
    );

    connection.transport_controls().unwrap().stop().unwrap();
    subscription.refresh();
    assert!(
        subscription
            .items()
            .iter()
            .all(|r| r.playback_indicator == PlaybackIndicator::NotPlaying)
    );
}
