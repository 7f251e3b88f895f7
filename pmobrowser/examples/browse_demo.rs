//! Example: browse an in-memory catalog and follow the player
//!
//! Run with: cargo run -p pmobrowser --example browse_demo
//! Or with a config directory: cargo run -p pmobrowser --example browse_demo -- /tmp/pmobrowser

use std::env;
use std::sync::Arc;
use std::time::Duration;

use pmobrowser::{
    CatalogService, Injector, ListUpdate, LocalSessionHost, MediaItemRecord, MediaSessionHost,
    QueueItem, logs::init_logging,
};
use pmoconfig::Config;

fn print_update(update: &ListUpdate) {
    println!("[{}] {} ops", update.parent_id, update.ops.len());
    for op in &update.ops {
        println!("  {}", serde_json::to_string(op).unwrap_or_default());
    }
    for item in &update.items {
        println!(
            "  {:<8} {:<10} {}",
            item.playback_indicator.as_str(),
            item.id.as_deref().unwrap_or("-"),
            item.title
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = env::args().nth(1).unwrap_or_default();
    let config = Arc::new(Config::load_config(&config_dir)?);
    let _log_state = init_logging(&config)?;

    let catalog = Arc::new(CatalogService::new("Library", config.get_browser_root_id()?));
    let tracks: Vec<MediaItemRecord> = ["intro", "song1", "song2", "song3"]
        .iter()
        .map(|id| MediaItemRecord::new(*id, format!("Track {id}"), "Demo Artist"))
        .collect();
    catalog.set_children(catalog.root_id(), tracks.clone())?;

    let host = LocalSessionHost::new(catalog.clone(), "pmobrowser.demo", 1000);
    let injector = Injector::new(config.clone(), Arc::new(host.clone()))?;
    let subscription = injector.provide_browse_subscription(None)?;
    let updates = subscription.updates().subscribe();

    host.set_queue(
        tracks
            .iter()
            .enumerate()
            .map(|(i, t)| QueueItem {
                queue_id: i as u64,
                media_id: t.id.clone().unwrap_or_default(),
                title: t.title.clone(),
            })
            .collect(),
    );

    let controls = injector
        .provide_music_service_connection()
        .require_transport_controls()?;
    controls.play_from_media_id("song1", None)?;
    controls.skip_to_next()?;
    controls.pause()?;

    catalog.set_children(catalog.root_id(), tracks[1..].iter().rev().cloned().collect())?;
    host.notify_children_changed(catalog.root_id())?;

    while let Ok(event) = updates.recv_timeout(Duration::from_millis(200)) {
        if let Some(update) = event.content_if_not_handled() {
            print_update(update);
        }
    }

    host.disconnect();
    println!("connected: {}", host.is_connected());
    Ok(())
}
