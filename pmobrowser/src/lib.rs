//! # pmobrowser - Connexion client à un service de navigation média
//!
//! Cette crate relie une application à un service de navigation média
//! ([`MediaBrowserService`]) à travers un hôte de session
//! ([`MediaSessionHost`]) :
//!
//! - [`MusicServiceConnection`] expose l'état de la connexion et de la
//!   lecture sous forme d'[`Observable`]s et relaie commandes et abonnements
//! - [`BrowseSubscription`] maintient la liste des enfants d'un nœud,
//!   décorée avec l'indicateur de lecture et diffée par `pmolistdiff`
//! - [`Injector`] construit ces objets une fois, au démarrage
//! - [`LocalSessionHost`] sert un service dans le même processus
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pmobrowser::{CatalogService, Injector, LocalSessionHost, MediaItemRecord};
//!
//! let catalog = Arc::new(CatalogService::new("Library", "/"));
//! catalog.set_children("/", vec![MediaItemRecord::new("song1", "Song 1", "Artist")])?;
//!
//! let config = Arc::new(pmoconfig::Config::load_config("")?);
//! let host = LocalSessionHost::new(catalog, "com.example.player", 1000);
//! let injector = Injector::new(config, Arc::new(host))?;
//!
//! let subscription = injector.provide_browse_subscription(None)?;
//! let update = subscription.updates().value().unwrap();
//! if let Some(update) = update.content_if_not_handled() {
//!     println!("{} rows, {} ops", update.items.len(), update.ops.len());
//! }
//! # Ok::<(), pmobrowser::BrowserError>(())
//! ```

mod connection;
pub mod errors;
mod event;
mod injector;
mod local_host;
pub mod logs;
mod model;
mod observable;
mod service;
mod session;
mod subscription;

pub use connection::MusicServiceConnection;
pub use errors::{BrowserError, Result};
pub use event::Event;
pub use injector::{Injector, MUSIC_SERVICE_NAME, service_from_config};
pub use local_host::{LocalSessionHost, RESULT_OK};
pub use model::{
    BrowserRoot, Bundle, EMPTY_PLAYBACK_STATE, MediaMetadata, NOTHING_PLAYING, PlaybackState,
    PlaybackStatus, QueueItem, playback_indicator_for,
};
pub use observable::Observable;
pub use service::{CatalogService, MediaBrowserService, MusicService, NETWORK_FAILURE};
pub use session::{
    ConnectionCallback, ControllerCallback, MediaSessionHost, ResultCallback,
    SubscriptionCallback, TransportControls,
};
pub use subscription::{BrowseSubscription, ListUpdate};

pub use pmolistdiff::{MediaItemRecord, PlaybackIndicator, RowOp, UpdateKind};
