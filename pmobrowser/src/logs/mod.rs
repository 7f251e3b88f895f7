// logs/mod.rs
mod bufferlayer;

pub use bufferlayer::BufferLayer;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use crossbeam_channel::{Receiver, Sender, unbounded};
use pmoconfig::Config;
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    Registry,
    filter::LevelFilter,
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
};

use crate::errors::{BrowserError, Result};

/// Représente une entrée de log
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Buffer circulaire partagé des derniers logs
#[derive(Clone)]
pub struct LogState {
    buffer: Arc<RwLock<VecDeque<LogEntry>>>,
    capacity: usize,
    subscribers: Arc<Mutex<Vec<Sender<LogEntry>>>>,
    max_level: Arc<RwLock<Level>>,
    reload_handle: Arc<RwLock<Option<reload::Handle<LevelFilter, Registry>>>>,
}

impl LogState {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            max_level: Arc::new(RwLock::new(Level::TRACE)),
            reload_handle: Arc::new(RwLock::new(None)),
        }
    }

    fn attach(&self, level: Level, handle: reload::Handle<LevelFilter, Registry>) {
        *self.max_level.write().unwrap() = level;
        *self.reload_handle.write().unwrap() = Some(handle);
    }

    /// Change le niveau minimal, à chaud si le subscriber global est installé
    pub fn set_max_level(&self, level: Level) -> Result<()> {
        *self.max_level.write().unwrap() = level;
        if let Some(handle) = self.reload_handle.read().unwrap().as_ref() {
            handle
                .reload(level_to_levelfilter(level))
                .map_err(|e| BrowserError::Logging(e.to_string()))?;
        }
        Ok(())
    }

    pub fn get_max_level(&self) -> Level {
        *self.max_level.read().unwrap()
    }

    fn push(&self, entry: LogEntry) {
        {
            let mut buf = self.buffer.write().unwrap();
            if buf.len() == self.capacity {
                buf.pop_front();
            }
            buf.push_back(entry.clone());
        }
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(entry.clone()).is_ok());
    }

    pub fn subscribe(&self) -> Receiver<LogEntry> {
        let (tx, rx) = unbounded::<LogEntry>();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    pub fn dump(&self) -> Vec<LogEntry> {
        self.buffer.read().unwrap().iter().cloned().collect()
    }
}

/// Initialise le logging global depuis la configuration
///
/// Lit `host.logger.min_level`, `host.logger.enable_console` et
/// `host.logger.buffer_capacity`. Les valeurs illisibles retombent sur
/// TRACE, console activée et 500 entrées.
///
/// # Exemple
/// ```rust,no_run
/// use pmobrowser::logs::init_logging;
/// use pmoconfig::Config;
///
/// let config = Config::load_config("").unwrap();
/// let log_state = init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &Config) -> Result<LogState> {
    let level = config
        .get_log_min_level()
        .ok()
        .and_then(|l| string_to_level(&l))
        .unwrap_or(Level::TRACE);

    let (filter, reload_handle) = reload::Layer::new(level_to_levelfilter(level));

    let buffer_capacity = config.get_log_cache_size().unwrap_or(500);
    let log_state = LogState::new(buffer_capacity);
    log_state.attach(level, reload_handle);

    // Le filtre doit être appliqué avant le BufferLayer
    let subscriber = Registry::default()
        .with(filter)
        .with(BufferLayer::new(log_state.clone()));

    let enable_console = config.get_log_enable_console().unwrap_or(true);

    let installed = if enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| BrowserError::Logging(e.to_string()))?;

    Ok(log_state)
}

pub fn string_to_level(s: &str) -> Option<Level> {
    match s.to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

fn level_to_levelfilter(level: Level) -> LevelFilter {
    match level {
        Level::ERROR => LevelFilter::ERROR,
        Level::WARN => LevelFilter::WARN,
        Level::INFO => LevelFilter::INFO,
        Level::DEBUG => LevelFilter::DEBUG,
        Level::TRACE => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, warn};

    #[test]
    fn test_string_to_level() {
        assert_eq!(string_to_level("info"), Some(Level::INFO));
        assert_eq!(string_to_level("WARN"), Some(Level::WARN));
        assert_eq!(string_to_level("verbose"), None);
    }

    #[test]
    fn test_buffer_layer_captures_events() {
        let state = LogState::new(2);
        let rx = state.subscribe();
        let subscriber = Registry::default().with(BufferLayer::new(state.clone()));

        tracing::subscriber::with_default(subscriber, || {
            info!(parent = "/", "first");
            info!("second");
            warn!(count = 3, "third");
        });

        let entries = state.dump();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[1].level, "WARN");
        assert_eq!(entries[1].message, "third count=3");
        assert_eq!(rx.try_iter().count(), 3);
    }

    #[test]
    fn test_set_max_level_without_global_subscriber() {
        let state = LogState::new(10);
        state.set_max_level(Level::DEBUG).unwrap();
        assert_eq!(state.get_max_level(), Level::DEBUG);
    }
}
