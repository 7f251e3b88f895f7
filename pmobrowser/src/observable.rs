use std::sync::{Arc, Mutex, RwLock};

use crossbeam_channel::{Receiver, Sender, unbounded};

/// Latest-value holder broadcasting every update to its subscribers.
///
/// Cloning an `Observable` gives another handle on the same value and the
/// same subscriber list.
#[derive(Clone)]
pub struct Observable<T: Clone> {
    value: Arc<RwLock<Option<T>>>,
    subscribers: Arc<Mutex<Vec<Sender<T>>>>,
}

impl<T: Clone> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.lock().unwrap().len();
        let has_value = self.value.read().unwrap().is_some();
        f.debug_struct("Observable")
            .field("has_value", &has_value)
            .field("subscribers", &subscribers)
            .finish()
    }
}

impl<T: Clone> Observable<T> {
    pub fn new() -> Self {
        Self {
            value: Arc::new(RwLock::new(None)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_value(value: T) -> Self {
        let observable = Self::new();
        *observable.value.write().unwrap() = Some(value);
        observable
    }

    /// Stores `value` and sends it to every live subscriber.
    pub fn post_value(&self, value: T) {
        // Le verrou des abonnés sérialise écriture et diffusion
        let mut subscribers = self.subscribers.lock().unwrap();
        *self.value.write().unwrap() = Some(value.clone());
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Latest posted value, if any.
    pub fn value(&self) -> Option<T> {
        self.value.read().unwrap().clone()
    }

    /// New receiver of updates. The current value, if set, is queued first.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = unbounded::<T>();
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(current) = self.value.read().unwrap().clone() {
            // Ne peut pas échouer : rx est encore vivant
            let _ = tx.send(current);
        }
        subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}
