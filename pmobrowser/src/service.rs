//! Services de navigation : ce qu'un client voit une fois connecté
//!
//! Un service expose une racine navigable (ou refuse le client en renvoyant
//! `None`) et la liste des enfants de chaque nœud.

use std::collections::HashMap;
use std::sync::RwLock;

use pmolistdiff::{MediaItemRecord, validate_snapshot};
use tracing::{debug, info};

use crate::errors::{BrowserError, Result};
use crate::model::{Bundle, BrowserRoot};

/// Session event sent by the service when the player cannot reach the network.
pub const NETWORK_FAILURE: &str = "com.example.android.uamp.media.session.NETWORK_FAILURE";

/// Server side of the browse protocol.
pub trait MediaBrowserService: Send + Sync {
    /// Name reported in logs and connection errors.
    fn name(&self) -> &str;

    /// Root offered to `client_package`, `None` to reject the client.
    fn get_root(
        &self,
        client_package: &str,
        client_uid: u32,
        hints: Option<&Bundle>,
    ) -> Option<BrowserRoot>;

    /// Children of `parent_id`, in display order.
    fn load_children(&self, parent_id: &str) -> Result<Vec<MediaItemRecord>>;
}

/// Placeholder service: rejects every client and has no content.
#[derive(Debug, Clone)]
pub struct MusicService {
    name: String,
}

impl MusicService {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for MusicService {
    fn default() -> Self {
        Self::new("MusicService")
    }
}

impl MediaBrowserService for MusicService {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_root(
        &self,
        client_package: &str,
        client_uid: u32,
        _hints: Option<&Bundle>,
    ) -> Option<BrowserRoot> {
        debug!(
            service = %self.name,
            client = client_package,
            uid = client_uid,
            "No browsable root offered"
        );
        None
    }

    fn load_children(&self, _parent_id: &str) -> Result<Vec<MediaItemRecord>> {
        Ok(Vec::new())
    }
}

/// In-memory catalog: a root id and a table of children per parent.
#[derive(Debug)]
pub struct CatalogService {
    name: String,
    root_id: String,
    children: RwLock<HashMap<String, Vec<MediaItemRecord>>>,
}

impl CatalogService {
    pub fn new(name: impl Into<String>, root_id: impl Into<String>) -> Self {
        let root_id = root_id.into();
        let mut children = HashMap::new();
        children.insert(root_id.clone(), Vec::new());
        Self {
            name: name.into(),
            root_id,
            children: RwLock::new(children),
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Replaces the children of `parent_id`. The snapshot must not contain
    /// two rows with the same id.
    pub fn set_children(&self, parent_id: &str, items: Vec<MediaItemRecord>) -> Result<()> {
        validate_snapshot(&items)?;
        info!(
            service = %self.name,
            parent = parent_id,
            count = items.len(),
            "Catalog node updated"
        );
        self.children
            .write()
            .map_err(|_| BrowserError::service("catalog lock poisoned"))?
            .insert(parent_id.to_string(), items);
        Ok(())
    }

    pub fn remove_node(&self, parent_id: &str) -> bool {
        self.children
            .write()
            .map(|mut children| children.remove(parent_id).is_some())
            .unwrap_or(false)
    }
}

impl MediaBrowserService for CatalogService {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_root(
        &self,
        client_package: &str,
        client_uid: u32,
        _hints: Option<&Bundle>,
    ) -> Option<BrowserRoot> {
        debug!(
            service = %self.name,
            client = client_package,
            uid = client_uid,
            root = %self.root_id,
            "Root offered"
        );
        Some(BrowserRoot::new(self.root_id.clone()))
    }

    fn load_children(&self, parent_id: &str) -> Result<Vec<MediaItemRecord>> {
        let children = self
            .children
            .read()
            .map_err(|_| BrowserError::service("catalog lock poisoned"))?;
        children
            .get(parent_id)
            .cloned()
            .ok_or_else(|| BrowserError::ParentNotFound(parent_id.to_string()))
    }
}
