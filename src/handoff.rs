//! Hand-off of an uploaded PDF from the upload surface to the viewer.
//!
//! The viewer owns an [`ObjectUrl`] for the bytes while a document is
//! active. The handle is released on delete, on navigation away and when
//! the viewer is dropped. Only a [`SessionRecord`] (name and timestamp)
//! outlives a reload.

use crate::error::{DashboardError, Result};
use crate::schema::{SessionRecord, UploadedDocument};
use crate::session::Route;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

pub const PDF_MIME: &str = "application/pdf";
pub const SESSION_KEY: &str = "currentPDF";
pub const STALE_MESSAGE: &str = "PDF needs to be re-uploaded after page refresh";
pub const INVALID_TYPE_MESSAGE: &str = "Please upload a PDF file";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Tab-scoped key/value storage.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
    fn remove_item(&self, key: &str);
}

/// In-process session storage. Clones share the same map, so a clone kept
/// by the caller survives a simulated reload of the viewer.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) {
        lock(&self.items).insert(key.to_string(), value);
    }

    fn remove_item(&self, key: &str) {
        lock(&self.items).remove(key);
    }
}

/// Issues `blob:` handles for in-memory bytes and tracks which are live.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    live: Arc<Mutex<HashSet<String>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, document: &UploadedDocument) -> ObjectUrl {
        let url = format!("blob:stockpro/{}", Uuid::new_v4());
        lock(&self.live).insert(url.clone());
        debug!("Created {} for '{}' ({} bytes)", url, document.name, document.size);
        ObjectUrl {
            url,
            registry: self.clone(),
            released: false,
        }
    }

    pub fn live_count(&self) -> usize {
        lock(&self.live).len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        lock(&self.live).contains(url)
    }

    fn revoke(&self, url: &str) {
        if lock(&self.live).remove(url) {
            debug!("Revoked {}", url);
        }
    }
}

/// A live handle to document bytes; revoked on [`ObjectUrl::release`] or drop.
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    registry: ResourceRegistry,
    released: bool,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Idempotent.
    pub fn release(&mut self) {
        if !self.released {
            self.registry.revoke(&self.url);
            self.released = true;
        }
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug)]
pub enum DocumentState {
    Empty,
    ActiveInMemory {
        document: UploadedDocument,
        url: ObjectUrl,
    },
    /// Only the session record survived; the bytes must be uploaded again.
    ActiveStale { record: SessionRecord },
}

impl DocumentState {
    pub fn name(&self) -> &'static str {
        match self {
            DocumentState::Empty => "Empty",
            DocumentState::ActiveInMemory { .. } => "ActiveInMemory",
            DocumentState::ActiveStale { .. } => "ActiveStale",
        }
    }
}

/// Checks the upload surface's file before any navigation happens.
pub fn validate_upload(document: &UploadedDocument) -> Result<()> {
    if document.content_type != PDF_MIME {
        warn!(
            "Rejected upload '{}' with content type '{}'",
            document.name, document.content_type
        );
        return Err(DashboardError::Validation(INVALID_TYPE_MESSAGE.to_string()));
    }
    Ok(())
}

/// What the viewer shows after it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Viewing { url: String },
    NeedsReupload { name: String, message: String },
    Redirect(Route),
}

pub struct DocumentViewer<S: SessionStorage> {
    storage: S,
    registry: ResourceRegistry,
    state: DocumentState,
}

impl<S: SessionStorage> DocumentViewer<S> {
    pub fn new(storage: S, registry: ResourceRegistry) -> Self {
        Self {
            storage,
            registry,
            state: DocumentState::Empty,
        }
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn document(&self) -> Option<&UploadedDocument> {
        match &self.state {
            DocumentState::ActiveInMemory { document, .. } => Some(document),
            _ => None,
        }
    }

    pub fn object_url(&self) -> Option<&str> {
        match &self.state {
            DocumentState::ActiveInMemory { url, .. } => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn session_record(&self) -> Option<SessionRecord> {
        let raw = self.storage.get_item(SESSION_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring unreadable session record: {}", e);
                None
            }
        }
    }

    /// Accepts a file from the upload surface. Non-PDF files are rejected and
    /// leave the viewer untouched.
    pub fn accept_upload(&mut self, document: UploadedDocument) -> Result<&str> {
        validate_upload(&document)?;
        self.release_handle();

        let record = SessionRecord {
            name: document.name.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        self.storage
            .set_item(SESSION_KEY, serde_json::to_string(&record)?);

        let url = self.registry.create(&document);
        info!("Viewing '{}'", document.name);
        self.state = DocumentState::ActiveInMemory { document, url };

        Ok(self.object_url().unwrap_or_default())
    }

    /// Opens the viewer with whatever navigation carried.
    pub fn open(&mut self, carried: Option<UploadedDocument>) -> Result<OpenOutcome> {
        if let Some(document) = carried {
            let url = self.accept_upload(document)?.to_string();
            return Ok(OpenOutcome::Viewing { url });
        }

        match self.session_record() {
            Some(record) => {
                let name = record.name.clone();
                self.state = DocumentState::ActiveStale { record };
                Ok(OpenOutcome::NeedsReupload {
                    name,
                    message: STALE_MESSAGE.to_string(),
                })
            }
            None => {
                self.state = DocumentState::Empty;
                Ok(OpenOutcome::Redirect(Route::Dashboard))
            }
        }
    }

    /// A page reload: in-memory bytes and their handle are gone, the session
    /// record is not.
    pub fn reload(&mut self) -> OpenOutcome {
        self.release_handle();
        self.state = DocumentState::Empty;
        match self.open(None) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Reload failed: {}", e);
                OpenOutcome::Redirect(Route::Dashboard)
            }
        }
    }

    /// Removes the document entirely and returns where to go next.
    pub fn delete(&mut self) -> Route {
        self.storage.remove_item(SESSION_KEY);
        self.release_handle();
        self.state = DocumentState::Empty;
        info!("Document deleted");
        Route::Dashboard
    }

    /// Leaving the viewer keeps the session record but not the handle.
    pub fn navigate_away(&mut self) -> Route {
        self.release_handle();
        if matches!(self.state, DocumentState::ActiveInMemory { .. }) {
            self.state = match self.session_record() {
                Some(record) => DocumentState::ActiveStale { record },
                None => DocumentState::Empty,
            };
        }
        Route::Dashboard
    }

    fn release_handle(&mut self) {
        if let DocumentState::ActiveInMemory { url, .. } = &mut self.state {
            url.release();
        }
    }
}

impl<S: SessionStorage> Drop for DocumentViewer<S> {
    fn drop(&mut self) {
        self.release_handle();
    }
}
