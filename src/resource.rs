//! ResourceArc Wrappers
//!
//! Persistent per-document state handed to the BEAM.

use crate::geometry::StaticLayout;
use crate::session::OverlaySession;
use rustler::ResourceArc;
use std::sync::Mutex;

/// Session plus the layout the host last reported for it
pub struct DocumentState {
    pub session: OverlaySession,
    pub layout: StaticLayout,
}

/// Wrapper for an overlay session that can be stored in a ResourceArc
pub struct DocumentResource {
    pub state: Mutex<DocumentState>,
}

impl DocumentResource {
    pub fn new(session: OverlaySession) -> Self {
        DocumentResource {
            state: Mutex::new(DocumentState {
                session,
                layout: StaticLayout::new(),
            }),
        }
    }

    /// Run `f` with exclusive access to the document state.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if a previous call panicked while holding
    /// the lock.
    pub fn with_state<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&mut DocumentState) -> R,
    {
        let mut guard = self.state.lock().map_err(|_| "mutex_poisoned")?;
        Ok(f(&mut guard))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DocumentResource {}

/// Type alias for document ResourceArc
pub type DocumentRef = ResourceArc<DocumentResource>;
