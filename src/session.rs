//! Overlay session
//!
//! Owns a document, its viewport bus and the overlays applied to it.
//! Each overlay subscribes to [`ViewportEvent::Load`] and
//! [`ViewportEvent::Resize`]; removing the overlay drops the subscription.

use crate::dom::{Document, NodeId};
use crate::error::OverlayError;
use crate::geometry::{LayoutProvider, Point};
use crate::locate::LocateStrategy;
use crate::overlay::{apply_overlay, ApplyOutcome, Overlay, OverlayParams};
use crate::viewport::{SubscriptionId, ViewportBus, ViewportEvent};

const REPOSITION_EVENTS: [ViewportEvent; 2] = [ViewportEvent::Load, ViewportEvent::Resize];

#[derive(Debug)]
struct Entry {
    overlay: Overlay,
    subscription: SubscriptionId,
}

/// A document together with its live overlays
#[derive(Debug)]
pub struct OverlaySession {
    document: Document,
    viewport: ViewportBus,
    strategy: LocateStrategy,
    /// In application order
    overlays: Vec<Entry>,
}

impl OverlaySession {
    pub fn new(document: Document) -> Self {
        OverlaySession {
            document,
            viewport: ViewportBus::new(),
            strategy: LocateStrategy::default(),
            overlays: Vec::new(),
        }
    }

    /// Use a different character locator walk
    pub fn with_strategy(mut self, strategy: LocateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn viewport(&self) -> &ViewportBus {
        &self.viewport
    }

    pub fn to_markup(&self) -> String {
        self.document.to_markup()
    }

    /// Look up a live overlay by its unique id
    pub fn overlay(&self, unique_id: &str) -> Option<&Overlay> {
        self.entry(unique_id).map(|e| &e.overlay)
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    fn entry(&self, unique_id: &str) -> Option<&Entry> {
        self.overlays.iter().find(|e| e.overlay.unique_id() == unique_id)
    }

    /// Apply an overlay and subscribe it to viewport changes
    ///
    /// # Errors
    ///
    /// See [`apply_overlay`].
    pub fn apply(
        &mut self,
        params: &OverlayParams,
        layout: &dyn LayoutProvider,
    ) -> Result<ApplyOutcome, OverlayError> {
        let outcome = apply_overlay(&mut self.document, params, layout, self.strategy)?;
        if let ApplyOutcome::Applied(overlay) = &outcome {
            let subscription = self.viewport.subscribe(&REPOSITION_EVENTS);
            self.overlays.push(Entry {
                overlay: overlay.clone(),
                subscription,
            });
        }
        Ok(outcome)
    }

    /// Reposition every overlay subscribed to `event`
    ///
    /// Returns how many overlays were repositioned. An overlay whose nodes
    /// were removed from the document behind the session's back is skipped
    /// and logged; the others are still repositioned.
    pub fn notify(&mut self, event: ViewportEvent, layout: &dyn LayoutProvider) -> usize {
        let subscribers = self.viewport.dispatch(event);
        let mut count = 0;
        for entry in self.overlays.iter().filter(|e| subscribers.contains(&e.subscription)) {
            match entry.overlay.reposition(&mut self.document, layout) {
                Ok(_) => count += 1,
                Err(e) => log::warn!("skipping overlay on {event:?}: {e}"),
            }
        }
        count
    }

    /// Reposition a single overlay against `layout`
    ///
    /// # Errors
    ///
    /// [`OverlayError::UnknownOverlay`] or [`OverlayError::Detached`].
    pub fn reposition(&mut self, unique_id: &str, layout: &dyn LayoutProvider) -> Result<Point, OverlayError> {
        let entry = self
            .overlays
            .iter()
            .find(|e| e.overlay.unique_id() == unique_id)
            .ok_or_else(|| OverlayError::UnknownOverlay(unique_id.to_string()))?;
        entry.overlay.reposition(&mut self.document, layout)
    }

    /// Remove an overlay: drop its subscription, detach the overlay element
    /// and merge the wrapped character back into the surrounding text.
    ///
    /// The container keeps the `position`/`z-index` it was given.
    ///
    /// # Errors
    ///
    /// [`OverlayError::UnknownOverlay`] when nothing is registered under
    /// `unique_id`.
    pub fn remove(&mut self, unique_id: &str) -> Result<(), OverlayError> {
        let pos = self
            .overlays
            .iter()
            .position(|e| e.overlay.unique_id() == unique_id)
            .ok_or_else(|| OverlayError::UnknownOverlay(unique_id.to_string()))?;
        let entry = self.overlays.remove(pos);
        self.viewport.unsubscribe(entry.subscription);

        let doc = &mut self.document;
        doc.detach(entry.overlay.element());
        unwrap_character(doc, entry.overlay.wrapper());
        log::debug!("removed overlay {unique_id}");
        Ok(())
    }
}

/// Put the wrapper's children back in its place and drop the wrapper.
///
/// Nested wrappers of other overlays move along with the text, and the
/// split text nodes around them are joined again.
fn unwrap_character(doc: &mut Document, wrapper: NodeId) {
    let Some(parent) = doc.get_node(wrapper).and_then(|n| n.parent) else {
        return;
    };
    let children: Vec<NodeId> = doc.children(wrapper).collect();
    let mut anchor = wrapper;
    for child in children {
        doc.insert_after(anchor, child);
        anchor = child;
    }
    doc.detach(wrapper);
    doc.merge_adjacent_text(parent);
}
