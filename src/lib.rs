//! CharOverlay - background image overlays anchored on single characters
//!
//! Parses a markup document, isolates one character of a container's text
//! in an identifiable `span`, and places a square background-image `div`
//! right after the container, centered on that character. Positions are
//! recomputed from host-reported layout on every viewport change.
//!
//! Layers:
//! - reader / core: markup pull reader and entity handling
//! - dom: mutable arena document
//! - locate: flattened-text character locator
//! - overlay / session: the overlay operation and its lifecycle
//! - NIF surface (this file) for the BEAM

use rustler::{Atom, Encoder, Env, NifResult, ResourceArc, Term};

pub mod core;
pub mod dom;
pub mod error;
pub mod geometry;
pub mod locate;
pub mod overlay;
pub mod reader;
mod resource;
pub mod session;
mod term;
pub mod viewport;

use dom::Document;
use overlay::{ApplyOutcome, OverlayParams};
use resource::{DocumentRef, DocumentResource};
use session::OverlaySession;
use term::{error_tuple, ok_tuple, point_to_term, str_to_binary};
use viewport::ViewportEvent;

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

/// Bytes currently allocated (0 without `memory_tracking`)
#[rustler::nif]
fn get_rust_memory() -> usize {
    #[cfg(feature = "memory_tracking")]
    return tracking::ALLOCATED.load(std::sync::atomic::Ordering::SeqCst);
    #[cfg(not(feature = "memory_tracking"))]
    0
}

/// Peak allocation since the last reset (0 without `memory_tracking`)
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    #[cfg(feature = "memory_tracking")]
    return tracking::PEAK_ALLOCATED.load(std::sync::atomic::Ordering::SeqCst);
    #[cfg(not(feature = "memory_tracking"))]
    0
}

/// Reset the peak to the current allocation, returning `{current, old_peak}`
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    #[cfg(feature = "memory_tracking")]
    {
        use std::sync::atomic::Ordering;
        let current = tracking::ALLOCATED.load(Ordering::SeqCst);
        let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
        (current, peak)
    }
    #[cfg(not(feature = "memory_tracking"))]
    (0, 0)
}

// ============================================================================
// Documents
// ============================================================================

/// Parse markup into a document resource: `{:ok, doc}` or `{:error, reason}`
#[rustler::nif]
fn parse<'a>(env: Env<'a>, markup: &str) -> NifResult<Term<'a>> {
    match Document::parse(markup) {
        Ok(doc) => {
            let resource = ResourceArc::new(DocumentResource::new(OverlaySession::new(doc)));
            Ok(ok_tuple(env, resource))
        }
        Err(e) => Ok(error_tuple(env, &e.to_string())),
    }
}

/// Serialize the document, overlays included
#[rustler::nif]
fn to_markup<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    Ok(match doc_ref.with_state(|state| state.session.to_markup()) {
        Ok(markup) => str_to_binary(env, &markup),
        Err(e) => error_tuple(env, e),
    })
}

/// Flattened text of the first element with `container_class`, or nil
#[rustler::nif]
fn flattened_text<'a>(env: Env<'a>, doc_ref: DocumentRef, container_class: &str) -> NifResult<Term<'a>> {
    let result = doc_ref.with_state(|state| {
        let doc = state.session.document();
        doc.first_by_class(container_class)
            .map(|container| locate::flattened_text(doc, container))
    });

    Ok(match result {
        Ok(Some(text)) => str_to_binary(env, &text),
        Ok(None) => rustler::types::atom::nil().encode(env),
        Err(e) => error_tuple(env, e),
    })
}

/// Replace the host-reported layout: `[{selector, left, top, width, height}]`
/// where selector is `#id` or `.class`.
#[rustler::nif]
fn set_layout<'a>(
    env: Env<'a>,
    doc_ref: DocumentRef,
    rects: Vec<(String, f64, f64, f64, f64)>,
) -> NifResult<Term<'a>> {
    let result = doc_ref.with_state(|state| {
        let doc = state.session.document();
        let mut resolved = Vec::with_capacity(rects.len());
        for (selector, left, top, width, height) in &rects {
            let node = doc
                .query(selector)
                .ok_or_else(|| format!("no element matches selector {selector:?}"))?;
            resolved.push((node, geometry::Rect::new(*left, *top, *width, *height)));
        }
        state.layout.clear();
        for (node, rect) in resolved {
            state.layout.set(node, rect);
        }
        Ok::<(), String>(())
    });

    Ok(match result {
        Ok(Ok(())) => term::ok().encode(env),
        Ok(Err(msg)) => error_tuple(env, &msg),
        Err(e) => error_tuple(env, e),
    })
}

// ============================================================================
// Overlays
// ============================================================================

/// Apply an overlay: `{:ok, {left, top}}`, `:not_found` or `{:error, reason}`
#[rustler::nif]
#[allow(clippy::too_many_arguments)]
fn apply_overlay<'a>(
    env: Env<'a>,
    doc_ref: DocumentRef,
    unique_id: String,
    container_class: String,
    target_char_index: usize,
    image_url: String,
    image_size: u32,
    rotation: Option<f64>,
    offset_x: i32,
    offset_y: i32,
    opacity: f64,
) -> NifResult<Term<'a>> {
    let mut params = OverlayParams::new(unique_id, container_class, target_char_index, image_url, image_size)
        .with_offset(offset_x, offset_y)
        .with_opacity(opacity);
    if let Some(degrees) = rotation {
        params = params.with_rotation(degrees);
    }

    let result = doc_ref.with_state(|state| {
        match state.session.apply(&params, &state.layout)? {
            ApplyOutcome::Applied(overlay) => state
                .session
                .reposition(overlay.unique_id(), &state.layout)
                .map(Some),
            ApplyOutcome::ContainerNotFound => Ok(None),
        }
    });

    Ok(match result {
        Ok(Ok(Some(origin))) => ok_tuple(env, point_to_term(env, origin)),
        Ok(Ok(None)) => term::not_found().encode(env),
        Ok(Err(e)) => error_tuple(env, &e.to_string()),
        Err(e) => error_tuple(env, e),
    })
}

/// Deliver a viewport event (`:load` or `:resize`); returns how many
/// overlays were repositioned
#[rustler::nif]
fn notify<'a>(env: Env<'a>, doc_ref: DocumentRef, event: Atom) -> NifResult<Term<'a>> {
    let event = if event == term::load() {
        ViewportEvent::Load
    } else if event == term::resize() {
        ViewportEvent::Resize
    } else {
        return Ok(error_tuple(env, "unknown viewport event"));
    };

    Ok(match doc_ref.with_state(|state| state.session.notify(event, &state.layout)) {
        Ok(count) => count.encode(env),
        Err(e) => error_tuple(env, e),
    })
}

/// Remove an overlay and restore the wrapped text; false if unknown
#[rustler::nif]
fn remove_overlay(doc_ref: DocumentRef, unique_id: &str) -> bool {
    doc_ref
        .with_state(|state| state.session.remove(unique_id).is_ok())
        .unwrap_or(false)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.CharOverlay.Native");
