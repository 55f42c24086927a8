//! Character overlay
//!
//! Isolates one character of a container's text in a `span` and places a
//! square background-image `div` right after the container, centered on
//! that character.

use std::borrow::Cow;
use std::ops::Range;

use crate::dom::{Document, NodeId};
use crate::error::OverlayError;
use crate::geometry::{overlay_origin, px, LayoutProvider, Point};
use crate::locate::{char_at, locate_char, text_len, LocateStrategy, TextPosition};

/// Suffix appended to the unique id to name the overlay element
pub const OVERLAY_ID_SUFFIX: &str = "-bg";

/// Parameters of one overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayParams {
    /// Id given to the wrapper; the overlay gets `{unique_id}-bg`
    pub unique_id: String,
    /// Class name of the container, without a leading `.`
    pub container_class: String,
    /// Index into the container's flattened text
    pub target_char_index: usize,
    pub image_url: String,
    /// Side of the square overlay in pixels
    pub image_size: u32,
    /// Rotation in degrees; `None` emits no transform
    pub rotation: Option<f64>,
    pub offset_x: i32,
    pub offset_y: i32,
    pub opacity: f64,
}

impl OverlayParams {
    pub fn new(
        unique_id: impl Into<String>,
        container_class: impl Into<String>,
        target_char_index: usize,
        image_url: impl Into<String>,
        image_size: u32,
    ) -> Self {
        OverlayParams {
            unique_id: unique_id.into(),
            container_class: container_class.into(),
            target_char_index,
            image_url: image_url.into(),
            image_size,
            rotation: None,
            offset_x: 0,
            offset_y: 0,
            opacity: 1.0,
        }
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Id of the overlay element
    pub fn overlay_id(&self) -> String {
        format!("{}{OVERLAY_ID_SUFFIX}", self.unique_id)
    }

    /// Check the parameters that do not depend on the document
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> Result<(), OverlayError> {
        if self.unique_id.is_empty() {
            return Err(OverlayError::EmptyId);
        }
        let class = &self.container_class;
        if class.is_empty() || class.starts_with(['.', '#']) || class.chars().any(char::is_whitespace) {
            return Err(OverlayError::InvalidContainerClass(class.clone()));
        }
        if self.image_size == 0 {
            return Err(OverlayError::InvalidImageSize);
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(OverlayError::InvalidOpacity(self.opacity));
        }
        if let Some(rotation) = self.rotation.filter(|r| !r.is_finite()) {
            return Err(OverlayError::InvalidRotation(rotation));
        }
        Ok(())
    }
}

/// Result of a successful call
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(Overlay),
    /// No element carries the container class; the document is untouched
    ContainerNotFound,
}

impl ApplyOutcome {
    pub fn overlay(&self) -> Option<&Overlay> {
        match self {
            ApplyOutcome::Applied(overlay) => Some(overlay),
            ApplyOutcome::ContainerNotFound => None,
        }
    }
}

/// Handle to an applied overlay
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    unique_id: String,
    container: NodeId,
    wrapper: NodeId,
    element: NodeId,
    image_size: u32,
    offset: (i32, i32),
}

impl Overlay {
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// The `span` holding the target character
    pub fn wrapper(&self) -> NodeId {
        self.wrapper
    }

    /// The background-image `div`
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Recompute `left`/`top` from the current layout and write them to the
    /// overlay's inline style. Boxes the layout does not know are treated as
    /// empty rects at the origin.
    ///
    /// # Errors
    ///
    /// [`OverlayError::Detached`] once the wrapper or overlay was removed.
    pub fn reposition(&self, doc: &mut Document, layout: &dyn LayoutProvider) -> Result<Point, OverlayError> {
        if !doc.is_attached(self.wrapper) || !doc.is_attached(self.element) {
            return Err(OverlayError::Detached(self.unique_id.clone()));
        }

        let wrapper = layout.bounding_rect(doc, self.wrapper).unwrap_or_default();
        let container = layout.bounding_rect(doc, self.container).unwrap_or_default();
        let origin = overlay_origin(wrapper, container, self.offset, self.image_size);

        doc.set_style_property(self.element, "left", px(origin.x));
        doc.set_style_property(self.element, "top", px(origin.y));
        log::trace!("repositioned overlay {} to ({}, {})", self.unique_id, origin.x, origin.y);
        Ok(origin)
    }
}

/// Inline style of a freshly created overlay element
pub fn style_template(params: &OverlayParams) -> String {
    let size = params.image_size;
    let transform = params
        .rotation
        .map(|deg| format!("transform: rotate({deg}deg); "))
        .unwrap_or_default();
    format!(
        "position: absolute; opacity: {opacity}; top: 0; left: 0; height: {size}px; {transform}width: {size}px; \
         background-image: url('{url}'); background-size: contain; background-position: center; \
         background-repeat: no-repeat; z-index: 1;",
        opacity = params.opacity,
        url = escape_css_string(&params.image_url),
    )
}

/// Escape a value for a single-quoted CSS string
fn escape_css_string(value: &str) -> Cow<'_, str> {
    if !value.contains(['\'', '\\', '\n', '\r']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            '\r' => out.push_str("\\d "),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Wrap the target character of the container and attach a positioned
/// overlay after the container.
///
/// Every check runs before the first mutation, so an error leaves the
/// document unchanged.
///
/// # Errors
///
/// Invalid parameters, an id already present in the document, or a
/// character index past the end of the container's text.
pub fn apply_overlay(
    doc: &mut Document,
    params: &OverlayParams,
    layout: &dyn LayoutProvider,
    strategy: LocateStrategy,
) -> Result<ApplyOutcome, OverlayError> {
    params.validate()?;

    let overlay_id = params.overlay_id();
    for id in [params.unique_id.as_str(), overlay_id.as_str()] {
        if doc.element_by_id(id).is_some() {
            return Err(OverlayError::DuplicateId(id.to_string()));
        }
    }

    let Some(container) = doc.first_by_class(&params.container_class) else {
        log::warn!("no element with class {:?}; overlay {} skipped", params.container_class, params.unique_id);
        return Ok(ApplyOutcome::ContainerNotFound);
    };
    let target = locate_char(doc, container, params.target_char_index, strategy)?;
    let range = char_range(doc, target).ok_or_else(|| OverlayError::IndexOutOfRange {
        index: params.target_char_index,
        len: text_len(doc, container),
    })?;
    let character = char_at(doc, target);

    doc.set_style_property(container, "position", "relative");
    doc.set_style_property(container, "z-index", "2");

    let wrapper = wrap_character(doc, target.node, range, &params.unique_id);

    let element = doc.create_element("div");
    doc.set_attribute(element, "style", style_template(params));
    doc.set_attribute(element, "id", overlay_id);
    doc.insert_after(container, element);

    let overlay = Overlay {
        unique_id: params.unique_id.clone(),
        container,
        wrapper,
        element,
        image_size: params.image_size,
        offset: (params.offset_x, params.offset_y),
    };
    overlay.reposition(doc, layout)?;
    log::debug!(
        "applied overlay {} at character {} ({:?}) of .{}",
        params.unique_id,
        params.target_char_index,
        character,
        params.container_class
    );

    Ok(ApplyOutcome::Applied(overlay))
}

/// Byte range of the located character within its text node
fn char_range(doc: &Document, target: TextPosition) -> Option<Range<usize>> {
    let (start, ch) = doc.text(target.node)?.char_indices().nth(target.offset)?;
    Some(start..start + ch.len_utf8())
}

/// Split `node` into before / `span#id` / after around the byte `range`.
fn wrap_character(doc: &mut Document, node: NodeId, range: Range<usize>, id: &str) -> NodeId {
    let text = doc.text(node).unwrap_or_default().to_string();
    doc.set_text(node, &text[..range.start]);

    let wrapper = doc.create_element("span");
    doc.set_attribute(wrapper, "id", id);
    let inner = doc.create_text(&text[range.clone()]);
    doc.append_child(wrapper, inner);
    doc.insert_after(node, wrapper);

    let after = doc.create_text(&text[range.end..]);
    doc.insert_after(wrapper, after);
    wrapper
}
