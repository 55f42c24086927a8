//! Layout geometry
//!
//! The document has no renderer of its own; on-screen boxes come from a
//! [`LayoutProvider`] supplied by the host.

use crate::dom::{Document, NodeId};
use std::collections::HashMap;

/// Bounding box in viewport coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect { left, top, width, height }
    }
}

/// A 2D point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Source of current on-screen bounding boxes.
///
/// Queried on every reposition; answers must reflect the current layout.
pub trait LayoutProvider {
    /// Bounding box of `node`, or `None` when it has no box
    fn bounding_rect(&self, doc: &Document, node: NodeId) -> Option<Rect>;
}

impl<F> LayoutProvider for F
where
    F: Fn(&Document, NodeId) -> Option<Rect>,
{
    fn bounding_rect(&self, doc: &Document, node: NodeId) -> Option<Rect> {
        self(doc, node)
    }
}

/// Layout fed explicitly with per-node boxes, typically by a host that
/// measured the real page.
#[derive(Debug, Clone, Default)]
pub struct StaticLayout {
    rects: HashMap<NodeId, Rect>,
}

impl StaticLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, node: NodeId, rect: Rect) {
        self.rects.insert(node, rect);
    }

    pub fn remove(&mut self, node: NodeId) -> Option<Rect> {
        self.rects.remove(&node)
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl LayoutProvider for StaticLayout {
    fn bounding_rect(&self, _doc: &Document, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }
}

/// Top-left corner, relative to the container, of a square overlay of side
/// `size` whose center sits on the wrapper's top-left corner shifted by
/// `offset`.
pub fn overlay_origin(wrapper: Rect, container: Rect, offset: (i32, i32), size: u32) -> Point {
    let half = f64::from(size) / 2.0;
    Point {
        x: wrapper.left - container.left + f64::from(offset.0) - half,
        y: wrapper.top - container.top + f64::from(offset.1) - half,
    }
}

/// Format a pixel length the way CSS serializes numbers (`10px`, `-2.5px`)
pub fn px(value: f64) -> String {
    format!("{value}px")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_formula() {
        let wrapper = Rect::new(130.0, 75.0, 9.0, 18.0);
        let container = Rect::new(100.0, 50.0, 400.0, 100.0);
        let origin = overlay_origin(wrapper, container, (4, -6), 40);
        assert_eq!(origin, Point { x: 14.0, y: -1.0 });
    }

    #[test]
    fn test_center_independent_of_size() {
        let wrapper = Rect::new(37.5, 12.0, 8.0, 16.0);
        let container = Rect::new(10.0, 2.0, 300.0, 40.0);
        for size in [1, 2, 33, 64, 500] {
            let origin = overlay_origin(wrapper, container, (3, 5), size);
            let half = f64::from(size) / 2.0;
            assert_eq!((origin.x + half, origin.y + half), (30.5, 15.0));
        }
    }

    #[test]
    fn test_px() {
        assert_eq!(px(10.0), "10px");
        assert_eq!(px(-2.5), "-2.5px");
    }

    #[test]
    fn test_static_layout() {
        let doc = Document::new();
        let mut layout = StaticLayout::new();
        layout.set(3, Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(layout.bounding_rect(&doc, 3), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(layout.bounding_rect(&doc, 4), None);
        assert_eq!(layout.remove(3).map(|r| r.width), Some(3.0));
        assert!(layout.is_empty());
    }

    #[test]
    fn test_closure_layout() {
        let doc = Document::new();
        let layout = |_: &Document, node: NodeId| Some(Rect::new(f64::from(node), 0.0, 1.0, 1.0));
        assert_eq!(layout.bounding_rect(&doc, 7).map(|r| r.left), Some(7.0));
    }
}
