//! Markup Document - Arena-based mutable DOM
//!
//! - Arena allocation for nodes; ids stay valid after detaching, so
//!   detached slots are never reused and the arena only grows
//! - NodeId indices for traversal
//! - String interning for names
//! - Inline style access through [`InlineStyle`]

use super::node::{Attribute, Node, NodeId, NodeKind, DOCUMENT_NODE};
use super::strings::StringPool;
use super::style::InlineStyle;
use crate::core::entities::{escape_attribute, escape_text};
use crate::error::MarkupError;
use crate::reader::{MarkupEvent, SliceReader};
use std::borrow::Cow;

/// A mutable markup document stored in arena format
#[derive(Debug)]
pub struct Document {
    /// Arena of nodes; slot 0 is the document node
    nodes: Vec<Node>,
    /// Interned element and attribute names
    pub strings: StringPool,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Document {
            nodes: vec![Node::document()],
            strings: StringPool::new(),
        }
    }

    /// Parse a markup document
    ///
    /// Tags must be balanced and attributes quoted. Several top-level
    /// elements are allowed so fragments parse as-is.
    pub fn parse(input: &str) -> Result<Self, MarkupError> {
        let mut doc = Document::new();
        doc.build_from_events(SliceReader::new(input.as_bytes()))?;
        Ok(doc)
    }

    /// Build DOM from markup events
    fn build_from_events(&mut self, reader: SliceReader<'_>) -> Result<(), MarkupError> {
        let mut stack: Vec<NodeId> = vec![DOCUMENT_NODE];

        for event in reader {
            let parent = *stack.last().unwrap_or(&DOCUMENT_NODE);
            match event? {
                MarkupEvent::StartElement(elem) => {
                    let id = self.element_from_event(&elem);
                    self.append_child(parent, id);
                    stack.push(id);
                }
                MarkupEvent::EmptyElement(elem) => {
                    let id = self.element_from_event(&elem);
                    self.append_child(parent, id);
                }
                MarkupEvent::EndElement(end) => {
                    let found = lossy(&end.name);
                    if stack.len() == 1 {
                        return Err(MarkupError::UnexpectedEndTag(found.into_owned()));
                    }
                    let open = stack[stack.len() - 1];
                    let expected = self.node_name(open).unwrap_or_default();
                    if expected != found {
                        return Err(MarkupError::MismatchedTag {
                            expected: expected.to_string(),
                            found: found.into_owned(),
                        });
                    }
                    stack.pop();
                }
                MarkupEvent::Text(content) => {
                    // Whitespace between top-level nodes is formatting, not content
                    if stack.len() == 1 && content.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    let id = self.push(Node::text(lossy(&content).into_owned()));
                    self.append_child(parent, id);
                }
                MarkupEvent::CData(content) => {
                    let id = self.push(Node::cdata(lossy(&content).into_owned()));
                    self.append_child(parent, id);
                }
                MarkupEvent::Comment(content) => {
                    let id = self.push(Node::comment(lossy(&content).into_owned()));
                    self.append_child(parent, id);
                }
                MarkupEvent::ProcessingInstruction { target, data } => {
                    if target.as_ref() == b"xml" {
                        continue;
                    }
                    let target_id = self.strings.intern(&lossy(&target));
                    let data = data.map(|d| lossy(&d).into_owned()).unwrap_or_default();
                    let id = self.push(Node::processing_instruction(target_id, data));
                    self.append_child(parent, id);
                }
                MarkupEvent::DocType(_) => {}
            }
        }

        if stack.len() > 1 {
            let unclosed = self.node_name(stack[1]).unwrap_or_default().to_string();
            return Err(MarkupError::UnclosedTag(unclosed));
        }
        Ok(())
    }

    fn element_from_event(&mut self, elem: &crate::reader::events::StartElement<'_>) -> NodeId {
        let name_id = self.strings.intern(&lossy(&elem.name));
        let mut node = Node::element(name_id);
        for attr in &elem.attributes {
            let attr_name = self.strings.intern(&lossy(&attr.name));
            node.attributes.push(Attribute::new(attr_name, lossy(&attr.value).into_owned()));
        }
        self.push(node)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    // =========================================================================
    // Node creation and tree mutation
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let name_id = self.strings.intern(name);
        self.push(Node::element(name_id))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(Node::text(content.into()))
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last_child = self.nodes[parent as usize].last_child;

        if let Some(last_id) = last_child {
            self.nodes[child as usize].prev_sibling = Some(last_id);
            self.nodes[last_id as usize].next_sibling = Some(child);
        } else {
            self.nodes[parent as usize].first_child = Some(child);
        }
        self.nodes[parent as usize].last_child = Some(child);
        self.nodes[child as usize].parent = Some(parent);
    }

    /// Insert `node` immediately after `reference` under the same parent.
    ///
    /// Returns false (and does nothing) when `reference` has no parent.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.get_node(reference).and_then(|n| n.parent) else {
            return false;
        };
        self.detach(node);
        let next = self.nodes[reference as usize].next_sibling;

        self.nodes[node as usize].parent = Some(parent);
        self.nodes[node as usize].prev_sibling = Some(reference);
        self.nodes[node as usize].next_sibling = next;
        self.nodes[reference as usize].next_sibling = Some(node);
        match next {
            Some(next_id) => self.nodes[next_id as usize].prev_sibling = Some(node),
            None => self.nodes[parent as usize].last_child = Some(node),
        }
        true
    }

    /// Unlink a node from its parent and siblings. The node and its subtree
    /// stay in the arena and can be reinserted.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id as usize) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        let Some(parent) = parent else {
            return;
        };

        match prev {
            Some(p) => self.nodes[p as usize].next_sibling = next,
            None => self.nodes[parent as usize].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n as usize].prev_sibling = prev,
            None => self.nodes[parent as usize].last_child = prev,
        }

        let node = &mut self.nodes[id as usize];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Check whether a node is reachable from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            if cid == DOCUMENT_NODE {
                return true;
            }
            current = self.get_node(cid).and_then(|n| n.parent);
        }
        false
    }

    /// Replace the content of a text, CDATA or comment node
    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) -> bool {
        match self.nodes.get_mut(id as usize) {
            Some(node) if node.kind != NodeKind::Element && node.kind != NodeKind::Document => {
                node.text = content.into();
                true
            }
            _ => false,
        }
    }

    /// Join runs of adjacent text nodes under `parent` into the first node
    /// of each run. CDATA sections are left alone.
    pub fn merge_adjacent_text(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self.children(parent).collect();
        let mut head: Option<NodeId> = None;
        for child in children {
            if self.nodes[child as usize].kind != NodeKind::Text {
                head = None;
                continue;
            }
            match head {
                Some(h) => {
                    let tail = std::mem::take(&mut self.nodes[child as usize].text);
                    self.nodes[h as usize].text.push_str(&tail);
                    self.detach(child);
                }
                None => head = Some(child),
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Get the first element child of the document
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.children(DOCUMENT_NODE)
            .find(|&id| self.get_node(id).is_some_and(Node::is_element))
    }

    /// Get node name as string (elements and PI targets)
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => self.strings.get_str(node.name_id),
            _ => None,
        }
    }

    /// Get the character data of a text or CDATA node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        node.is_text().then_some(node.text.as_str())
    }

    /// Get attribute value by name
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name_id = self.strings.lookup(name)?;
        self.get_node(id)?
            .attributes
            .iter()
            .find(|a| a.name_id == name_id)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute on an element, replacing any existing value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        let name_id = self.strings.intern(name);
        let value = value.into();
        let Some(node) = self.nodes.get_mut(id as usize).filter(|n| n.is_element()) else {
            return false;
        };
        match node.attributes.iter_mut().find(|a| a.name_id == name_id) {
            Some(attr) => attr.value = value,
            None => node.attributes.push(Attribute::new(name_id, value)),
        }
        true
    }

    /// Get all attribute names and values for a node
    pub fn get_attribute_values(&self, id: NodeId) -> Vec<(&str, &str)> {
        self.get_node(id)
            .map(|node| {
                node.attributes
                    .iter()
                    .filter_map(|attr| Some((self.strings.get_str(attr.name_id)?, attr.value.as_str())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parse the element's `style` attribute
    pub fn style(&self, id: NodeId) -> InlineStyle {
        InlineStyle::parse(self.get_attribute(id, "style").unwrap_or_default())
    }

    /// Set one inline style property, keeping the other declarations
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: impl Into<String>) -> bool {
        let mut style = self.style(id);
        style.set(property, value);
        self.set_attribute(id, "style", style.to_css())
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node in document order
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        self.push_children_reversed(id, &mut stack);
        DescendantIter { doc: self, stack }
    }

    fn push_children_reversed(&self, id: NodeId, stack: &mut Vec<NodeId>) {
        let mut child_id = self.get_node(id).and_then(|n| n.last_child);
        while let Some(cid) = child_id {
            stack.push(cid);
            child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
        }
    }

    /// Get total number of nodes in the arena, detached ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    /// Find the attached element with the given `id` attribute
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(DOCUMENT_NODE).find(|&node| {
            self.get_node(node).is_some_and(Node::is_element) && self.get_attribute(node, "id") == Some(id)
        })
    }

    /// Find the first element in document order whose class list contains `class`
    pub fn first_by_class(&self, class: &str) -> Option<NodeId> {
        self.descendants(DOCUMENT_NODE).find(|&node| {
            self.get_node(node).is_some_and(Node::is_element)
                && self
                    .get_attribute(node, "class")
                    .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
        })
    }

    /// Resolve a simple `#id` or `.class` selector
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        if let Some(id) = selector.strip_prefix('#') {
            self.element_by_id(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            self.first_by_class(class)
        } else {
            None
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize the whole document
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for child in self.children(DOCUMENT_NODE) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get_node(id) else {
            return;
        };
        match node.kind {
            NodeKind::Document => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Element => {
                let name = self.strings.get_str(node.name_id).unwrap_or_default();
                out.push('<');
                out.push_str(name);
                for (attr_name, value) in self.get_attribute_values(id) {
                    out.push(' ');
                    out.push_str(attr_name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Text => out.push_str(&escape_text(&node.text)),
            NodeKind::CData => {
                out.push_str("<![CDATA[");
                out.push_str(&node.text);
                out.push_str("]]>");
            }
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&node.text);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction => {
                out.push_str("<?");
                out.push_str(self.strings.get_str(node.name_id).unwrap_or_default());
                if !node.text.is_empty() {
                    out.push(' ');
                    out.push_str(&node.text);
                }
                out.push_str("?>");
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first, document order)
pub struct DescendantIter<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.doc.push_children_reversed(current, &mut self.stack);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let doc = Document::parse("<root>hello</root>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("root"));
        let text = doc.children(root).next().unwrap();
        assert_eq!(doc.text(text), Some("hello"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = Document::parse("<root><a/><b><c/></b><d/></root>").unwrap();
        let root = doc.root_element_id().unwrap();
        let names: Vec<_> = doc.descendants(root).filter_map(|id| doc.node_name(id)).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_siblings() {
        let doc = Document::parse("<root><a/><b/><c/></root>").unwrap();
        let root = doc.root_element_id().unwrap();
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 3);

        let first = doc.get_node(children[0]).unwrap();
        assert!(first.prev_sibling.is_none());
        assert_eq!(first.next_sibling, Some(children[1]));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Document::parse("<a><b></a>"),
            Err(MarkupError::MismatchedTag { .. })
        ));
        assert!(matches!(Document::parse("</a>"), Err(MarkupError::UnexpectedEndTag(_))));
        assert_eq!(
            Document::parse("<a><b/>").unwrap_err(),
            MarkupError::UnclosedTag("a".to_string())
        );
    }

    #[test]
    fn test_insert_after_and_detach() {
        let mut doc = Document::parse("<p>ab</p>").unwrap();
        let p = doc.root_element_id().unwrap();
        let text = doc.children(p).next().unwrap();

        let span = doc.create_element("span");
        assert!(doc.insert_after(text, span));
        let tail = doc.create_text("z");
        assert!(doc.insert_after(span, tail));
        assert_eq!(doc.to_markup(), "<p>ab<span></span>z</p>");
        assert_eq!(doc.get_node(p).unwrap().last_child, Some(tail));

        doc.detach(span);
        assert!(!doc.is_attached(span));
        assert_eq!(doc.to_markup(), "<p>abz</p>");
        assert_eq!(doc.get_node(tail).unwrap().prev_sibling, Some(text));
    }

    #[test]
    fn test_merge_adjacent_text() {
        let mut doc = Document::parse("<p>a<![CDATA[b]]><i/></p>").unwrap();
        let p = doc.root_element_id().unwrap();
        let first = doc.children(p).next().unwrap();
        let cdata = doc.get_node(first).unwrap().next_sibling.unwrap();
        for part in ["", "c", "d"] {
            let text = doc.create_text(part);
            doc.insert_after(first, text);
        }
        let tail = doc.create_text("e");
        doc.append_child(p, tail);
        let extra = doc.create_text("f");
        doc.append_child(p, extra);

        doc.merge_adjacent_text(p);
        assert_eq!(doc.text(first), Some("adc"));
        assert_eq!(doc.get_node(first).unwrap().next_sibling, Some(cdata));
        assert_eq!(doc.text(tail), Some("ef"));
        assert!(!doc.is_attached(extra));
        assert_eq!(doc.to_markup(), "<p>adc<![CDATA[b]]><i></i>ef</p>");
    }

    #[test]
    fn test_insert_after_requires_parent() {
        let mut doc = Document::new();
        let lone = doc.create_element("div");
        let other = doc.create_text("x");
        assert!(!doc.insert_after(lone, other));
    }

    #[test]
    fn test_selectors() {
        let doc = Document::parse(
            "<body><p class=\"intro\">x</p><div id=\"main\" class=\"t  wide\">y</div><div class=\"t\"/></body>",
        )
        .unwrap();
        let main = doc.element_by_id("main").unwrap();
        assert_eq!(doc.first_by_class("t"), Some(main));
        assert_eq!(doc.query(".wide"), Some(main));
        assert_eq!(doc.query("#main"), Some(main));
        assert_eq!(doc.query(".missing"), None);
        assert_eq!(doc.query("div"), None);
    }

    #[test]
    fn test_style_property() {
        let mut doc = Document::parse("<div style=\"color: red\">x</div>").unwrap();
        let div = doc.root_element_id().unwrap();
        doc.set_style_property(div, "position", "relative");
        doc.set_style_property(div, "color", "blue");
        assert_eq!(doc.get_attribute(div, "style"), Some("color: blue; position: relative;"));
    }

    #[test]
    fn test_round_trip_markup() {
        let src = "<div class=\"t\">a &amp; b<!--note--><em title=\"&quot;q&quot;\">C</em><![CDATA[<raw>]]></div>";
        let doc = Document::parse(src).unwrap();
        assert_eq!(doc.to_markup(), src);
    }
}
