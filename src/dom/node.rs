//! Document Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// ID of the document node, always the first arena slot
pub const DOCUMENT_NODE: NodeId = 0;

/// Type of node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the document node and detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the element name or PI target
    pub name_id: u32,
    /// Element attributes in source order
    pub attributes: Vec<Attribute>,
    /// Character data for text, CDATA, comment and PI nodes
    pub text: String,
}

impl Node {
    fn new(kind: NodeKind, name_id: u32, text: String) -> Self {
        Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id,
            attributes: Vec::new(),
            text,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::new(NodeKind::Document, 0, String::new())
    }

    /// Create a new element node
    pub fn element(name_id: u32) -> Self {
        Self::new(NodeKind::Element, name_id, String::new())
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::new(NodeKind::Text, 0, content)
    }

    /// Create a new CDATA node
    pub fn cdata(content: String) -> Self {
        Self::new(NodeKind::CData, 0, content)
    }

    /// Create a new comment node
    pub fn comment(content: String) -> Self {
        Self::new(NodeKind::Comment, 0, content)
    }

    /// Create a processing instruction node
    pub fn processing_instruction(target_id: u32, data: String) -> Self {
        Self::new(NodeKind::ProcessingInstruction, target_id, data)
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node carries rendered text (text or CDATA)
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }
}

/// Stored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Index into string pool for attribute name
    pub name_id: u32,
    /// Attribute value
    pub value: String,
}

impl Attribute {
    pub fn new(name_id: u32, value: String) -> Self {
        Attribute { name_id, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = Node::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert!(doc.first_child.is_none());
    }

    #[test]
    fn test_text_kinds() {
        assert!(Node::text("a".into()).is_text());
        assert!(Node::cdata("a".into()).is_text());
        assert!(!Node::comment("a".into()).is_text());
        assert!(Node::element(1).is_element());
    }
}
