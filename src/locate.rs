//! Character locator
//!
//! Maps an index into a container's flattened text (the depth-first
//! concatenation of its text and CDATA descendants) to the text node holding
//! that character and the character offset inside it. Comments and
//! processing instructions contribute no characters.
//!
//! Indices count Unicode scalar values.

use crate::dom::{Document, NodeId};
use crate::error::OverlayError;

/// A single character inside a text node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    /// Text or CDATA node holding the character
    pub node: NodeId,
    /// Character offset within the node
    pub offset: usize,
}

/// Walk used to find the character
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocateStrategy {
    /// Subtract each passed text node's length from the remaining index
    Decrement,
    /// Keep a running start offset and test each text node's range
    #[default]
    Cumulative,
}

/// Concatenate the text beneath `root` in document order
pub fn flattened_text(doc: &Document, root: NodeId) -> String {
    doc.descendants(root).filter_map(|id| doc.text(id)).collect()
}

/// Number of characters in the flattened text beneath `root`
pub fn text_len(doc: &Document, root: NodeId) -> usize {
    doc.descendants(root)
        .filter_map(|id| doc.text(id))
        .map(|text| text.chars().count())
        .sum()
}

/// Find the text node and offset of character `index` beneath `root`
pub fn locate(doc: &Document, root: NodeId, index: usize, strategy: LocateStrategy) -> Option<TextPosition> {
    match strategy {
        LocateStrategy::Decrement => find_decrement(doc, root, index),
        LocateStrategy::Cumulative => find_cumulative(doc, root, index, &mut 0),
    }
}

/// Like [`locate`], but reports a missing character as
/// [`OverlayError::IndexOutOfRange`].
pub fn locate_char(
    doc: &Document,
    root: NodeId,
    index: usize,
    strategy: LocateStrategy,
) -> Result<TextPosition, OverlayError> {
    locate(doc, root, index, strategy).ok_or_else(|| OverlayError::IndexOutOfRange {
        index,
        len: text_len(doc, root),
    })
}

/// Character at a located position
pub fn char_at(doc: &Document, position: TextPosition) -> Option<char> {
    doc.text(position.node)?.chars().nth(position.offset)
}

fn find_decrement(doc: &Document, node: NodeId, mut index: usize) -> Option<TextPosition> {
    for child in doc.children(node) {
        if let Some(text) = doc.text(child) {
            let len = text.chars().count();
            if index < len {
                return Some(TextPosition { node: child, offset: index });
            }
            index -= len;
        } else if doc.get_node(child).is_some_and(|n| n.is_element()) {
            if let Some(found) = find_decrement(doc, child, index) {
                return Some(found);
            }
            index -= text_len(doc, child);
        }
    }
    None
}

fn find_cumulative(doc: &Document, node: NodeId, index: usize, start: &mut usize) -> Option<TextPosition> {
    for child in doc.children(node) {
        if let Some(text) = doc.text(child) {
            let len = text.chars().count();
            if index < *start + len {
                return Some(TextPosition {
                    node: child,
                    offset: index - *start,
                });
            }
            *start += len;
        } else if let Some(found) = find_cumulative(doc, child, index, start) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    const STRATEGIES: [LocateStrategy; 2] = [LocateStrategy::Decrement, LocateStrategy::Cumulative];

    #[test]
    fn test_nested_lookup() {
        let doc = Document::parse("<div class=\"t\">AB<em>C</em>D</div>").unwrap();
        let div = doc.first_by_class("t").unwrap();
        assert_eq!(flattened_text(&doc, div), "ABCD");

        for strategy in STRATEGIES {
            let pos = locate(&doc, div, 2, strategy).unwrap();
            assert_eq!(char_at(&doc, pos), Some('C'));
            assert_eq!(pos.offset, 0);
            let parent = doc.get_node(pos.node).unwrap().parent.unwrap();
            assert_eq!(doc.node_name(parent), Some("em"));

            let pos = locate(&doc, div, 3, strategy).unwrap();
            assert_eq!(char_at(&doc, pos), Some('D'));
        }
    }

    #[test]
    fn test_comments_and_empty_elements_skipped() {
        let doc = Document::parse("<p>a<!--xyz--><br/><?pi data?>b<![CDATA[<c>]]></p>").unwrap();
        let p = doc.root_element_id().unwrap();
        assert_eq!(text_len(&doc, p), 5);
        for strategy in STRATEGIES {
            let pos = locate(&doc, p, 1, strategy).unwrap();
            assert_eq!(char_at(&doc, pos), Some('b'));
            let pos = locate(&doc, p, 2, strategy).unwrap();
            assert_eq!(char_at(&doc, pos), Some('<'));
        }
    }

    #[test]
    fn test_multibyte_offsets_are_chars() {
        let doc = Document::parse("<p>h\u{e9}llo \u{2605}</p>").unwrap();
        let p = doc.root_element_id().unwrap();
        let pos = locate(&doc, p, 6, LocateStrategy::Cumulative).unwrap();
        assert_eq!(pos.offset, 6);
        assert_eq!(char_at(&doc, pos), Some('\u{2605}'));
    }

    #[test]
    fn test_out_of_range() {
        let doc = Document::parse("<p>ab<i>c</i></p>").unwrap();
        let p = doc.root_element_id().unwrap();
        for strategy in STRATEGIES {
            assert!(locate(&doc, p, 3, strategy).is_none());
            assert_eq!(
                locate_char(&doc, p, 7, strategy),
                Err(OverlayError::IndexOutOfRange { index: 7, len: 3 })
            );
        }
    }

    #[test]
    fn test_empty_container() {
        let doc = Document::parse("<p><b/></p>").unwrap();
        let p = doc.root_element_id().unwrap();
        for strategy in STRATEGIES {
            assert!(locate(&doc, p, 0, strategy).is_none());
        }
    }

    /// Random element/text tree used to build documents for property tests
    #[derive(Debug, Clone)]
    enum Tree {
        Text(String),
        Element(Vec<Tree>),
    }

    impl Tree {
        fn generate(g: &mut Gen, depth: usize) -> Self {
            let leaf = depth == 0 || *g.choose(&[true, false, false]).unwrap_or(&true);
            if leaf {
                return Tree::Text(String::arbitrary(g));
            }
            let width = usize::arbitrary(g) % 4;
            Tree::Element((0..width).map(|_| Tree::generate(g, depth - 1)).collect())
        }

        fn build(&self, doc: &mut Document, parent: NodeId) {
            match self {
                Tree::Text(text) => {
                    let id = doc.create_text(text.clone());
                    doc.append_child(parent, id);
                }
                Tree::Element(children) => {
                    let id = doc.create_element("span");
                    doc.append_child(parent, id);
                    for child in children {
                        child.build(doc, id);
                    }
                }
            }
        }
    }

    impl Arbitrary for Tree {
        fn arbitrary(g: &mut Gen) -> Self {
            let width = usize::arbitrary(g) % 5 + 1;
            Tree::Element((0..width).map(|_| Tree::generate(g, 4)).collect())
        }
    }

    quickcheck::quickcheck! {
        fn prop_strategies_agree(tree: Tree) -> bool {
            let mut doc = Document::new();
            let root = doc.create_element("div");
            doc.append_child(crate::dom::DOCUMENT_NODE, root);
            tree.build(&mut doc, root);

            let flat: Vec<char> = flattened_text(&doc, root).chars().collect();
            let in_range = (0..flat.len()).all(|index| {
                let decrement = locate(&doc, root, index, LocateStrategy::Decrement);
                let cumulative = locate(&doc, root, index, LocateStrategy::Cumulative);
                decrement.is_some()
                    && decrement == cumulative
                    && decrement.and_then(|pos| char_at(&doc, pos)) == Some(flat[index])
            });

            in_range
                && locate(&doc, root, flat.len(), LocateStrategy::Decrement).is_none()
                && locate(&doc, root, flat.len(), LocateStrategy::Cumulative).is_none()
        }
    }
}
