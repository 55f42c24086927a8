//! Markup Event Types
//!
//! Event types for pull-parser style markup processing.

use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// Markup parsing event
#[derive(Debug, Clone)]
pub enum MarkupEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags (entities decoded)
    Text(Cow<'a, [u8]>),
    /// CDATA section content
    CData(Cow<'a, [u8]>),
    /// Comment content
    Comment(Cow<'a, [u8]>),
    /// Processing instruction: <?target data?>
    ProcessingInstruction {
        target: Cow<'a, [u8]>,
        data: Option<Cow<'a, [u8]>>,
    },
    /// DOCTYPE or other `<!...>` declaration
    DocType(Cow<'a, [u8]>),
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Element name
    pub name: Cow<'a, [u8]>,
    /// Element attributes
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    /// Create a new start element from a byte slice
    pub fn new(name: &'a [u8], attributes: Vec<Attribute<'a>>) -> Self {
        StartElement {
            name: Cow::Borrowed(name),
            attributes,
        }
    }
}

/// End element event data
#[derive(Debug, Clone)]
pub struct EndElement<'a> {
    /// Element name
    pub name: Cow<'a, [u8]>,
}

impl<'a> EndElement<'a> {
    /// Create a new end element from a byte slice
    pub fn new(name: &'a [u8]) -> Self {
        EndElement {
            name: Cow::Borrowed(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrowed_names() {
        let attr = Attribute::new(b"class", Cow::Borrowed(&b"t"[..]));
        let elem = StartElement::new(b"div", vec![attr]);
        assert!(matches!(elem.name, Cow::Borrowed(b"div")));
        assert_eq!(elem.attributes[0].value.as_ref(), b"t");
        assert!(matches!(EndElement::new(b"div").name, Cow::Borrowed(b"div")));
    }
}
