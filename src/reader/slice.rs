//! Zero-Copy Slice Reader
//!
//! Pulls markup events from a byte slice. Names and undecoded content
//! borrow directly from the input.

use super::events::{EndElement, MarkupEvent, StartElement};
use crate::core::attributes::{is_name_char, is_whitespace, parse_attributes};
use crate::core::entities::decode_text;
use crate::error::MarkupError;
use memchr::{memchr, memchr3, memmem};
use std::borrow::Cow;

/// Zero-copy markup reader from a byte slice
pub struct SliceReader<'a> {
    input: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> SliceReader<'a> {
    /// Create a new slice reader
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader {
            input,
            pos: 0,
            failed: false,
        }
    }

    /// Get the next markup event, or `None` at end of input
    pub fn next_event(&mut self) -> Option<Result<MarkupEvent<'a>, MarkupError>> {
        if self.failed || self.pos >= self.input.len() {
            return None;
        }

        let result = if self.input[self.pos] == b'<' {
            self.read_markup()
        } else {
            Ok(self.read_text())
        };

        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn read_text(&mut self) -> MarkupEvent<'a> {
        let input = self.input;
        let start = self.pos;
        let end = memchr(b'<', &input[start..]).map_or(input.len(), |i| start + i);
        self.pos = end;
        MarkupEvent::Text(decode_text(&input[start..end]))
    }

    fn read_markup(&mut self) -> Result<MarkupEvent<'a>, MarkupError> {
        let start = self.pos;
        let rest = &self.input[start..];

        if rest.starts_with(b"<!--") {
            let body = self.read_until(start + 4, b"-->", "comment")?;
            return Ok(MarkupEvent::Comment(Cow::Borrowed(body)));
        }
        if rest.starts_with(b"<![CDATA[") {
            let body = self.read_until(start + 9, b"]]>", "CDATA section")?;
            return Ok(MarkupEvent::CData(Cow::Borrowed(body)));
        }
        if rest.starts_with(b"<!") {
            let body = self.read_until(start + 2, b">", "declaration")?;
            return Ok(MarkupEvent::DocType(Cow::Borrowed(body)));
        }
        if rest.starts_with(b"<?") {
            let body = self.read_until(start + 2, b"?>", "processing instruction")?;
            let name_len = body.iter().take_while(|&&b| is_name_char(b)).count();
            if name_len == 0 {
                return Err(MarkupError::EmptyTagName { offset: start });
            }
            let data = trim_ascii(&body[name_len..]);
            return Ok(MarkupEvent::ProcessingInstruction {
                target: Cow::Borrowed(&body[..name_len]),
                data: (!data.is_empty()).then_some(Cow::Borrowed(data)),
            });
        }
        if rest.starts_with(b"</") {
            let body = trim_ascii(self.read_until(start + 2, b">", "end tag")?);
            if body.is_empty() {
                return Err(MarkupError::EmptyTagName { offset: start });
            }
            return Ok(MarkupEvent::EndElement(EndElement::new(body)));
        }

        self.read_start_tag(start)
    }

    /// Read `<name attrs...>` or `<name attrs.../>`, honoring quoted `>`.
    fn read_start_tag(&mut self, start: usize) -> Result<MarkupEvent<'a>, MarkupError> {
        let input = self.input;
        let mut cursor = start + 1;
        let close = loop {
            let Some(i) = memchr3(b'>', b'"', b'\'', &input[cursor..]) else {
                return Err(MarkupError::Unterminated {
                    construct: "start tag",
                    offset: start,
                });
            };
            let at = cursor + i;
            match input[at] {
                b'>' => break at,
                quote => {
                    let Some(q) = memchr(quote, &input[at + 1..]) else {
                        return Err(MarkupError::Unterminated {
                            construct: "start tag",
                            offset: start,
                        });
                    };
                    cursor = at + 1 + q + 1;
                }
            }
        };
        self.pos = close + 1;

        let mut body = &input[start + 1..close];
        let is_empty = body.last() == Some(&b'/');
        if is_empty {
            body = &body[..body.len() - 1];
        }

        let name_len = body.iter().take_while(|&&b| is_name_char(b)).count();
        if name_len == 0 {
            return Err(MarkupError::EmptyTagName { offset: start });
        }
        let after_name = &body[name_len..];
        if !after_name.is_empty() && !is_whitespace(after_name[0]) {
            return Err(MarkupError::Attribute {
                message: "expected whitespace after tag name",
                offset: start + 1 + name_len,
            });
        }

        let attributes = parse_attributes(after_name).map_err(|(message, at)| MarkupError::Attribute {
            message,
            offset: start + 1 + name_len + at,
        })?;

        let element = StartElement::new(&body[..name_len], attributes);
        Ok(if is_empty {
            MarkupEvent::EmptyElement(element)
        } else {
            MarkupEvent::StartElement(element)
        })
    }

    /// Return the bytes between `from` and `terminator`, advancing past it.
    fn read_until(
        &mut self,
        from: usize,
        terminator: &[u8],
        construct: &'static str,
    ) -> Result<&'a [u8], MarkupError> {
        let input = self.input;
        match memmem::find(&input[from..], terminator) {
            Some(i) => {
                self.pos = from + i + terminator.len();
                Ok(&input[from..from + i])
            }
            None => Err(MarkupError::Unterminated {
                construct,
                offset: self.pos,
            }),
        }
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = Result<MarkupEvent<'a>, MarkupError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_whitespace(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| !is_whitespace(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_events(input: &[u8]) -> Result<Vec<MarkupEvent<'_>>, MarkupError> {
        SliceReader::new(input).collect()
    }

    fn attribute<'e>(elem: &'e StartElement<'_>, name: &str) -> Option<&'e [u8]> {
        elem.attributes
            .iter()
            .find(|a| a.name.as_ref() == name.as_bytes())
            .map(|a| a.value.as_ref())
    }

    #[test]
    fn test_simple_element() {
        let events = parse_events(b"<root>hello</root>").unwrap();
        assert_eq!(events.len(), 3);

        assert!(matches!(&events[0], MarkupEvent::StartElement(e) if e.name.as_ref() == b"root"));
        assert!(matches!(&events[1], MarkupEvent::Text(t) if t.as_ref() == b"hello"));
        assert!(matches!(&events[2], MarkupEvent::EndElement(e) if e.name.as_ref() == b"root"));
    }

    #[test]
    fn test_empty_element() {
        let events = parse_events(b"<br/>").unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], MarkupEvent::EmptyElement(e) if e.name.as_ref() == b"br"));
    }

    #[test]
    fn test_attributes() {
        let events = parse_events(b"<div id=\"main\" class=\"t big\" />").unwrap();
        let MarkupEvent::EmptyElement(e) = &events[0] else {
            panic!("Expected EmptyElement");
        };
        assert_eq!(attribute(e, "id"), Some(&b"main"[..]));
        assert_eq!(attribute(e, "class"), Some(&b"t big"[..]));
    }

    #[test]
    fn test_quoted_angle_bracket() {
        let events = parse_events(b"<a title=\"x > y\">z</a>").unwrap();
        let MarkupEvent::StartElement(e) = &events[0] else {
            panic!("Expected StartElement");
        };
        assert_eq!(attribute(e, "title"), Some(&b"x > y"[..]));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_cdata_comment_pi() {
        let events = parse_events(b"<?xml version=\"1.0\"?><p><!-- c --><![CDATA[a<b]]></p>").unwrap();
        assert!(matches!(&events[0], MarkupEvent::ProcessingInstruction { target, .. } if target.as_ref() == b"xml"));
        assert!(matches!(&events[2], MarkupEvent::Comment(c) if c.as_ref() == b" c "));
        assert!(matches!(&events[3], MarkupEvent::CData(c) if c.as_ref() == b"a<b"));
    }

    #[test]
    fn test_entities_in_text() {
        let events = parse_events(b"<p>a &amp; b</p>").unwrap();
        assert!(matches!(&events[1], MarkupEvent::Text(t) if t.as_ref() == b"a & b"));
    }

    #[test]
    fn test_unterminated() {
        assert!(matches!(
            parse_events(b"<p>text<!-- open"),
            Err(MarkupError::Unterminated { construct: "comment", .. })
        ));
        assert!(matches!(
            parse_events(b"<p class=\"x"),
            Err(MarkupError::Unterminated { construct: "start tag", .. })
        ));
    }

    #[test]
    fn test_stops_after_error() {
        let mut reader = SliceReader::new(b"< >after");
        assert!(matches!(reader.next(), Some(Err(MarkupError::EmptyTagName { offset: 0 }))));
        assert!(reader.next().is_none());
    }
}
