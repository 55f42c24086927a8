//! Attribute Parsing
//!
//! Parses attributes from tag content.

use super::entities::decode_text;
use std::borrow::Cow;

/// A parsed attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name
    pub name: Cow<'a, [u8]>,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    /// Create a new attribute
    pub fn new(name: &'a [u8], value: Cow<'a, [u8]>) -> Self {
        Attribute {
            name: Cow::Borrowed(name),
            value,
        }
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// Input should be the content between element name and '>' or '/>'.
/// On failure returns the message and the offset into `input`.
pub fn parse_attributes(input: &[u8]) -> Result<Vec<Attribute<'_>>, (&'static str, usize)> {
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        pos = skip_whitespace(input, pos);
        if pos >= input.len() {
            break;
        }

        if !is_name_start_char(input[pos]) {
            return Err(("attribute name must start with letter, underscore, or colon", pos));
        }
        let name_start = pos;
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        pos = skip_whitespace(input, pos);
        if input.get(pos) != Some(&b'=') {
            return Err(("attribute value required", pos));
        }
        pos = skip_whitespace(input, pos + 1);

        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(("attribute value must be quoted", pos)),
        };
        let value_start = pos + 1;
        let Some(len) = memchr::memchr(quote, &input[value_start..]) else {
            return Err(("attribute value has mismatched quotes", pos));
        };
        let value = decode_text(&input[value_start..value_start + len]);
        pos = value_start + len + 1;

        if attrs.iter().any(|a| a.name.as_ref() == name) {
            return Err(("duplicate attribute", name_start));
        }
        attrs.push(Attribute::new(name, value));
    }

    Ok(attrs)
}

#[inline]
fn skip_whitespace(input: &[u8], mut pos: usize) -> usize {
    while pos < input.len() && is_whitespace(input[pos]) {
        pos += 1;
    }
    pos
}

/// Check if byte is a valid NameStartChar (non-ASCII accepted as-is)
#[inline]
fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is whitespace
#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if byte is valid in a name
#[inline]
pub(crate) fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(b" id=\"test\" class=\"foo\"").unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name.as_ref(), b"id");
        assert_eq!(attrs[0].value.as_ref(), b"test");
        assert_eq!(attrs[1].name.as_ref(), b"class");
        assert_eq!(attrs[1].value.as_ref(), b"foo");
    }

    #[test]
    fn test_single_quoted() {
        let attrs = parse_attributes(b" style='color: red'").unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value.as_ref(), b"color: red");
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(b" title=\"&lt;hello&gt;\"").unwrap();
        assert_eq!(attrs[0].value.as_ref(), b"<hello>");
    }

    #[test]
    fn test_whitespace_handling() {
        let attrs = parse_attributes(b"  id  =  \"test\"  ").unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value.as_ref(), b"test");
    }

    #[test]
    fn test_empty_attributes() {
        assert!(parse_attributes(b"").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_attributes(b" id=test").is_err());
        assert!(parse_attributes(b" checked").is_err());
        assert!(parse_attributes(b" id=\"open").is_err());
        assert_eq!(
            parse_attributes(b" a=\"1\" a=\"2\"").unwrap_err().0,
            "duplicate attribute"
        );
    }
}
