//! Inline style declarations
//!
//! Ordered `property: value;` pairs as found in a `style` attribute.
//! Updating a property keeps its original position so a rewritten style
//! string differs from the input only in the changed values.

/// Parsed inline style
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse a `style` attribute value.
    ///
    /// Splits on `;` outside quotes and parentheses, so values like
    /// `url('data:image/png;base64,...')` stay intact. A backslash escapes
    /// the next character. Declarations without
    /// a `:` are dropped.
    pub fn parse(css: &str) -> Self {
        let mut declarations = Vec::new();
        for chunk in split_declarations(css) {
            let Some((property, value)) = chunk.split_once(':') else {
                continue;
            };
            let property = property.trim();
            if property.is_empty() {
                continue;
            }
            declarations.push((property.to_ascii_lowercase(), value.trim().to_string()));
        }
        InlineStyle { declarations }
    }

    /// Get a property value
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, replacing in place or appending
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.declarations.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value,
            None => self.declarations.push((property.to_string(), value)),
        }
    }

    /// Remove a property, returning its value
    pub fn remove(&mut self, property: &str) -> Option<String> {
        let pos = self.declarations.iter().position(|(p, _)| p == property)?;
        Some(self.declarations.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialize as `a: b; c: d;`
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (property, value) in &self.declarations {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(property);
            out.push_str(": ");
            out.push_str(value);
            out.push(';');
        }
        out
    }
}

fn split_declarations(css: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in css.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&css[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&css[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let style = InlineStyle::parse("position: absolute;top:0 ; left: 0;");
        assert_eq!(style.len(), 3);
        assert_eq!(style.get("top"), Some("0"));
        assert_eq!(style.to_css(), "position: absolute; top: 0; left: 0;");
    }

    #[test]
    fn test_set_keeps_position() {
        let mut style = InlineStyle::parse("opacity: 1; top: 0; left: 0; z-index: 1;");
        style.set("left", "-12.5px");
        style.set("top", "40px");
        assert_eq!(style.to_css(), "opacity: 1; top: 40px; left: -12.5px; z-index: 1;");
        style.set("position", "relative");
        assert_eq!(style.get("position"), Some("relative"));
        assert_eq!(style.remove("opacity").as_deref(), Some("1"));
        assert_eq!(style.len(), 4);
    }

    #[test]
    fn test_url_with_semicolon() {
        let css = "background-image: url('data:image/png;base64,AAAA'); z-index: 1;";
        let style = InlineStyle::parse(css);
        assert_eq!(style.get("background-image"), Some("url('data:image/png;base64,AAAA')"));
        assert_eq!(style.to_css(), css);
    }

    #[test]
    fn test_empty() {
        let style = InlineStyle::parse("  ; ;");
        assert!(style.is_empty());
        assert_eq!(style.to_css(), "");
    }

    #[test]
    fn test_escaped_quote_in_url() {
        let css = r"background-image: url('it\'s;1.png'); background-size: contain; left: 0;";
        let mut style = InlineStyle::parse(css);
        assert_eq!(style.len(), 3);
        assert_eq!(style.get("background-image"), Some(r"url('it\'s;1.png')"));
        style.set("left", "4px");
        assert_eq!(
            style.to_css(),
            r"background-image: url('it\'s;1.png'); background-size: contain; left: 4px;"
        );
    }
}
