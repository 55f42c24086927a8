//! String Interning Pool
//!
//! Deduplicated storage for element and attribute names. Text content and
//! attribute values live on the nodes themselves since they get rewritten.

use std::collections::HashMap;

/// String interning pool
///
/// ID 0 is reserved for the empty string.
#[derive(Debug)]
pub struct StringPool {
    /// Strings indexed by ID
    entries: Vec<Box<str>>,
    /// Content -> ID
    index: HashMap<Box<str>, u32>,
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        StringPool {
            entries: vec![Box::from("")],
            index: HashMap::new(),
        }
    }

    /// Intern a string, returning its ID
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = self.entries.len() as u32;
        self.entries.push(Box::from(s));
        self.index.insert(Box::from(s), id);
        id
    }

    /// Look up the ID of an already interned string
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.index.get(s).copied()
    }

    /// Get string by ID
    #[inline]
    pub fn get_str(&self, id: u32) -> Option<&str> {
        self.entries.get(id as usize).map(|s| &**s)
    }

    /// Number of interned strings (including the reserved empty entry)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if only the reserved entry is present
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut pool = StringPool::new();
        let a = pool.intern("span");
        let b = pool.intern("div");
        let c = pool.intern("span");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pool.get_str(b), Some("div"));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_empty_is_reserved() {
        let mut pool = StringPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get_str(0), Some(""));
        assert_eq!(pool.lookup("missing"), None);
    }
}
