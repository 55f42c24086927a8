//! Error types for markup parsing and overlay application.

use thiserror::Error;

/// Failure while reading markup into a [`crate::dom::Document`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unterminated {construct} starting at byte {offset}")]
    Unterminated {
        construct: &'static str,
        offset: usize,
    },

    #[error("missing tag name at byte {offset}")]
    EmptyTagName { offset: usize },

    #[error("malformed attribute at byte {offset}: {message}")]
    Attribute {
        message: &'static str,
        offset: usize,
    },

    #[error("tag mismatch: <{expected}> closed with </{found}>")]
    MismatchedTag { expected: String, found: String },

    #[error("unexpected end tag </{0}> without matching start tag")]
    UnexpectedEndTag(String),

    #[error("unclosed tag <{0}>")]
    UnclosedTag(String),
}

/// Failure while applying, repositioning or removing an overlay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    #[error("unique id must not be empty")]
    EmptyId,

    #[error("invalid container class {0:?}: expected a bare class name")]
    InvalidContainerClass(String),

    #[error("image size must be a positive number of pixels")]
    InvalidImageSize,

    #[error("opacity {0} is outside [0, 1]")]
    InvalidOpacity(f64),

    #[error("rotation {0} is not a finite angle")]
    InvalidRotation(f64),

    #[error("an element with id {0:?} already exists")]
    DuplicateId(String),

    #[error("character index {index} is out of range for text of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("overlay {0:?} is no longer attached to the document")]
    Detached(String),

    #[error("no overlay registered under {0:?}")]
    UnknownOverlay(String),
}
