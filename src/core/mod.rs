//! Core markup primitives shared by the reader and the DOM serializer.

pub mod attributes;
pub mod entities;
