//! Elixir Term Conversion Utilities
//!
//! Converts overlay results to Elixir terms.

use crate::geometry::Point;
use rustler::{Encoder, Env, NewBinary, Term};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    not_found,
    load,
    resize,
}

/// `{:ok, value}`
pub fn ok_tuple<'a>(env: Env<'a>, value: impl Encoder) -> Term<'a> {
    (ok(), value).encode(env)
}

/// `{:error, message}` with the message as a binary
pub fn error_tuple<'a>(env: Env<'a>, message: &str) -> Term<'a> {
    (error(), str_to_binary(env, message)).encode(env)
}

/// `{left, top}` of a repositioned overlay
pub fn point_to_term<'a>(env: Env<'a>, point: Point) -> Term<'a> {
    (point.x, point.y).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
