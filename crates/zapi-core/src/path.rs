//! Resource path encoding.
//!
//! ZAPI addresses entities with slash-separated identifiers, so a `/` inside
//! an identifier (a farm named `web/public`, a certificate path) is written
//! as `~` on the wire.

/// Path separator used between segments.
pub const SEPARATOR: char = '/';

/// Substitute written in place of [`SEPARATOR`] inside a segment.
pub const ESCAPE: char = '~';

/// Join resource path segments into a single ZAPI path.
///
/// Segments are expected to be non-empty; an empty segment produces a
/// doubled separator.
#[must_use]
pub fn encode_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| segment.as_ref().replace(SEPARATOR, &ESCAPE.to_string()))
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Split an encoded path back into its segments.
#[must_use]
pub fn decode_path(encoded: &str) -> Vec<String> {
    encoded
        .split(SEPARATOR)
        .map(|segment| segment.replace(ESCAPE, &SEPARATOR.to_string()))
        .collect()
}
