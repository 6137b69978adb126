//! Helpers for presenting server-provided text.

/// Maximum number of characters of a server error body shown to a user.
pub const PREVIEW_LEN: usize = 100;

/// Returns at most [`PREVIEW_LEN`] characters of `text`.
///
/// Cuts on a character boundary, never inside a multi-byte sequence.
pub fn preview(text: &str) -> &str {
    match text.char_indices().nth(PREVIEW_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
