//! Restore direction: lift an embedded signature out of a commit message

use super::record::{Signature, EMBEDDED_MARKER, EMBEDDED_SEPARATOR};

/// Outcome of looking for an embedded signature in a message.
///
/// Detection takes the last marker in the message rather than the first, so
/// a message that quotes the marker earlier on still yields the trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// No marker in the message.
    Absent,
    /// A marker was found but could not be split into type and payload.
    Malformed,
    Found {
        /// The message with separator, marker and payload removed.
        message: Vec<u8>,
        signature: Signature,
    },
}

/// Split `message` into the cleaned message and the signature stored by
/// [`embed_signature`](super::store::embed_signature).
///
/// The last `\n\noriginal_gpgsig ` occurrence wins, since the stored
/// signature is always appended at the very end of the message.
pub fn extract_signature(message: &[u8]) -> Extraction {
    let needle_len = EMBEDDED_SEPARATOR.len() + EMBEDDED_MARKER.len();
    let Some(start) = message.windows(needle_len).rposition(is_marker) else {
        return Extraction::Absent;
    };

    let section = &message[start + needle_len..];
    let Some(newline) = section.iter().position(|&b| b == b'\n') else {
        return Extraction::Malformed;
    };

    let kind = &section[..newline];
    let payload = &section[newline + 1..];
    if kind.is_empty() || payload.is_empty() {
        return Extraction::Malformed;
    }

    // The first separator LF is the message's own trailing LF, except for
    // an empty message, where both LFs were added on store.
    let cleaned = if start == 0 {
        Vec::new()
    } else {
        message[..=start].to_vec()
    };
    Extraction::Found {
        message: cleaned,
        signature: Signature::new(kind, payload),
    }
}

fn is_marker(window: &[u8]) -> bool {
    let (separator, marker) = window.split_at(EMBEDDED_SEPARATOR.len());
    separator == EMBEDDED_SEPARATOR && marker == EMBEDDED_MARKER
}
