//! Store direction: fold a native signature into the commit message

use super::record::{Signature, EMBEDDED_MARKER};

/// Append `signature` to `message` behind a blank line and an
/// `original_gpgsig <kind>` marker line.
///
/// The payload is appended verbatim, so the result ends in LF only when the
/// payload does. Callers frame it with
/// [`write_block_lf`](super::block::write_block_lf).
pub fn embed_signature(message: &[u8], signature: &Signature) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        message.len() + EMBEDDED_MARKER.len() + signature.kind.len() + signature.payload.len() + 4,
    );
    out.extend_from_slice(message);
    if !out.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.push(b'\n');
    out.extend_from_slice(EMBEDDED_MARKER);
    out.extend_from_slice(&signature.kind);
    out.push(b'\n');
    out.extend_from_slice(&signature.payload);
    out
}
