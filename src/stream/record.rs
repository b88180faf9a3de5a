//! Commit record pieces: header lines and signatures

use std::io::Write;

use super::block::write_block_lf;
use crate::error::Result;

/// Marker line that starts a commit record.
pub const COMMIT_PREFIX: &[u8] = b"commit ";
/// Native signature header, followed by the signature type.
pub const SIGNATURE_PREFIX: &[u8] = b"gpgsig ";
/// Marker that introduces a signature embedded in a commit message.
pub const EMBEDDED_MARKER: &[u8] = b"original_gpgsig ";
/// Blank-line separator that precedes [`EMBEDDED_MARKER`] inside a message.
pub const EMBEDDED_SEPARATOR: &[u8] = b"\n\n";

const ENCODING_PREFIX: &[u8] = b"encoding ";

/// An opaque commit signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Everything after `gpgsig ` on the header line, e.g. `sha1 openpgp`.
    pub kind: Vec<u8>,
    pub payload: Vec<u8>,
}

impl Signature {
    pub fn new(kind: impl Into<Vec<u8>>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// Write the native `gpgsig` header and its data block.
    pub fn write_header<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(SIGNATURE_PREFIX)?;
        out.write_all(&self.kind)?;
        out.write_all(b"\n")?;
        write_block_lf(out, &self.payload)
    }
}

/// One header line of a commit record, as discovered during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// Any header the transcoder does not interpret, kept with its LF.
    Opaque(Vec<u8>),
    Signature(Signature),
}

impl Header {
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            Header::Opaque(line) => {
                out.write_all(line)?;
                Ok(())
            }
            Header::Signature(signature) => signature.write_header(out),
        }
    }

    fn is_encoding(&self) -> bool {
        matches!(self, Header::Opaque(line) if line.starts_with(ENCODING_PREFIX))
    }
}

/// Position at which a native signature header may be inserted.
///
/// fast-import accepts `gpgsig` only after `committer` and before `encoding`.
pub fn signature_insert_position(headers: &[Header]) -> usize {
    headers
        .iter()
        .position(Header::is_encoding)
        .unwrap_or(headers.len())
}
