//! Record scanner and per-commit signature relocation

use std::{
    fmt,
    io::{BufRead, Write},
};

use super::{
    block::{copy_block, write_block, write_block_lf, DataBlock, DataHeader},
    reader::StreamReader,
    record::{signature_insert_position, Header, Signature, COMMIT_PREFIX, SIGNATURE_PREFIX},
    restore::{extract_signature, Extraction},
    store::embed_signature,
};
use crate::error::{Error, Result};

/// Direction in which signatures are relocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Native `gpgsig` header -> commit message.
    Store,
    /// Commit message -> native `gpgsig` header.
    Restore,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Store => write!(f, "store"),
            Mode::Restore => write!(f, "restore"),
        }
    }
}

/// Counters for one transcoding pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeStats {
    pub commits: u64,
    /// Signatures moved in the pass's direction.
    pub signatures: u64,
}

/// Transcode a whole fast-export stream from `input` to `output`.
pub fn transcode<R: BufRead, W: Write>(mode: Mode, input: R, output: W) -> Result<TranscodeStats> {
    transcode_with_progress(mode, input, output, |_| {})
}

/// Like [`transcode`], calling `progress` after every commit record.
pub fn transcode_with_progress<R, W, F>(
    mode: Mode,
    input: R,
    mut output: W,
    progress: F,
) -> Result<TranscodeStats>
where
    R: BufRead,
    W: Write,
    F: FnMut(&TranscodeStats),
{
    let mut transcoder = Transcoder {
        mode,
        reader: StreamReader::new(input),
        output: &mut output,
        stats: TranscodeStats::default(),
        line: Vec::new(),
    };
    transcoder.run(progress)?;
    let stats = transcoder.stats;
    output.flush()?;
    Ok(stats)
}

struct Transcoder<'w, R, W> {
    mode: Mode,
    reader: StreamReader<R>,
    output: &'w mut W,
    stats: TranscodeStats,
    line: Vec<u8>,
}

impl<R: BufRead, W: Write> Transcoder<'_, R, W> {
    fn run<F: FnMut(&TranscodeStats)>(&mut self, mut progress: F) -> Result<()> {
        // Set when a commit record ended without its blank line and the
        // next command is already in `self.line`.
        let mut pending = false;
        while pending || self.reader.read_line(&mut self.line)? {
            pending = false;
            if self.line.starts_with(COMMIT_PREFIX) {
                self.output.write_all(&self.line)?;
                pending = self.commit()?;
                progress(&self.stats);
            } else {
                self.pass_through("data block")?;
            }
        }
        Ok(())
    }

    /// Copy the current line, plus its block if it is a `data` line.
    fn pass_through(&mut self, context: &'static str) -> Result<()> {
        self.output.write_all(&self.line)?;
        if let Some(header) = DataHeader::parse(&self.line)? {
            copy_block(&mut self.reader, header, self.output, context)?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<bool> {
        self.stats.commits += 1;
        let (headers, message) = self.collect_headers()?;
        match self.mode {
            Mode::Store => self.emit_stored(headers, message)?,
            Mode::Restore => self.emit_restored(headers, message)?,
        }
        self.replay_tail()
    }

    /// Read header lines up to and including the message block.
    fn collect_headers(&mut self) -> Result<(Vec<Header>, DataBlock)> {
        let mut headers = Vec::new();
        loop {
            if !self.reader.read_line(&mut self.line)? {
                return Err(Error::Truncated {
                    context: "commit headers",
                    offset: self.reader.offset(),
                });
            }

            if let Some(header) = DataHeader::parse(&self.line)? {
                let mut message =
                    DataBlock::read(&mut self.reader, &self.line, header, "commit message")?;
                message.take_optional_lf(&mut self.reader)?;
                return Ok((headers, message));
            }

            if let Some(kind) = self.line.strip_prefix(SIGNATURE_PREFIX) {
                let kind = kind.strip_suffix(b"\n").unwrap_or(kind).to_vec();
                let signature = self.read_signature(kind)?;
                headers.push(Header::Signature(signature));
            } else {
                headers.push(Header::Opaque(self.line.clone()));
            }
        }
    }

    fn read_signature(&mut self, kind: Vec<u8>) -> Result<Signature> {
        let header_offset = self.reader.offset();
        if !self.reader.read_line(&mut self.line)? {
            return Err(Error::Truncated {
                context: "signature block",
                offset: header_offset,
            });
        }
        let Some(header) = DataHeader::parse(&self.line)? else {
            return Err(Error::Protocol(format!(
                "expected 'data' after gpgsig header at byte {}, got: {:?}",
                header_offset,
                String::from_utf8_lossy(&self.line)
            )));
        };
        let block = DataBlock::read(&mut self.reader, &self.line, header, "signature block")?;
        // A single LF may follow the block as framing.
        self.reader.consume_if(b'\n')?;
        Ok(Signature::new(kind, block.payload()))
    }

    fn emit_stored(&mut self, mut headers: Vec<Header>, message: DataBlock) -> Result<()> {
        let relocated = headers
            .iter()
            .position(|h| matches!(h, Header::Signature(sig) if !sig.payload.is_empty()))
            .map(|index| headers.remove(index));

        for header in &headers {
            if let Header::Signature(sig) = header {
                tracing::warn!(
                    "Keeping '{}' signature of commit {} as a native header",
                    String::from_utf8_lossy(&sig.kind),
                    self.stats.commits
                );
            }
            header.write_to(self.output)?;
        }

        match relocated {
            Some(Header::Signature(signature)) => {
                tracing::debug!(
                    "Storing '{}' signature of commit {} in its message",
                    String::from_utf8_lossy(&signature.kind),
                    self.stats.commits
                );
                write_block_lf(self.output, &embed_signature(message.payload(), &signature))?;
                if message.has_trailing_lf() {
                    self.output.write_all(b"\n")?;
                }
                self.stats.signatures += 1;
            }
            _ => message.write_verbatim(self.output)?,
        }
        Ok(())
    }

    fn emit_restored(&mut self, mut headers: Vec<Header>, message: DataBlock) -> Result<()> {
        match extract_signature(message.payload()) {
            Extraction::Found {
                message: cleaned,
                signature,
            } => {
                tracing::debug!(
                    "Restoring '{}' signature of commit {} from its message",
                    String::from_utf8_lossy(&signature.kind),
                    self.stats.commits
                );
                let position = signature_insert_position(&headers);
                headers.insert(position, Header::Signature(signature));
                for header in &headers {
                    header.write_to(self.output)?;
                }
                // An LF consumed after a payload without one went out with
                // the signature block.
                write_block(self.output, &cleaned)?;
                self.stats.signatures += 1;
            }
            extraction => {
                if extraction == Extraction::Malformed {
                    tracing::debug!(
                        "Commit {} mentions an embedded signature marker that cannot be parsed; leaving it alone",
                        self.stats.commits
                    );
                }
                for header in &headers {
                    header.write_to(self.output)?;
                }
                message.write_verbatim(self.output)?;
            }
        }
        Ok(())
    }

    /// Copy the rest of the commit record up to its blank terminator line.
    /// Returns true if another commit started first; its line is left in
    /// `self.line`.
    fn replay_tail(&mut self) -> Result<bool> {
        while self.reader.read_line(&mut self.line)? {
            if self.line == b"\n" {
                self.output.write_all(&self.line)?;
                return Ok(false);
            }
            if self.line.starts_with(COMMIT_PREFIX) {
                return Ok(true);
            }
            self.pass_through("inline data block")?;
        }
        Ok(false)
    }
}
