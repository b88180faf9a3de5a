//! `data` blocks: parsing, reading, verbatim copying and writing

use std::io::{BufRead, Write};

use super::reader::StreamReader;
use crate::error::{Error, Result};

const DATA_PREFIX: &[u8] = b"data ";

/// Framing declared by a `data` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataHeader {
    /// `data <N>`: exactly N bytes follow.
    Counted(u64),
    /// `data <<DELIM`: lines follow until a line equal to DELIM.
    Delimited(Vec<u8>),
}

impl DataHeader {
    /// Parse a `data` line. Returns `Ok(None)` if the line is not a `data` command.
    pub fn parse(line: &[u8]) -> Result<Option<Self>> {
        let Some(rest) = line.strip_prefix(DATA_PREFIX) else {
            return Ok(None);
        };
        let rest = strip_newline(rest);

        if let Some(delim) = rest.strip_prefix(b"<<") {
            if delim.is_empty() {
                return Err(Error::Protocol("empty delimiter in 'data <<' line".into()));
            }
            return Ok(Some(DataHeader::Delimited(delim.to_vec())));
        }

        let count = std::str::from_utf8(rest)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "invalid byte count in data line: {:?}",
                    String::from_utf8_lossy(line)
                ))
            })?;
        Ok(Some(DataHeader::Counted(count)))
    }
}

/// A block read into memory, remembering its original framing so it can be
/// written back byte-for-byte when nothing about it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    /// The `data ...` line exactly as it appeared.
    header_line: Vec<u8>,
    /// Bytes between the header line and the end of the block. For delimited
    /// blocks this excludes the delimiter line itself.
    raw: Vec<u8>,
    delimiter: Option<Vec<u8>>,
    /// Whether the optional LF after a counted block was consumed.
    trailing_lf: bool,
}

impl DataBlock {
    /// Read the block announced by `header_line`.
    pub fn read<R: BufRead>(
        reader: &mut StreamReader<R>,
        header_line: &[u8],
        header: DataHeader,
        context: &'static str,
    ) -> Result<Self> {
        match header {
            DataHeader::Counted(len) => {
                let len = usize::try_from(len).map_err(|_| {
                    Error::Protocol(format!("data block of {} bytes is too large", len))
                })?;
                let raw = reader.read_exact_vec(len, context)?;
                Ok(Self {
                    header_line: header_line.to_vec(),
                    raw,
                    delimiter: None,
                    trailing_lf: false,
                })
            }
            DataHeader::Delimited(delim) => {
                let mut raw = Vec::new();
                let mut line = Vec::new();
                loop {
                    if !reader.read_line(&mut line)? {
                        return Err(Error::Truncated {
                            context,
                            offset: reader.offset(),
                        });
                    }
                    if strip_newline(&line) == delim.as_slice() {
                        break;
                    }
                    raw.extend_from_slice(&line);
                }
                Ok(Self {
                    header_line: header_line.to_vec(),
                    raw,
                    delimiter: Some(delim),
                    trailing_lf: false,
                })
            }
        }
    }

    /// The payload as git sees it. The LF preceding a delimiter belongs to the
    /// framing, not to the payload.
    pub fn payload(&self) -> &[u8] {
        match self.delimiter {
            Some(_) => self.raw.strip_suffix(b"\n").unwrap_or(&self.raw),
            None => &self.raw,
        }
    }

    /// Consume the optional LF after a counted payload that does not end in
    /// LF. Payloads ending in LF are left alone: a blank line after them is
    /// the record terminator.
    pub fn take_optional_lf<R: BufRead>(&mut self, reader: &mut StreamReader<R>) -> Result<bool> {
        if self.delimiter.is_none() && !self.raw.ends_with(b"\n") {
            self.trailing_lf = reader.consume_if(b'\n')?;
        }
        Ok(self.trailing_lf)
    }

    pub fn has_trailing_lf(&self) -> bool {
        self.trailing_lf
    }

    /// Write the block exactly as it was read, optional LF included.
    pub fn write_verbatim<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.header_line)?;
        out.write_all(&self.raw)?;
        if let Some(delim) = &self.delimiter {
            out.write_all(delim)?;
            out.write_all(b"\n")?;
        }
        if self.trailing_lf {
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Copy the block announced by `header` from `reader` to `out` unchanged.
/// The header line itself must already have been written.
pub fn copy_block<R: BufRead, W: Write>(
    reader: &mut StreamReader<R>,
    header: DataHeader,
    out: &mut W,
    context: &'static str,
) -> Result<()> {
    match header {
        DataHeader::Counted(len) => reader.copy_exact(len, out, context),
        DataHeader::Delimited(delim) => {
            let mut line = Vec::new();
            loop {
                if !reader.read_line(&mut line)? {
                    return Err(Error::Truncated {
                        context,
                        offset: reader.offset(),
                    });
                }
                out.write_all(&line)?;
                if strip_newline(&line) == delim.as_slice() {
                    return Ok(());
                }
            }
        }
    }
}

/// Write `data <N>` followed by exactly `payload`.
pub fn write_block<W: Write>(out: &mut W, payload: &[u8]) -> Result<()> {
    writeln!(out, "data {}", payload.len())?;
    out.write_all(payload)?;
    Ok(())
}

/// Write a counted block and, if the payload does not end in LF, one extra LF
/// outside the count so the next command starts on its own line.
pub fn write_block_lf<W: Write>(out: &mut W, payload: &[u8]) -> Result<()> {
    write_block(out, payload)?;
    if !payload.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}

pub(crate) fn strip_newline(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n").unwrap_or(line)
}
