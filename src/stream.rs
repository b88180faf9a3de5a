//! fast-export stream transcoding
//!
//! Reads the record stream produced by `git fast-export`, relocates commit
//! signatures between the native `gpgsig` header and the commit message, and
//! writes a stream `git fast-import` accepts. Everything that is not a commit
//! record is copied byte for byte.

mod block;
mod reader;
mod record;
mod restore;
mod store;
mod transcode;

pub use block::{DataBlock, DataHeader};
pub use reader::StreamReader;
pub use record::{Header, Signature, EMBEDDED_MARKER};
pub use restore::{extract_signature, Extraction};
pub use store::embed_signature;
pub use transcode::{transcode, transcode_with_progress, Mode, TranscodeStats};
