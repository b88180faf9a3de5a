//! Commands for the git processes on either side of the transcoder

mod fast_export;
mod fast_import;

pub use fast_export::export_command;
pub use fast_import::import_command;
