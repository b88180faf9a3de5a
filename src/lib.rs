#![deny(clippy::mod_module_files)]
//! Relocate commit signatures in `git fast-export` streams.
//!
//! `store` moves each commit's native `gpgsig` header into its message so the
//! signature survives history rewriting tools; `restore` moves it back.

pub mod config;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod stream;
