//! Shared helpers for the demo binaries. Not part of the library
//! crate — each `demos/*.rs` binary pulls this in via `#[path]`.

pub mod json_gen;
pub mod logging;
pub mod timing;
